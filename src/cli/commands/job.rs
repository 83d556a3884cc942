use chrono::Utc;
use clap::Subcommand;
use serde_json::json;
use uuid::Uuid;

use crate::cli::config::connect;
use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::models::Job;
use crate::services::NewJobRequest;

#[derive(Subcommand)]
pub enum JobCommands {
    #[command(about = "List the access jobs of a property")]
    List {
        property: Uuid,
    },

    #[command(about = "Show a job")]
    Get {
        id: Uuid,
    },

    #[command(about = "Issue PIN access to some of a property's assets")]
    Create {
        property: Uuid,
        #[arg(long)]
        title: String,
        #[arg(long = "asset", required = true, help = "Asset id; repeat or comma-separate")]
        assets: Vec<String>,
        #[arg(long)]
        contractor: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long, help = "RFC 3339, 'YYYY-MM-DD HH:MM' or +2h (default now)")]
        starts: Option<String>,
        #[arg(long, help = "RFC 3339, 'YYYY-MM-DD HH:MM' or +8h")]
        expires: Option<String>,
        #[arg(long, help = "Fixed 4-8 digit PIN (generated when omitted)")]
        pin: Option<String>,
    },

    #[command(about = "Push back the expiry of a job")]
    Extend {
        id: Uuid,
        #[arg(help = "New expiry: RFC 3339, 'YYYY-MM-DD HH:MM' or +2d")]
        until: String,
    },

    #[command(about = "Revoke a job immediately")]
    Revoke {
        id: Uuid,
    },

    #[command(about = "Look up what a PIN unlocks (no login needed)")]
    Access {
        pin: String,
    },
}

fn print_jobs(jobs: &[Job]) {
    let now = Utc::now();
    println!("{:<36} {:<24} {:<8} {:<10} {}", "ID", "TITLE", "PIN", "STATUS", "WINDOW");
    println!("{}", "-".repeat(110));
    for job in jobs {
        println!(
            "{:<36} {:<24} {:<8} {:<10} {} -> {}",
            job.id,
            job.title,
            job.pin,
            job.status(now).as_str(),
            job.starts_at.format("%Y-%m-%d %H:%M"),
            job.expires_at.format("%Y-%m-%d %H:%M")
        );
    }
}

pub async fn handle(cmd: JobCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = connect()?;
    let jobs = client.jobs();

    match cmd {
        JobCommands::List { property } => {
            let list = jobs.list(property).await?;
            if list.is_empty() {
                return output_empty_collection(&output_format, "jobs", "No jobs");
            }
            output_value(&output_format, &list, |l| print_jobs(l))
        }
        JobCommands::Get { id } => {
            let job = jobs.get(id).await?;
            output_value(&output_format, &job, |j| print_jobs(std::slice::from_ref(j)))
        }
        JobCommands::Create {
            property,
            title,
            assets,
            contractor,
            notes,
            starts,
            expires,
            pin,
        } => {
            let mut request = NewJobRequest::new(property, title, parse_uuid_list(&assets)?);
            request.contractor_name = contractor;
            request.notes = notes;
            request.starts_at = starts.as_deref().map(parse_when).transpose()?;
            request.expires_at = expires.as_deref().map(parse_when).transpose()?;
            request.pin = pin;

            let job = jobs.create(request).await?;
            output_success(
                &output_format,
                &format!(
                    "Job '{}' issued, PIN {} valid {} -> {}",
                    job.title,
                    job.pin,
                    job.starts_at.format("%Y-%m-%d %H:%M"),
                    job.expires_at.format("%Y-%m-%d %H:%M")
                ),
                Some(json!({ "job": job })),
            )
        }
        JobCommands::Extend { id, until } => {
            let job = jobs.extend(id, parse_when(&until)?).await?;
            output_success(
                &output_format,
                &format!("Job '{}' now expires {}", job.title, job.expires_at.format("%Y-%m-%d %H:%M")),
                Some(json!({ "job": job })),
            )
        }
        JobCommands::Revoke { id } => {
            let job = jobs.revoke(id).await?;
            output_success(&output_format, &format!("Job '{}' revoked", job.title), Some(json!({ "job": job })))
        }
        JobCommands::Access { pin } => {
            let access = jobs.access(&pin).await?;
            output_value(&output_format, &access, |a| {
                println!("{} at {}", a.job.title, a.property_name);
                println!("Until {}", a.job.expires_at.format("%Y-%m-%d %H:%M UTC"));
                for asset in &a.assets {
                    println!("  - {}", asset.name);
                }
            })
        }
    }
}
