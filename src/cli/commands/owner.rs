use clap::Subcommand;
use serde_json::json;
use uuid::Uuid;

use super::property::print_property_table;
use crate::cli::config::connect;
use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::models::{NewOwner, OwnerUpdate};

#[derive(Subcommand)]
pub enum OwnerCommands {
    #[command(about = "List owners")]
    List {
        #[arg(long)]
        search: Option<String>,
    },

    #[command(about = "Show an owner")]
    Get {
        id: Uuid,
    },

    #[command(about = "Create an owner record")]
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        company: Option<String>,
    },

    #[command(about = "Update an owner record")]
    Update {
        id: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        company: Option<String>,
    },

    #[command(about = "List an owner's properties")]
    Properties {
        id: Uuid,
    },
}

pub async fn handle(cmd: OwnerCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = connect()?;
    let owners = client.owners();

    match cmd {
        OwnerCommands::List { search } => {
            let list = owners.list(search.as_deref()).await?;
            if list.is_empty() {
                return output_empty_collection(&output_format, "owners", "No owners found");
            }
            output_value(&output_format, &list, |l| {
                println!("{:<36} {:<24} {:<30} {}", "ID", "NAME", "EMAIL", "COMPANY");
                println!("{}", "-".repeat(100));
                for o in l {
                    println!(
                        "{:<36} {:<24} {:<30} {}",
                        o.id,
                        o.full_name,
                        o.email,
                        or_dash(o.company.as_deref())
                    );
                }
            })
        }
        OwnerCommands::Get { id } => {
            let owner = owners.get(id).await?;
            output_value(&output_format, &owner, |o| {
                println!("{} <{}>", o.full_name, o.email);
                println!("Phone:   {}", or_dash(o.phone.as_deref()));
                println!("Company: {}", or_dash(o.company.as_deref()));
                println!("ID:      {}", o.id);
            })
        }
        OwnerCommands::Create {
            name,
            email,
            phone,
            company,
        } => {
            let owner = owners
                .create(&NewOwner {
                    full_name: name,
                    email,
                    phone,
                    company,
                })
                .await?;
            output_success(
                &output_format,
                &format!("Owner '{}' created ({})", owner.full_name, owner.id),
                Some(json!({ "owner": owner })),
            )
        }
        OwnerCommands::Update {
            id,
            name,
            email,
            phone,
            company,
        } => {
            let update = OwnerUpdate {
                full_name: name,
                email,
                phone,
                company,
            };
            let owner = owners.update(id, &update).await?;
            output_success(
                &output_format,
                &format!("Owner '{}' updated", owner.full_name),
                Some(json!({ "owner": owner })),
            )
        }
        OwnerCommands::Properties { id } => {
            let list = owners.properties(id).await?;
            if list.is_empty() {
                return output_empty_collection(&output_format, "properties", "No properties");
            }
            output_value(&output_format, &list, |l| print_property_table(l))
        }
    }
}
