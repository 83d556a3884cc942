use std::path::PathBuf;

use clap::Subcommand;
use serde_json::json;
use uuid::Uuid;

use crate::cli::config::connect;
use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::models::PropertyDetail;
use crate::report::{ReportOptions, ReportSelection};

#[derive(Subcommand)]
pub enum ReportCommands {
    #[command(about = "Show the selectable spaces and assets of a property")]
    Tree {
        property: Uuid,
    },

    #[command(about = "Build a report; with no --space/--asset everything is included")]
    Build {
        property: Uuid,
        #[arg(long = "space", help = "Include a space and all its assets (repeatable)")]
        spaces: Vec<String>,
        #[arg(long = "asset", help = "Include a single asset (repeatable)")]
        assets: Vec<String>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        no_features: bool,
        #[arg(long)]
        images: bool,
        #[arg(long)]
        jobs: bool,
        #[arg(long, short, help = "Write to a file instead of stdout")]
        output: Option<PathBuf>,
    },
}

/// Everything when nothing is named, otherwise only the named spaces and assets
fn selection_from_args(
    detail: &PropertyDetail,
    spaces: &[Uuid],
    assets: &[Uuid],
) -> anyhow::Result<ReportSelection> {
    if spaces.is_empty() && assets.is_empty() {
        return Ok(ReportSelection::from_detail(detail, true));
    }

    let mut selection = ReportSelection::from_detail(detail, false);
    for space in spaces {
        if !selection.set_space(*space, true) {
            return Err(anyhow::anyhow!("Space {} is not part of '{}'", space, detail.property.name));
        }
    }
    for asset in assets {
        let space = selection
            .space_of(*asset)
            .ok_or_else(|| anyhow::anyhow!("Asset {} is not part of '{}'", asset, detail.property.name))?;
        selection.set_asset(space, *asset, true);
    }
    Ok(selection)
}

pub async fn handle(cmd: ReportCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = connect()?;
    let reports = client.reports();

    match cmd {
        ReportCommands::Tree { property } => {
            let detail = reports.detail(property).await?;
            output_value(&output_format, &detail, |d| {
                println!("{}", d.property.name);
                for space in &d.spaces {
                    println!("  {} {}", space.space.id, space.space.name);
                    for asset in &space.assets {
                        println!("    {} {}", asset.id, asset.name);
                    }
                }
            })
        }
        ReportCommands::Build {
            property,
            spaces,
            assets,
            title,
            no_features,
            images,
            jobs,
            output,
        } => {
            let detail = reports.detail(property).await?;
            let selection = selection_from_args(&detail, &parse_uuid_list(&spaces)?, &parse_uuid_list(&assets)?)?;
            let options = ReportOptions {
                title,
                include_features: !no_features,
                include_images: images,
                include_jobs: jobs,
            };
            let report = reports.build_with_detail(&detail, &selection, &options).await?;

            let rendered = match output_format {
                OutputFormat::Json => serde_json::to_string_pretty(&report)?,
                OutputFormat::Text => report.render_text(),
            };
            match output {
                Some(path) => {
                    tokio::fs::write(&path, rendered).await?;
                    output_success(
                        &output_format,
                        &format!(
                            "Report '{}' written to {} ({} spaces, {} assets)",
                            report.title,
                            path.display(),
                            report.totals.spaces,
                            report.totals.assets
                        ),
                        Some(json!({ "path": path.display().to_string(), "totals": report.totals })),
                    )
                }
                None => {
                    println!("{}", rendered);
                    Ok(())
                }
            }
        }
    }
}
