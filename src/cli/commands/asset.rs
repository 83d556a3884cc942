use chrono::NaiveDate;
use clap::Subcommand;
use serde_json::json;
use uuid::Uuid;

use crate::cli::config::connect;
use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::models::{AssetUpdate, NewAsset};

#[derive(Subcommand)]
pub enum AssetCommands {
    #[command(about = "List the assets in a space")]
    List {
        space: Uuid,
    },

    #[command(about = "Add an asset to a space")]
    Create {
        property: Uuid,
        space: Uuid,
        #[arg(long)]
        name: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        make: Option<String>,
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        serial: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long, help = "YYYY-MM-DD")]
        installed_on: Option<NaiveDate>,
    },

    #[command(about = "Update an asset")]
    Update {
        property: Uuid,
        asset: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        make: Option<String>,
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        serial: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long, help = "YYYY-MM-DD")]
        installed_on: Option<NaiveDate>,
        #[arg(long)]
        position: Option<i32>,
    },

    #[command(about = "Remove an asset")]
    Delete {
        property: Uuid,
        asset: Uuid,
    },
}

pub async fn handle(cmd: AssetCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = connect()?;
    let properties = client.properties();

    match cmd {
        AssetCommands::List { space } => {
            let assets = properties.assets(space).await?;
            if assets.is_empty() {
                return output_empty_collection(&output_format, "assets", "No assets");
            }
            output_value(&output_format, &assets, |list| {
                println!("{:<36} {:<24} {:<14} {}", "ID", "NAME", "CATEGORY", "MAKE/MODEL");
                println!("{}", "-".repeat(90));
                for a in list {
                    let maker = [a.make.as_deref(), a.model.as_deref()]
                        .into_iter()
                        .flatten()
                        .collect::<Vec<_>>()
                        .join(" ");
                    println!(
                        "{:<36} {:<24} {:<14} {}",
                        a.id,
                        a.name,
                        or_dash(a.category.as_deref()),
                        or_dash(Some(maker.as_str()))
                    );
                }
            })
        }
        AssetCommands::Create {
            property,
            space,
            name,
            category,
            make,
            model,
            serial,
            notes,
            installed_on,
        } => {
            let asset = NewAsset {
                name,
                category,
                make,
                model,
                serial_number: serial,
                notes,
                installed_on,
            };
            let created = properties.create_asset(property, space, &asset).await?;
            output_success(
                &output_format,
                &format!("Asset '{}' added ({})", created.name, created.id),
                Some(json!({ "asset": created })),
            )
        }
        AssetCommands::Update {
            property,
            asset,
            name,
            category,
            make,
            model,
            serial,
            notes,
            installed_on,
            position,
        } => {
            let update = AssetUpdate {
                name,
                category,
                make,
                model,
                serial_number: serial,
                notes,
                installed_on,
                position,
            };
            let updated = properties.update_asset(property, asset, &update).await?;
            output_success(
                &output_format,
                &format!("Asset '{}' updated", updated.name),
                Some(json!({ "asset": updated })),
            )
        }
        AssetCommands::Delete { property, asset } => {
            properties.delete_asset(property, asset).await?;
            output_success(&output_format, &format!("Asset {} removed", asset), Some(json!({ "id": asset })))
        }
    }
}
