use clap::Subcommand;
use serde_json::json;
use uuid::Uuid;

use crate::cli::config::connect;
use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::models::{NewSpace, SpaceUpdate};

#[derive(Subcommand)]
pub enum SpaceCommands {
    #[command(about = "List the spaces of a property")]
    List {
        property: Uuid,
    },

    #[command(about = "Add a space to a property")]
    Create {
        property: Uuid,
        #[arg(long)]
        name: String,
        #[arg(long, help = "e.g. kitchen, bedroom, garden")]
        kind: Option<String>,
        #[arg(long)]
        floor: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },

    #[command(about = "Update a space")]
    Update {
        property: Uuid,
        space: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        kind: Option<String>,
        #[arg(long)]
        floor: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        position: Option<i32>,
    },

    #[command(about = "Remove a space and its assets")]
    Delete {
        property: Uuid,
        space: Uuid,
    },
}

pub async fn handle(cmd: SpaceCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = connect()?;
    let properties = client.properties();

    match cmd {
        SpaceCommands::List { property } => {
            let spaces = properties.spaces(property).await?;
            if spaces.is_empty() {
                return output_empty_collection(&output_format, "spaces", "No spaces");
            }
            output_value(&output_format, &spaces, |list| {
                println!("{:<36} {:<24} {:<12} {}", "ID", "NAME", "KIND", "FLOOR");
                println!("{}", "-".repeat(84));
                for s in list {
                    println!(
                        "{:<36} {:<24} {:<12} {}",
                        s.id,
                        s.name,
                        or_dash(s.kind.as_deref()),
                        or_dash(s.floor.as_deref())
                    );
                }
            })
        }
        SpaceCommands::Create {
            property,
            name,
            kind,
            floor,
            description,
        } => {
            let space = properties
                .create_space(property, &NewSpace { name, kind, floor, description })
                .await?;
            output_success(
                &output_format,
                &format!("Space '{}' added ({})", space.name, space.id),
                Some(json!({ "space": space })),
            )
        }
        SpaceCommands::Update {
            property,
            space,
            name,
            kind,
            floor,
            description,
            position,
        } => {
            let update = SpaceUpdate {
                name,
                kind,
                floor,
                description,
                position,
            };
            let updated = properties.update_space(property, space, &update).await?;
            output_success(
                &output_format,
                &format!("Space '{}' updated", updated.name),
                Some(json!({ "space": updated })),
            )
        }
        SpaceCommands::Delete { property, space } => {
            properties.delete_space(property, space).await?;
            output_success(&output_format, &format!("Space {} removed", space), Some(json!({ "id": space })))
        }
    }
}
