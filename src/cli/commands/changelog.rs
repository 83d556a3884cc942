use clap::Subcommand;
use uuid::Uuid;

use crate::cli::config::connect;
use crate::cli::utils::*;
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum ChangelogCommands {
    #[command(about = "Show the change history of a property")]
    List {
        property: Uuid,
        #[arg(long, default_value_t = 50)]
        limit: u32,
        #[arg(long)]
        offset: Option<u32>,
    },
}

pub async fn handle(cmd: ChangelogCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = connect()?;

    match cmd {
        ChangelogCommands::List { property, limit, offset } => {
            let entries = client.changelog().list(property, Some(limit), offset).await?;
            if entries.is_empty() {
                return output_empty_collection(&output_format, "changelog", "No changes recorded");
            }
            output_value(&output_format, &entries, |list| {
                for e in list {
                    println!(
                        "{}  {:<8} {:<9} {}",
                        e.created_at.format("%Y-%m-%d %H:%M"),
                        e.action.as_str(),
                        e.entity_type.as_str(),
                        e.description
                    );
                }
            })
        }
    }
}
