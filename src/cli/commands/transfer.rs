use chrono::Utc;
use clap::{Subcommand, ValueEnum};
use serde_json::json;
use uuid::Uuid;

use crate::cli::config::connect;
use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::models::{Transfer, TransferDirection};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Direction {
    Incoming,
    Outgoing,
}

impl From<Direction> for TransferDirection {
    fn from(d: Direction) -> Self {
        match d {
            Direction::Incoming => TransferDirection::Incoming,
            Direction::Outgoing => TransferDirection::Outgoing,
        }
    }
}

#[derive(Subcommand)]
pub enum TransferCommands {
    #[command(about = "List transfers you sent or received")]
    List {
        #[arg(long, value_enum)]
        direction: Option<Direction>,
    },

    #[command(about = "Show a transfer")]
    Get {
        id: Uuid,
    },

    #[command(about = "Offer a property to another user")]
    Initiate {
        property: Uuid,
        email: String,
        #[arg(long)]
        message: Option<String>,
    },

    #[command(about = "Accept a transfer offered to you")]
    Accept {
        id: Uuid,
    },

    #[command(about = "Reject a transfer offered to you")]
    Reject {
        id: Uuid,
    },

    #[command(about = "Withdraw a transfer you sent")]
    Cancel {
        id: Uuid,
    },
}

fn print_transfers(transfers: &[Transfer]) {
    let now = Utc::now();
    println!("{:<36} {:<36} {:<28} {}", "ID", "PROPERTY", "RECIPIENT", "STATUS");
    println!("{}", "-".repeat(110));
    for t in transfers {
        println!(
            "{:<36} {:<36} {:<28} {}",
            t.id,
            t.property_id,
            t.recipient_email,
            t.effective_status(now).as_str()
        );
    }
}

pub async fn handle(cmd: TransferCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = connect()?;
    let transfers = client.transfers();

    let resolved = match cmd {
        TransferCommands::List { direction } => {
            let list = transfers.list(direction.map(Into::into)).await?;
            if list.is_empty() {
                return output_empty_collection(&output_format, "transfers", "No transfers");
            }
            return output_value(&output_format, &list, |l| print_transfers(l));
        }
        TransferCommands::Get { id } => {
            let transfer = transfers.get(id).await?;
            return output_value(&output_format, &transfer, |t| print_transfers(std::slice::from_ref(t)));
        }
        TransferCommands::Initiate {
            property,
            email,
            message,
        } => {
            let transfer = transfers.initiate(property, &email, message).await?;
            return output_success(
                &output_format,
                &format!(
                    "Transfer offered to {}, open until {}",
                    transfer.recipient_email,
                    transfer.expires_at.format("%Y-%m-%d %H:%M")
                ),
                Some(json!({ "transfer": transfer })),
            );
        }
        TransferCommands::Accept { id } => transfers.accept(id).await?,
        TransferCommands::Reject { id } => transfers.reject(id).await?,
        TransferCommands::Cancel { id } => transfers.cancel(id).await?,
    };

    output_success(
        &output_format,
        &format!("Transfer {} is now {}", resolved.id, resolved.status.as_str()),
        Some(json!({ "transfer": resolved })),
    )
}
