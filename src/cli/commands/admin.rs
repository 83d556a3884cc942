use clap::Subcommand;
use serde_json::json;
use uuid::Uuid;

use super::property::print_property_table;
use crate::api::ListQuery;
use crate::cli::config::connect;
use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::types::Role;

#[derive(Subcommand)]
pub enum AdminCommands {
    #[command(about = "List all users")]
    Users,

    #[command(about = "Change a user's role")]
    SetRole {
        user: Uuid,
        #[arg(help = "owner or admin")]
        role: Role,
    },

    #[command(about = "List all properties across owners")]
    Properties {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        owner: Option<Uuid>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        offset: Option<u32>,
    },

    #[command(about = "Assign a property to an owner")]
    AssignOwner {
        property: Uuid,
        owner: Uuid,
    },

    #[command(about = "Platform counters")]
    Stats,
}

pub async fn handle(cmd: AdminCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = connect()?;
    let admin = client.admin();

    match cmd {
        AdminCommands::Users => {
            let users = admin.users().await?;
            output_value(&output_format, &users, |list| {
                println!("{:<36} {:<32} {:<7} {}", "ID", "EMAIL", "ROLE", "NAME");
                println!("{}", "-".repeat(100));
                for u in list {
                    println!("{:<36} {:<32} {:<7} {}", u.id, u.email, u.role.as_str(), u.display_name());
                }
            })
        }
        AdminCommands::SetRole { user, role } => {
            let updated = admin.set_role(user, role).await?;
            output_success(
                &output_format,
                &format!("{} is now {}", updated.email, updated.role),
                Some(json!({ "user": updated })),
            )
        }
        AdminCommands::Properties {
            search,
            owner,
            limit,
            offset,
        } => {
            let query = ListQuery {
                search,
                owner_id: owner,
                limit,
                offset,
                ..Default::default()
            };
            let list = admin.properties(&query).await?;
            if list.is_empty() {
                return output_empty_collection(&output_format, "properties", "No properties found");
            }
            output_value(&output_format, &list, |l| print_property_table(l))
        }
        AdminCommands::AssignOwner { property, owner } => {
            let updated = admin.assign_owner(property, owner).await?;
            output_success(
                &output_format,
                &format!("Property '{}' assigned to owner {}", updated.name, updated.owner_id),
                Some(json!({ "property": updated })),
            )
        }
        AdminCommands::Stats => {
            let stats = admin.stats().await?;
            output_value(&output_format, &stats, |s| {
                println!("Properties:        {}", s.properties);
                println!("Owners:            {}", s.owners);
                println!("Active jobs:       {}", s.active_jobs);
                println!("Pending transfers: {}", s.pending_transfers);
            })
        }
    }
}
