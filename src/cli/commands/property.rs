use clap::Subcommand;
use serde_json::json;
use uuid::Uuid;

use crate::api::ListQuery;
use crate::cli::config::connect;
use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::models::{NewProperty, Property, PropertyDetail, PropertyStatus, PropertyUpdate};

#[derive(Subcommand)]
pub enum PropertyCommands {
    #[command(about = "List properties")]
    List {
        #[arg(long, help = "Match against name and address")]
        search: Option<String>,
        #[arg(long, help = "draft, active or archived")]
        status: Option<PropertyStatus>,
        #[arg(long)]
        owner: Option<Uuid>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        offset: Option<u32>,
        #[arg(long, help = "e.g. \"created_at desc\"")]
        order: Option<String>,
    },

    #[command(about = "Show a property with its spaces, assets and features")]
    Get {
        id: Uuid,
    },

    #[command(about = "Create a property")]
    Create {
        #[arg(long)]
        owner: Uuid,
        #[arg(long)]
        name: String,
        #[arg(long)]
        address: String,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        postcode: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, default_value = "draft")]
        status: PropertyStatus,
    },

    #[command(about = "Update property fields")]
    Update {
        id: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        postcode: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        status: Option<PropertyStatus>,
    },

    #[command(about = "Delete a property")]
    Delete {
        id: Uuid,
    },
}

pub(crate) fn print_property_table(properties: &[Property]) {
    println!("{:<36} {:<28} {:<9} {}", "ID", "NAME", "STATUS", "ADDRESS");
    println!("{}", "-".repeat(100));
    for p in properties {
        println!("{:<36} {:<28} {:<9} {}", p.id, p.name, p.status.as_str(), p.address);
    }
}

fn print_detail(detail: &PropertyDetail) {
    let p = &detail.property;
    println!("{} ({})", p.name, p.status.as_str());
    println!("Address: {}", p.address);
    if let Some(city) = p.city.as_deref() {
        println!("City:    {} {}", city, or_dash(p.postcode.as_deref()));
    }
    println!("ID:      {}", p.id);
    println!("Owner:   {}", p.owner_id);
    if let Some(splash) = p.splash_image_id {
        println!("Splash:  {}", splash);
    }

    for space in &detail.spaces {
        println!("\n  [{}] {} {}", space.space.id, space.space.name, or_dash(space.space.kind.as_deref()));
        for asset in &space.assets {
            println!("      [{}] {}", asset.id, asset.name);
        }
    }

    if !detail.features.is_empty() {
        println!("\n  Features:");
        for f in &detail.features {
            println!("    [{}] {}: {}", f.id, f.name, or_dash(f.value.as_deref()));
        }
    }
}

pub async fn handle(cmd: PropertyCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = connect()?;
    let properties = client.properties();

    match cmd {
        PropertyCommands::List {
            search,
            status,
            owner,
            limit,
            offset,
            order,
        } => {
            let query = ListQuery {
                search,
                status: status.map(|s| s.as_str().to_string()),
                owner_id: owner,
                limit,
                offset,
                order,
            };
            let list = properties.list(&query).await?;
            if list.is_empty() {
                return output_empty_collection(&output_format, "properties", "No properties found");
            }
            output_value(&output_format, &list, |l| print_property_table(l))
        }
        PropertyCommands::Get { id } => {
            let detail = properties.detail(id).await?;
            output_value(&output_format, &detail, print_detail)
        }
        PropertyCommands::Create {
            owner,
            name,
            address,
            city,
            postcode,
            description,
            status,
        } => {
            let created = properties
                .create(&NewProperty {
                    owner_id: owner,
                    name,
                    address,
                    city,
                    postcode,
                    description,
                    status,
                })
                .await?;
            output_success(
                &output_format,
                &format!("Property '{}' created ({})", created.name, created.id),
                Some(json!({ "property": created })),
            )
        }
        PropertyCommands::Update {
            id,
            name,
            address,
            city,
            postcode,
            description,
            status,
        } => {
            let update = PropertyUpdate {
                name,
                address,
                city,
                postcode,
                description,
                status,
            };
            let updated = properties.update(id, &update).await?;
            output_success(
                &output_format,
                &format!("Property '{}' updated", updated.name),
                Some(json!({ "property": updated })),
            )
        }
        PropertyCommands::Delete { id } => {
            properties.delete(id).await?;
            output_success(&output_format, &format!("Property {} deleted", id), Some(json!({ "id": id })))
        }
    }
}
