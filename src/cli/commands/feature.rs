use clap::Subcommand;
use serde_json::json;
use uuid::Uuid;

use crate::cli::config::connect;
use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::models::NewFeature;

#[derive(Subcommand)]
pub enum FeatureCommands {
    #[command(about = "List the features of a property")]
    List {
        property: Uuid,
    },

    #[command(about = "Add a feature, e.g. 'Parking' '2 spaces'")]
    Add {
        property: Uuid,
        name: String,
        value: Option<String>,
    },

    #[command(about = "Remove a feature")]
    Remove {
        property: Uuid,
        feature: Uuid,
    },
}

pub async fn handle(cmd: FeatureCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = connect()?;
    let properties = client.properties();

    match cmd {
        FeatureCommands::List { property } => {
            let features = properties.features(property).await?;
            if features.is_empty() {
                return output_empty_collection(&output_format, "features", "No features");
            }
            output_value(&output_format, &features, |list| {
                for f in list {
                    println!("{}  {}: {}", f.id, f.name, or_dash(f.value.as_deref()));
                }
            })
        }
        FeatureCommands::Add { property, name, value } => {
            let feature = properties.add_feature(property, &NewFeature { name, value }).await?;
            output_success(
                &output_format,
                &format!("Feature '{}' added", feature.name),
                Some(json!({ "feature": feature })),
            )
        }
        FeatureCommands::Remove { property, feature } => {
            properties.remove_feature(property, feature).await?;
            output_success(&output_format, "Feature removed", Some(json!({ "id": feature })))
        }
    }
}
