use std::path::PathBuf;

use clap::{Subcommand, ValueEnum};
use serde_json::json;
use uuid::Uuid;

use crate::cli::config::connect;
use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::models::ImageTarget;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ImageOwner {
    Property,
    Space,
    Asset,
}

impl ImageOwner {
    fn target(self, id: Uuid) -> ImageTarget {
        match self {
            ImageOwner::Property => ImageTarget::property(id),
            ImageOwner::Space => ImageTarget::space(id),
            ImageOwner::Asset => ImageTarget::asset(id),
        }
    }
}

#[derive(Subcommand)]
pub enum ImageCommands {
    #[command(about = "Upload an image file")]
    Upload {
        #[arg(value_enum)]
        entity: ImageOwner,
        id: Uuid,
        file: PathBuf,
        #[arg(long, help = "Override the content type guessed from the extension")]
        content_type: Option<String>,
        #[arg(long, help = "Make this the property's splash image (property uploads only)")]
        splash: bool,
    },

    #[command(about = "List images attached to a property, space or asset")]
    List {
        #[arg(value_enum)]
        entity: ImageOwner,
        id: Uuid,
    },

    #[command(about = "Delete an image; for property images pass --property to keep the splash in order")]
    Delete {
        image: Uuid,
        #[arg(long)]
        property: Option<Uuid>,
    },

    #[command(about = "Set or clear the splash image of a property")]
    Splash {
        property: Uuid,
        #[arg(help = "Image to use; omit with --clear")]
        image: Option<Uuid>,
        #[arg(long, conflicts_with = "image")]
        clear: bool,
    },
}

pub async fn handle(cmd: ImageCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = connect()?;
    let images = client.images();

    match cmd {
        ImageCommands::Upload {
            entity,
            id,
            file,
            content_type,
            splash,
        } => {
            let file_name = file
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| anyhow::anyhow!("Invalid file name: {}", file.display()))?
                .to_string();
            let content_type = match content_type {
                Some(ct) => ct,
                None => guess_content_type(&file_name)
                    .ok_or_else(|| anyhow::anyhow!("Cannot tell the image type of '{}', pass --content-type", file_name))?
                    .to_string(),
            };
            let bytes = tokio::fs::read(&file).await?;

            let image = match entity {
                ImageOwner::Property => {
                    images
                        .upload_property_image(id, &file_name, &content_type, bytes, splash)
                        .await?
                }
                _ if splash => return Err(anyhow::anyhow!("--splash only applies to property images")),
                other => images.upload(other.target(id), &file_name, &content_type, bytes).await?,
            };
            output_success(
                &output_format,
                &format!("Uploaded '{}' ({} bytes)", image.file_name, image.size_bytes),
                Some(json!({ "image": image })),
            )
        }
        ImageCommands::List { entity, id } => {
            let list = images.list(entity.target(id)).await?;
            if list.is_empty() {
                return output_empty_collection(&output_format, "images", "No images");
            }
            output_value(&output_format, &list, |l| {
                println!("{:<36} {:<28} {:>10} {}", "ID", "FILE", "BYTES", "UPLOADED");
                println!("{}", "-".repeat(96));
                for img in l {
                    println!(
                        "{:<36} {:<28} {:>10} {}",
                        img.id,
                        img.file_name,
                        img.size_bytes,
                        img.created_at.format("%Y-%m-%d %H:%M")
                    );
                }
            })
        }
        ImageCommands::Delete { image, property } => match property {
            Some(property_id) => {
                let property = images.delete_property_image(property_id, image).await?;
                output_success(
                    &output_format,
                    &format!("Image {} deleted", image),
                    Some(json!({ "id": image, "splash_image_id": property.splash_image_id })),
                )
            }
            None => {
                images.delete(image).await?;
                output_success(&output_format, &format!("Image {} deleted", image), Some(json!({ "id": image })))
            }
        },
        ImageCommands::Splash { property, image, clear } => {
            let updated = match (image, clear) {
                (_, true) => images.clear_splash(property).await?,
                (Some(image), false) => images.set_splash(property, image).await?,
                (None, false) => return Err(anyhow::anyhow!("Pass an image id or --clear")),
            };
            let message = match updated.splash_image_id {
                Some(id) => format!("Splash image of '{}' is now {}", updated.name, id),
                None => format!("Splash image of '{}' cleared", updated.name),
            };
            output_success(
                &output_format,
                &message,
                Some(json!({ "splash_image_id": updated.splash_image_id })),
            )
        }
    }
}
