use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::changelog_service::ChangeLogService;
use super::property_service::PropertyService;
use super::require_text;
use crate::api::{ApiClient, QueryParams};
use crate::config::UploadConfig;
use crate::error::ApiError;
use crate::models::{Image, ImageTarget, Property};
use crate::types::{ChangeAction, EntityType};

/// Image upload, listing and deletion, plus upkeep of each property's
/// splash (cover) image reference.
#[derive(Clone)]
pub struct ImageService {
    api: ApiClient,
    properties: PropertyService,
    uploads: UploadConfig,
    changelog: ChangeLogService,
}

impl ImageService {
    pub fn new(api: ApiClient, uploads: UploadConfig, changelog: ChangeLogService) -> Self {
        let properties = PropertyService::new(api.clone(), changelog.clone());
        Self {
            api,
            properties,
            uploads,
            changelog,
        }
    }

    fn validate_upload(&self, file_name: &str, content_type: &str, bytes: &[u8]) -> Result<String, ApiError> {
        let file_name = require_text("file name", file_name)?;

        let content_type = content_type.trim().to_ascii_lowercase();
        if !self.uploads.allowed_content_types.iter().any(|t| *t == content_type) {
            return Err(ApiError::validation(format!(
                "unsupported image type '{}' (allowed: {})",
                content_type,
                self.uploads.allowed_content_types.join(", ")
            )));
        }

        if bytes.is_empty() {
            return Err(ApiError::validation("image is empty"));
        }
        if bytes.len() > self.uploads.max_image_bytes {
            return Err(ApiError::validation(format!(
                "image is {} bytes, limit is {} bytes",
                bytes.len(),
                self.uploads.max_image_bytes
            )));
        }

        Ok(file_name)
    }

    /// Upload an image for any entity
    #[tracing::instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload(
        &self,
        target: ImageTarget,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<Image, ApiError> {
        let file_name = self.validate_upload(file_name, content_type, &bytes)?;
        let query = QueryParams::new()
            .with("entity_type", target.entity_type)
            .with("entity_id", target.entity_id)
            .with("file_name", &file_name)
            .with("checksum", checksum(&bytes));

        self.api
            .upload("/api/images", &query, &content_type.trim().to_ascii_lowercase(), bytes)
            .await
    }

    /// Upload a property image. The first image of a property without a
    /// splash becomes the splash; `make_splash` forces it. Otherwise the
    /// existing splash is left alone.
    #[tracing::instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload_property_image(
        &self,
        property_id: Uuid,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
        make_splash: bool,
    ) -> Result<Image, ApiError> {
        let property = self.properties.get(property_id).await?;
        let image = self
            .upload(ImageTarget::property(property_id), file_name, content_type, bytes)
            .await?;

        if make_splash || property.splash_image_id.is_none() {
            self.properties.put_splash(property_id, Some(image.id)).await?;
        }

        self.changelog
            .record_quietly(
                property_id,
                EntityType::Property,
                image.id,
                ChangeAction::Upload,
                format!("Uploaded image '{}'", image.file_name),
            )
            .await;
        Ok(image)
    }

    #[tracing::instrument(skip(self))]
    pub async fn list(&self, target: ImageTarget) -> Result<Vec<Image>, ApiError> {
        let query = QueryParams::new()
            .with("entity_type", target.entity_type)
            .with("entity_id", target.entity_id);
        self.api.get("/api/images", &query).await
    }

    /// Delete an image without touching any splash reference
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, image_id: Uuid) -> Result<(), ApiError> {
        self.api.delete(&format!("/api/images/{}", image_id)).await
    }

    /// Delete a property image. If it was the splash, the oldest remaining
    /// property image takes over, or the splash is cleared when none remain.
    /// Returns the property as it stands afterwards.
    #[tracing::instrument(skip(self))]
    pub async fn delete_property_image(&self, property_id: Uuid, image_id: Uuid) -> Result<Property, ApiError> {
        let property = self.properties.get(property_id).await?;
        let mut remaining = self.list(ImageTarget::property(property_id)).await?;
        if !remaining.iter().any(|img| img.id == image_id) {
            return Err(ApiError::validation(format!(
                "image {} does not belong to property {}",
                image_id, property_id
            )));
        }
        self.delete(image_id).await?;

        self.changelog
            .record_quietly(
                property_id,
                EntityType::Property,
                image_id,
                ChangeAction::Delete,
                "Deleted image".to_string(),
            )
            .await;

        if property.splash_image_id != Some(image_id) {
            return Ok(property);
        }

        remaining.retain(|img| img.id != image_id);
        remaining.sort_by_key(|img| img.created_at);
        let next = remaining.first().map(|img| img.id);

        tracing::debug!(?next, "splash image deleted, reassigning");
        self.properties.put_splash(property_id, next).await
    }

    /// Make an existing property image the splash
    #[tracing::instrument(skip(self))]
    pub async fn set_splash(&self, property_id: Uuid, image_id: Uuid) -> Result<Property, ApiError> {
        let images = self.list(ImageTarget::property(property_id)).await?;
        if !images.iter().any(|img| img.id == image_id) {
            return Err(ApiError::validation(format!(
                "image {} does not belong to property {}",
                image_id, property_id
            )));
        }
        self.properties.put_splash(property_id, Some(image_id)).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn clear_splash(&self, property_id: Uuid) -> Result<Property, ApiError> {
        self.properties.put_splash(property_id, None).await
    }
}

/// Hex SHA-256 of the payload, sent so the backend can dedupe storage objects
pub fn checksum(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
