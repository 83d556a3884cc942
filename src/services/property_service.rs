use uuid::Uuid;

use super::changelog_service::ChangeLogService;
use super::require_text;
use crate::api::{ApiClient, ListQuery, QueryParams};
use crate::error::ApiError;
use crate::models::{
    Asset, AssetUpdate, Feature, NewAsset, NewFeature, NewProperty, NewSpace, Property,
    PropertyDetail, PropertyUpdate, Space, SpaceUpdate,
};
use crate::types::{ChangeAction, EntityType};

/// Properties and everything hanging off them: spaces, assets, features.
///
/// Mutations are followed by a change-log entry. Recording is best-effort;
/// a failed entry is logged and never fails the mutation itself.
#[derive(Clone)]
pub struct PropertyService {
    api: ApiClient,
    changelog: ChangeLogService,
}

impl PropertyService {
    pub fn new(api: ApiClient, changelog: ChangeLogService) -> Self {
        Self { api, changelog }
    }

    // ---- properties ------------------------------------------------------

    #[tracing::instrument(skip(self))]
    pub async fn list(&self, query: &ListQuery) -> Result<Vec<Property>, ApiError> {
        self.api.get("/api/properties", &query.to_params()).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<Property, ApiError> {
        self.api
            .get(&format!("/api/properties/{}", id), &QueryParams::new())
            .await
    }

    /// Property with spaces, assets and features in one call
    #[tracing::instrument(skip(self))]
    pub async fn detail(&self, id: Uuid) -> Result<PropertyDetail, ApiError> {
        self.api
            .get(&format!("/api/properties/{}/detail", id), &QueryParams::new())
            .await
    }

    #[tracing::instrument(skip(self, property), fields(name = %property.name))]
    pub async fn create(&self, property: &NewProperty) -> Result<Property, ApiError> {
        let mut payload = property.clone();
        payload.name = require_text("name", &property.name)?;
        payload.address = require_text("address", &property.address)?;

        let created: Property = self.api.post("/api/properties", &payload).await?;
        self.changelog
            .record_quietly(
                created.id,
                EntityType::Property,
                created.id,
                ChangeAction::Create,
                format!("Created property '{}'", created.name),
            )
            .await;
        Ok(created)
    }

    #[tracing::instrument(skip(self, update))]
    pub async fn update(&self, id: Uuid, update: &PropertyUpdate) -> Result<Property, ApiError> {
        if update.is_empty() {
            return Err(ApiError::validation("nothing to update"));
        }
        let mut payload = update.clone();
        if let Some(name) = update.name.as_deref() {
            payload.name = Some(require_text("name", name)?);
        }
        if let Some(address) = update.address.as_deref() {
            payload.address = Some(require_text("address", address)?);
        }

        let updated: Property = self
            .api
            .put(&format!("/api/properties/{}", id), &payload)
            .await?;
        self.changelog
            .record_quietly(
                id,
                EntityType::Property,
                id,
                ChangeAction::Update,
                format!("Updated property '{}'", updated.name),
            )
            .await;
        Ok(updated)
    }

    /// Deletes the property; its change log goes with it, so nothing is recorded
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ApiError> {
        self.api.delete(&format!("/api/properties/{}", id)).await
    }

    // ---- spaces ----------------------------------------------------------

    #[tracing::instrument(skip(self))]
    pub async fn spaces(&self, property_id: Uuid) -> Result<Vec<Space>, ApiError> {
        self.api
            .get(&format!("/api/properties/{}/spaces", property_id), &QueryParams::new())
            .await
    }

    #[tracing::instrument(skip(self, space))]
    pub async fn create_space(&self, property_id: Uuid, space: &NewSpace) -> Result<Space, ApiError> {
        let mut payload = space.clone();
        payload.name = require_text("space name", &space.name)?;

        let created: Space = self
            .api
            .post(&format!("/api/properties/{}/spaces", property_id), &payload)
            .await?;
        self.changelog
            .record_quietly(
                property_id,
                EntityType::Space,
                created.id,
                ChangeAction::Create,
                format!("Added space '{}'", created.name),
            )
            .await;
        Ok(created)
    }

    #[tracing::instrument(skip(self, update))]
    pub async fn update_space(
        &self,
        property_id: Uuid,
        space_id: Uuid,
        update: &SpaceUpdate,
    ) -> Result<Space, ApiError> {
        let mut payload = update.clone();
        if let Some(name) = update.name.as_deref() {
            payload.name = Some(require_text("space name", name)?);
        }

        let updated: Space = self
            .api
            .put(&format!("/api/spaces/{}", space_id), &payload)
            .await?;
        self.changelog
            .record_quietly(
                property_id,
                EntityType::Space,
                space_id,
                ChangeAction::Update,
                format!("Updated space '{}'", updated.name),
            )
            .await;
        Ok(updated)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_space(&self, property_id: Uuid, space_id: Uuid) -> Result<(), ApiError> {
        self.api.delete(&format!("/api/spaces/{}", space_id)).await?;
        self.changelog
            .record_quietly(
                property_id,
                EntityType::Space,
                space_id,
                ChangeAction::Delete,
                "Removed space".to_string(),
            )
            .await;
        Ok(())
    }

    // ---- assets ----------------------------------------------------------

    #[tracing::instrument(skip(self))]
    pub async fn assets(&self, space_id: Uuid) -> Result<Vec<Asset>, ApiError> {
        self.api
            .get(&format!("/api/spaces/{}/assets", space_id), &QueryParams::new())
            .await
    }

    #[tracing::instrument(skip(self, asset))]
    pub async fn create_asset(
        &self,
        property_id: Uuid,
        space_id: Uuid,
        asset: &NewAsset,
    ) -> Result<Asset, ApiError> {
        let mut payload = asset.clone();
        payload.name = require_text("asset name", &asset.name)?;

        let created: Asset = self
            .api
            .post(&format!("/api/spaces/{}/assets", space_id), &payload)
            .await?;
        self.changelog
            .record_quietly(
                property_id,
                EntityType::Asset,
                created.id,
                ChangeAction::Create,
                format!("Added asset '{}'", created.name),
            )
            .await;
        Ok(created)
    }

    #[tracing::instrument(skip(self, update))]
    pub async fn update_asset(
        &self,
        property_id: Uuid,
        asset_id: Uuid,
        update: &AssetUpdate,
    ) -> Result<Asset, ApiError> {
        let mut payload = update.clone();
        if let Some(name) = update.name.as_deref() {
            payload.name = Some(require_text("asset name", name)?);
        }

        let updated: Asset = self
            .api
            .put(&format!("/api/assets/{}", asset_id), &payload)
            .await?;
        self.changelog
            .record_quietly(
                property_id,
                EntityType::Asset,
                asset_id,
                ChangeAction::Update,
                format!("Updated asset '{}'", updated.name),
            )
            .await;
        Ok(updated)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_asset(&self, property_id: Uuid, asset_id: Uuid) -> Result<(), ApiError> {
        self.api.delete(&format!("/api/assets/{}", asset_id)).await?;
        self.changelog
            .record_quietly(
                property_id,
                EntityType::Asset,
                asset_id,
                ChangeAction::Delete,
                "Removed asset".to_string(),
            )
            .await;
        Ok(())
    }

    // ---- features --------------------------------------------------------

    #[tracing::instrument(skip(self))]
    pub async fn features(&self, property_id: Uuid) -> Result<Vec<Feature>, ApiError> {
        self.api
            .get(&format!("/api/properties/{}/features", property_id), &QueryParams::new())
            .await
    }

    #[tracing::instrument(skip(self, feature))]
    pub async fn add_feature(&self, property_id: Uuid, feature: &NewFeature) -> Result<Feature, ApiError> {
        let payload = NewFeature {
            name: require_text("feature name", &feature.name)?,
            value: feature
                .value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string),
        };

        let created: Feature = self
            .api
            .post(&format!("/api/properties/{}/features", property_id), &payload)
            .await?;
        self.changelog
            .record_quietly(
                property_id,
                EntityType::Feature,
                created.id,
                ChangeAction::Create,
                format!("Added feature '{}'", created.name),
            )
            .await;
        Ok(created)
    }

    #[tracing::instrument(skip(self))]
    pub async fn remove_feature(&self, property_id: Uuid, feature_id: Uuid) -> Result<(), ApiError> {
        self.api.delete(&format!("/api/features/{}", feature_id)).await?;
        self.changelog
            .record_quietly(
                property_id,
                EntityType::Feature,
                feature_id,
                ChangeAction::Delete,
                "Removed feature".to_string(),
            )
            .await;
        Ok(())
    }

    /// Point the property's splash reference at an image (or clear it)
    pub(crate) async fn put_splash(
        &self,
        property_id: Uuid,
        image_id: Option<Uuid>,
    ) -> Result<Property, ApiError> {
        self.api
            .put(
                &format!("/api/properties/{}/splash", property_id),
                &serde_json::json!({ "image_id": image_id }),
            )
            .await
    }
}
