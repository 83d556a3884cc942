use uuid::Uuid;

use crate::api::{ApiClient, QueryParams};
use crate::error::ApiError;
use crate::models::{ChangeLogEntry, NewChangeLogEntry};
use crate::types::{ChangeAction, EntityType};

#[derive(Clone)]
pub struct ChangeLogService {
    api: ApiClient,
}

impl ChangeLogService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    #[tracing::instrument(skip(self))]
    pub async fn list(
        &self,
        property_id: Uuid,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<Vec<ChangeLogEntry>, ApiError> {
        let query = QueryParams::new()
            .with_opt("limit", limit)
            .with_opt("offset", offset);
        self.api
            .get(&format!("/api/properties/{}/changelog", property_id), &query)
            .await
    }

    #[tracing::instrument(skip(self, entry), fields(property_id = %entry.property_id, action = %entry.action))]
    pub async fn record(&self, entry: &NewChangeLogEntry) -> Result<ChangeLogEntry, ApiError> {
        self.api.post("/api/changelog", entry).await
    }

    /// Record a change without letting a failure leak into the caller's result
    pub(crate) async fn record_quietly(
        &self,
        property_id: Uuid,
        entity_type: EntityType,
        entity_id: Uuid,
        action: ChangeAction,
        description: String,
    ) {
        let entry = NewChangeLogEntry {
            property_id,
            entity_type,
            entity_id,
            action,
            description,
        };
        if let Err(e) = self.record(&entry).await {
            tracing::warn!(%property_id, %entity_type, %action, "failed to record change: {}", e);
        }
    }
}
