use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::EntityType;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub id: Uuid,
    pub entity_type: EntityType,
    pub entity_id: Uuid,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub checksum: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

/// The record an image is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageTarget {
    pub entity_type: EntityType,
    pub entity_id: Uuid,
}

impl ImageTarget {
    pub fn property(id: Uuid) -> Self {
        Self { entity_type: EntityType::Property, entity_id: id }
    }

    pub fn space(id: Uuid) -> Self {
        Self { entity_type: EntityType::Space, entity_id: id }
    }

    pub fn asset(id: Uuid) -> Self {
        Self { entity_type: EntityType::Asset, entity_id: id }
    }
}
