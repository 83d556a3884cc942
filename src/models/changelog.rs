use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{ChangeAction, EntityType};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeLogEntry {
    pub id: Uuid,
    pub property_id: Uuid,
    pub entity_type: EntityType,
    pub entity_id: Uuid,
    pub action: ChangeAction,
    pub description: String,
    pub actor_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewChangeLogEntry {
    pub property_id: Uuid,
    pub entity_type: EntityType,
    pub entity_id: Uuid,
    pub action: ChangeAction,
    pub description: String,
}
