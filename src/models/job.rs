use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::property::Asset;

/// A time-boxed grant of access to some of a property's assets, unlocked by PIN
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub property_id: Uuid,
    pub title: String,
    pub pin: String,
    #[serde(default)]
    pub asset_ids: Vec<Uuid>,
    pub contractor_name: Option<String>,
    pub notes: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Scheduled,
    Active,
    Expired,
    Revoked,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Scheduled => "scheduled",
            JobStatus::Active => "active",
            JobStatus::Expired => "expired",
            JobStatus::Revoked => "revoked",
        }
    }
}

impl Job {
    /// Status at `now`. Revocation wins over the time window.
    pub fn status(&self, now: DateTime<Utc>) -> JobStatus {
        if self.revoked_at.is_some() {
            JobStatus::Revoked
        } else if now < self.starts_at {
            JobStatus::Scheduled
        } else if now >= self.expires_at {
            JobStatus::Expired
        } else {
            JobStatus::Active
        }
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.status(now) == JobStatus::Active
    }
}

/// Wire payload for creating a job; the PIN is already chosen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewJob {
    pub property_id: Uuid,
    pub title: String,
    pub pin: String,
    pub asset_ids: Vec<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contractor_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// What a PIN holder gets to see
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobAccess {
    pub job: Job,
    pub property_name: String,
    #[serde(default)]
    pub assets: Vec<Asset>,
}
