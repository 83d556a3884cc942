use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    Pending,
    Accepted,
    Rejected,
    Cancelled,
    /// Never sent by the backend; derived for pending transfers past their deadline
    Expired,
}

impl TransferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Pending => "pending",
            TransferStatus::Accepted => "accepted",
            TransferStatus::Rejected => "rejected",
            TransferStatus::Cancelled => "cancelled",
            TransferStatus::Expired => "expired",
        }
    }
}

/// Which side of a transfer the current user is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferDirection {
    Incoming,
    Outgoing,
}

impl TransferDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferDirection::Incoming => "incoming",
            TransferDirection::Outgoing => "outgoing",
        }
    }
}

/// Ownership hand-over of a property from its current owner to someone else
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transfer {
    pub id: Uuid,
    pub property_id: Uuid,
    pub from_user_id: Uuid,
    pub recipient_email: String,
    pub message: Option<String>,
    pub status: TransferStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Transfer {
    pub fn effective_status(&self, now: DateTime<Utc>) -> TransferStatus {
        match self.status {
            TransferStatus::Pending if now >= self.expires_at => TransferStatus::Expired,
            status => status,
        }
    }

    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.effective_status(now) == TransferStatus::Pending
    }

    pub fn is_recipient(&self, email: &str) -> bool {
        self.recipient_email.eq_ignore_ascii_case(email.trim())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransfer {
    pub property_id: Uuid,
    pub recipient_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
