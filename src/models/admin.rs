use serde::{Deserialize, Serialize};

/// Dashboard counters returned by the admin stats endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminStats {
    pub properties: u64,
    pub owners: u64,
    pub active_jobs: u64,
    pub pending_transfers: u64,
}
