use serde::{Deserialize, Serialize};

use crate::model::badge::Badge;
use crate::model::progress::ProgressRecord;
use crate::model::role::Role;

/// Durable serialized form of the tracker state.
///
/// Persisted wholesale under a single storage key and restored on startup.
/// Timestamps round-trip through RFC 3339 so the recent-activity ordering
/// survives a cold start.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub progress: Vec<ProgressRecord>,
    #[serde(default)]
    pub badges: Vec<Badge>,
    #[serde(default)]
    pub current_role: Option<Role>,
}
