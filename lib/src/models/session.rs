use serde::{Deserialize, Serialize};

/// Per-run import record. Written exactly once at the very end of a run,
/// including cancelled and partially failed runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSession {
    pub id: i64,
    pub file_name: String,
    /// Total entries parsed out of the archive
    pub total_bookmarks: i64,
    pub successful: i64,
    pub failed: i64,
    /// Includes in-file duplicates and invalid-URL skips
    pub skipped: i64,
    pub created_at: i64,
}
