//! Run summary.

use serde::{Deserialize, Serialize};

/// A distinct object key whose upload failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedUpload {
    /// Object key from the document URL
    pub object_key: String,
    /// Failure message recorded in the checkpoint
    pub error: String,
}

/// Counts and follow-up lists produced by a migration run.
///
/// Counts come in three units:
///
/// - occurrences: `references` and `links_rewritten`, one per URL in the
///   document text
/// - distinct object keys: `distinct_keys`, `resolved`, `ambiguous` and
///   `unresolved`, plus every follow-up list
/// - local files: `uploaded`, `already_present` and `failed`; several keys
///   that resolve to one file count once
///
/// So `resolved` can exceed `uploaded + already_present + failed`, and
/// `failed_uploads` can list more entries than `failed`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationSummary {
    /// URL occurrences found in the document
    pub references: usize,
    /// Distinct object keys among them
    pub distinct_keys: usize,
    /// Keys resolved to a single local file
    pub resolved: usize,
    /// Keys matching more than one local file
    pub ambiguous: usize,
    /// Keys matching no local file
    pub unresolved: usize,
    /// Files transferred during this run
    pub uploaded: usize,
    /// Files not transferred because the checkpoint or the target already
    /// had them
    pub already_present: usize,
    /// Files whose upload failed
    pub failed: usize,
    /// URL occurrences replaced in the output document
    pub links_rewritten: usize,
    /// Unresolved keys, for operator follow-up
    pub unresolved_keys: Vec<String>,
    /// Ambiguous keys, for operator follow-up
    pub ambiguous_keys: Vec<String>,
    /// One entry per key of every failed file, with the file's last error
    pub failed_uploads: Vec<FailedUpload>,
}

impl MigrationSummary {
    /// Whether every reference was migrated.
    pub fn is_complete(&self) -> bool {
        self.ambiguous == 0 && self.unresolved == 0 && self.failed == 0
    }
}
