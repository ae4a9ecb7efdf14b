//! Persisted per-file upload state.

use chrono::{DateTime, Utc};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Upload lifecycle status.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::EnumIter,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    /// Attempt started, outcome not yet committed
    #[display("pending")]
    Pending,
    /// Object verified present at the target
    #[display("uploaded")]
    Uploaded,
    /// Last attempt failed permanently
    #[display("failed")]
    Failed,
}

/// Durable record of one object key's migration.
///
/// `status == Uploaded` implies `target_url` is set. Transitions go through
/// [`UploadRecord::uploaded`] and [`UploadRecord::failed`], which keep that
/// invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct UploadRecord {
    /// Object key from the document URL
    object_key: String,
    /// Local file being uploaded
    source_path: PathBuf,
    /// Key of the object in the target store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target_key: Option<String>,
    /// Public URL, set only once uploaded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target_url: Option<String>,
    /// Current status
    status: UploadStatus,
    /// Total transfer attempts across runs
    #[serde(default)]
    attempts: u32,
    /// Last failure message, set only when failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_error: Option<String>,
    /// Time of the last transition
    updated_at: DateTime<Utc>,
}

impl UploadRecord {
    /// A fresh pending record.
    pub fn pending(object_key: impl Into<String>, source_path: impl Into<PathBuf>) -> Self {
        Self {
            object_key: object_key.into(),
            source_path: source_path.into(),
            target_key: None,
            target_url: None,
            status: UploadStatus::Pending,
            attempts: 0,
            last_error: None,
            updated_at: Utc::now(),
        }
    }

    /// Move back to pending for a new attempt, keeping the attempt history.
    pub fn restart(mut self, source_path: impl Into<PathBuf>) -> Self {
        self.source_path = source_path.into();
        self.status = UploadStatus::Pending;
        self.target_url = None;
        self.last_error = None;
        self.updated_at = Utc::now();
        self
    }

    /// Transition to uploaded.
    pub fn uploaded(
        mut self,
        target_key: impl Into<String>,
        target_url: impl Into<String>,
        attempts: u32,
    ) -> Self {
        self.target_key = Some(target_key.into());
        self.target_url = Some(target_url.into());
        self.status = UploadStatus::Uploaded;
        self.attempts += attempts;
        self.last_error = None;
        self.updated_at = Utc::now();
        self
    }

    /// Transition to failed.
    pub fn failed(mut self, error: impl Into<String>, attempts: u32) -> Self {
        self.target_url = None;
        self.status = UploadStatus::Failed;
        self.attempts += attempts;
        self.last_error = Some(error.into());
        self.updated_at = Utc::now();
        self
    }

    /// Record the planned target key before the transfer starts.
    pub fn with_target_key(mut self, target_key: impl Into<String>) -> Self {
        self.target_key = Some(target_key.into());
        self
    }

    /// Whether this record is committed as uploaded.
    pub fn is_uploaded(&self) -> bool {
        self.status == UploadStatus::Uploaded && self.target_url.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uploaded_sets_url_and_accumulates_attempts() {
        let record = UploadRecord::pending("photo.png", "/files/photo.png")
            .failed("HTTP 503", 3)
            .restart("/files/photo.png")
            .uploaded("photo.png", "https://pub.example/photo.png", 1);

        assert!(record.is_uploaded());
        assert_eq!(*record.attempts(), 4);
        assert!(record.last_error().is_none());
    }

    #[test]
    fn failed_clears_url() {
        let record = UploadRecord::pending("a.png", "/a.png")
            .uploaded("a.png", "https://pub.example/a.png", 1)
            .failed("gone", 1);
        assert_eq!(*record.status(), UploadStatus::Failed);
        assert!(record.target_url().is_none());
        assert!(!record.is_uploaded());
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&UploadStatus::Uploaded).unwrap();
        assert_eq!(json, "\"uploaded\"");
    }
}
