//! Roam export media migration.
//!
//! Rewrites the encrypted Firebase media links of a Roam Research JSON export
//! to public URLs of files uploaded from the export's media folder:
//!
//! 1. Index the media folder ([`relink_catalog::FileCatalog`])
//! 2. Find every source URL in the document ([`relink_document::DocumentWalker`])
//! 3. Resolve each distinct object key to a local file ([`relink_catalog::Matcher`])
//! 4. Upload each resolved file once ([`relink_storage::Uploader`]), recording
//!    progress in a checkpoint ([`relink_checkpoint::UploadCheckpoint`])
//! 5. Rewrite the uploaded URLs and write a new document
//!
//! [`MigrationOrchestrator`] runs the whole pipeline from a
//! [`MigrationConfig`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod migration;
mod report;

pub use config::{
    CheckpointPolicyConfig, MatcherConfig, MigrationConfig, NamingConfig, NamingModeConfig,
    PathsConfig, RetryConfig, TargetConfig, DEFAULT_CHECKPOINT_NAME,
};
pub use migration::{
    InterruptFlag, MigrationOrchestrator, MigrationPlan, MigrationState,
};
pub use report::{log_summary, render_summary, write_summary};

pub use relink_catalog::{CatalogOptions, DecorationRules, FileCatalog, Matcher};
pub use relink_checkpoint::{CheckpointCounts, CheckpointPolicy, UploadCheckpoint};
pub use relink_core::{
    CatalogEntry, FailedUpload, MatchTier, MediaReference, MigrationSummary, ResolutionResult,
    UploadRecord, UploadStatus,
};
pub use relink_document::{Document, OutputFormat, SourceSignature, UrlPattern};
pub use relink_error::{
    MigrationError, MigrationErrorKind, RelinkError, RelinkErrorKind, RelinkResult,
};
pub use relink_storage::{
    FileSystemStore, HttpObjectStore, MemoryStore, NamingMode, ObjectStore, RetryPolicy,
    ScriptedFailure,
};
