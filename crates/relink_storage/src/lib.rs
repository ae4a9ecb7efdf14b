//! Target object stores and the uploader for Relink.
//!
//! This crate provides the [`ObjectStore`] abstraction over the migration
//! target together with three backends, and the [`Uploader`] that moves one
//! resolved local file to the target with retry, verification and checkpoint
//! bookkeeping.
//!
//! # Backends
//!
//! - [`HttpObjectStore`]: Cloudflare R2 REST API or any bearer-token endpoint
//! - [`FileSystemStore`]: a local directory, for offline rehearsal
//! - [`MemoryStore`]: in-process store with scripted failures, for tests
//!
//! # Example
//!
//! ```rust
//! use relink_storage::{MemoryStore, ObjectStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryStore::new();
//! store.put_object("photo.png", b"png bytes", "image/png").await?;
//! assert!(store.head_object("photo.png").await?);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod content_type;
mod filesystem;
mod http;
mod memory;
mod naming;
mod uploader;

pub use content_type::{content_type_for, MediaKind};
pub use filesystem::FileSystemStore;
pub use http::HttpObjectStore;
pub use memory::{MemoryStore, ScriptedFailure};
pub use naming::{clean_filename, content_hash_name, numbered_key, public_url, NamingMode};
pub use uploader::{RetryPolicy, UploadJob, UploadOutcome, UploadReport, Uploader};

use relink_error::StoreError;

/// Result type for object store calls.
///
/// Store calls keep the concrete [`StoreError`] so callers can inspect the
/// kind for retry decisions.
pub type StoreResult<T> = Result<T, StoreError>;

/// Trait for migration target backends.
///
/// Keys are flat object names (no bucket prefix). Implementations must be
/// safe to call from concurrent upload workers.
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `data` under `key`, replacing any existing object.
    async fn put_object(&self, key: &str, data: &[u8], content_type: &str) -> StoreResult<()>;

    /// Check whether an object exists under `key`.
    async fn head_object(&self, key: &str) -> StoreResult<bool>;

    /// Preflight check that credentials and bucket are usable.
    ///
    /// The default implementation accepts everything.
    async fn verify_access(&self) -> StoreResult<()> {
        Ok(())
    }

    /// Short backend name for logs.
    fn backend_name(&self) -> &'static str;
}
