//! Durable per-file upload state.
//!
//! The checkpoint is the one shared mutable resource of a migration run. Every
//! upload worker reads and records through a single [`UploadCheckpoint`], which
//! serializes writes behind a mutex and persists the whole record set
//! atomically (temp file, fsync, rename), so a crash never leaves a torn file.
//!
//! # Example
//!
//! ```no_run
//! use relink_checkpoint::{CheckpointPolicy, UploadCheckpoint};
//! use relink_core::UploadRecord;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let checkpoint = UploadCheckpoint::load("migration_progress.json", CheckpointPolicy::EveryRecord)?;
//! checkpoint
//!     .record(UploadRecord::pending("photo.png", "/export/files/photo.png"))
//!     .await?;
//! assert!(checkpoint.get("photo.png").is_some());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod policy;
mod store;

pub use policy::CheckpointPolicy;
pub use store::{CheckpointCounts, UploadCheckpoint, CHECKPOINT_VERSION};
