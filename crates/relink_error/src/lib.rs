//! Error types for the Relink media migration engine.
//!
//! This crate provides the foundation error types used throughout the Relink workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! Per-reference problems (ambiguous or unresolved matches) are not errors; they
//! are ordinary resolution outcomes. [`StoreError`] and [`UploadError`] are
//! per-file and end up in the run summary; every other error is fatal to a
//! migration run (see [`RelinkError::is_fatal`]).
//!
//! # Examples
//!
//! ```
//! use relink_error::{IoError, RelinkResult};
//!
//! fn read_export() -> RelinkResult<String> {
//!     Err(IoError::new("backup.json: permission denied"))?
//! }
//!
//! assert!(read_export().is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod catalog;
mod checkpoint;
mod config;
mod document;
mod error;
mod io;
mod json;
mod migration;
mod retry;
mod store;
mod upload;

pub use catalog::{CatalogError, CatalogErrorKind};
pub use checkpoint::{CheckpointError, CheckpointErrorKind};
pub use config::ConfigError;
pub use document::{DocumentError, DocumentErrorKind};
pub use error::{RelinkError, RelinkErrorKind, RelinkResult};
pub use io::IoError;
pub use json::JsonError;
pub use migration::{MigrationError, MigrationErrorKind};
pub use retry::RetryableError;
pub use store::{StoreError, StoreErrorKind};
pub use upload::{UploadError, UploadErrorKind};
