//! Core data types for the Relink media migration engine.
//!
//! This crate provides the values passed between the engine components:
//! references found in the document, catalog entries, match outcomes,
//! persisted upload records and the final run summary.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod catalog;
mod location;
mod reference;
mod resolution;
mod summary;
mod upload;

pub use catalog::CatalogEntry;
pub use location::{JsonPath, PathSegment};
pub use reference::MediaReference;
pub use resolution::{MatchTier, ResolutionResult};
pub use summary::{FailedUpload, MigrationSummary};
pub use upload::{UploadRecord, UploadStatus};
