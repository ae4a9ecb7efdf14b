//! Checkpoint store error types.

/// Kinds of checkpoint errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum CheckpointErrorKind {
    /// Failed to read the checkpoint file
    #[display("Failed to read checkpoint: {}", _0)]
    Read(String),
    /// Failed to write or flush the checkpoint file
    #[display("Failed to write checkpoint: {}", _0)]
    Write(String),
    /// Checkpoint file exists but is not valid JSON for the record schema
    #[display("Corrupt checkpoint: {}", _0)]
    Corrupt(String),
    /// Checkpoint was written by a newer schema version
    #[display("Unsupported checkpoint version {} (supported: {})", found, supported)]
    UnsupportedVersion {
        /// Version found in the file
        found: u32,
        /// Highest version this build understands
        supported: u32,
    },
}

/// Checkpoint error with location tracking.
///
/// # Examples
///
/// ```
/// use relink_error::{CheckpointError, CheckpointErrorKind};
///
/// let err = CheckpointError::new(CheckpointErrorKind::UnsupportedVersion {
///     found: 9,
///     supported: 1,
/// });
/// assert!(format!("{}", err).contains("version 9"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Checkpoint Error: {} at line {} in {}", kind, line, file)]
pub struct CheckpointError {
    /// The kind of error that occurred
    pub kind: CheckpointErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl CheckpointError {
    /// Create a new checkpoint error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: CheckpointErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
