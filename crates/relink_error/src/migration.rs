//! Migration run error types.

/// Conditions that abort a migration run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum MigrationErrorKind {
    /// User interrupted the run; in-flight uploads were drained and the checkpoint flushed
    #[display("Migration interrupted after {} completed uploads", _0)]
    Interrupted(usize),
    /// Preflight check against the target store failed
    #[display("Target store preflight failed: {}", _0)]
    Preflight(String),
    /// Output path would overwrite the input document
    #[display("Refusing to overwrite input document: {}", _0)]
    OutputIsInput(String),
}

/// Migration error with location tracking.
///
/// # Examples
///
/// ```
/// use relink_error::{MigrationError, MigrationErrorKind};
///
/// let err = MigrationError::new(MigrationErrorKind::Interrupted(12));
/// assert!(format!("{}", err).contains("12 completed"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Migration Error: {} at line {} in {}", kind, line, file)]
pub struct MigrationError {
    /// The kind of error that occurred
    pub kind: MigrationErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl MigrationError {
    /// Create a new migration error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: MigrationErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
