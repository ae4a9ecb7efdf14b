//! Upload outcome error types.

/// Persistent upload failures.
///
/// Every variant is final for the current run: the record is marked Failed and
/// the reference is left pointing at its original URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum UploadErrorKind {
    /// Store rejected the request with a non-retryable error
    #[display("Upload rejected: {}", _0)]
    Rejected(String),
    /// Transient failures persisted past the retry budget
    #[display("Gave up after {} attempts: {}", attempts, message)]
    RetriesExhausted {
        /// Number of attempts made
        attempts: u32,
        /// Last error seen
        message: String,
    },
    /// Object was still absent after a successful PUT
    #[display("Upload not visible at target: {}", _0)]
    VerificationFailed(String),
    /// Local source file could not be read
    #[display("Failed to read source file: {}", _0)]
    SourceRead(String),
}

/// Upload error with location tracking.
///
/// # Examples
///
/// ```
/// use relink_error::{UploadError, UploadErrorKind};
///
/// let err = UploadError::new(UploadErrorKind::RetriesExhausted {
///     attempts: 4,
///     message: "HTTP 503".to_string(),
/// });
/// assert!(format!("{}", err).contains("4 attempts"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Upload Error: {} at line {} in {}", kind, line, file)]
pub struct UploadError {
    /// The kind of error that occurred
    pub kind: UploadErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl UploadError {
    /// Create a new upload error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: UploadErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
