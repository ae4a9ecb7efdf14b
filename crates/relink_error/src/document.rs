//! Document load/rewrite/save error types.

/// Kinds of document errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum DocumentErrorKind {
    /// Input document could not be read
    #[display("Failed to read document: {}", _0)]
    Read(String),
    /// Input document is not valid JSON
    #[display("Failed to parse document: {}", _0)]
    Parse(String),
    /// Rewritten document could not be serialized
    #[display("Failed to serialize document: {}", _0)]
    Serialize(String),
    /// Rewritten document could not be written to the output path
    #[display("Failed to write document: {}", _0)]
    Write(String),
    /// A recorded location no longer points at a string value
    #[display("Stale reference location: {}", _0)]
    StaleLocation(String),
    /// The URL signature could not be compiled into a pattern
    #[display("Invalid URL signature: {}", _0)]
    InvalidSignature(String),
}

/// Document error with location tracking.
///
/// # Examples
///
/// ```
/// use relink_error::{DocumentError, DocumentErrorKind};
///
/// let err = DocumentError::new(DocumentErrorKind::Write("disk full".to_string()));
/// assert!(format!("{}", err).contains("disk full"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Document Error: {} at line {} in {}", kind, line, file)]
pub struct DocumentError {
    /// The kind of error that occurred
    pub kind: DocumentErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl DocumentError {
    /// Create a new document error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: DocumentErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
