//! File catalog error types.

/// Kinds of catalog errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum CatalogErrorKind {
    /// Catalog root directory does not exist or is not a directory
    #[display("Catalog root is not a directory: {}", _0)]
    NotADirectory(String),
    /// Catalog root or one of its entries could not be read
    #[display("Failed to read catalog directory: {}", _0)]
    Unreadable(String),
    /// A decoration pattern failed to compile
    #[display("Invalid decoration pattern '{}': {}", pattern, message)]
    InvalidDecoration {
        /// The offending regular expression
        pattern: String,
        /// Compiler message
        message: String,
    },
}

/// Catalog error with location tracking.
///
/// # Examples
///
/// ```
/// use relink_error::{CatalogError, CatalogErrorKind};
///
/// let err = CatalogError::new(CatalogErrorKind::NotADirectory("/missing".to_string()));
/// assert!(format!("{}", err).contains("not a directory"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Catalog Error: {} at line {} in {}", kind, line, file)]
pub struct CatalogError {
    /// The kind of error that occurred
    pub kind: CatalogErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl CatalogError {
    /// Create a new catalog error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: CatalogErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
