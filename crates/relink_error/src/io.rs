//! Filesystem error types.

/// Filesystem error with source location.
///
/// Raised when the input document or the catalog root cannot be read.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("IO Error: {} at line {} in {}", message, line, file)]
pub struct IoError {
    /// The underlying error message
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl IoError {
    /// Create a new IoError with the given message at the current location.
    ///
    /// # Examples
    ///
    /// ```
    /// use relink_error::IoError;
    ///
    /// let err = IoError::new("No such file or directory");
    /// assert!(err.message.contains("No such file"));
    /// ```
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}

impl From<std::io::Error> for IoError {
    #[track_caller]
    fn from(err: std::io::Error) -> Self {
        Self::new(err.to_string())
    }
}
