//! JSON output error types.

/// A summary, plan or status could not be rendered as JSON.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("JSON Error: failed to serialize {}: {} at line {} in {}", subject, message, line, file)]
pub struct JsonError {
    /// What was being serialized
    pub subject: String,
    /// Message from the serializer
    pub message: String,
    /// Line number where the error was raised
    pub line: u32,
    /// File where the error was raised
    pub file: &'static str,
}

impl JsonError {
    /// Serialization of `subject` failed with `message`.
    ///
    /// # Examples
    ///
    /// ```
    /// use relink_error::JsonError;
    ///
    /// let err = JsonError::new("summary", "key must be a string");
    /// assert!(err.to_string().contains("failed to serialize summary"));
    /// ```
    #[track_caller]
    pub fn new(subject: impl Into<String>, message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            subject: subject.into(),
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
