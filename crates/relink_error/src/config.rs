//! Configuration error types.

use std::fmt;

/// Configuration that could not be loaded or is incomplete.
#[derive(Debug, Clone, derive_more::Error)]
pub struct ConfigError {
    /// Problems found, one per missing or invalid setting
    pub problems: Vec<String>,
    /// Line number where the error was raised
    pub line: u32,
    /// File where the error was raised
    pub file: &'static str,
}

impl ConfigError {
    /// A single problem.
    ///
    /// # Examples
    ///
    /// ```
    /// use relink_error::ConfigError;
    ///
    /// let err = ConfigError::new("target.bucket is required");
    /// assert_eq!(err.problems, ["target.bucket is required"]);
    /// ```
    #[track_caller]
    pub fn new(problem: impl Into<String>) -> Self {
        Self::invalid(vec![problem.into()])
    }

    /// Several problems found by one validation pass.
    ///
    /// # Examples
    ///
    /// ```
    /// use relink_error::ConfigError;
    ///
    /// let err = ConfigError::invalid(vec![
    ///     "paths.document is required".to_string(),
    ///     "target.token is required".to_string(),
    /// ]);
    /// assert!(err.to_string().contains("paths.document is required; target.token"));
    /// ```
    #[track_caller]
    pub fn invalid(problems: Vec<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            problems,
            line: location.line(),
            file: location.file(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Configuration Error: {} at line {} in {}",
            self.problems.join("; "),
            self.line,
            self.file
        )
    }
}
