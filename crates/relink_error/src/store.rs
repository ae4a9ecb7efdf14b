//! Object store error types.

use crate::RetryableError;

/// Kinds of object store errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum StoreErrorKind {
    /// Request timed out
    #[display("Request timed out: {}", _0)]
    Timeout(String),
    /// Connection could not be established or was reset
    #[display("Connection failed: {}", _0)]
    Connection(String),
    /// Store answered with a non-success HTTP status
    #[display("HTTP {} error: {}", status_code, message)]
    Status {
        /// HTTP status code
        status_code: u16,
        /// Response body excerpt
        message: String,
    },
    /// Credentials were rejected
    #[display("Permission denied: {}", _0)]
    PermissionDenied(String),
    /// Failed to write an object (filesystem backends)
    #[display("Failed to write object: {}", _0)]
    Write(String),
    /// Store client could not be configured
    #[display("Invalid store configuration: {}", _0)]
    InvalidConfig(String),
}

impl StoreErrorKind {
    /// Check if this error type should be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            StoreErrorKind::Status { status_code, .. } => {
                matches!(*status_code, 408 | 429 | 500..=599)
            }
            StoreErrorKind::Timeout(_) => true,
            StoreErrorKind::Connection(_) => true,
            _ => false,
        }
    }

    /// Get retry strategy parameters for this error type.
    ///
    /// Returns `(initial_backoff_ms, max_retries, max_delay_secs)`.
    pub fn retry_strategy_params(&self) -> (u64, usize, u64) {
        match self {
            StoreErrorKind::Status { status_code, .. } => match *status_code {
                429 => (5000, 3, 40),
                503 => (2000, 5, 60),
                500 | 502 | 504 => (1000, 3, 8),
                408 => (2000, 4, 30),
                _ => (1000, 3, 30),
            },
            StoreErrorKind::Timeout(_) => (2000, 3, 30),
            StoreErrorKind::Connection(_) => (1000, 3, 10),
            _ => (1000, 3, 30),
        }
    }
}

/// Object store error with location tracking.
///
/// # Examples
///
/// ```
/// use relink_error::{StoreError, StoreErrorKind};
///
/// let err = StoreError::new(StoreErrorKind::PermissionDenied("bad token".to_string()));
/// assert!(format!("{}", err).contains("Permission denied"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Store Error: {} at line {} in {}", kind, line, file)]
pub struct StoreError {
    /// The kind of error that occurred
    pub kind: StoreErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl StoreError {
    /// Create a new store error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StoreErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

impl RetryableError for StoreError {
    fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    fn retry_strategy_params(&self) -> (u64, usize, u64) {
        self.kind.retry_strategy_params()
    }
}
