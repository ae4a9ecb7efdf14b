//! Retry classification for object store calls.

/// An error that may go away if the same request is sent again.
///
/// The uploader asks the first failure of a call whether to retry and how:
/// a rate limit backs off longer than a dropped connection.
///
/// # Examples
///
/// ```
/// use relink_error::{RetryableError, StoreError, StoreErrorKind};
///
/// let err = StoreError::new(StoreErrorKind::Status {
///     status_code: 503,
///     message: "Service unavailable".to_string(),
/// });
///
/// assert!(err.is_retryable());
/// let (backoff, retries, _max_delay) = err.retry_strategy_params();
/// assert_eq!(backoff, 2000);
/// assert_eq!(retries, 5);
/// ```
pub trait RetryableError {
    /// Whether resending can succeed: timeouts, resets, 408, 429 and 5xx.
    /// Rejected credentials and client errors never can.
    fn is_retryable(&self) -> bool;

    /// `(initial_backoff_ms, max_retries, max_delay_secs)` for this failure.
    fn retry_strategy_params(&self) -> (u64, usize, u64) {
        (1000, 3, 30)
    }
}
