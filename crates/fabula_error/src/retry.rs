//! Retry classification shared by provider errors.

/// Trait for errors that support retry logic.
///
/// Transient failures (rate limiting, HTTP 5xx, timeouts) return `true` from
/// [`is_retryable`](RetryableError::is_retryable); authentication, not-found and
/// validation failures return `false` and are surfaced immediately.
///
/// # Examples
///
/// ```
/// use fabula_error::{ProviderError, ProviderErrorKind, RetryableError};
///
/// let err = ProviderError::new(ProviderErrorKind::Unavailable {
///     status: Some(503),
///     message: "Service unavailable".to_string(),
/// });
/// assert!(err.is_retryable());
///
/// let err = ProviderError::new(ProviderErrorKind::Unauthorized("bad key".to_string()));
/// assert!(!err.is_retryable());
/// ```
pub trait RetryableError {
    /// Returns true if this error should trigger a retry.
    fn is_retryable(&self) -> bool;
}
