//! Provider error types and HTTP status classification.

use crate::RetryableError;

/// Specific error conditions raised while talking to an LLM provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ProviderErrorKind {
    /// Credential rejected by the provider (HTTP 401/403)
    #[display("Authentication failed (401): {}", _0)]
    Unauthorized(String),
    /// Provider asked us to slow down (HTTP 429)
    #[display("Rate limit exceeded: {}", _0)]
    RateLimited(String),
    /// Account quota or balance exhausted
    #[display("Insufficient quota: {}", _0)]
    QuotaExceeded(String),
    /// Provider temporarily unavailable (HTTP 408/5xx, connect or timeout failure)
    #[display("Provider unavailable: {}", message)]
    Unavailable {
        /// HTTP status code, when one was received
        status: Option<u16>,
        /// Error message
        message: String,
    },
    /// Requested model is unknown, deprecated, or missing on disk
    #[display("Model not found: {}", _0)]
    ModelUnavailable(String),
    /// Provider name does not match any known provider
    #[display("Unknown API provider: {}", _0)]
    ProviderUnknown(String),
    /// Local model support is not enabled in this process
    #[display("Local model support is not enabled")]
    LocalUnsupported,
    /// Provider returned no content
    #[display("Provider returned an empty response")]
    EmptyResponse,
    /// Request rejected for a non-transient reason (other 4xx)
    #[display("Request rejected (status {}): {}", status, message)]
    InvalidRequest {
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },
    /// Response body could not be decoded
    #[display("Failed to decode provider response: {}", _0)]
    Decode(String),
    /// Client construction failed
    #[display("Failed to create provider client: {}", _0)]
    ClientCreation(String),
}

impl ProviderErrorKind {
    /// Classify a non-success HTTP status and its response body.
    ///
    /// # Examples
    ///
    /// ```
    /// use fabula_error::ProviderErrorKind;
    ///
    /// let kind = ProviderErrorKind::from_status(429, r#"{"error":{"code":"insufficient_quota"}}"#);
    /// assert!(matches!(kind, ProviderErrorKind::QuotaExceeded(_)));
    ///
    /// let kind = ProviderErrorKind::from_status(502, "bad gateway");
    /// assert!(matches!(kind, ProviderErrorKind::Unavailable { status: Some(502), .. }));
    /// ```
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let message = body.into();
        let lowered = message.to_lowercase();
        match status {
            401 | 403 => Self::Unauthorized(message),
            429 if lowered.contains("quota") => Self::QuotaExceeded(message),
            429 => Self::RateLimited(message),
            404 => Self::ModelUnavailable(message),
            400 if lowered.contains("model_not_found")
                || lowered.contains("decommissioned")
                || lowered.contains("does not exist") =>
            {
                Self::ModelUnavailable(message)
            }
            408 | 500..=599 => Self::Unavailable {
                status: Some(status),
                message,
            },
            _ => Self::InvalidRequest { status, message },
        }
    }

    /// Check if this error type should be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited(_) | Self::Unavailable { .. })
    }
}

/// Provider error with source location tracking.
///
/// # Examples
///
/// ```
/// use fabula_error::{ProviderError, ProviderErrorKind};
///
/// let err = ProviderError::new(ProviderErrorKind::ProviderUnknown("foo".to_string()));
/// assert!(format!("{}", err).contains("Unknown API provider: foo"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Provider Error: {} at line {} in {}", kind, line, file)]
pub struct ProviderError {
    /// The kind of error that occurred
    pub kind: ProviderErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ProviderError {
    /// Create a new ProviderError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ProviderErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

impl RetryableError for ProviderError {
    fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

/// Result type for provider calls.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            ProviderErrorKind::from_status(401, "nope"),
            ProviderErrorKind::Unauthorized(_)
        ));
        assert!(matches!(
            ProviderErrorKind::from_status(403, "nope"),
            ProviderErrorKind::Unauthorized(_)
        ));
        assert!(matches!(
            ProviderErrorKind::from_status(429, "slow down"),
            ProviderErrorKind::RateLimited(_)
        ));
        assert!(matches!(
            ProviderErrorKind::from_status(404, "no such model"),
            ProviderErrorKind::ModelUnavailable(_)
        ));
        assert!(matches!(
            ProviderErrorKind::from_status(400, "The model `x` has been decommissioned"),
            ProviderErrorKind::ModelUnavailable(_)
        ));
        assert!(matches!(
            ProviderErrorKind::from_status(400, "missing field"),
            ProviderErrorKind::InvalidRequest { status: 400, .. }
        ));
        assert!(matches!(
            ProviderErrorKind::from_status(408, "timeout"),
            ProviderErrorKind::Unavailable { status: Some(408), .. }
        ));
    }

    #[test]
    fn test_only_transient_kinds_retry() {
        assert!(ProviderErrorKind::RateLimited(String::new()).is_retryable());
        assert!(
            ProviderErrorKind::Unavailable {
                status: None,
                message: String::new()
            }
            .is_retryable()
        );
        assert!(!ProviderErrorKind::QuotaExceeded(String::new()).is_retryable());
        assert!(!ProviderErrorKind::EmptyResponse.is_retryable());
        assert!(!ProviderErrorKind::LocalUnsupported.is_retryable());
        assert!(!ProviderErrorKind::ModelUnavailable(String::new()).is_retryable());
    }
}
