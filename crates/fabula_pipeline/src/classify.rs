//! Mapping of failures to user-facing categories and messages.

use fabula_error::{FabulaError, FabulaErrorKind, PipelineErrorKind, ProviderErrorKind};
use serde::Serialize;

/// User-facing failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorCategory {
    /// Credential rejected
    CredentialError,
    /// Too many requests
    RateLimitError,
    /// Plan or balance exhausted
    QuotaExceeded,
    /// Provider down or unreachable
    ProviderUnavailable,
    /// Model missing, deprecated or decommissioned
    ModelUnavailable,
    /// A stage produced nothing usable
    EmptyExtraction,
    /// Stage output could not be decoded
    MalformedOutput,
    /// Stage output lacks required structure
    StructureError,
    /// Provider name not recognized
    UnknownProvider,
    /// Local models not enabled
    LocalUnsupported,
    /// Anything else
    Unclassified,
}

enum Match {
    Any(&'static [&'static str]),
    All(&'static [&'static str]),
}

impl Match {
    fn matches(&self, text: &str) -> bool {
        match self {
            Self::Any(needles) => needles.iter().any(|n| text.contains(n)),
            Self::All(needles) => needles.iter().all(|n| text.contains(n)),
        }
    }
}

/// Keyword rules for free-text errors, checked in order.
const TEXT_RULES: &[(Match, ErrorCategory)] = &[
    (
        Match::Any(&["quota", "insufficient_quota"]),
        ErrorCategory::QuotaExceeded,
    ),
    (
        Match::Any(&["rate limit", "rate_limit", "too many requests"]),
        ErrorCategory::RateLimitError,
    ),
    (
        Match::Any(&["authentication", "invalid api key", "invalid_api_key", "401"]),
        ErrorCategory::CredentialError,
    ),
    (
        Match::Any(&[
            "model not found",
            "model_not_found",
            "modelnotfounderror",
            "deprecated",
            "decommissioned",
        ]),
        ErrorCategory::ModelUnavailable,
    ),
    (Match::All(&["404", "model"]), ErrorCategory::ModelUnavailable),
];

/// Classify an error message by keyword, case-insensitively.
///
/// # Examples
///
/// ```
/// use fabula_pipeline::{ErrorCategory, classify_text};
///
/// assert_eq!(
///     classify_text("Error code: 429 - You exceeded your current quota"),
///     ErrorCategory::QuotaExceeded
/// );
/// assert_eq!(classify_text("404 model gemma-7b is gone"), ErrorCategory::ModelUnavailable);
/// assert_eq!(classify_text("connection reset"), ErrorCategory::Unclassified);
/// ```
pub fn classify_text(text: &str) -> ErrorCategory {
    let lowered = text.to_lowercase();
    TEXT_RULES
        .iter()
        .find(|(rule, _)| rule.matches(&lowered))
        .map(|(_, category)| *category)
        .unwrap_or(ErrorCategory::Unclassified)
}

/// Classify an error, preferring its structured kind over its text.
pub fn classify(err: &FabulaError) -> ErrorCategory {
    match err.kind() {
        FabulaErrorKind::Provider(e) => match &e.kind {
            ProviderErrorKind::Unauthorized(_) => ErrorCategory::CredentialError,
            ProviderErrorKind::RateLimited(_) => ErrorCategory::RateLimitError,
            ProviderErrorKind::QuotaExceeded(_) => ErrorCategory::QuotaExceeded,
            ProviderErrorKind::Unavailable { .. } => ErrorCategory::ProviderUnavailable,
            ProviderErrorKind::ModelUnavailable(_) => ErrorCategory::ModelUnavailable,
            ProviderErrorKind::ProviderUnknown(_) => ErrorCategory::UnknownProvider,
            ProviderErrorKind::LocalUnsupported => ErrorCategory::LocalUnsupported,
            ProviderErrorKind::EmptyResponse => ErrorCategory::EmptyExtraction,
            other @ (ProviderErrorKind::InvalidRequest { .. }
            | ProviderErrorKind::Decode(_)
            | ProviderErrorKind::ClientCreation(_)) => classify_text(&other.to_string()),
        },
        FabulaErrorKind::Pipeline(e) => match &e.kind {
            PipelineErrorKind::EmptyExtraction(_) => ErrorCategory::EmptyExtraction,
            PipelineErrorKind::MalformedOutput { .. } => ErrorCategory::MalformedOutput,
            PipelineErrorKind::StructureError { .. } | PipelineErrorKind::UnreachableStart(_) => {
                ErrorCategory::StructureError
            }
            PipelineErrorKind::MissingState { .. } => ErrorCategory::Unclassified,
        },
        other => classify_text(&other.to_string()),
    }
}

/// The error's own description, without source location.
fn detail(err: &FabulaError) -> String {
    match err.kind() {
        FabulaErrorKind::Provider(e) => e.kind.to_string(),
        FabulaErrorKind::Pipeline(e) => e.kind.to_string(),
        FabulaErrorKind::Config(e) => e.kind.to_string(),
        other => other.to_string(),
    }
}

/// Render the message carried by a terminal `error` event.
///
/// # Examples
///
/// ```
/// use fabula_error::{FabulaError, ProviderError, ProviderErrorKind};
/// use fabula_pipeline::describe_failure;
///
/// let err: FabulaError = ProviderError::new(ProviderErrorKind::ModelUnavailable("gone".into())).into();
/// let message = describe_failure(&err, "groq", "gemma-7b-it");
/// assert!(message.contains("'gemma-7b-it'"));
/// assert!(message.contains("groq"));
/// ```
pub fn describe_failure(err: &FabulaError, provider: &str, model: &str) -> String {
    match classify(err) {
        ErrorCategory::QuotaExceeded => {
            "API usage limit exceeded or insufficient funds. Please check your plan or balance."
                .to_string()
        }
        ErrorCategory::RateLimitError => {
            "API request rate limit exceeded. Please try again later.".to_string()
        }
        ErrorCategory::CredentialError => "Invalid API key. Please check your key.".to_string(),
        ErrorCategory::ModelUnavailable => format!(
            "The selected model '{}' was not found, is unavailable or is deprecated at provider {}. Try another model.",
            model, provider
        ),
        ErrorCategory::ProviderUnavailable => format!(
            "The {} API is temporarily unavailable. Please try again later.",
            provider
        ),
        ErrorCategory::EmptyExtraction => {
            "The model returned nothing usable. Try changing the setting or choosing another model or provider."
                .to_string()
        }
        ErrorCategory::MalformedOutput | ErrorCategory::StructureError => {
            "The model could not produce a valid quest structure. Try changing the setting or choosing another model or provider."
                .to_string()
        }
        ErrorCategory::UnknownProvider => format!("Unknown API provider: {}", provider),
        ErrorCategory::LocalUnsupported => "Local model support is not enabled.".to_string(),
        ErrorCategory::Unclassified => format!(
            "An error occurred while calling the {} API: {}",
            provider,
            detail(err)
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabula_error::{ConfigError, ConfigErrorKind, PipelineError, ProviderError};

    fn provider_err(kind: ProviderErrorKind) -> FabulaError {
        ProviderError::new(kind).into()
    }

    #[test]
    fn test_text_rules_follow_priority() {
        assert_eq!(
            classify_text("Too many requests, rate limit exceeded"),
            ErrorCategory::RateLimitError
        );
        assert_eq!(
            classify_text("AuthenticationError: Invalid API key"),
            ErrorCategory::CredentialError
        );
        assert_eq!(
            classify_text("ModelNotFoundError: Model gemma-7b-it not found"),
            ErrorCategory::ModelUnavailable
        );
        assert_eq!(
            classify_text("404 Gemini 1.0 Pro Vision has been deprecated on July 12, 2024."),
            ErrorCategory::ModelUnavailable
        );
        // quota outranks the rate limit rule
        assert_eq!(
            classify_text("rate limit: insufficient_quota"),
            ErrorCategory::QuotaExceeded
        );
        assert_eq!(classify_text("404 page"), ErrorCategory::Unclassified);
    }

    #[test]
    fn test_structured_kinds() {
        assert_eq!(
            classify(&provider_err(ProviderErrorKind::Unauthorized("x".into()))),
            ErrorCategory::CredentialError
        );
        assert_eq!(
            classify(&provider_err(ProviderErrorKind::EmptyResponse)),
            ErrorCategory::EmptyExtraction
        );
        // structured kind wins even when the text would say otherwise
        assert_eq!(
            classify(&provider_err(ProviderErrorKind::RateLimited("quota".into()))),
            ErrorCategory::RateLimitError
        );
        assert_eq!(
            classify(&provider_err(ProviderErrorKind::InvalidRequest {
                status: 400,
                message: "model_not_found".into()
            })),
            ErrorCategory::ModelUnavailable
        );
        let unreachable: FabulaError =
            PipelineError::new(PipelineErrorKind::UnreachableStart("scene_1".into())).into();
        assert_eq!(classify(&unreachable), ErrorCategory::StructureError);
    }

    #[test]
    fn test_generic_message_carries_detail() {
        let err: FabulaError = 
            ConfigError::new(ConfigErrorKind::Invalid("Some unexpected API error occurred.".into())).into();
        let message = describe_failure(&err, "groq", "llama3-8b-8192");
        assert!(message.starts_with("An error occurred while calling the groq API: "));
        assert!(message.contains("Some unexpected API error occurred."));
    }

    #[test]
    fn test_specific_messages() {
        let err = provider_err(ProviderErrorKind::QuotaExceeded("429".into()));
        assert!(describe_failure(&err, "openai", "gpt-4o").contains("insufficient funds"));

        let err = provider_err(ProviderErrorKind::ProviderUnknown("foo".into()));
        assert_eq!(describe_failure(&err, "foo", "m"), "Unknown API provider: foo");
    }
}
