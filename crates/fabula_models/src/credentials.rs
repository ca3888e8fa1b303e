//! Credential validation and remote model listing.

use crate::{DefaultProviderFactory, ModelCategories, categorize_models};
use fabula_core::ProviderKind;
use fabula_error::{FabulaResult, ProviderError, ProviderErrorKind, ProviderResult};
use fabula_interface::ModelListing;
use serde::{Deserialize, Serialize};
use tracing::{error, instrument};

/// Result of validating an API key.
///
/// Serializes as `{"status":"ok"}` or `{"status":"error","message":"..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CredentialStatus {
    /// The key works
    Ok,
    /// The key was rejected or could not be checked
    Error {
        /// User-facing reason
        message: String,
    },
}

impl CredentialStatus {
    fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

async fn list_for(
    kind: ProviderKind,
    api_key: &str,
    factory: &DefaultProviderFactory,
) -> ProviderResult<Vec<String>> {
    match kind {
        ProviderKind::Groq | ProviderKind::OpenAi => match factory.hosted_client(kind, api_key) {
            Some(client) => client.list_models().await,
            None => Err(ProviderError::new(ProviderErrorKind::ProviderUnknown(
                kind.to_string(),
            ))),
        },
        ProviderKind::Gemini => factory.gemini(api_key).list_models().await,
        ProviderKind::Local | ProviderKind::VpsProxy => Ok(Vec::new()),
    }
}

fn rejection_message(err: &ProviderError) -> String {
    let text = err.to_string().to_lowercase();
    if matches!(err.kind, ProviderErrorKind::Unauthorized(_))
        || text.contains("401")
        || text.contains("invalid")
    {
        "Invalid API key.".to_string()
    } else {
        "Key validation failed. See logs for details.".to_string()
    }
}

/// Check that `api_key` works for `provider`.
///
/// Local models and the proxy need no key and always validate. Hosted
/// providers are checked by listing models; Gemini additionally needs at
/// least one model that supports content generation.
#[instrument(skip(api_key, factory))]
pub async fn validate_credentials(
    provider: &str,
    api_key: &str,
    factory: &DefaultProviderFactory,
) -> CredentialStatus {
    let kind = match ProviderKind::parse(provider) {
        Ok(kind) => kind,
        Err(e) => return CredentialStatus::error(e.kind.to_string()),
    };
    if !kind.requires_credential() {
        return CredentialStatus::Ok;
    }

    match list_for(kind, api_key, factory).await {
        Ok(models) if kind == ProviderKind::Gemini && models.is_empty() => {
            CredentialStatus::error("No models supporting content generation were found.")
        }
        Ok(_) => CredentialStatus::Ok,
        Err(e) => {
            error!(provider = %kind, "API key validation failed: {}", e);
            CredentialStatus::error(rejection_message(&e))
        }
    }
}

/// List and categorize the models `api_key` can use on `kind`.
///
/// # Errors
///
/// Returns the provider error when listing fails.
#[instrument(skip(api_key, factory))]
pub async fn list_remote_models(
    kind: ProviderKind,
    api_key: &str,
    factory: &DefaultProviderFactory,
) -> FabulaResult<ModelCategories> {
    let ids = list_for(kind, api_key, factory).await?;
    Ok(categorize_models(kind, ids))
}
