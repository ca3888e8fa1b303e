//! Trait definitions for LLM providers and their capabilities.

use crate::ChatRequest;
use async_trait::async_trait;
use fabula_core::ProviderKind;
use fabula_error::ProviderResult;
use std::sync::Arc;

/// Core trait that all LLM providers implement.
///
/// Adding a provider means adding an implementation of this trait, not
/// touching the call sites that consume it.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Complete one prompt, returning the raw response text.
    async fn complete_chat(&self, request: &ChatRequest) -> ProviderResult<String>;

    /// Provider name (e.g., "groq", "gemini").
    fn provider_name(&self) -> &'static str;
}

/// Providers that can enumerate the models available to a credential.
#[async_trait]
pub trait ModelListing: ChatProvider {
    /// List model identifiers usable for text generation.
    async fn list_models(&self) -> ProviderResult<Vec<String>>;
}

/// Builds providers for a generation run.
pub trait ProviderFactory: Send + Sync {
    /// Create a provider for `kind` authenticated with `api_key`.
    ///
    /// # Errors
    ///
    /// Fails with `LocalUnsupported` when the local capability is disabled,
    /// or `ClientCreation` when the client cannot be constructed.
    fn create(&self, kind: ProviderKind, api_key: &str) -> ProviderResult<Arc<dyn ChatProvider>>;
}
