//! Single-prompt invocation with retry and output normalization.

use crate::unwrap_fenced;
use fabula_error::{ProviderError, ProviderErrorKind, ProviderResult};
use fabula_interface::{ChatProvider, ChatRequest};
use fabula_rate_limit::RetryPolicy;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Sends one prompt to one provider.
///
/// Transient failures are retried according to the [`RetryPolicy`]; blank
/// responses fail with `EmptyResponse`; a fenced block in the response is
/// unwrapped so callers only ever see the payload.
#[derive(Clone)]
pub struct LlmInvoker {
    provider: Arc<dyn ChatProvider>,
    retry: RetryPolicy,
    temperature: Option<f32>,
}

impl std::fmt::Debug for LlmInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmInvoker")
            .field("provider", &self.provider.provider_name())
            .field("retry", &self.retry)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl LlmInvoker {
    /// Wrap `provider` with `retry`.
    pub fn new(provider: Arc<dyn ChatProvider>, retry: RetryPolicy) -> Self {
        Self {
            provider,
            retry,
            temperature: None,
        }
    }

    /// Sampling temperature sent with every request.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Name of the wrapped provider.
    pub fn provider_name(&self) -> &'static str {
        self.provider.provider_name()
    }

    /// Send `prompt` to `model` and return the normalized payload.
    ///
    /// # Errors
    ///
    /// Returns the provider's error once retries are exhausted or on the
    /// first non-transient failure, and `EmptyResponse` for blank output.
    #[instrument(
        skip(self, prompt),
        fields(provider = self.provider.provider_name(), prompt_len = prompt.len())
    )]
    pub async fn invoke(
        &self,
        prompt: &str,
        model: &str,
        structured: bool,
    ) -> ProviderResult<String> {
        let mut builder = ChatRequest::builder();
        builder.prompt(prompt).model(model).structured(structured);
        if let Some(temperature) = self.temperature {
            builder.temperature(temperature);
        }
        let request = builder.build().map_err(|e| {
            ProviderError::new(ProviderErrorKind::ClientCreation(e.to_string()))
        })?;

        let raw = self
            .retry
            .execute(|| self.provider.complete_chat(&request))
            .await?;

        let payload = unwrap_fenced(&raw);
        if payload.trim().is_empty() {
            return Err(ProviderError::new(ProviderErrorKind::EmptyResponse));
        }

        debug!(raw_len = raw.len(), payload_len = payload.len(), "Response normalized");
        Ok(payload.to_string())
    }
}
