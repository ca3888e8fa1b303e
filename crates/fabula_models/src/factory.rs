//! Provider construction from configuration.

use crate::{GeminiProvider, LocalProvider, OpenAiCompatibleClient, VpsProxyClient};
use fabula_core::ProviderKind;
use fabula_error::{ProviderError, ProviderErrorKind, ProviderResult};
use fabula_interface::{ChatProvider, ProviderFactory};
use fabula_rate_limit::{LocalConfig, ProvidersConfig};
use std::sync::Arc;
use tracing::debug;

/// Builds real providers from endpoint configuration.
///
/// The local-model capability is resolved once, when the factory is built;
/// asking for a `local` provider while it is disabled fails fast with
/// `LocalUnsupported`.
///
/// # Example
///
/// ```no_run
/// use fabula_core::ProviderKind;
/// use fabula_interface::ProviderFactory;
/// use fabula_models::DefaultProviderFactory;
/// use fabula_rate_limit::FabulaConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = FabulaConfig::load()?;
/// let factory = DefaultProviderFactory::new(&config.providers, &config.local);
/// let provider = factory.create(ProviderKind::Groq, "gsk_...")?;
/// assert_eq!(provider.provider_name(), "groq");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DefaultProviderFactory {
    providers: ProvidersConfig,
    local: LocalConfig,
    http: reqwest::Client,
}

impl DefaultProviderFactory {
    /// Create a factory sharing one HTTP connection pool across providers.
    pub fn new(providers: &ProvidersConfig, local: &LocalConfig) -> Self {
        Self {
            providers: providers.clone(),
            local: local.clone(),
            http: reqwest::Client::new(),
        }
    }

    /// Build a concrete Groq/OpenAI client, used by model listing as well.
    pub(crate) fn hosted_client(
        &self,
        kind: ProviderKind,
        api_key: &str,
    ) -> Option<OpenAiCompatibleClient> {
        let (name, endpoint) = match kind {
            ProviderKind::Groq => ("groq", &self.providers.groq),
            ProviderKind::OpenAi => ("openai", &self.providers.openai),
            _ => return None,
        };
        Some(OpenAiCompatibleClient::new(
            name,
            endpoint.base_url.clone(),
            Some(api_key.to_string()),
            self.http.clone(),
        ))
    }

    /// Build a concrete Gemini provider, used by model listing as well.
    pub(crate) fn gemini(&self, api_key: &str) -> GeminiProvider {
        GeminiProvider::new(
            api_key,
            self.providers.gemini.base_url.clone(),
            self.http.clone(),
        )
    }
}

impl ProviderFactory for DefaultProviderFactory {
    fn create(&self, kind: ProviderKind, api_key: &str) -> ProviderResult<Arc<dyn ChatProvider>> {
        debug!(provider = %kind, "Creating provider");
        let provider: Arc<dyn ChatProvider> = match kind {
            ProviderKind::Groq | ProviderKind::OpenAi => match self.hosted_client(kind, api_key) {
                Some(client) => Arc::new(client),
                None => {
                    return Err(ProviderError::new(ProviderErrorKind::ProviderUnknown(
                        kind.to_string(),
                    )));
                }
            },
            ProviderKind::Gemini => Arc::new(self.gemini(api_key)),
            ProviderKind::Local => {
                if !self.local.enabled {
                    return Err(ProviderError::new(ProviderErrorKind::LocalUnsupported));
                }
                Arc::new(LocalProvider::new(
                    self.local.model_dir.clone(),
                    &self.local.server_url,
                    self.http.clone(),
                ))
            }
            ProviderKind::VpsProxy => Arc::new(VpsProxyClient::new(
                self.providers.vps_proxy.base_url.clone(),
                Some(api_key.to_string()),
                self.http.clone(),
            )),
        };
        Ok(provider)
    }
}
