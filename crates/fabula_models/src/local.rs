//! Locally hosted `.gguf` models.

use crate::OpenAiCompatibleClient;
use crate::catalog::is_plain_model_name;
use async_trait::async_trait;
use fabula_error::{ProviderError, ProviderErrorKind, ProviderResult};
use fabula_interface::{ChatProvider, ChatRequest};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Provider for a model file on local disk.
///
/// Each call checks that the requested model file exists under the models
/// directory, then sends the prompt to the local OpenAI-compatible inference
/// server that loads it.
#[derive(Debug, Clone)]
pub struct LocalProvider {
    model_dir: PathBuf,
    server: OpenAiCompatibleClient,
}

impl LocalProvider {
    /// Create a provider reading models from `model_dir` and serving them through `server_url`.
    pub fn new(
        model_dir: impl Into<PathBuf>,
        server_url: impl AsRef<str>,
        http: reqwest::Client,
    ) -> Self {
        let base_url = format!("{}/v1", server_url.as_ref().trim_end_matches('/'));
        Self {
            model_dir: model_dir.into(),
            server: OpenAiCompatibleClient::new("local", base_url, None, http),
        }
    }

    /// Directory holding the model files.
    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    /// Resolve `model` to a file on disk.
    ///
    /// # Errors
    ///
    /// Fails with `ModelUnavailable` when `model` is not a plain `.gguf`
    /// file name or the file does not exist.
    pub fn resolve_model(&self, model: &str) -> ProviderResult<PathBuf> {
        if !is_plain_model_name(model) {
            return Err(ProviderError::new(ProviderErrorKind::ModelUnavailable(
                format!("Invalid local model name: {}", model),
            )));
        }
        let path = self.model_dir.join(model);
        if path.is_file() {
            Ok(path)
        } else {
            Err(ProviderError::new(ProviderErrorKind::ModelUnavailable(
                format!("Local model not found at path: {}", path.display()),
            )))
        }
    }
}

#[async_trait]
impl ChatProvider for LocalProvider {
    #[instrument(name = "local_complete_chat", skip(self, request), fields(model = %request.model()))]
    async fn complete_chat(&self, request: &ChatRequest) -> ProviderResult<String> {
        let path = self.resolve_model(request.model())?;
        debug!(path = %path.display(), "Using local model");
        self.server.complete_chat(request).await
    }

    fn provider_name(&self) -> &'static str {
        "local"
    }
}
