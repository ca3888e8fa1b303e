//! Google Gemini provider.

use crate::openai_compat::{status_error, transport_error};
use async_trait::async_trait;
use fabula_error::{ProviderError, ProviderErrorKind, ProviderResult};
use fabula_interface::{ChatProvider, ChatRequest, ModelListing};
use gemini_rust::{Gemini, client::Model};
use serde::Deserialize;
use tracing::{debug, instrument};

#[derive(Debug, Deserialize)]
struct GeminiModelList {
    #[serde(default)]
    models: Vec<GeminiModelEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiModelEntry {
    name: String,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

/// Gemini provider backed by `gemini-rust`.
///
/// A client is created per call so the model can vary between requests.
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    api_key: String,
    base_url: String,
    http: reqwest::Client,
}

impl GeminiProvider {
    /// Create a provider. `base_url` is used for model listing only.
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    /// Convert a model name to a gemini-rust model, adding the `models/` prefix when missing.
    fn model_for(name: &str) -> Model {
        if name.starts_with("models/") {
            Model::Custom(name.to_string())
        } else {
            Model::Custom(format!("models/{}", name))
        }
    }

    /// Parse gemini-rust errors to extract HTTP status codes.
    ///
    /// Error strings look like "bad response from server; code 503; description: ...".
    fn parse_gemini_error(err: impl std::fmt::Display) -> ProviderError {
        let message = err.to_string();

        if let Some(status) = Self::extract_status_code(&message) {
            return ProviderError::new(ProviderErrorKind::from_status(status, message));
        }

        let lowered = message.to_lowercase();
        if lowered.contains("api key not valid") || lowered.contains("api_key_invalid") {
            ProviderError::new(ProviderErrorKind::Unauthorized(message))
        } else {
            ProviderError::new(ProviderErrorKind::Unavailable {
                status: None,
                message,
            })
        }
    }

    fn extract_status_code(message: &str) -> Option<u16> {
        let code_start = message.find("code ")?;
        let code = &message[code_start + 5..];
        let end = code.find(|c: char| !c.is_ascii_digit()).unwrap_or(code.len());
        code[..end].parse().ok()
    }
}

#[async_trait]
impl ChatProvider for GeminiProvider {
    #[instrument(
        name = "gemini_complete_chat",
        skip(self, request),
        fields(provider = "gemini", model = %request.model())
    )]
    async fn complete_chat(&self, request: &ChatRequest) -> ProviderResult<String> {
        let client = Gemini::with_model(&self.api_key, Self::model_for(request.model()))
            .map_err(|e| ProviderError::new(ProviderErrorKind::ClientCreation(e.to_string())))?;

        let mut builder = client.generate_content().with_user_message(request.prompt());
        if let Some(temperature) = request.temperature() {
            builder = builder.with_temperature(*temperature);
        }

        let response = builder.execute().await.map_err(Self::parse_gemini_error)?;
        debug!("Gemini generation successful");
        Ok(response.text())
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
    }
}

#[async_trait]
impl ModelListing for GeminiProvider {
    /// Models that support `generateContent`, without the `models/` prefix.
    #[instrument(name = "gemini_list_models", skip(self))]
    async fn list_models(&self) -> ProviderResult<Vec<String>> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| transport_error("gemini", e))?;

        if !response.status().is_success() {
            return Err(status_error("gemini", response).await);
        }

        let list: GeminiModelList = response
            .json()
            .await
            .map_err(|e| transport_error("gemini", e))?;
        Ok(generation_models(list))
    }
}

fn generation_models(list: GeminiModelList) -> Vec<String> {
    list.models
        .into_iter()
        .filter(|model| {
            model
                .supported_generation_methods
                .iter()
                .any(|method| method == "generateContent")
        })
        .map(|model| model.name.trim_start_matches("models/").to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_extraction() {
        let err = GeminiProvider::parse_gemini_error(
            "bad response from server; code 503; description: overloaded",
        );
        assert!(matches!(
            err.kind,
            ProviderErrorKind::Unavailable {
                status: Some(503),
                ..
            }
        ));

        let err = GeminiProvider::parse_gemini_error("bad response from server; code 429");
        assert!(matches!(err.kind, ProviderErrorKind::RateLimited(_)));
    }

    #[test]
    fn test_invalid_key_without_status() {
        let err = GeminiProvider::parse_gemini_error("API key not valid. Please pass a valid API key.");
        assert!(matches!(err.kind, ProviderErrorKind::Unauthorized(_)));
    }

    #[test]
    fn test_generation_models_filter() {
        let list: GeminiModelList = serde_json::from_str(
            r#"{"models":[
                {"name":"models/gemini-2.0-flash","supportedGenerationMethods":["generateContent","countTokens"]},
                {"name":"models/text-embedding-004","supportedGenerationMethods":["embedContent"]}
            ]}"#,
        )
        .unwrap();
        assert_eq!(generation_models(list), vec!["gemini-2.0-flash".to_string()]);
    }
}
