//! OpenAI-compatible chat completions client.
//!
//! Groq, OpenAI and local inference servers all speak the
//! `/chat/completions` dialect, so one client serves all three.

use async_trait::async_trait;
use fabula_error::{ProviderError, ProviderErrorKind, ProviderResult};
use fabula_interface::{ChatProvider, ChatRequest, ModelListing};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

/// Client for any OpenAI-compatible chat completions endpoint.
///
/// # Example
///
/// ```no_run
/// use fabula_interface::{ChatProvider, ChatRequest};
/// use fabula_models::OpenAiCompatibleClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = OpenAiCompatibleClient::new(
///     "groq",
///     "https://api.groq.com/openai/v1",
///     Some("gsk_...".to_string()),
///     reqwest::Client::new(),
/// );
/// let request = ChatRequest::builder()
///     .prompt("Describe a haunted lighthouse")
///     .model("llama-3.1-8b-instant")
///     .build()?;
/// let text = client.complete_chat(&request).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, derive_getters::Getters)]
pub struct OpenAiCompatibleClient {
    provider: &'static str,
    base_url: String,
    #[getter(skip)]
    api_key: Option<String>,
    #[getter(skip)]
    client: reqwest::Client,
}

impl OpenAiCompatibleClient {
    /// Create a client for `base_url` (without the trailing `/chat/completions`).
    pub fn new(
        provider: &'static str,
        base_url: impl Into<String>,
        api_key: Option<String>,
        client: reqwest::Client,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            provider,
            base_url,
            api_key: api_key.filter(|key| !key.is_empty()),
            client,
        }
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}

/// Map a transport-level reqwest failure.
pub(crate) fn transport_error(provider: &str, e: reqwest::Error) -> ProviderError {
    error!(provider, "Request failed: {}", e);
    if e.is_decode() {
        ProviderError::new(ProviderErrorKind::Decode(e.to_string()))
    } else {
        ProviderError::new(ProviderErrorKind::Unavailable {
            status: e.status().map(|s| s.as_u16()),
            message: format!("Request to {} failed: {}", provider, e),
        })
    }
}

/// Convert a non-success response into a classified error.
pub(crate) async fn status_error(provider: &str, response: reqwest::Response) -> ProviderError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    error!(provider, status, "Provider returned error: {}", body);
    ProviderError::new(ProviderErrorKind::from_status(status, body))
}

/// Pull the first choice's text out of a chat completion body.
fn first_choice_text(response: ChatCompletionResponse) -> ProviderResult<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| ProviderError::new(ProviderErrorKind::EmptyResponse))
}

#[async_trait]
impl ChatProvider for OpenAiCompatibleClient {
    #[instrument(
        name = "openai_compat_complete_chat",
        skip(self, request),
        fields(provider = self.provider, model = %request.model(), structured = request.structured())
    )]
    async fn complete_chat(&self, request: &ChatRequest) -> ProviderResult<String> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!("Sending chat completion request to {}", url);

        let body = ChatCompletionRequest {
            model: request.model(),
            messages: vec![ChatMessage {
                role: "user",
                content: request.prompt(),
            }],
            temperature: *request.temperature(),
            response_format: request.structured().then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        let response = self
            .authorize(self.client.post(&url).json(&body))
            .send()
            .await
            .map_err(|e| transport_error(self.provider, e))?;

        if !response.status().is_success() {
            return Err(status_error(self.provider, response).await);
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| transport_error(self.provider, e))?;

        debug!("Chat completion successful");
        first_choice_text(completion)
    }

    fn provider_name(&self) -> &'static str {
        self.provider
    }
}

#[async_trait]
impl ModelListing for OpenAiCompatibleClient {
    #[instrument(name = "openai_compat_list_models", skip(self), fields(provider = self.provider))]
    async fn list_models(&self) -> ProviderResult<Vec<String>> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|e| transport_error(self.provider, e))?;

        if !response.status().is_success() {
            return Err(status_error(self.provider, response).await);
        }

        let list: ModelList = response
            .json()
            .await
            .map_err(|e| transport_error(self.provider, e))?;
        Ok(list.data.into_iter().map(|entry| entry.id).collect())
    }
}
