//! Bare HTTP passthrough proxy.

use crate::openai_compat::{status_error, transport_error};
use async_trait::async_trait;
use fabula_error::{ProviderError, ProviderErrorKind, ProviderResult};
use fabula_interface::{ChatProvider, ChatRequest};
use serde::Serialize;
use tracing::{debug, instrument};

#[derive(Debug, Serialize)]
struct ProxyRequest<'a> {
    prompt: &'a str,
    model: &'a str,
    json_mode: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Client for a proxy that forwards prompts to a model it hosts.
///
/// The proxy accepts `{prompt, model, json_mode}` and answers either with a
/// JSON object carrying the text under `response`, `text` or `content`, or
/// with the text itself as the body.
#[derive(Debug, Clone)]
pub struct VpsProxyClient {
    url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl VpsProxyClient {
    /// Create a client posting to `url`, authenticating with `token` when non-empty.
    pub fn new(url: impl Into<String>, token: Option<String>, client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            token: token.filter(|t| !t.is_empty()),
            client,
        }
    }
}

/// Keys the proxy may wrap the completion in.
const ENVELOPE_KEYS: [&str; 3] = ["response", "text", "content"];

/// Keys that mark a body as model output rather than an envelope.
const PAYLOAD_KEYS: [&str; 4] = ["choices_text", "choices", "scenes", "start_scene"];

/// Pull the completion out of a proxy response body.
///
/// An object carrying any payload key is the model's own JSON and is kept whole.
fn extract_proxy_text(body: String) -> ProviderResult<String> {
    let text = match serde_json::from_str::<serde_json::Value>(&body) {
        Ok(serde_json::Value::Object(map))
            if !PAYLOAD_KEYS.iter().any(|key| map.contains_key(*key)) =>
        {
            ENVELOPE_KEYS
                .iter()
                .find_map(|key| map.get(*key).and_then(|v| v.as_str()).map(str::to_string))
                .unwrap_or(body)
        }
        Ok(serde_json::Value::String(text)) => text,
        _ => body,
    };

    if text.trim().is_empty() {
        Err(ProviderError::new(ProviderErrorKind::EmptyResponse))
    } else {
        Ok(text)
    }
}

#[async_trait]
impl ChatProvider for VpsProxyClient {
    #[instrument(name = "proxy_complete_chat", skip(self, request), fields(model = %request.model()))]
    async fn complete_chat(&self, request: &ChatRequest) -> ProviderResult<String> {
        let body = ProxyRequest {
            prompt: request.prompt(),
            model: request.model(),
            json_mode: *request.structured(),
            temperature: *request.temperature(),
        };

        let mut http_request = self.client.post(&self.url).json(&body);
        if let Some(token) = &self.token {
            http_request = http_request.bearer_auth(token);
        }

        let response = http_request
            .send()
            .await
            .map_err(|e| transport_error("vps_proxy", e))?;
        if !response.status().is_success() {
            return Err(status_error("vps_proxy", response).await);
        }

        let text = response
            .text()
            .await
            .map_err(|e| transport_error("vps_proxy", e))?;
        debug!(length = text.len(), "Proxy response received");
        extract_proxy_text(text)
    }

    fn provider_name(&self) -> &'static str {
        "vps_proxy"
    }
}
