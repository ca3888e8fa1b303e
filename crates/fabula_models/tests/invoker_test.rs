//! Tests for LlmInvoker retry and normalization behavior.

use async_trait::async_trait;
use fabula_error::{ProviderError, ProviderErrorKind, ProviderResult};
use fabula_interface::{ChatProvider, ChatRequest};
use fabula_models::LlmInvoker;
use fabula_rate_limit::RetryPolicy;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Provider that replays a fixed script of results and records requests.
struct ScriptedProvider {
    script: Mutex<VecDeque<ProviderResult<String>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedProvider {
    fn new(script: Vec<ProviderResult<String>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn attempts(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatProvider for ScriptedProvider {
    async fn complete_chat(&self, request: &ChatRequest) -> ProviderResult<String> {
        self.requests.lock().unwrap().push(request.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::new(ProviderErrorKind::EmptyResponse)))
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}

fn rate_limited() -> ProviderResult<String> {
    Err(ProviderError::new(ProviderErrorKind::RateLimited(
        "429 Too Many Requests".to_string(),
    )))
}

#[tokio::test(start_paused = true)]
async fn test_retry_then_success() {
    let provider = ScriptedProvider::new(vec![
        rate_limited(),
        rate_limited(),
        Ok("1. The gate".to_string()),
    ]);
    let invoker = LlmInvoker::new(provider.clone(), RetryPolicy::default());
    let start = Instant::now();

    let text = invoker.invoke("prompt", "model", false).await.unwrap();

    assert_eq!(text, "1. The gate");
    assert_eq!(provider.attempts(), 3);
    assert_eq!(start.elapsed(), Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn test_retry_exhausted_after_three_attempts() {
    let provider = ScriptedProvider::new(vec![
        rate_limited(),
        rate_limited(),
        rate_limited(),
        Ok("never reached".to_string()),
    ]);
    let invoker = LlmInvoker::new(provider.clone(), RetryPolicy::default());

    let err = invoker.invoke("prompt", "model", false).await.unwrap_err();

    assert!(matches!(err.kind, ProviderErrorKind::RateLimited(_)));
    assert_eq!(provider.attempts(), 3);
}

#[tokio::test]
async fn test_non_transient_fails_immediately() {
    let provider = ScriptedProvider::new(vec![Err(ProviderError::new(
        ProviderErrorKind::ModelUnavailable("model_not_found".to_string()),
    ))]);
    let invoker = LlmInvoker::new(provider.clone(), RetryPolicy::default());

    let err = invoker.invoke("prompt", "model", true).await.unwrap_err();

    assert!(matches!(err.kind, ProviderErrorKind::ModelUnavailable(_)));
    assert_eq!(provider.attempts(), 1);
}

#[tokio::test]
async fn test_fenced_payload_round_trip() {
    let payload = r#"{"text": "Rain on the docks", "choices_text": ["Run", "Hide"]}"#;
    let provider = ScriptedProvider::new(vec![
        Ok(format!("```json\n{}\n```", payload)),
        Ok(payload.to_string()),
    ]);
    let invoker = LlmInvoker::new(provider, RetryPolicy::none());

    assert_eq!(invoker.invoke("p", "m", true).await.unwrap(), payload);
    assert_eq!(invoker.invoke("p", "m", true).await.unwrap(), payload);
}

#[tokio::test]
async fn test_blank_response_is_empty_response() {
    let provider = ScriptedProvider::new(vec![Ok("   \n".to_string())]);
    let invoker = LlmInvoker::new(provider.clone(), RetryPolicy::default());

    let err = invoker.invoke("p", "m", false).await.unwrap_err();

    assert_eq!(err.kind, ProviderErrorKind::EmptyResponse);
    assert_eq!(provider.attempts(), 1);
}

#[tokio::test]
async fn test_request_carries_settings() {
    let provider = ScriptedProvider::new(vec![Ok("ok".to_string())]);
    let invoker = LlmInvoker::new(provider.clone(), RetryPolicy::none()).with_temperature(0.7);

    invoker.invoke("Write a scene", "llama3", true).await.unwrap();

    let requests = provider.requests.lock().unwrap();
    assert_eq!(requests[0].prompt(), "Write a scene");
    assert_eq!(requests[0].model(), "llama3");
    assert!(*requests[0].structured());
    assert_eq!(*requests[0].temperature(), Some(0.7));
}
