//! Live provider checks. Run with `--features api` and keys in `.env`.

#![cfg(feature = "api")]

use fabula_core::ProviderKind;
use fabula_interface::ProviderFactory;
use fabula_models::{CredentialStatus, DefaultProviderFactory, LlmInvoker, validate_credentials};
use fabula_rate_limit::{FabulaConfig, RetryPolicy};

fn factory() -> DefaultProviderFactory {
    let config = FabulaConfig::default();
    DefaultProviderFactory::new(&config.providers, &config.local)
}

#[tokio::test]
async fn test_groq_structured_completion() {
    let _ = dotenvy::dotenv();
    let key = std::env::var("GROQ_API_KEY").expect("GROQ_API_KEY not set");

    let provider = factory().create(ProviderKind::Groq, &key).unwrap();
    let invoker = LlmInvoker::new(provider, RetryPolicy::default());
    let text = invoker
        .invoke(
            "Return a JSON object with a single key \"ok\" set to true.",
            "llama-3.1-8b-instant",
            true,
        )
        .await
        .unwrap();

    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["ok"], true);
}

#[tokio::test]
async fn test_groq_key_validation() {
    let _ = dotenvy::dotenv();
    let key = std::env::var("GROQ_API_KEY").expect("GROQ_API_KEY not set");

    assert_eq!(
        validate_credentials("groq", &key, &factory()).await,
        CredentialStatus::Ok
    );
    assert!(matches!(
        validate_credentials("groq", "gsk_invalid", &factory()).await,
        CredentialStatus::Error { .. }
    ));
}
