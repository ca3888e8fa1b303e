//! Request types shared by every provider.

use serde::{Deserialize, Serialize};

/// One chat-style completion request.
///
/// # Examples
///
/// ```
/// use fabula_interface::ChatRequest;
///
/// let request = ChatRequest::builder()
///     .prompt("List five scenes")
///     .model("llama-3.1-8b-instant")
///     .structured(false)
///     .build()
///     .unwrap();
///
/// assert_eq!(request.model(), "llama-3.1-8b-instant");
/// assert_eq!(*request.temperature(), None);
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Serialize,
    Deserialize,
    derive_builder::Builder,
    derive_getters::Getters,
)]
#[builder(setter(into))]
pub struct ChatRequest {
    /// Prompt text sent as a single user message
    prompt: String,
    /// Model identifier as understood by the provider
    model: String,
    /// Ask the provider for a single JSON object when it supports that mode
    #[builder(default)]
    structured: bool,
    /// Sampling temperature
    #[builder(default, setter(strip_option))]
    temperature: Option<f32>,
}

impl ChatRequest {
    /// Creates a new request builder.
    pub fn builder() -> ChatRequestBuilder {
        ChatRequestBuilder::default()
    }
}
