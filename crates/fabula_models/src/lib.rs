//! LLM provider integrations for Fabula.
//!
//! Every backend implements [`ChatProvider`](fabula_interface::ChatProvider):
//!
//! - [`OpenAiCompatibleClient`]: Groq and OpenAI chat completions
//! - [`GeminiProvider`]: Google Gemini via `gemini-rust`
//! - [`LocalProvider`]: a `.gguf` model on disk behind a local inference server
//! - [`VpsProxyClient`]: a bare HTTP passthrough
//!
//! [`LlmInvoker`] wraps a provider with the retry policy and response
//! normalization the pipeline relies on. The catalog and credential helpers
//! back the command-line model management commands.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod catalog;
mod credentials;
mod factory;
mod fence;
mod gemini;
mod invoker;
mod local;
mod openai_compat;
mod proxy;

pub use catalog::{
    DeleteReport, DeleteStatus, LocalModel, ModelCategories, categorize_models,
    delete_local_models, list_local_models,
};
pub use credentials::{CredentialStatus, list_remote_models, validate_credentials};
pub use factory::DefaultProviderFactory;
pub use fence::unwrap_fenced;
pub use gemini::GeminiProvider;
pub use invoker::LlmInvoker;
pub use local::LocalProvider;
pub use openai_compat::OpenAiCompatibleClient;
pub use proxy::VpsProxyClient;
