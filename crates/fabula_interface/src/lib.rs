//! Trait definitions for the Fabula quest generator.
//!
//! This crate provides the provider abstraction the pipeline talks to: a
//! single chat-completion capability, an optional model-listing capability,
//! and a factory that turns a provider name and credential into a provider.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod traits;
mod types;

pub use traits::{ChatProvider, ModelListing, ProviderFactory};
pub use types::{ChatRequest, ChatRequestBuilder};
