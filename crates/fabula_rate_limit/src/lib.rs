//! Retry, pacing and configuration.
//!
//! This crate provides:
//! - [`RetryPolicy`]: bounded exponential backoff for transient provider failures
//! - [`FabulaConfig`]: layered TOML configuration (bundled defaults, user overrides,
//!   environment)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod retry;

pub use self::config::{
    FabulaConfig, LocalConfig, PipelineConfig, ProviderEndpoint, ProvidersConfig, RetryConfig,
};
pub use retry::RetryPolicy;
