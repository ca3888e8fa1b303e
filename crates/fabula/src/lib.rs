//! Fabula - multi-stage LLM generator for branching text quests.
//!
//! A quest is built by a fixed sequence of narrowly scoped LLM calls: a plot
//! concept, a flat scene list, a scene graph, per-scene prose, a
//! reachability repair pass and a final proofreading pass. Progress is
//! streamed as it happens.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use fabula::{DefaultProviderFactory, FabulaConfig, GenerationRequest, GeneratorSettings, QuestGenerator};
//! use futures_util::StreamExt;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = FabulaConfig::load()?;
//!     let factory = Arc::new(DefaultProviderFactory::new(&config.providers, &config.local));
//!     let generator = QuestGenerator::new(factory, GeneratorSettings::from(&config));
//!
//!     let request = GenerationRequest::builder()
//!         .setting("A lighthouse on a cursed shore")
//!         .api_key(std::env::var("GROQ_API_KEY")?)
//!         .api_provider("groq")
//!         .model("llama-3.1-8b-instant")
//!         .build()?;
//!
//!     let mut events = generator.generate(request);
//!     while let Some(event) = events.next().await {
//!         println!("{}", serde_json::to_string(&event)?);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `fabula_error` - Error types
//! - `fabula_core` - Requests, quest graph types and progress events
//! - `fabula_interface` - The `ChatProvider` trait and provider factory seam
//! - `fabula_rate_limit` - Retry policy and layered configuration
//! - `fabula_models` - Groq, OpenAI, Gemini, local and proxy providers
//! - `fabula_pipeline` - Prompts, parsers, graph validator and orchestrator
//!
//! This crate re-exports everything for convenience and ships the `fabula`
//! command-line tool.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod observability;

pub use fabula_core::*;
pub use fabula_error::*;
pub use fabula_interface::*;
pub use fabula_models::*;
pub use fabula_pipeline::{
    ErrorCategory, GeneratorSettings, ManualPrompt, ManualRequest, ManualStep, ParentLink,
    ParentMap, ProgressStream, QuestGenerator, build_step, classify, classify_text,
    describe_failure, parsing, prompts, prune_unreachable,
};
pub use fabula_rate_limit::*;

pub use observability::{ObservabilityConfig, init_observability};
