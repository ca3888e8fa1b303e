//! Error types for the Fabula quest generator.
//!
//! This crate provides the foundation error types used throughout the Fabula workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All constructors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use fabula_error::{FabulaResult, ProviderError, ProviderErrorKind};
//!
//! fn call_provider() -> FabulaResult<String> {
//!     Err(ProviderError::new(ProviderErrorKind::EmptyResponse))?
//! }
//!
//! match call_provider() {
//!     Ok(text) => println!("Got: {}", text),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod catalog;
mod config;
mod error;
mod json;
mod pipeline;
mod provider;
mod retry;

pub use catalog::{CatalogError, CatalogErrorKind};
pub use config::{ConfigError, ConfigErrorKind};
pub use error::{FabulaError, FabulaErrorKind, FabulaResult};
pub use json::JsonError;
pub use pipeline::{PipelineError, PipelineErrorKind};
pub use provider::{ProviderError, ProviderErrorKind, ProviderResult};
pub use retry::RetryableError;
