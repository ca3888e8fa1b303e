//! Provider selection.

use fabula_error::{ProviderError, ProviderErrorKind, ProviderResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The interchangeable LLM backends a generation request can target.
///
/// # Examples
///
/// ```
/// use fabula_core::ProviderKind;
///
/// assert_eq!(ProviderKind::parse("openai").unwrap(), ProviderKind::OpenAi);
/// assert_eq!(ProviderKind::VpsProxy.to_string(), "vps_proxy");
/// assert!(ProviderKind::parse("anthropic").is_err());
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProviderKind {
    /// Groq hosted API (OpenAI-compatible)
    Groq,
    /// OpenAI hosted API
    #[serde(rename = "openai")]
    #[strum(serialize = "openai")]
    OpenAi,
    /// Google Gemini hosted API
    Gemini,
    /// Model file on local disk served by a local inference server
    Local,
    /// Bare HTTP passthrough proxy
    VpsProxy,
}

impl ProviderKind {
    /// Resolve a provider name, failing with `ProviderUnknown` for anything unrecognized.
    pub fn parse(name: &str) -> ProviderResult<Self> {
        Self::from_str(name.trim()).map_err(|_| {
            ProviderError::new(ProviderErrorKind::ProviderUnknown(name.to_string()))
        })
    }

    /// Whether calls to this provider require an API key.
    pub fn requires_credential(&self) -> bool {
        matches!(self, Self::Groq | Self::OpenAi | Self::Gemini)
    }
}
