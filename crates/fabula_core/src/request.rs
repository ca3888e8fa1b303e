//! Generation request types.

use serde::{Deserialize, Serialize};

/// Scene count used when a request does not specify one.
pub const DEFAULT_SCENE_COUNT: u32 = 8;

fn default_scene_count() -> u32 {
    DEFAULT_SCENE_COUNT
}

/// Creative parameters threaded through every prompt.
///
/// # Examples
///
/// ```
/// use fabula_core::PipelineParams;
///
/// let params = PipelineParams::builder()
///     .scene_count(5u32)
///     .tone("grim")
///     .narrative_elements(vec!["foreshadowing".to_string()])
///     .build()
///     .unwrap();
/// assert_eq!(params.scene_count, 5);
/// assert_eq!(params.pacing, "");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_builder::Builder)]
#[builder(setter(into))]
pub struct PipelineParams {
    /// Target number of scenes (advisory, not exact)
    #[serde(default = "default_scene_count")]
    #[builder(default = "DEFAULT_SCENE_COUNT")]
    pub scene_count: u32,
    /// Free-text tone
    #[serde(default)]
    #[builder(default)]
    pub tone: String,
    /// Free-text pacing
    #[serde(default)]
    #[builder(default)]
    pub pacing: String,
    /// Ordered narrative-element tags
    #[serde(default)]
    #[builder(default)]
    pub narrative_elements: Vec<String>,
}

impl PipelineParams {
    /// Creates a new params builder.
    pub fn builder() -> PipelineParamsBuilder {
        PipelineParamsBuilder::default()
    }
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            scene_count: DEFAULT_SCENE_COUNT,
            tone: String::new(),
            pacing: String::new(),
            narrative_elements: Vec::new(),
        }
    }
}

/// A request to generate one quest.
///
/// `api_provider` is kept as text so that an unknown provider surfaces as a
/// pipeline error event rather than a request decoding failure.
///
/// # Examples
///
/// ```
/// use fabula_core::GenerationRequest;
///
/// let request: GenerationRequest = serde_json::from_str(
///     r#"{"setting":"A drowned city","api_key":"k","api_provider":"groq","model":"llama3"}"#,
/// ).unwrap();
/// assert_eq!(request.params.scene_count, 8);
/// assert!(request.params.narrative_elements.is_empty());
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, derive_builder::Builder)]
#[builder(setter(into))]
pub struct GenerationRequest {
    /// World description
    pub setting: String,
    /// Provider credential
    #[serde(default)]
    #[builder(default)]
    pub api_key: String,
    /// Provider name (`groq`, `openai`, `gemini`, `local`, `vps_proxy`)
    pub api_provider: String,
    /// Model name as understood by the provider
    pub model: String,
    /// Creative parameters
    #[serde(flatten)]
    #[builder(default)]
    pub params: PipelineParams,
}

impl GenerationRequest {
    /// Creates a new request builder.
    pub fn builder() -> GenerationRequestBuilder {
        GenerationRequestBuilder::default()
    }
}

impl std::fmt::Debug for GenerationRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationRequest")
            .field("setting", &self.setting)
            .field("api_key", &"<redacted>")
            .field("api_provider", &self.api_provider)
            .field("model", &self.model)
            .field("params", &self.params)
            .finish()
    }
}
