//! Layered TOML configuration.
//!
//! Sources, later ones overriding earlier ones:
//! - Bundled defaults (include_str! from fabula.toml)
//! - `~/.config/fabula/fabula.toml`
//! - `./fabula.toml`
//! - `LOCAL_MODEL_PATH` and `USE_LOCAL_LLM` environment variables

use ::config::{Config, File, FileFormat};
use fabula_error::{ConfigError, ConfigErrorKind, FabulaError, FabulaResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, instrument};

/// Bundled default configuration.
const DEFAULT_CONFIG: &str = include_str!("../../../fabula.toml");

/// Generation pipeline settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Pause between sequential LLM calls within one run
    pub stage_delay_ms: u64,
    /// Language all player-facing text must be written in
    pub language: String,
    /// Sampling temperature for every stage
    pub temperature: f32,
    /// Re-run the pruning validator on the proofread quest
    pub revalidate_corrected: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stage_delay_ms: 1000,
            language: "Russian".to_string(),
            temperature: 0.7,
            revalidate_corrected: false,
        }
    }
}

impl PipelineConfig {
    /// Inter-stage delay as a duration.
    pub fn stage_delay(&self) -> Duration {
        Duration::from_millis(self.stage_delay_ms)
    }
}

/// Transient-failure retry settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Additional attempts after the first transient failure
    pub max_retries: usize,
    /// Delay before the first retry
    pub initial_backoff_ms: u64,
    /// Growth factor applied to each subsequent delay
    pub multiplier: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff_ms: 1000,
            multiplier: 2,
        }
    }
}

/// Local model settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LocalConfig {
    /// Whether local model support is available in this process
    pub enabled: bool,
    /// Directory holding `.gguf` model files
    pub model_dir: PathBuf,
    /// Base URL of the local OpenAI-compatible inference server
    pub server_url: String,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            model_dir: PathBuf::from("quest-generator/models"),
            server_url: "http://127.0.0.1:8080".to_string(),
        }
    }
}

/// Endpoint of one hosted provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProviderEndpoint {
    /// Base URL requests are built from
    pub base_url: String,
}

impl ProviderEndpoint {
    fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
        }
    }
}

/// Endpoints for every remote provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// Groq OpenAI-compatible API
    pub groq: ProviderEndpoint,
    /// OpenAI API
    pub openai: ProviderEndpoint,
    /// Gemini REST API (used for model listing)
    pub gemini: ProviderEndpoint,
    /// Passthrough proxy
    pub vps_proxy: ProviderEndpoint,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            groq: ProviderEndpoint::new("https://api.groq.com/openai/v1"),
            openai: ProviderEndpoint::new("https://api.openai.com/v1"),
            gemini: ProviderEndpoint::new("https://generativelanguage.googleapis.com/v1beta"),
            vps_proxy: ProviderEndpoint::new("http://127.0.0.1:8000/generate"),
        }
    }
}

/// Top-level Fabula configuration.
///
/// # Example
///
/// ```no_run
/// use fabula_rate_limit::FabulaConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = FabulaConfig::load()?;
/// println!("Models live in {}", config.local.model_dir.display());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct FabulaConfig {
    /// Pipeline settings
    pub pipeline: PipelineConfig,
    /// Retry settings
    pub retry: RetryConfig,
    /// Local model settings
    pub local: LocalConfig,
    /// Remote provider endpoints
    pub providers: ProvidersConfig,
}

impl FabulaConfig {
    /// Load only the bundled defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled file fails to parse.
    pub fn bundled() -> FabulaResult<Self> {
        Self::build(
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml)),
        )
    }

    /// Load configuration from a specific file path layered over the bundled defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> FabulaResult<Self> {
        debug!("Loading configuration from file");

        let builder = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::from(path.as_ref()));
        Ok(Self::build(builder)?.with_env_overrides())
    }

    /// Load configuration with precedence: environment > current dir > home dir > bundled defaults.
    ///
    /// User config files are optional and silently skipped if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if any present file fails to parse.
    #[instrument]
    pub fn load() -> FabulaResult<Self> {
        debug!("Loading configuration with precedence: env > current dir > home dir > bundled");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/fabula/fabula.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("fabula").required(false));

        Ok(Self::build(builder)?.with_env_overrides())
    }

    fn build(
        builder: ::config::ConfigBuilder<::config::builder::DefaultState>,
    ) -> FabulaResult<Self> {
        builder
            .build()
            .map_err(|e| FabulaError::from(ConfigError::new(ConfigErrorKind::Build(e.to_string()))))?
            .try_deserialize()
            .map_err(|e| FabulaError::from(ConfigError::new(ConfigErrorKind::Parse(e.to_string()))))
    }

    fn with_env_overrides(self) -> Self {
        self.apply_overrides(
            std::env::var("LOCAL_MODEL_PATH").ok(),
            std::env::var("USE_LOCAL_LLM").ok(),
        )
    }

    /// Apply `LOCAL_MODEL_PATH` / `USE_LOCAL_LLM` style overrides.
    ///
    /// The flag accepts `1`, `true` or `yes` (case-insensitive) as enabled and
    /// anything else as disabled.
    pub fn apply_overrides(
        mut self,
        model_path: Option<String>,
        use_local: Option<String>,
    ) -> Self {
        if let Some(path) = model_path.filter(|p| !p.trim().is_empty()) {
            self.local.model_dir = PathBuf::from(path);
        }
        if let Some(flag) = use_local {
            self.local.enabled =
                matches!(flag.trim().to_lowercase().as_str(), "1" | "true" | "yes");
        }
        self
    }
}
