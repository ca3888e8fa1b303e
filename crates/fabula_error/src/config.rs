//! Settings loading errors.

/// What went wrong while assembling `FabulaConfig`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ConfigErrorKind {
    /// A settings source could not be read or merged
    #[display("Failed to build configuration: {}", _0)]
    Build(String),
    /// Merged settings did not match the expected shape
    #[display("Failed to parse configuration: {}", _0)]
    Parse(String),
    /// A setting holds a value the pipeline cannot use
    #[display("{}", _0)]
    Invalid(String),
}

/// Settings error with source location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Config Error: {} at line {} in {}", kind, line, file)]
pub struct ConfigError {
    /// The kind of error that occurred
    pub kind: ConfigErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ConfigError {
    /// Create a new ConfigError with automatic location tracking.
    ///
    /// # Examples
    ///
    /// ```
    /// use fabula_error::{ConfigError, ConfigErrorKind};
    ///
    /// let err = ConfigError::new(ConfigErrorKind::Parse("pipeline.stage_delay_ms: invalid type".into()));
    /// assert!(err.to_string().starts_with("Config Error: Failed to parse configuration"));
    /// ```
    #[track_caller]
    pub fn new(kind: ConfigErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
