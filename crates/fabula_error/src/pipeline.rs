//! Generation pipeline error types.

/// Specific error conditions raised while parsing stage output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum PipelineErrorKind {
    /// A stage produced zero usable items
    #[display("Stage '{}' produced no usable items", _0)]
    EmptyExtraction(String),
    /// A stage response could not be decoded as expected
    #[display("Stage '{}' returned malformed output: {}", stage, message)]
    MalformedOutput {
        /// Stage that produced the output
        stage: String,
        /// Decode failure description
        message: String,
    },
    /// A stage response decoded but lacks required top-level keys
    #[display("Stage '{}' response is missing required key '{}'", stage, key)]
    StructureError {
        /// Stage that produced the output
        stage: String,
        /// Missing key
        key: String,
    },
    /// Pruning left no scene reachable from the start scene
    #[display("No scene is reachable from start scene '{}'", _0)]
    UnreachableStart(String),
    /// Manual step state is missing a required field
    #[display("Step '{}' requires state field '{}'", step, field)]
    MissingState {
        /// Requested step
        step: String,
        /// Missing field
        field: String,
    },
}

/// Error type for pipeline operations.
///
/// # Examples
///
/// ```
/// use fabula_error::{PipelineError, PipelineErrorKind};
///
/// let err = PipelineError::new(PipelineErrorKind::EmptyExtraction("architect".to_string()));
/// assert!(format!("{}", err).contains("no usable items"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Pipeline Error: {} at line {} in {}", kind, line, file)]
pub struct PipelineError {
    /// The kind of error that occurred
    pub kind: PipelineErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl PipelineError {
    /// Create a new PipelineError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: PipelineErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
