//! Local model catalog error types.

/// Error conditions for local model file management.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum CatalogErrorKind {
    /// Directory could not be read
    #[display("Failed to read model directory {}: {}", path, message)]
    ReadDir {
        /// Directory path
        path: String,
        /// Error message
        message: String,
    },
    /// File name is not a plain `.gguf` file name
    #[display("Invalid model file name: {}", _0)]
    InvalidFileName(String),
    /// File could not be removed
    #[display("Failed to delete {}: {}", name, message)]
    Delete {
        /// File name
        name: String,
        /// Error message
        message: String,
    },
}

/// Catalog error with source location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Catalog Error: {} at line {} in {}", kind, line, file)]
pub struct CatalogError {
    /// The kind of error that occurred
    pub kind: CatalogErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl CatalogError {
    /// Create a new CatalogError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: CatalogErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
