//! Shared input handling for command handlers.

use fabula::{FabulaConfig, FabulaResult};
use std::io::Read;
use std::path::Path;

/// Read a file, or stdin when `path` is `-`.
pub fn read_input(path: &Path) -> std::io::Result<String> {
    if path == Path::new("-") {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        std::fs::read_to_string(path)
    }
}

/// Load configuration from `path`, or the standard locations.
pub fn load_config(path: Option<&Path>) -> FabulaResult<FabulaConfig> {
    match path {
        Some(path) => FabulaConfig::from_file(path),
        None => FabulaConfig::load(),
    }
}

/// Environment variable holding the key for `provider`, e.g. `GROQ_API_KEY`.
fn key_variable(provider: &str) -> String {
    format!("{}_API_KEY", provider.trim().to_uppercase())
}

/// The explicit key, else the provider's environment variable, else empty.
pub fn api_key_for(provider: &str, explicit: Option<String>) -> String {
    explicit
        .filter(|key| !key.trim().is_empty())
        .or_else(|| std::env::var(key_variable(provider)).ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_variable() {
        assert_eq!(key_variable("groq"), "GROQ_API_KEY");
        assert_eq!(key_variable(" openai "), "OPENAI_API_KEY");
    }

    #[test]
    fn test_explicit_key_wins() {
        assert_eq!(api_key_for("groq", Some("explicit".to_string())), "explicit");
    }

    #[test]
    fn test_read_input_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("request.json");
        std::fs::write(&path, r#"{"step": "concept"}"#).unwrap();
        assert_eq!(read_input(&path).unwrap(), r#"{"step": "concept"}"#);
    }
}
