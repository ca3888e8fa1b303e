//! Tests that the facade wires configuration into the pipeline.

use fabula::{
    FabulaConfig, GeneratorSettings, ManualRequest, ManualStep, RetryPolicy, build_step,
};
use serde_json::json;
use std::time::Duration;

#[test]
fn test_bundled_config_drives_generator_settings() {
    let config = FabulaConfig::bundled().unwrap();
    let settings = GeneratorSettings::from(&config);

    assert_eq!(settings.stage_delay, Duration::from_secs(1));
    assert_eq!(settings.language, "Russian");
    assert_eq!(settings.retry, RetryPolicy::default());
    assert!(!settings.revalidate_corrected);
}

#[test]
fn test_config_file_overrides_language() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fabula.toml");
    std::fs::write(&path, "[pipeline]\nlanguage = \"English\"\nstage_delay_ms = 0\n").unwrap();

    let config = FabulaConfig::from_file(&path).unwrap();
    let settings = GeneratorSettings::from(&config);
    assert_eq!(settings.language, "English");
    assert!(settings.stage_delay.is_zero());

    let prompt = build_step(
        &ManualRequest {
            step: ManualStep::Concept,
            state: json!({"setting": "A drowned city"}),
        },
        &settings.language,
    )
    .unwrap();
    assert!(prompt.prompt.contains("Respond in English only"));
}
