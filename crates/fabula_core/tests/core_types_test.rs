//! Tests for the wire shapes of requests, quests and progress events.

use fabula_core::{GenerationRequest, PipelineStatus, ProgressEvent, ProviderKind, Quest};
use strum::IntoEnumIterator;

#[test]
fn test_request_defaults() {
    let request: GenerationRequest = serde_json::from_str(
        r#"{"setting":"Frozen wastes","api_provider":"local","model":"tiny.gguf"}"#,
    )
    .unwrap();

    assert_eq!(request.api_key, "");
    assert_eq!(request.params.scene_count, 8);
    assert_eq!(request.params.tone, "");
    assert_eq!(request.params.pacing, "");
}

#[test]
fn test_request_flattened_params() {
    let request: GenerationRequest = serde_json::from_str(
        r#"{
            "setting": "Frozen wastes",
            "api_key": "secret",
            "api_provider": "gemini",
            "model": "gemini-2.0-flash",
            "scene_count": 12,
            "tone": "hopeful",
            "narrative_elements": ["red_herring", "time pressure"]
        }"#,
    )
    .unwrap();

    assert_eq!(request.params.scene_count, 12);
    assert_eq!(request.params.tone, "hopeful");
    assert_eq!(request.params.narrative_elements.len(), 2);
    assert!(!format!("{:?}", request).contains("secret"));
}

#[test]
fn test_provider_names_round_trip_through_display() {
    for kind in ProviderKind::iter() {
        assert_eq!(ProviderKind::parse(&kind.to_string()).unwrap(), kind);
    }
    let names: Vec<String> = ProviderKind::iter().map(|k| k.to_string()).collect();
    assert_eq!(names, ["groq", "openai", "gemini", "local", "vps_proxy"]);
}

#[test]
fn test_unknown_provider() {
    let err = ProviderKind::parse("mistral").unwrap_err();
    assert!(err.to_string().contains("Unknown API provider: mistral"));
}

#[test]
fn test_terminal_events() {
    let quest = Quest {
        start_scene: "scene_1".to_string(),
        scenes: vec![],
    };
    let done = ProgressEvent::done(quest);
    assert!(done.is_terminal());
    assert_eq!(
        serde_json::to_string(&done).unwrap(),
        r#"{"status":"done","quest":{"start_scene":"scene_1","scenes":[]}}"#
    );

    let error = ProgressEvent::error("Invalid API key.");
    assert!(error.is_terminal());
    assert!(!ProgressEvent::stage(PipelineStatus::Concept, "Working").is_terminal());
}

#[test]
fn test_quest_tolerates_nulls() {
    let quest: Quest = serde_json::from_str(
        r#"{"start_scene":"a","scenes":[{"scene_id":"a","text":null,"choices":null}]}"#,
    )
    .unwrap();
    assert_eq!(quest.scenes[0].text, "");
    assert!(quest.scenes[0].choices.is_empty());
}
