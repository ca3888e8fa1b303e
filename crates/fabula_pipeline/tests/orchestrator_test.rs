//! End-to-end tests for the generation state machine with a scripted provider.

use async_trait::async_trait;
use fabula_core::{GenerationRequest, PipelineParams, PipelineStatus, ProgressEvent, ProviderKind};
use fabula_error::{ProviderError, ProviderErrorKind, ProviderResult};
use fabula_interface::{ChatProvider, ChatRequest, ProviderFactory};
use fabula_pipeline::{GeneratorSettings, QuestGenerator};
use fabula_rate_limit::RetryPolicy;
use futures_util::StreamExt;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Provider that replays a fixed script of results and records requests.
struct ScriptedProvider {
    script: Mutex<VecDeque<ProviderResult<String>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedProvider {
    fn new(script: Vec<ProviderResult<String>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatProvider for ScriptedProvider {
    async fn complete_chat(&self, request: &ChatRequest) -> ProviderResult<String> {
        self.requests.lock().unwrap().push(request.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::new(ProviderErrorKind::EmptyResponse)))
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}

/// Hands out the scripted provider for every hosted kind; local is disabled.
struct ScriptedFactory {
    provider: Arc<ScriptedProvider>,
}

impl ProviderFactory for ScriptedFactory {
    fn create(&self, kind: ProviderKind, _api_key: &str) -> ProviderResult<Arc<dyn ChatProvider>> {
        match kind {
            ProviderKind::Local => Err(ProviderError::new(ProviderErrorKind::LocalUnsupported)),
            _ => Ok(self.provider.clone()),
        }
    }
}

fn settings(stage_delay: Duration) -> GeneratorSettings {
    GeneratorSettings {
        stage_delay,
        language: "English".to_string(),
        temperature: 0.5,
        retry: RetryPolicy::none(),
        revalidate_corrected: false,
    }
}

fn request(provider: &str) -> GenerationRequest {
    GenerationRequest {
        setting: "A lighthouse on a cursed shore".to_string(),
        api_key: "test-key".to_string(),
        api_provider: provider.to_string(),
        model: "test-model".to_string(),
        params: PipelineParams {
            scene_count: 2,
            ..PipelineParams::default()
        },
    }
}

async fn run(
    provider: &Arc<ScriptedProvider>,
    settings: GeneratorSettings,
    request: GenerationRequest,
) -> Vec<ProgressEvent> {
    let factory = Arc::new(ScriptedFactory {
        provider: provider.clone(),
    });
    QuestGenerator::new(factory, settings)
        .generate(request)
        .collect()
        .await
}

fn statuses(events: &[ProgressEvent]) -> Vec<PipelineStatus> {
    events.iter().map(|e| e.status).collect()
}

fn two_scene_skeleton() -> String {
    json!({
        "start_scene": "scene_1",
        "scenes": [
            {"scene_id": "scene_1", "summary": "The storm", "choices": [
                {"choice_summary": "Climb the tower", "next_scene": "scene_2"}
            ]},
            {"scene_id": "scene_2", "summary": "The lamp", "choices": []}
        ]
    })
    .to_string()
}

fn happy_script() -> Vec<ProviderResult<String>> {
    vec![
        Ok("A keeper fights the sea.".to_string()),
        Ok("1. The storm\n2. The lamp".to_string()),
        Ok(format!("```json\n{}\n```", two_scene_skeleton())),
        Ok(json!({"text": "Waves hammer the rocks.", "choices_text": ["Run up the stairs"]})
            .to_string()),
        Ok(json!({"text": "The lamp flickers.", "choices_text": []}).to_string()),
        Ok(json!({
            "start_scene": "scene_1",
            "scenes": [
                {"scene_id": "scene_1", "text": "Waves hammer the rocks!", "choices": [
                    {"text": "Run up the stairs", "next_scene": "scene_2"}
                ]},
                {"scene_id": "scene_2", "text": "The lamp flickers.", "choices": []}
            ]
        })
        .to_string()),
    ]
}

#[tokio::test]
async fn test_happy_path_event_order() {
    let provider = ScriptedProvider::new(happy_script());
    let events = run(&provider, settings(Duration::ZERO), request("groq")).await;

    assert_eq!(
        statuses(&events),
        vec![
            PipelineStatus::Concept,
            PipelineStatus::Architect,
            PipelineStatus::Director,
            PipelineStatus::DetailingScene,
            PipelineStatus::DetailingScene,
            PipelineStatus::Validating,
            PipelineStatus::Correcting,
            PipelineStatus::Done,
        ]
    );

    let quest = events.last().unwrap().quest.clone().unwrap();
    assert_eq!(quest.start_scene, "scene_1");
    assert_eq!(quest.scenes[0].text, "Waves hammer the rocks!");
    assert_eq!(quest.scenes[0].choices[0].next_scene, "scene_2");

    let requests = provider.requests();
    assert_eq!(requests.len(), 6);
    let structured: Vec<bool> = requests.iter().map(|r| *r.structured()).collect();
    assert_eq!(structured, vec![false, false, true, true, true, true]);
    assert!(requests.iter().all(|r| r.model() == "test-model"));
    assert_eq!(*requests[0].temperature(), Some(0.5));

    // the second scene sees its parent's text and the action leading to it
    assert!(requests[4].prompt().contains("Waves hammer the rocks."));
    assert!(requests[4].prompt().contains("Climb the tower"));
    assert!(requests[3].prompt().contains("No previous text available."));
}

#[tokio::test]
async fn test_parent_detailed_later_leaves_no_previous_text() {
    let skeleton = json!({
        "start_scene": "scene_2",
        "scenes": [
            {"scene_id": "scene_1", "summary": "The vault", "choices": []},
            {"scene_id": "scene_2", "summary": "The hatch", "choices": [
                {"choice_summary": "Open the hatch", "next_scene": "scene_1"}
            ]}
        ]
    });
    let provider = ScriptedProvider::new(vec![
        Ok("A diver searches a wreck.".to_string()),
        Ok("1. The vault\n2. The hatch".to_string()),
        Ok(skeleton.to_string()),
        Ok(json!({"text": "Gold glints in the dark.", "choices_text": []}).to_string()),
        Ok(json!({"text": "A rusted hatch.", "choices_text": ["Pull the wheel"]}).to_string()),
        Ok("not json at all".to_string()),
    ]);
    let events = run(&provider, settings(Duration::ZERO), request("groq")).await;

    assert_eq!(events.last().unwrap().status, PipelineStatus::Done);

    let requests = provider.requests();
    let vault_prompt = requests[3].prompt();
    assert!(vault_prompt.contains("The vault"));
    assert!(vault_prompt.contains("No previous text available."));
    assert!(vault_prompt.contains("Open the hatch"));
    assert!(!vault_prompt.contains("A rusted hatch."));
}

#[tokio::test(start_paused = true)]
async fn test_cooldown_between_calls() {
    let provider = ScriptedProvider::new(happy_script());
    let start = Instant::now();

    let events = run(&provider, settings(Duration::from_secs(1)), request("groq")).await;

    assert_eq!(events.last().unwrap().status, PipelineStatus::Done);
    // six calls, five pauses
    assert_eq!(start.elapsed(), Duration::from_secs(5));
}

#[tokio::test]
async fn test_empty_architect_output_stops_before_director() {
    let provider = ScriptedProvider::new(vec![
        Ok("A concept.".to_string()),
        Ok("no scenes here".to_string()),
    ]);
    let events = run(&provider, settings(Duration::ZERO), request("groq")).await;

    assert_eq!(
        statuses(&events),
        vec![
            PipelineStatus::Concept,
            PipelineStatus::Architect,
            PipelineStatus::Error
        ]
    );
    assert_eq!(provider.requests().len(), 2);
    assert!(events.last().unwrap().message.is_some());
}

#[tokio::test]
async fn test_director_missing_start_scene_is_fatal() {
    let provider = ScriptedProvider::new(vec![
        Ok("A concept.".to_string()),
        Ok("1. One\n2. Two".to_string()),
        Ok(json!({"scenes": [{"scene_id": "scene_1"}]}).to_string()),
    ]);
    let events = run(&provider, settings(Duration::ZERO), request("groq")).await;

    let last = events.last().unwrap();
    assert_eq!(last.status, PipelineStatus::Error);
    assert!(last.message.as_deref().unwrap().contains("valid quest structure"));
    assert!(!statuses(&events).contains(&PipelineStatus::DetailingScene));
}

#[tokio::test]
async fn test_choice_count_mismatch_keeps_summaries() {
    let skeleton = json!({
        "start_scene": "scene_1",
        "scenes": [
            {"scene_id": "scene_1", "summary": "Crossroads", "choices": [
                {"choice_summary": "Go north", "next_scene": "scene_2"},
                {"choice_summary": "Go south", "next_scene": "scene_3"},
                {"choice_summary": "Go east", "next_scene": "scene_4"}
            ]},
            {"scene_id": "scene_2", "summary": "North"},
            {"scene_id": "scene_3", "summary": "South"},
            {"scene_id": "scene_4", "summary": "East"}
        ]
    });
    let provider = ScriptedProvider::new(vec![
        Ok("A concept.".to_string()),
        Ok("1. Crossroads\n2. North\n3. South\n4. East".to_string()),
        Ok(skeleton.to_string()),
        Ok(json!({"text": "Three roads.", "choices_text": ["Take the north road"]}).to_string()),
        Ok(json!({"text": "Snow."}).to_string()),
        Ok(json!({"text": "Sand."}).to_string()),
        Ok(json!({"text": "Sea."}).to_string()),
        Ok("not json at all".to_string()),
    ]);
    let events = run(&provider, settings(Duration::ZERO), request("openai")).await;

    let quest = events.last().unwrap().quest.clone().unwrap();
    let choices: Vec<&str> = quest.scenes[0].choices.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(choices, vec!["Take the north road", "Go south", "Go east"]);
}

#[tokio::test]
async fn test_unusable_detail_and_correction_are_repaired() {
    let provider = ScriptedProvider::new(vec![
        Ok("A keeper fights the sea.".to_string()),
        Ok("1. The storm\n2. The lamp".to_string()),
        Ok(two_scene_skeleton()),
        Ok("I cannot write JSON today.".to_string()),
        Ok(json!({"text": "The lamp flickers.", "choices_text": []}).to_string()),
        Ok("{}".to_string()),
    ]);
    let events = run(&provider, settings(Duration::ZERO), request("gemini")).await;

    let last = events.last().unwrap();
    assert_eq!(last.status, PipelineStatus::Done);
    let quest = last.quest.clone().unwrap();
    assert_eq!(quest.scenes[0].text, "The storm");
    assert_eq!(quest.scenes[0].choices[0].text, "Climb the tower");
    assert_eq!(quest.scenes[1].text, "The lamp flickers.");
}

#[tokio::test]
async fn test_dangling_edges_pruned_before_correcting() {
    let skeleton = json!({
        "start_scene": "scene_1",
        "scenes": [
            {"scene_id": "scene_1", "summary": "Gate", "choices": [
                {"choice_summary": "Enter", "next_scene": "scene_9"}
            ]},
            {"scene_id": "scene_2", "summary": "Orphan"}
        ]
    });
    let provider = ScriptedProvider::new(vec![
        Ok("A concept.".to_string()),
        Ok("1. Gate\n2. Orphan".to_string()),
        Ok(skeleton.to_string()),
        Ok(json!({"text": "A gate.", "choices_text": ["Enter"]}).to_string()),
        Ok(json!({"text": "Alone."}).to_string()),
        Ok("garbage".to_string()),
    ]);
    let events = run(&provider, settings(Duration::ZERO), request("groq")).await;

    let quest = events.last().unwrap().quest.clone().unwrap();
    assert_eq!(quest.scenes.len(), 1);
    assert!(quest.scenes[0].choices.is_empty());

    let correcting_prompt = provider.requests()[5].prompt().clone();
    assert!(!correcting_prompt.contains("Orphan"));
    assert!(!correcting_prompt.contains("scene_9"));
}

#[tokio::test]
async fn test_unknown_provider_single_error() {
    let provider = ScriptedProvider::new(vec![]);
    let events = run(&provider, settings(Duration::ZERO), request("foo")).await;

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].status, PipelineStatus::Error);
    assert_eq!(events[0].message.as_deref(), Some("Unknown API provider: foo"));
    assert!(provider.requests().is_empty());
}

#[tokio::test]
async fn test_local_disabled_single_error() {
    let provider = ScriptedProvider::new(vec![]);
    let events = run(&provider, settings(Duration::ZERO), request("local")).await;

    assert_eq!(events.len(), 1);
    assert_eq!(
        events[0].message.as_deref(),
        Some("Local model support is not enabled.")
    );
}

#[tokio::test]
async fn test_provider_failure_maps_to_user_message() {
    let provider = ScriptedProvider::new(vec![Err(ProviderError::new(
        ProviderErrorKind::Unauthorized("bad key".to_string()),
    ))]);
    let events = run(&provider, settings(Duration::ZERO), request("groq")).await;

    assert_eq!(
        statuses(&events),
        vec![PipelineStatus::Concept, PipelineStatus::Error]
    );
    assert_eq!(
        events[1].message.as_deref(),
        Some("Invalid API key. Please check your key.")
    );
}

#[tokio::test]
async fn test_cyclic_skeleton_terminates() {
    let skeleton = json!({
        "start_scene": "scene_1",
        "scenes": [
            {"scene_id": "scene_1", "summary": "Loop A", "choices": [
                {"choice_summary": "Forward", "next_scene": "scene_2"}
            ]},
            {"scene_id": "scene_2", "summary": "Loop B", "choices": [
                {"choice_summary": "Back", "next_scene": "scene_1"}
            ]}
        ]
    });
    let provider = ScriptedProvider::new(vec![
        Ok("A concept.".to_string()),
        Ok("1. Loop A\n2. Loop B".to_string()),
        Ok(skeleton.to_string()),
        Ok(json!({"text": "A.", "choices_text": ["Forward"]}).to_string()),
        Ok(json!({"text": "B.", "choices_text": ["Back"]}).to_string()),
        Ok("oops".to_string()),
    ]);
    let events = run(&provider, settings(Duration::ZERO), request("vps_proxy")).await;

    let quest = events.last().unwrap().quest.clone().unwrap();
    assert_eq!(quest.scenes.len(), 2);
    assert_eq!(quest.scenes[1].choices[0].next_scene, "scene_1");
}
