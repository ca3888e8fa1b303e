//! One-call-at-a-time access to the stage prompts.
//!
//! An operator supplies each stage's prior output by hand and gets back the
//! next prompt to send. Parsing goes through the same functions as the
//! automated run, so a quest built by hand is shaped identically.

use crate::parents::ParentMap;
use crate::parsing;
use crate::prompts::{self, DetailContext};
use crate::prune_unreachable;
use fabula_core::PipelineParams;
use fabula_error::{FabulaResult, JsonError, PipelineError, PipelineErrorKind};
use fabula_models::unwrap_fenced;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// LLM-backed stages an operator can request a prompt for.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ManualStep {
    /// Needs `setting`
    Concept,
    /// Needs `concept`
    Architect,
    /// Needs `scene_list`
    Director,
    /// Needs `skeleton`; optional `scene_id`, `detailed_texts`, `concept`
    Detailing,
    /// Needs `quest`
    Correcting,
}

/// A single-step request.
///
/// `state` carries prior stage outputs plus the creative parameters
/// (`scene_count`, `tone`, `pacing`, `narrative_elements`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualRequest {
    /// Stage to build a prompt for
    pub step: ManualStep,
    /// Accumulated state
    #[serde(default)]
    pub state: Value,
}

/// The prompt for the requested step and what comes after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualPrompt {
    /// Prompt text to send to the model
    pub prompt: String,
    /// Step to request next (`done` after correcting)
    pub next_step: String,
    /// Scene to detail next, while detailing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_scene_id: Option<String>,
}

fn missing(step: ManualStep, field: &str) -> PipelineError {
    PipelineError::new(PipelineErrorKind::MissingState {
        step: step.to_string(),
        field: field.to_string(),
    })
}

fn required<'a>(state: &'a Value, step: ManualStep, field: &str) -> Result<&'a Value, PipelineError> {
    match state.get(field) {
        None | Some(Value::Null) => Err(missing(step, field)),
        Some(Value::String(s)) if s.trim().is_empty() => Err(missing(step, field)),
        Some(value) => Ok(value),
    }
}

fn required_text<'a>(state: &'a Value, step: ManualStep, field: &str) -> Result<&'a str, PipelineError> {
    required(state, step, field)?
        .as_str()
        .ok_or_else(|| missing(step, field))
}

/// Raw model output as text, or a hand-built object re-serialized.
fn graph_payload(value: &Value) -> FabulaResult<String> {
    match value {
        Value::String(raw) => Ok(unwrap_fenced(raw).to_string()),
        other => serde_json::to_string(other).map_err(|e| JsonError::new(e.to_string()).into()),
    }
}

fn to_pretty_json<T: Serialize>(value: &T) -> FabulaResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| JsonError::new(e.to_string()).into())
}

/// Build the prompt for one step from operator-supplied state.
///
/// # Errors
///
/// Returns `MissingState` when a required field is absent, and the usual
/// parse errors when a prior stage's output cannot be used.
///
/// # Examples
///
/// ```
/// use fabula_pipeline::{ManualRequest, ManualStep, build_step};
/// use serde_json::json;
///
/// let request = ManualRequest {
///     step: ManualStep::Director,
///     state: json!({"scene_list": "1. The gate\n2. The hall", "scene_count": 2}),
/// };
/// let step = build_step(&request, "English").unwrap();
/// assert!(step.prompt.contains("scene_2"));
/// assert_eq!(step.next_step, "detailing");
/// ```
pub fn build_step(request: &ManualRequest, language: &str) -> FabulaResult<ManualPrompt> {
    let step = request.step;
    let state = &request.state;
    if !state.is_object() {
        return Err(missing(step, "state").into());
    }
    let params: PipelineParams =
        serde_json::from_value(state.clone()).map_err(|e| JsonError::new(e.to_string()))?;
    debug!(%step, "Building manual step");

    let simple = |prompt: String, next: ManualStep| ManualPrompt {
        prompt,
        next_step: next.to_string(),
        next_scene_id: None,
    };

    match step {
        ManualStep::Concept => {
            let setting = required_text(state, step, "setting")?;
            Ok(simple(
                prompts::concept_prompt(setting, &params, language),
                ManualStep::Architect,
            ))
        }
        ManualStep::Architect => {
            let concept = required_text(state, step, "concept")?;
            Ok(simple(
                prompts::architect_prompt(concept, &params, language),
                ManualStep::Director,
            ))
        }
        ManualStep::Director => {
            let list = required_text(state, step, "scene_list")?;
            let stubs = parsing::parse_scene_list(unwrap_fenced(list))?;
            Ok(simple(
                prompts::director_prompt(&to_pretty_json(&stubs)?, &params, language),
                ManualStep::Detailing,
            ))
        }
        ManualStep::Detailing => detailing_step(state, &params, language),
        ManualStep::Correcting => {
            let payload = graph_payload(required(state, step, "quest")?)?;
            let quest = prune_unreachable(parsing::parse_quest(&payload, "correcting")?);
            Ok(ManualPrompt {
                prompt: prompts::correcting_prompt(&to_pretty_json(&quest)?, language),
                next_step: "done".to_string(),
                next_scene_id: None,
            })
        }
    }
}

fn detailing_step(
    state: &Value,
    params: &PipelineParams,
    language: &str,
) -> FabulaResult<ManualPrompt> {
    let step = ManualStep::Detailing;
    let payload = graph_payload(required(state, step, "skeleton")?)?;
    let skeleton = parsing::parse_skeleton(&payload)?;
    let parents = ParentMap::build(&skeleton.scenes);

    let position = match state.get("scene_id").and_then(Value::as_str) {
        Some(id) => skeleton
            .scenes
            .iter()
            .position(|scene| scene.scene_id == id)
            .ok_or_else(|| missing(step, "scene_id"))?,
        None => 0,
    };
    let scene = skeleton
        .scenes
        .get(position)
        .ok_or_else(|| missing(step, "skeleton"))?;

    let parent = parents.parent_of(&scene.scene_id);
    let previous_text = parent.and_then(|p| {
        state
            .get("detailed_texts")
            .and_then(|texts| texts.get(&p.parent_id))
            .and_then(Value::as_str)
            .filter(|text| !text.trim().is_empty())
    });
    let choice_summaries: Vec<String> = scene
        .choices
        .iter()
        .map(|c| c.choice_summary.clone())
        .collect();

    let prompt = prompts::detail_prompt(&DetailContext {
        concept: state.get("concept").and_then(Value::as_str),
        summary: &scene.summary,
        choice_summaries: &choice_summaries,
        previous_text,
        player_action: parent.map(|p| p.choice_summary.as_str()),
        params,
        language,
    });

    let next_scene_id = skeleton
        .scenes
        .get(position + 1)
        .map(|next| next.scene_id.clone());
    let next_step = if next_scene_id.is_some() {
        ManualStep::Detailing.to_string()
    } else {
        ManualStep::Correcting.to_string()
    };

    Ok(ManualPrompt {
        prompt,
        next_step,
        next_scene_id,
    })
}
