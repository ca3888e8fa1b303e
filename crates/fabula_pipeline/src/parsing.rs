//! Decoding of raw stage output into typed pipeline data.
//!
//! Payloads arrive here already stripped of markdown fences by the invoker.
//! Anything a model can plausibly get wrong in shape (keyed maps instead of
//! arrays, bare strings instead of objects, prose around the JSON) is
//! normalized before strict decoding.

use fabula_core::{Quest, SceneStub, Skeleton};
use fabula_error::{FabulaResult, PipelineError, PipelineErrorKind};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;
use tracing::{debug, error};

static NUMBERED_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)\s*[.)]\s*(.*)$").expect("valid numbered line pattern"));

/// Parse the architect's numbered list into scene stubs.
///
/// Only lines starting with a number followed by `.` or `)` count; headings,
/// blank lines and commentary are ignored. Stubs are numbered by position in
/// the output, not by the number the model wrote.
///
/// # Errors
///
/// Returns `EmptyExtraction` when no numbered line carries a summary.
///
/// # Examples
///
/// ```
/// use fabula_pipeline::parsing::parse_scene_list;
///
/// let stubs = parse_scene_list("Scenes:\n1. The storm\n2) The wreck\n").unwrap();
/// assert_eq!(stubs.len(), 2);
/// assert_eq!(stubs[1].scene_id, "scene_2");
/// assert_eq!(stubs[1].summary, "The wreck");
/// ```
pub fn parse_scene_list(text: &str) -> FabulaResult<Vec<SceneStub>> {
    let stubs: Vec<SceneStub> = text
        .lines()
        .filter_map(|line| NUMBERED_LINE.captures(line))
        .filter_map(|caps| {
            let summary = caps.get(2)?.as_str().trim();
            (!summary.is_empty()).then(|| summary.to_string())
        })
        .enumerate()
        .map(|(i, summary)| SceneStub {
            scene_id: format!("scene_{}", i + 1),
            summary,
        })
        .collect();

    if stubs.is_empty() {
        error!(raw = %text, "Architect output contained no numbered scenes");
        return Err(
            PipelineError::new(PipelineErrorKind::EmptyExtraction("architect".to_string())).into(),
        );
    }
    debug!(count = stubs.len(), "Parsed scene list");
    Ok(stubs)
}

/// Extract the first balanced `{ ... }` block, ignoring braces in strings.
fn extract_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in text[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[start..start + i + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

fn malformed(stage: &str, message: impl Into<String>) -> PipelineError {
    PipelineError::new(PipelineErrorKind::MalformedOutput {
        stage: stage.to_string(),
        message: message.into(),
    })
}

/// Decode a structured payload into a non-empty JSON object.
///
/// When the payload does not decode as a whole, the first balanced object
/// inside it is tried instead.
///
/// # Errors
///
/// Returns `MalformedOutput` when no JSON object can be decoded, or when the
/// decoded object is empty.
pub fn parse_structured(payload: &str, stage: &str) -> FabulaResult<Map<String, Value>> {
    let decoded = serde_json::from_str::<Value>(payload.trim()).or_else(|first| {
        extract_object(payload)
            .ok_or(first)
            .and_then(|block| serde_json::from_str::<Value>(block))
    });

    let value = match decoded {
        Ok(value) => value,
        Err(e) => {
            error!(stage, error = %e, raw = %payload, "Failed to decode stage output");
            return Err(malformed(stage, e.to_string()).into());
        }
    };

    match value {
        Value::Object(map) if !map.is_empty() => Ok(map),
        Value::Object(_) => {
            error!(stage, raw = %payload, "Stage output is an empty object");
            Err(malformed(stage, "empty JSON object").into())
        }
        other => {
            error!(stage, raw = %payload, "Stage output is not a JSON object");
            Err(malformed(stage, format!("expected a JSON object, got {}", kind_name(&other))).into())
        }
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Coerce a keyed scene map into an array, injecting each key as `scene_id`.
///
/// Arrays pass through. Bare string entries become `{scene_id, summary}`
/// objects. Objects that already carry a `scene_id` keep it.
///
/// # Examples
///
/// ```
/// use fabula_pipeline::parsing::normalize_scenes;
/// use serde_json::json;
///
/// let scenes = normalize_scenes(json!({"scene_1": {"choices": []}, "scene_2": "The end"}));
/// assert_eq!(scenes[0]["scene_id"], "scene_1");
/// assert_eq!(scenes[1]["summary"], "The end");
/// ```
pub fn normalize_scenes(scenes: Value) -> Value {
    let normalize_entry = |key: Option<String>, entry: Value| -> Value {
        match entry {
            Value::Object(mut fields) => {
                if let Some(key) = key {
                    let missing = fields
                        .get("scene_id")
                        .and_then(Value::as_str)
                        .is_none_or(|id| id.trim().is_empty());
                    if missing {
                        fields.insert("scene_id".to_string(), Value::String(key));
                    }
                }
                Value::Object(fields)
            }
            Value::String(summary) => {
                let mut fields = Map::new();
                fields.insert(
                    "scene_id".to_string(),
                    Value::String(key.unwrap_or_default()),
                );
                fields.insert("summary".to_string(), Value::String(summary));
                Value::Object(fields)
            }
            other => other,
        }
    };

    match scenes {
        Value::Object(map) => Value::Array(
            map.into_iter()
                .map(|(key, entry)| normalize_entry(Some(key), entry))
                .collect(),
        ),
        Value::Array(entries) => Value::Array(
            entries
                .into_iter()
                .map(|entry| normalize_entry(None, entry))
                .collect(),
        ),
        other => other,
    }
}

fn require_key(
    map: &mut Map<String, Value>,
    stage: &str,
    key: &str,
) -> Result<Value, PipelineError> {
    let missing = || {
        PipelineError::new(PipelineErrorKind::StructureError {
            stage: stage.to_string(),
            key: key.to_string(),
        })
    };
    match map.remove(key) {
        None | Some(Value::Null) => Err(missing()),
        Some(Value::String(s)) if s.trim().is_empty() => Err(missing()),
        Some(Value::Array(a)) if a.is_empty() => Err(missing()),
        Some(Value::Object(o)) if o.is_empty() => Err(missing()),
        Some(value) => Ok(value),
    }
}

fn decode_graph<T: serde::de::DeserializeOwned>(payload: &str, stage: &str) -> FabulaResult<T> {
    let mut map = parse_structured(payload, stage)?;
    let start_scene = require_key(&mut map, stage, "start_scene")?;
    let scenes = require_key(&mut map, stage, "scenes")?;

    let mut graph = Map::new();
    graph.insert("start_scene".to_string(), start_scene);
    graph.insert("scenes".to_string(), normalize_scenes(scenes));

    serde_json::from_value(Value::Object(graph)).map_err(|e| {
        error!(stage, error = %e, raw = %payload, "Stage output has the wrong shape");
        malformed(stage, e.to_string()).into()
    })
}

/// Decode the director's payload into a skeleton graph.
///
/// # Errors
///
/// Returns `MalformedOutput` for undecodable payloads and `StructureError`
/// when `start_scene` or `scenes` is missing or empty.
pub fn parse_skeleton(payload: &str) -> FabulaResult<Skeleton> {
    decode_graph(payload, "director")
}

/// Decode a full quest payload, as returned by the correcting stage.
///
/// # Errors
///
/// Same conditions as [`parse_skeleton`], reported against `stage`.
pub fn parse_quest(payload: &str, stage: &str) -> FabulaResult<Quest> {
    decode_graph(payload, stage)
}

/// Prose returned for one scene by the detailing stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SceneDetail {
    /// Scene text, if the model supplied a non-blank one
    pub text: Option<String>,
    /// Player-facing choice texts, positionally matched to the scene's choices
    pub choices_text: Vec<String>,
}

fn entry_text(entry: &Value) -> String {
    match entry {
        Value::String(s) => s.trim().to_string(),
        Value::Object(fields) => fields
            .get("text")
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Decode one detailing payload.
///
/// A missing `text` or `choices_text` is tolerated here; the caller falls
/// back to the skeleton summaries for whatever is absent.
///
/// # Errors
///
/// Returns `MalformedOutput` when the payload is not a JSON object.
pub fn parse_detail(payload: &str) -> FabulaResult<SceneDetail> {
    let map = parse_structured(payload, "detailing")?;

    let text = map
        .get("text")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    let choices_text = match map.get("choices_text").or_else(|| map.get("choices")) {
        Some(Value::Array(entries)) => entries.iter().map(entry_text).collect(),
        _ => Vec::new(),
    };

    Ok(SceneDetail { text, choices_text })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabula_error::FabulaErrorKind;

    fn pipeline_kind(err: &fabula_error::FabulaError) -> &PipelineErrorKind {
        match err.kind() {
            FabulaErrorKind::Pipeline(e) => &e.kind,
            other => panic!("expected pipeline error, got {:?}", other),
        }
    }

    #[test]
    fn test_scene_list_ignores_unnumbered_lines() {
        let text = "Here is the list:\n\n1. Arrival\n- a bullet\n   2.   The **market**\n3.\nNotes at the end";
        let stubs = parse_scene_list(text).unwrap();
        assert_eq!(
            stubs,
            vec![
                SceneStub {
                    scene_id: "scene_1".to_string(),
                    summary: "Arrival".to_string()
                },
                SceneStub {
                    scene_id: "scene_2".to_string(),
                    summary: "The **market**".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_scene_list_empty_is_error() {
        let err = parse_scene_list("No numbered lines at all.").unwrap_err();
        assert_eq!(
            pipeline_kind(&err),
            &PipelineErrorKind::EmptyExtraction("architect".to_string())
        );
    }

    #[test]
    fn test_structured_recovers_object_from_prose() {
        let map = parse_structured("Sure! {\"a\": \"{not a brace}\"} Hope that helps.", "director")
            .unwrap();
        assert_eq!(map["a"], "{not a brace}");
    }

    #[test]
    fn test_structured_rejects_array_and_empty() {
        for payload in ["[1, 2]", "{}", "not json"] {
            let err = parse_structured(payload, "director").unwrap_err();
            assert!(matches!(
                pipeline_kind(&err),
                PipelineErrorKind::MalformedOutput { .. }
            ));
        }
    }

    #[test]
    fn test_skeleton_keyed_map() {
        let payload = r#"{
            "start_scene": "scene_1",
            "scenes": {
                "scene_1": {"summary": "Gate", "choices": [{"choice_summary": "Enter", "next_scene": "scene_2"}]},
                "scene_2": "Courtyard"
            }
        }"#;
        let skeleton = parse_skeleton(payload).unwrap();
        assert_eq!(skeleton.scenes.len(), 2);
        assert_eq!(skeleton.scenes[0].scene_id, "scene_1");
        assert_eq!(skeleton.scenes[1].summary, "Courtyard");
        assert!(skeleton.scenes[1].choices.is_empty());
    }

    #[test]
    fn test_skeleton_missing_keys() {
        let err = parse_skeleton(r#"{"scenes": [{"scene_id": "a"}]}"#).unwrap_err();
        assert_eq!(
            pipeline_kind(&err),
            &PipelineErrorKind::StructureError {
                stage: "director".to_string(),
                key: "start_scene".to_string()
            }
        );

        let err = parse_skeleton(r#"{"start_scene": "a", "scenes": []}"#).unwrap_err();
        assert!(matches!(
            pipeline_kind(&err),
            PipelineErrorKind::StructureError { key, .. } if key == "scenes"
        ));
    }

    #[test]
    fn test_detail_tolerates_missing_fields() {
        let detail = parse_detail(r#"{"text": "  "}"#).unwrap();
        assert_eq!(detail, SceneDetail::default());

        let detail =
            parse_detail(r#"{"text": "Rain.", "choices_text": ["Run", {"text": "Hide"}, null]}"#)
                .unwrap();
        assert_eq!(detail.text.as_deref(), Some("Rain."));
        assert_eq!(detail.choices_text, vec!["Run", "Hide", ""]);
    }

    #[test]
    fn test_quest_reports_stage() {
        let err = parse_quest(r#"{"start_scene": "a"}"#, "correcting").unwrap_err();
        assert!(matches!(
            pipeline_kind(&err),
            PipelineErrorKind::StructureError { stage, .. } if stage == "correcting"
        ));
    }
}
