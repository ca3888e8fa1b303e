//! Progress events streamed to pipeline callers.

use crate::Quest;
use serde::{Deserialize, Serialize};

/// Pipeline state reported by a progress event.
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
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PipelineStatus {
    /// Generating the plot concept
    Concept,
    /// Breaking the concept into a scene list
    Architect,
    /// Wiring scenes into a graph
    Director,
    /// Writing prose for one scene
    DetailingScene,
    /// Pruning the graph
    Validating,
    /// Final proofreading pass
    Correcting,
    /// Terminal success
    Done,
    /// Terminal failure
    Error,
}

impl PipelineStatus {
    /// Whether this status ends the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }
}

/// One line of the progress stream.
///
/// # Examples
///
/// ```
/// use fabula_core::{PipelineStatus, ProgressEvent};
///
/// let event = ProgressEvent::stage(PipelineStatus::DetailingScene, "Detailing scene 1 of 3");
/// let line = serde_json::to_string(&event).unwrap();
/// assert_eq!(line, r#"{"status":"detailing_scene","message":"Detailing scene 1 of 3"}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Current pipeline state
    pub status: PipelineStatus,
    /// Human-readable progress or error message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Final quest, present only on `done`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quest: Option<Quest>,
}

impl ProgressEvent {
    /// A non-terminal stage announcement.
    pub fn stage(status: PipelineStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: Some(message.into()),
            quest: None,
        }
    }

    /// The terminal success event.
    pub fn done(quest: Quest) -> Self {
        Self {
            status: PipelineStatus::Done,
            message: None,
            quest: Some(quest),
        }
    }

    /// The terminal failure event.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: PipelineStatus::Error,
            message: Some(message.into()),
            quest: None,
        }
    }

    /// Whether this event ends the stream.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
