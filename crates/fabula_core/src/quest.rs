//! The terminal quest graph.

use crate::serde_helpers::{string_or_null, vec_or_null};
use serde::{Deserialize, Serialize};

/// A player-facing edge from one scene to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    /// Text shown to the player
    #[serde(default, deserialize_with = "string_or_null")]
    pub text: String,
    /// Target scene id
    #[serde(default, deserialize_with = "string_or_null")]
    pub next_scene: String,
}

/// One node of the quest graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    /// Stable scene identifier (`scene_<n>`)
    pub scene_id: String,
    /// Narrative text shown to the player
    #[serde(default, deserialize_with = "string_or_null")]
    pub text: String,
    /// Outgoing choices, in display order
    #[serde(default, deserialize_with = "vec_or_null")]
    pub choices: Vec<Choice>,
}

/// The branching narrative delivered to the end user.
///
/// # Examples
///
/// ```
/// use fabula_core::Quest;
///
/// let quest: Quest = serde_json::from_str(
///     r#"{"start_scene":"a","scenes":[{"scene_id":"a","choices":[{"next_scene":"b"}]}]}"#,
/// ).unwrap();
/// assert_eq!(quest.scenes[0].choices[0].text, "");
/// assert!(quest.scene("a").is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quest {
    /// Scene the player starts in
    pub start_scene: String,
    /// All scenes, in declaration order
    #[serde(default, deserialize_with = "vec_or_null")]
    pub scenes: Vec<Scene>,
}

impl Quest {
    /// Look up a scene by id.
    pub fn scene(&self, scene_id: &str) -> Option<&Scene> {
        self.scenes.iter().find(|scene| scene.scene_id == scene_id)
    }
}
