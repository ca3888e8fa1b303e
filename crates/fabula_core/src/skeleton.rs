//! Intermediate graph shapes produced before detailing.

use crate::serde_helpers::{string_or_null, vec_or_null};
use serde::{Deserialize, Serialize};

/// One entry of the architect's flat scene list.
///
/// `scene_id` is assigned from list position, never by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneStub {
    /// Positional identifier (`scene_1`, `scene_2`, ...)
    pub scene_id: String,
    /// One-line summary of what happens in the scene
    pub summary: String,
}

/// An edge of the skeleton graph, described but not yet written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkeletonChoice {
    /// What the player does, in summary form
    #[serde(default, deserialize_with = "string_or_null")]
    pub choice_summary: String,
    /// Target scene id
    #[serde(default, deserialize_with = "string_or_null")]
    pub next_scene: String,
}

/// A scene with structure but no player-facing prose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkeletonScene {
    /// Scene identifier copied from the stub list
    pub scene_id: String,
    /// Summary copied or refined from the stub list
    #[serde(default, deserialize_with = "string_or_null")]
    pub summary: String,
    /// Outgoing edges
    #[serde(default, deserialize_with = "vec_or_null")]
    pub choices: Vec<SkeletonChoice>,
}

/// The director's graph: ids and edges, no final prose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skeleton {
    /// Scene the player starts in
    pub start_scene: String,
    /// Scenes in declaration order
    pub scenes: Vec<SkeletonScene>,
}
