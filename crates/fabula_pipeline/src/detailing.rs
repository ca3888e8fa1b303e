//! Per-scene working state for the detailing stage.

use crate::parsing::SceneDetail;
use fabula_core::{Choice, Quest, Scene, Skeleton};
use std::collections::HashMap;
use tracing::warn;

/// A skeleton choice with its player-facing text, once written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceRecord {
    /// Summary from the skeleton
    pub summary: String,
    /// Player-facing text
    pub text: Option<String>,
    /// Target scene id
    pub next_scene: String,
}

/// A skeleton scene with its prose, once written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneRecord {
    /// Scene identifier
    pub scene_id: String,
    /// Summary from the skeleton
    pub summary: String,
    /// Player-facing text
    pub text: Option<String>,
    /// Outgoing choices in skeleton order
    pub choices: Vec<ChoiceRecord>,
}

impl SceneRecord {
    /// Choice summaries in order, as sent to the detailing prompt.
    pub fn choice_summaries(&self) -> Vec<String> {
        self.choices.iter().map(|c| c.summary.clone()).collect()
    }
}

/// Scenes of one run, addressable by position and by id.
///
/// Records stay in skeleton order so detailing proceeds deterministically;
/// the id index lets a scene find its parent's text.
#[derive(Debug, Clone, Default)]
pub struct SceneArena {
    records: Vec<SceneRecord>,
    index: HashMap<String, usize>,
}

impl SceneArena {
    /// Build an arena from the director's skeleton.
    pub fn from_skeleton(skeleton: &Skeleton) -> Self {
        let records: Vec<SceneRecord> = skeleton
            .scenes
            .iter()
            .map(|scene| SceneRecord {
                scene_id: scene.scene_id.clone(),
                summary: scene.summary.clone(),
                text: None,
                choices: scene
                    .choices
                    .iter()
                    .map(|choice| ChoiceRecord {
                        summary: choice.choice_summary.clone(),
                        text: None,
                        next_scene: choice.next_scene.clone(),
                    })
                    .collect(),
            })
            .collect();

        let mut index = HashMap::new();
        for (i, record) in records.iter().enumerate() {
            index.entry(record.scene_id.clone()).or_insert(i);
        }
        Self { records, index }
    }

    /// Number of scenes.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the arena holds no scenes.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record at `position`.
    pub fn get(&self, position: usize) -> Option<&SceneRecord> {
        self.records.get(position)
    }

    /// Written text of scene `scene_id`, if it has been detailed.
    pub fn detailed_text(&self, scene_id: &str) -> Option<&str> {
        self.index
            .get(scene_id)
            .and_then(|&i| self.records[i].text.as_deref())
    }

    /// Merge one detailing result into the record at `position`.
    ///
    /// Choice texts are matched by position. Missing or blank entries fall
    /// back to the choice summary; extra entries are ignored. A missing scene
    /// text falls back to the scene summary.
    pub fn apply_detail(&mut self, position: usize, detail: SceneDetail) {
        let Some(record) = self.records.get_mut(position) else {
            return;
        };

        if detail.choices_text.len() != record.choices.len() {
            warn!(
                scene_id = %record.scene_id,
                expected = record.choices.len(),
                received = detail.choices_text.len(),
                "Choice count mismatch, filling from summaries"
            );
        }

        record.text = Some(
            detail
                .text
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| record.summary.clone()),
        );

        let mut texts = detail.choices_text.into_iter();
        for choice in &mut record.choices {
            let text = texts
                .next()
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| choice.summary.clone());
            choice.text = Some(text);
        }
    }

    /// Assemble the quest, using summaries wherever text is still missing.
    pub fn into_quest(self, start_scene: String) -> Quest {
        let scenes = self
            .records
            .into_iter()
            .map(|record| Scene {
                scene_id: record.scene_id,
                text: record.text.unwrap_or(record.summary),
                choices: record
                    .choices
                    .into_iter()
                    .map(|choice| Choice {
                        text: choice.text.unwrap_or(choice.summary),
                        next_scene: choice.next_scene,
                    })
                    .collect(),
            })
            .collect();
        Quest {
            start_scene,
            scenes,
        }
    }
}
