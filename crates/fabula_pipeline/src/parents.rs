//! Parent lookup for detailing context.

use fabula_core::SkeletonScene;
use std::collections::HashMap;

/// The scene and choice through which the player first arrives somewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentLink {
    /// Id of the scene holding the choice
    pub parent_id: String,
    /// Summary of the choice that leads here
    pub choice_summary: String,
}

/// Maps each scene to a single parent edge.
///
/// A scene with several incoming edges gets the first one in declaration
/// order (scene order, then choice order). Self-edges are ignored.
#[derive(Debug, Clone, Default)]
pub struct ParentMap {
    links: HashMap<String, ParentLink>,
}

impl ParentMap {
    /// Build the map from skeleton scenes.
    pub fn build(scenes: &[SkeletonScene]) -> Self {
        let mut links = HashMap::new();
        for scene in scenes {
            for choice in &scene.choices {
                if choice.next_scene.is_empty() || choice.next_scene == scene.scene_id {
                    continue;
                }
                links
                    .entry(choice.next_scene.clone())
                    .or_insert_with(|| ParentLink {
                        parent_id: scene.scene_id.clone(),
                        choice_summary: choice.choice_summary.clone(),
                    });
            }
        }
        Self { links }
    }

    /// Parent edge of `scene_id`, if any scene leads to it.
    pub fn parent_of(&self, scene_id: &str) -> Option<&ParentLink> {
        self.links.get(scene_id)
    }
}
