//! Graph pruning: keep only what the player can reach.

use fabula_core::Quest;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, info};

/// Remove unreachable scenes and choices that point outside the graph.
///
/// Traversal is breadth-first from `start_scene` and follows only choices
/// whose target is a declared scene, so cycles terminate and dangling edges
/// never pull phantom ids into the result. When an id is declared twice the
/// first declaration wins. Surviving scenes keep their original order.
///
/// # Examples
///
/// ```
/// use fabula_core::Quest;
/// use fabula_pipeline::prune_unreachable;
///
/// let quest: Quest = serde_json::from_str(r#"{
///     "start_scene": "a",
///     "scenes": [
///         {"scene_id": "a", "text": "A", "choices": [{"text": "go", "next_scene": "b"}, {"text": "x", "next_scene": "z"}]},
///         {"scene_id": "b", "text": "B", "choices": []},
///         {"scene_id": "c", "text": "C", "choices": []}
///     ]
/// }"#).unwrap();
///
/// let pruned = prune_unreachable(quest);
/// let ids: Vec<_> = pruned.scenes.iter().map(|s| s.scene_id.as_str()).collect();
/// assert_eq!(ids, ["a", "b"]);
/// assert_eq!(pruned.scenes[0].choices.len(), 1);
/// ```
pub fn prune_unreachable(quest: Quest) -> Quest {
    let Quest {
        start_scene,
        scenes,
    } = quest;

    let mut first_index: HashMap<&str, usize> = HashMap::new();
    for (i, scene) in scenes.iter().enumerate() {
        first_index.entry(scene.scene_id.as_str()).or_insert(i);
    }

    let mut reachable: HashSet<usize> = HashSet::new();
    let mut queue: VecDeque<usize> = VecDeque::new();
    if let Some(&start) = first_index.get(start_scene.as_str()) {
        reachable.insert(start);
        queue.push_back(start);
    }
    while let Some(current) = queue.pop_front() {
        for choice in &scenes[current].choices {
            if let Some(&next) = first_index.get(choice.next_scene.as_str()) {
                if reachable.insert(next) {
                    queue.push_back(next);
                }
            }
        }
    }

    let kept_ids: HashSet<String> = reachable
        .iter()
        .map(|&i| scenes[i].scene_id.clone())
        .collect();
    let declared = scenes.len();

    let mut dropped_choices = 0usize;
    let pruned: Vec<_> = scenes
        .into_iter()
        .enumerate()
        .filter(|(i, _)| reachable.contains(i))
        .map(|(_, mut scene)| {
            let before = scene.choices.len();
            scene
                .choices
                .retain(|choice| kept_ids.contains(&choice.next_scene));
            dropped_choices += before - scene.choices.len();
            scene
        })
        .collect();

    if pruned.len() < declared || dropped_choices > 0 {
        info!(
            declared,
            kept = pruned.len(),
            dropped_choices,
            "Pruned quest graph"
        );
    } else {
        debug!(scenes = declared, "Quest graph fully reachable");
    }

    Quest {
        start_scene,
        scenes: pruned,
    }
}
