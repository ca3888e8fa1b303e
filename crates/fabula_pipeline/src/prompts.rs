//! Prompt builders, one per LLM-backed stage.
//!
//! Builders are pure: they format typed inputs into instruction text and
//! never truncate or validate. Constraints the model must honor (output
//! language, JSON-only output, acyclic graph) are restated in every prompt
//! that depends on them.

use fabula_core::PipelineParams;

/// Fixed technique descriptions for recognized narrative-element tags.
const NARRATIVE_TECHNIQUES: &[(&str, &str)] = &[
    (
        "plot_twist",
        "Include at least one unexpected plot twist that recasts earlier events in a new light.",
    ),
    (
        "foreshadowing",
        "Plant subtle hints in early scenes that pay off in later ones.",
    ),
    (
        "red_herring",
        "Introduce a misleading clue that points the player away from the truth.",
    ),
    (
        "moral_dilemma",
        "Confront the player with a choice between two competing values with no clearly right answer.",
    ),
    (
        "cliffhanger",
        "End key scenes on a moment of suspense that pulls the player forward.",
    ),
    (
        "chekhovs_gun",
        "Every significant object or detail introduced early must matter later.",
    ),
    (
        "unreliable_narrator",
        "Let the narration be subtly biased or mistaken, so the player must read between the lines.",
    ),
    (
        "time_pressure",
        "Create a sense of urgency: delays and hesitation have visible consequences.",
    ),
    (
        "multiple_endings",
        "Give the story several distinct endings that reflect the player's choices.",
    ),
    (
        "character_arc",
        "Let the protagonist change in a visible way depending on the path taken.",
    ),
];

fn technique_for(tag: &str) -> Option<&'static str> {
    let key: String = tag
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .filter(|c| *c != '\'')
        .collect();
    NARRATIVE_TECHNIQUES
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, description)| *description)
}

/// Requirement lines for narrative-element tags, in input order.
///
/// Recognized tags map to fixed technique descriptions; anything else is
/// passed through verbatim as a custom requirement.
///
/// # Examples
///
/// ```
/// use fabula_pipeline::prompts::narrative_requirements;
///
/// let lines = narrative_requirements(&["Red herring".to_string(), "a talking cat".to_string()]);
/// assert!(lines[0].contains("misleading clue"));
/// assert_eq!(lines[1], "Custom requirement: a talking cat");
/// ```
pub fn narrative_requirements(elements: &[String]) -> Vec<String> {
    elements
        .iter()
        .filter(|tag| !tag.trim().is_empty())
        .map(|tag| match technique_for(tag) {
            Some(description) => description.to_string(),
            None => format!("Custom requirement: {}", tag),
        })
        .collect()
}

fn style_block(params: &PipelineParams) -> String {
    let mut block = String::new();
    if !params.tone.trim().is_empty() {
        block.push_str(&format!("Tone: {}\n", params.tone.trim()));
    }
    if !params.pacing.trim().is_empty() {
        block.push_str(&format!("Pacing: {}\n", params.pacing.trim()));
    }
    let requirements = narrative_requirements(&params.narrative_elements);
    if !requirements.is_empty() {
        block.push_str("Narrative requirements:\n");
        for line in requirements {
            block.push_str(&format!("- {}\n", line));
        }
    }
    block
}

/// Stage 1: a free-text plot concept from the setting.
pub fn concept_prompt(setting: &str, params: &PipelineParams, language: &str) -> String {
    format!(
        "You are an experienced game writer designing a branching text quest.\n\
         \n\
         Setting:\n\
         {setting}\n\
         \n\
         Write a plot concept for a quest of about {count} scenes: the protagonist and their goal, \
         the central conflict, key characters and locations, the points where the story can \
         branch, and the different ways it can end.\n\
         {style}\n\
         Constraints:\n\
         - Respond in {language} only.\n\
         - Write plain prose. No lists, no JSON, no markdown headings.\n",
        setting = setting.trim(),
        count = params.scene_count,
        style = style_block(params),
        language = language,
    )
}

/// Stage 2: a flat numbered scene list from the concept.
pub fn architect_prompt(concept: &str, params: &PipelineParams, language: &str) -> String {
    format!(
        "You are a story architect. Break the plot concept below into about {count} scenes, \
         covering every branch and every ending it describes.\n\
         \n\
         Plot concept:\n\
         {concept}\n\
         \n\
         Output format:\n\
         - A flat numbered list with one scene per line: \"1. <one-sentence summary>\".\n\
         - No headings, no nested items, no commentary before or after the list.\n\
         - Write the summaries in {language} only.\n",
        count = params.scene_count,
        concept = concept.trim(),
        language = language,
    )
}

/// Stage 3: wire the scene list into a graph.
///
/// `scenes_json` is the serialized list of scene stubs.
pub fn director_prompt(scenes_json: &str, params: &PipelineParams, language: &str) -> String {
    format!(
        "You are a quest director. Connect the scenes below into a branching story graph.\n\
         \n\
         Scenes:\n\
         {scenes_json}\n\
         \n\
         Rules:\n\
         - Use the scene_id values exactly as given. Do not rename, add or remove scenes.\n\
         - Every scene that is not an ending gets 1 to 3 choices. Each choice has a \
         \"choice_summary\" and a \"next_scene\" that is one of the given scene_id values.\n\
         - Ending scenes have an empty \"choices\" list.\n\
         - The graph must be acyclic: no choice may lead back to a scene already visited.\n\
         - Every scene must be reachable from \"start_scene\".\n\
         {style}\n\
         Output strictly one JSON object and nothing else, shaped like:\n\
         {{\"start_scene\": \"scene_1\", \"scenes\": [{{\"scene_id\": \"scene_1\", \"summary\": \"...\", \
         \"choices\": [{{\"choice_summary\": \"...\", \"next_scene\": \"scene_2\"}}]}}]}}\n\
         Write every summary in {language} only.\n",
        scenes_json = scenes_json.trim(),
        style = style_block(params),
        language = language,
    )
}

/// Inputs for one detailing prompt.
#[derive(Debug, Clone, Copy)]
pub struct DetailContext<'a> {
    /// Plot concept, when available
    pub concept: Option<&'a str>,
    /// Summary of the scene to write
    pub summary: &'a str,
    /// Summaries of the scene's choices, in order
    pub choice_summaries: &'a [String],
    /// Full text of the parent scene, when already written
    pub previous_text: Option<&'a str>,
    /// The parent choice that leads into this scene
    pub player_action: Option<&'a str>,
    /// Creative parameters
    pub params: &'a PipelineParams,
    /// Output language
    pub language: &'a str,
}

/// Text used when a scene's parent has not been written yet.
pub const NO_PREVIOUS_TEXT: &str = "No previous text available.";

/// Stage 4: player-facing prose for one scene and its choices.
pub fn detail_prompt(context: &DetailContext<'_>) -> String {
    let concept = context
        .concept
        .map(|c| format!("Plot concept:\n{}\n\n", c.trim()))
        .unwrap_or_default();
    let action = context
        .player_action
        .filter(|a| !a.trim().is_empty())
        .unwrap_or("None. This is where the player arrives first or the action is unknown.");

    let choices = if context.choice_summaries.is_empty() {
        "This is an ending scene. It has no choices, so \"choices_text\" must be an empty list.\n"
            .to_string()
    } else {
        let mut listed = String::from("Choices to write, in this order:\n");
        for (i, summary) in context.choice_summaries.iter().enumerate() {
            listed.push_str(&format!("{}. {}\n", i + 1, summary));
        }
        listed
    };

    format!(
        "You are writing one scene of an interactive text quest.\n\
         \n\
         {concept}\
         Previous scene text:\n\
         {previous}\n\
         \n\
         Player action that led here: {action}\n\
         \n\
         This scene: {summary}\n\
         {choices}\
         {style}\n\
         Write the full scene text the player will read (two to four paragraphs) continuing \
         naturally from the previous scene, and one short player-facing line for each choice.\n\
         \n\
         Constraints:\n\
         - Respond in {language} only. Do not use words from other languages or scripts.\n\
         - \"choices_text\" must contain exactly {count} entries, in the order given.\n\
         - Output strictly one JSON object and nothing else: \
         {{\"text\": \"...\", \"choices_text\": [\"...\"]}}\n",
        concept = concept,
        previous = context.previous_text.unwrap_or(NO_PREVIOUS_TEXT).trim(),
        action = action.trim(),
        summary = context.summary.trim(),
        choices = choices,
        style = style_block(context.params),
        language = context.language,
        count = context.choice_summaries.len(),
    )
}

/// Stage 6: proofread the finished quest without touching its structure.
///
/// `quest_json` is the serialized validated quest.
pub fn correcting_prompt(quest_json: &str, language: &str) -> String {
    format!(
        "You are a meticulous proofreader. Below is a finished text quest as JSON.\n\
         \n\
         Fix only the following in the \"text\" fields:\n\
         - words in a foreign language or script (rewrite them in {language});\n\
         - typos and grammar mistakes.\n\
         \n\
         Do not change the structure: keep every key, every scene_id, every next_scene, \
         start_scene, and the order of scenes and choices exactly as they are. Do not add or \
         remove scenes or choices.\n\
         \n\
         Output strictly one JSON object and nothing else: the corrected quest.\n\
         \n\
         Quest:\n\
         {quest_json}\n",
        language = language,
        quest_json = quest_json.trim(),
    )
}
