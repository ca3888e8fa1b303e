//! The six-stage generation state machine.

use crate::detailing::SceneArena;
use crate::parents::ParentMap;
use crate::parsing::{self, SceneDetail};
use crate::prompts::{self, DetailContext};
use crate::{describe_failure, prune_unreachable};
use async_stream::stream;
use fabula_core::{
    GenerationRequest, PipelineParams, PipelineStatus, ProgressEvent, ProviderKind, Quest,
    SceneStub,
};
use fabula_error::{FabulaResult, JsonError, PipelineError, PipelineErrorKind};
use fabula_interface::ProviderFactory;
use fabula_models::LlmInvoker;
use fabula_rate_limit::{FabulaConfig, RetryPolicy};
use futures_util::Stream;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Lazy stream of progress events ending in exactly one `done` or `error`.
pub type ProgressStream = Pin<Box<dyn Stream<Item = ProgressEvent> + Send>>;

/// Tunables for a generation run.
#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    /// Pause before every LLM call after the first
    pub stage_delay: Duration,
    /// Natural language the quest is written in
    pub language: String,
    /// Sampling temperature sent with every call
    pub temperature: f32,
    /// Transient-failure retry policy
    pub retry: RetryPolicy,
    /// Prune the corrected quest a second time
    pub revalidate_corrected: bool,
}

impl From<&FabulaConfig> for GeneratorSettings {
    fn from(config: &FabulaConfig) -> Self {
        Self {
            stage_delay: config.pipeline.stage_delay(),
            language: config.pipeline.language.clone(),
            temperature: config.pipeline.temperature,
            retry: RetryPolicy::from(&config.retry),
            revalidate_corrected: config.pipeline.revalidate_corrected,
        }
    }
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self::from(&FabulaConfig::default())
    }
}

/// Drives the concept → architect → director → detailing → validating →
/// correcting sequence for one request at a time.
///
/// Every call to [`generate`](Self::generate) owns its own state; a single
/// generator can serve concurrent requests.
///
/// # Example
///
/// ```no_run
/// use fabula_core::GenerationRequest;
/// use fabula_models::DefaultProviderFactory;
/// use fabula_pipeline::{GeneratorSettings, QuestGenerator};
/// use fabula_rate_limit::FabulaConfig;
/// use futures_util::StreamExt;
/// use std::sync::Arc;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let config = FabulaConfig::load()?;
/// let factory = Arc::new(DefaultProviderFactory::new(&config.providers, &config.local));
/// let generator = QuestGenerator::new(factory, GeneratorSettings::from(&config));
///
/// let request = GenerationRequest::builder()
///     .setting("A lighthouse on a cursed shore")
///     .api_key("gsk_...")
///     .api_provider("groq")
///     .model("llama-3.1-8b-instant")
///     .build()?;
///
/// let mut events = generator.generate(request);
/// while let Some(event) = events.next().await {
///     println!("{}", serde_json::to_string(&event)?);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct QuestGenerator {
    factory: Arc<dyn ProviderFactory>,
    settings: GeneratorSettings,
}

impl std::fmt::Debug for QuestGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuestGenerator")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl QuestGenerator {
    /// Create a generator that builds providers with `factory`.
    pub fn new(factory: Arc<dyn ProviderFactory>, settings: GeneratorSettings) -> Self {
        Self { factory, settings }
    }

    /// Settings applied to every run.
    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    /// Start a run and return its progress stream.
    ///
    /// Nothing happens until the stream is polled. Each stage announces
    /// itself before its LLM call starts; a failure anywhere ends the stream
    /// with a single `error` event. Dropping the stream abandons the run.
    pub fn generate(&self, request: GenerationRequest) -> ProgressStream {
        let factory = Arc::clone(&self.factory);
        let settings = self.settings.clone();

        Box::pin(stream! {
            let provider = request.api_provider.clone();
            let model = request.model.clone();
            info!(
                provider = %provider,
                model = %model,
                scene_count = request.params.scene_count,
                "Quest generation started"
            );

            match PipelineRun::start(factory.as_ref(), &settings, request) {
                Err(e) => {
                    error!(error = %e, provider = %provider, "Could not start generation");
                    yield ProgressEvent::error(describe_failure(&e, &provider, &model));
                }
                Ok(mut run) => loop {
                    if let Some(event) = run.announce() {
                        yield event;
                    }
                    match run.advance().await {
                        Ok(Some(quest)) => {
                            info!(scenes = quest.scenes.len(), "Quest generation finished");
                            yield ProgressEvent::done(quest);
                            break;
                        }
                        Ok(None) => {}
                        Err(e) => {
                            error!(error = %e, provider = %provider, model = %model, "Quest generation failed");
                            yield ProgressEvent::error(describe_failure(&e, &provider, &model));
                            break;
                        }
                    }
                },
            }
        })
    }
}

enum Stage {
    Concept,
    Architect,
    Director {
        stubs: Vec<SceneStub>,
    },
    Detailing {
        start_scene: String,
        arena: SceneArena,
        parents: ParentMap,
        next: usize,
    },
    Validating {
        quest: Quest,
    },
    Correcting {
        quest: Quest,
    },
    Finished,
}

/// State owned by one generation run.
struct PipelineRun {
    invoker: LlmInvoker,
    model: String,
    setting: String,
    params: PipelineParams,
    language: String,
    stage_delay: Duration,
    revalidate_corrected: bool,
    concept: Option<String>,
    calls_made: usize,
    stage: Stage,
}

impl PipelineRun {
    fn start(
        factory: &dyn ProviderFactory,
        settings: &GeneratorSettings,
        request: GenerationRequest,
    ) -> FabulaResult<Self> {
        let kind = ProviderKind::parse(&request.api_provider)?;
        let provider = factory.create(kind, &request.api_key)?;
        let invoker =
            LlmInvoker::new(provider, settings.retry).with_temperature(settings.temperature);

        Ok(Self {
            invoker,
            model: request.model,
            setting: request.setting,
            params: request.params,
            language: settings.language.clone(),
            stage_delay: settings.stage_delay,
            revalidate_corrected: settings.revalidate_corrected,
            concept: None,
            calls_made: 0,
            stage: Stage::Concept,
        })
    }

    /// Progress event for the stage about to run.
    fn announce(&self) -> Option<ProgressEvent> {
        let event = match &self.stage {
            Stage::Concept => {
                ProgressEvent::stage(PipelineStatus::Concept, "Generating the plot concept")
            }
            Stage::Architect => {
                ProgressEvent::stage(PipelineStatus::Architect, "Breaking the plot into scenes")
            }
            Stage::Director { stubs } => ProgressEvent::stage(
                PipelineStatus::Director,
                format!("Connecting {} scenes into a story graph", stubs.len()),
            ),
            Stage::Detailing { arena, next, .. } => ProgressEvent::stage(
                PipelineStatus::DetailingScene,
                format!("Writing scene {} of {}", next + 1, arena.len()),
            ),
            Stage::Validating { .. } => {
                ProgressEvent::stage(PipelineStatus::Validating, "Checking the quest structure")
            }
            Stage::Correcting { .. } => {
                ProgressEvent::stage(PipelineStatus::Correcting, "Proofreading the quest")
            }
            Stage::Finished => return None,
        };
        Some(event)
    }

    /// One LLM call, paced after the first.
    async fn call(&mut self, prompt: &str, structured: bool) -> FabulaResult<String> {
        if self.calls_made > 0 && !self.stage_delay.is_zero() {
            tokio::time::sleep(self.stage_delay).await;
        }
        self.calls_made += 1;
        Ok(self.invoker.invoke(prompt, &self.model, structured).await?)
    }

    /// Run the current stage. Returns the quest once the last stage is done.
    async fn advance(&mut self) -> FabulaResult<Option<Quest>> {
        match std::mem::replace(&mut self.stage, Stage::Finished) {
            Stage::Concept => {
                let prompt = prompts::concept_prompt(&self.setting, &self.params, &self.language);
                let concept = self.call(&prompt, false).await?;
                debug!(len = concept.len(), "Concept ready");
                self.concept = Some(concept);
                self.stage = Stage::Architect;
            }
            Stage::Architect => {
                let concept = self.concept.clone().unwrap_or_default();
                let prompt = prompts::architect_prompt(&concept, &self.params, &self.language);
                let list = self.call(&prompt, false).await?;
                let stubs = parsing::parse_scene_list(&list)?;
                info!(scenes = stubs.len(), "Scene list extracted");
                self.stage = Stage::Director { stubs };
            }
            Stage::Director { stubs } => {
                let stubs_json = serde_json::to_string_pretty(&stubs)
                    .map_err(|e| JsonError::new(e.to_string()))?;
                let prompt = prompts::director_prompt(&stubs_json, &self.params, &self.language);
                let payload = self.call(&prompt, true).await?;
                let skeleton = parsing::parse_skeleton(&payload)?;

                let arena = SceneArena::from_skeleton(&skeleton);
                if arena.is_empty() {
                    return Err(PipelineError::new(PipelineErrorKind::StructureError {
                        stage: "director".to_string(),
                        key: "scenes".to_string(),
                    })
                    .into());
                }
                let parents = ParentMap::build(&skeleton.scenes);
                info!(
                    scenes = arena.len(),
                    start_scene = %skeleton.start_scene,
                    "Skeleton built"
                );
                self.stage = Stage::Detailing {
                    start_scene: skeleton.start_scene,
                    arena,
                    parents,
                    next: 0,
                };
            }
            Stage::Detailing {
                start_scene,
                mut arena,
                parents,
                next,
            } => {
                let detail = self.detail_scene(&arena, &parents, next).await?;
                arena.apply_detail(next, detail);

                self.stage = if next + 1 < arena.len() {
                    Stage::Detailing {
                        start_scene,
                        arena,
                        parents,
                        next: next + 1,
                    }
                } else {
                    Stage::Validating {
                        quest: arena.into_quest(start_scene),
                    }
                };
            }
            Stage::Validating { quest } => {
                let quest = prune_unreachable(quest);
                if quest.scenes.is_empty() {
                    return Err(PipelineError::new(PipelineErrorKind::UnreachableStart(
                        quest.start_scene,
                    ))
                    .into());
                }
                self.stage = Stage::Correcting { quest };
            }
            Stage::Correcting { quest } => {
                let quest_json = serde_json::to_string_pretty(&quest)
                    .map_err(|e| JsonError::new(e.to_string()))?;
                let prompt = prompts::correcting_prompt(&quest_json, &self.language);
                let payload = self.call(&prompt, true).await?;
                return Ok(Some(self.accept_correction(&payload, quest)));
            }
            Stage::Finished => {}
        }
        Ok(None)
    }

    async fn detail_scene(
        &mut self,
        arena: &SceneArena,
        parents: &ParentMap,
        position: usize,
    ) -> FabulaResult<SceneDetail> {
        let Some(record) = arena.get(position) else {
            return Ok(SceneDetail::default());
        };
        let parent = parents.parent_of(&record.scene_id);
        let previous_text = parent.and_then(|p| arena.detailed_text(&p.parent_id));
        let choice_summaries = record.choice_summaries();

        let prompt = prompts::detail_prompt(&DetailContext {
            concept: self.concept.as_deref(),
            summary: &record.summary,
            choice_summaries: &choice_summaries,
            previous_text,
            player_action: parent.map(|p| p.choice_summary.as_str()),
            params: &self.params,
            language: &self.language,
        });
        let scene_id = record.scene_id.clone();
        let payload = self.call(&prompt, true).await?;

        match parsing::parse_detail(&payload) {
            Ok(detail) => Ok(detail),
            Err(e) => {
                warn!(scene_id = %scene_id, error = %e, "Unusable scene detail, keeping summaries");
                Ok(SceneDetail::default())
            }
        }
    }

    /// The corrected quest, or the validated one when the correction is unusable.
    fn accept_correction(&self, payload: &str, validated: Quest) -> Quest {
        let corrected = match parsing::parse_quest(payload, "correcting") {
            Ok(quest) => quest,
            Err(e) => {
                warn!(error = %e, "Unusable correction, keeping the validated quest");
                return validated;
            }
        };

        if !self.revalidate_corrected {
            return corrected;
        }
        let pruned = prune_unreachable(corrected);
        if pruned.scenes.is_empty() {
            warn!("Correction broke the graph, keeping the validated quest");
            validated
        } else {
            pruned
        }
    }
}
