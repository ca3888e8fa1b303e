//! Quest generation and manual step handlers.

use super::commands::GenerateArgs;
use super::input::{api_key_for, read_input};
use fabula::{
    DefaultProviderFactory, FabulaConfig, GenerationRequest, GeneratorSettings, JsonError,
    ManualRequest, ManualStep, PipelineParams, PipelineStatus, QuestGenerator, build_step,
};
use futures_util::StreamExt;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument};

fn request_from_args(args: GenerateArgs) -> Result<GenerationRequest, Box<dyn std::error::Error>> {
    if let Some(path) = &args.request {
        let mut request: GenerationRequest = serde_json::from_str(&read_input(path)?)
            .map_err(|e| JsonError::new(format!("Invalid generation request: {}", e)))?;
        if request.api_key.is_empty() {
            request.api_key = api_key_for(&request.api_provider, None);
        }
        return Ok(request);
    }

    let provider = args.provider.unwrap_or_default();
    let defaults = PipelineParams::default();
    let params = PipelineParams {
        scene_count: args.scene_count.unwrap_or(defaults.scene_count),
        tone: args.tone.unwrap_or_default(),
        pacing: args.pacing.unwrap_or_default(),
        narrative_elements: args.elements,
    };

    Ok(GenerationRequest::builder()
        .setting(args.setting.unwrap_or_default())
        .api_key(api_key_for(&provider, args.api_key))
        .api_provider(provider)
        .model(args.model.unwrap_or_default())
        .params(params)
        .build()?)
}

/// Run the pipeline, writing one JSON event per line to stdout.
///
/// Returns whether the run ended in `done`.
#[instrument(skip_all)]
pub async fn run_generate(
    args: GenerateArgs,
    config: &FabulaConfig,
) -> Result<bool, Box<dyn std::error::Error>> {
    let request = request_from_args(args)?;
    let factory = Arc::new(DefaultProviderFactory::new(&config.providers, &config.local));
    let generator = QuestGenerator::new(factory, GeneratorSettings::from(config));

    let mut events = generator.generate(request);
    let mut succeeded = false;
    while let Some(event) = events.next().await {
        let line = serde_json::to_string(&event)?;
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", line)?;
        stdout.flush()?;
        if event.is_terminal() {
            succeeded = event.status == PipelineStatus::Done;
        }
    }

    info!(succeeded, "Generation stream closed");
    Ok(succeeded)
}

/// Print the prompt for one manual step as JSON.
pub fn run_step(
    step: ManualStep,
    state: &Path,
    language: Option<String>,
    config: &FabulaConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let state = serde_json::from_str(&read_input(state)?)
        .map_err(|e| JsonError::new(format!("Invalid step state: {}", e)))?;
    let request = ManualRequest { step, state };
    let language = language.unwrap_or_else(|| config.pipeline.language.clone());

    let prompt = build_step(&request, &language)?;
    println!("{}", serde_json::to_string_pretty(&prompt)?);
    Ok(())
}
