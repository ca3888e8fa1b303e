//! Fabula CLI binary.
//!
//! This binary provides command-line access to Fabula's functionality:
//! - Generate a quest, streaming progress as JSON lines
//! - Build single-step prompts for manual runs
//! - Manage local models and inspect remote ones
//! - Validate provider API keys

use clap::Parser;
use fabula::{ObservabilityConfig, init_observability};

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{Cli, Commands, handle_models_command, load_config, run_generate, run_step, validate_key};

    let cli = Cli::parse();

    // Keys and local-model toggles may live in a .env file
    dotenvy::dotenv().ok();

    let mut observability = ObservabilityConfig::new().with_json_logs(cli.json_logs);
    if cli.verbose {
        observability = observability.with_log_level("debug");
    }
    init_observability(&observability)?;

    let config = load_config(cli.config.as_deref())?;

    let succeeded = match cli.command {
        Commands::Generate(args) => run_generate(args, &config).await?,
        Commands::Step {
            step,
            state,
            language,
        } => {
            run_step(step, &state, language, &config)?;
            true
        }
        Commands::Models(command) => handle_models_command(command, &config).await?,
        Commands::ValidateKey { provider, api_key } => {
            validate_key(&provider, api_key, &config).await?
        }
    };

    if !succeeded {
        std::process::exit(1);
    }
    Ok(())
}
