//! CLI command definitions.

use clap::{Args, Parser, Subcommand};
use fabula::ManualStep;
use std::path::PathBuf;

/// Fabula - generate branching text quests with LLMs
#[derive(Parser, Debug)]
#[command(name = "fabula")]
#[command(about = "Generate branching text quests with LLMs", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Configuration file layered over the bundled defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a quest, streaming progress events as JSON lines
    Generate(GenerateArgs),

    /// Build the prompt for one pipeline step from hand-supplied state
    Step {
        /// Step to build (concept, architect, director, detailing, correcting)
        #[arg(long)]
        step: ManualStep,

        /// JSON file holding the accumulated state object, or `-` for stdin
        #[arg(long, default_value = "-")]
        state: PathBuf,

        /// Output language, overriding the configured one
        #[arg(long)]
        language: Option<String>,
    },

    /// Model management commands
    #[command(subcommand)]
    Models(ModelsCommands),

    /// Check an API key against its provider
    ValidateKey {
        /// Provider name
        #[arg(long)]
        provider: String,

        /// API key; read from the provider's environment variable when omitted
        #[arg(long)]
        api_key: Option<String>,
    },
}

/// Arguments for `generate`.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// JSON file holding a full generation request, or `-` for stdin
    #[arg(long, conflicts_with_all = ["setting", "provider", "model"])]
    pub request: Option<PathBuf>,

    /// World description
    #[arg(long, required_unless_present = "request")]
    pub setting: Option<String>,

    /// Provider name (groq, openai, gemini, local, vps_proxy)
    #[arg(long, required_unless_present = "request")]
    pub provider: Option<String>,

    /// Model name as understood by the provider
    #[arg(long, required_unless_present = "request")]
    pub model: Option<String>,

    /// API key; read from the provider's environment variable when omitted
    #[arg(long)]
    pub api_key: Option<String>,

    /// Target number of scenes
    #[arg(long)]
    pub scene_count: Option<u32>,

    /// Tone of the story
    #[arg(long)]
    pub tone: Option<String>,

    /// Pacing of the story
    #[arg(long)]
    pub pacing: Option<String>,

    /// Narrative element tag (repeatable)
    #[arg(long = "element")]
    pub elements: Vec<String>,
}

/// Model management subcommands
#[derive(Subcommand, Debug)]
pub enum ModelsCommands {
    /// List model files in the local model directory
    Local,

    /// Delete model files from the local model directory
    Delete {
        /// File names to delete
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// List models a provider offers, split into free and paid
    Remote {
        /// Provider name
        #[arg(long)]
        provider: String,

        /// API key; read from the provider's environment variable when omitted
        #[arg(long)]
        api_key: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_generate_from_flags() {
        let cli = Cli::try_parse_from([
            "fabula",
            "generate",
            "--setting",
            "A drowned city",
            "--provider",
            "groq",
            "--model",
            "llama3",
            "--element",
            "plot_twist",
            "--element",
            "red_herring",
        ])
        .unwrap();
        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(args.setting.as_deref(), Some("A drowned city"));
                assert_eq!(args.elements, vec!["plot_twist", "red_herring"]);
                assert!(args.request.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_generate_requires_setting_without_request() {
        assert!(Cli::try_parse_from(["fabula", "generate", "--provider", "groq"]).is_err());
        assert!(Cli::try_parse_from(["fabula", "generate", "--request", "req.json"]).is_ok());
    }

    #[test]
    fn test_step_parses_step_name() {
        let cli = Cli::try_parse_from(["fabula", "step", "--step", "detailing", "--state", "s.json"])
            .unwrap();
        match cli.command {
            Commands::Step { step, state, .. } => {
                assert_eq!(step, ManualStep::Detailing);
                assert_eq!(state, PathBuf::from("s.json"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert!(Cli::try_parse_from(["fabula", "step", "--step", "done"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["fabula", "models", "local", "--verbose", "--json-logs"])
            .unwrap();
        assert!(cli.verbose);
        assert!(cli.json_logs);
        assert!(matches!(cli.command, Commands::Models(ModelsCommands::Local)));
    }
}
