//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the fabula binary.

mod commands;
mod generate;
mod input;
mod models;

pub use commands::{Cli, Commands, GenerateArgs, ModelsCommands};
pub use generate::{run_generate, run_step};
pub use input::{api_key_for, load_config};
pub use models::{handle_models_command, validate_key};
