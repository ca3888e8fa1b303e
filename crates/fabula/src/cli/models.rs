//! Model catalog and credential handlers.

use super::commands::ModelsCommands;
use super::input::api_key_for;
use fabula::{
    CredentialStatus, DefaultProviderFactory, DeleteStatus, FabulaConfig, ProviderKind,
    delete_local_models, list_local_models, list_remote_models, validate_credentials,
};

/// Run a `models` subcommand, printing its result as JSON.
///
/// Returns whether the command fully succeeded.
pub async fn handle_models_command(
    command: ModelsCommands,
    config: &FabulaConfig,
) -> Result<bool, Box<dyn std::error::Error>> {
    match command {
        ModelsCommands::Local => {
            let models = list_local_models(&config.local.model_dir)?;
            println!("{}", serde_json::to_string_pretty(&models)?);
            Ok(true)
        }
        ModelsCommands::Delete { names } => {
            let report = delete_local_models(&config.local.model_dir, &names);
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(report.status == DeleteStatus::Ok)
        }
        ModelsCommands::Remote { provider, api_key } => {
            let kind = ProviderKind::parse(&provider)?;
            let factory = DefaultProviderFactory::new(&config.providers, &config.local);
            let key = api_key_for(&provider, api_key);
            let categories = list_remote_models(kind, &key, &factory).await?;
            println!("{}", serde_json::to_string_pretty(&categories)?);
            Ok(true)
        }
    }
}

/// Validate a key and print `{"status": "ok"}` or `{"status": "error", ...}`.
pub async fn validate_key(
    provider: &str,
    api_key: Option<String>,
    config: &FabulaConfig,
) -> Result<bool, Box<dyn std::error::Error>> {
    let factory = DefaultProviderFactory::new(&config.providers, &config.local);
    let key = api_key_for(provider, api_key);
    let status = validate_credentials(provider, &key, &factory).await;
    println!("{}", serde_json::to_string(&status)?);
    Ok(status == CredentialStatus::Ok)
}
