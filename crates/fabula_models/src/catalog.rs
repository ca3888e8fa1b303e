//! Local model files and remote model categorization.

use fabula_core::ProviderKind;
use fabula_error::{CatalogError, CatalogErrorKind, FabulaResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{info, instrument, warn};

const MODEL_EXTENSION: &str = "gguf";

static DATE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-\d{4}-\d{2}-\d{2}$").expect("valid date suffix pattern"));
static VERSION_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-\d{4}$").expect("valid version suffix pattern"));

/// A model file available on local disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalModel {
    /// File name, e.g. `mistral-7b.Q4_K_M.gguf`
    pub name: String,
    /// File size in bytes
    pub size_bytes: u64,
}

/// List `.gguf` files in `dir`, sorted by name.
///
/// A missing directory yields an empty list.
///
/// # Errors
///
/// Returns a `ReadDir` catalog error when the directory exists but cannot be read.
#[instrument(fields(dir = %dir.display()))]
pub fn list_local_models(dir: &Path) -> FabulaResult<Vec<LocalModel>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let entries = std::fs::read_dir(dir).map_err(|e| {
        CatalogError::new(CatalogErrorKind::ReadDir {
            path: dir.display().to_string(),
            message: e.to_string(),
        })
    })?;

    let mut models = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(MODEL_EXTENSION) || !path.is_file() {
            continue;
        }
        match entry.metadata() {
            Ok(metadata) => models.push(LocalModel {
                name: entry.file_name().to_string_lossy().into_owned(),
                size_bytes: metadata.len(),
            }),
            Err(e) => warn!(file = %path.display(), "Could not read model metadata: {}", e),
        }
    }
    models.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(models)
}

/// Outcome of a batch delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteStatus {
    /// Every requested file was deleted
    Ok,
    /// Some files were deleted, some failed
    Partial,
    /// Nothing was deleted
    Error,
}

/// Result of [`delete_local_models`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteReport {
    /// Overall outcome
    pub status: DeleteStatus,
    /// Human-readable summary
    pub message: String,
    /// Files that were removed
    pub deleted: Vec<String>,
    /// One message per failed file
    pub errors: Vec<String>,
}

pub(crate) fn is_plain_model_name(name: &str) -> bool {
    let path = Path::new(name);
    path.file_name().and_then(|n| n.to_str()) == Some(name)
        && path.extension().and_then(|e| e.to_str()) == Some(MODEL_EXTENSION)
}

/// Delete model files by name from `dir`.
///
/// Names must be plain file names ending in `.gguf`; anything with a path
/// component is rejected without touching the file system.
#[instrument(skip(names), fields(dir = %dir.display(), count = names.len()))]
pub fn delete_local_models(dir: &Path, names: &[String]) -> DeleteReport {
    if !dir.is_dir() {
        return DeleteReport {
            status: DeleteStatus::Error,
            message: "Model directory not found.".to_string(),
            deleted: Vec::new(),
            errors: Vec::new(),
        };
    }

    let mut deleted = Vec::new();
    let mut errors = Vec::new();

    for name in names {
        if !is_plain_model_name(name) {
            errors.push(CatalogErrorKind::InvalidFileName(name.clone()).to_string());
            continue;
        }
        let path = dir.join(name);
        if !path.is_file() {
            errors.push(format!("File not found: {}", name));
            continue;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => {
                info!(file = %name, "Deleted local model");
                deleted.push(name.clone());
            }
            Err(e) => {
                let kind = CatalogErrorKind::Delete {
                    name: name.clone(),
                    message: e.to_string(),
                };
                warn!("{}", kind);
                errors.push(kind.to_string());
            }
        }
    }

    let mut parts = Vec::new();
    if !deleted.is_empty() {
        parts.push(format!("Deleted {} file(s).", deleted.len()));
    }
    if !errors.is_empty() {
        parts.push(format!("Errors: {}. {}", errors.len(), errors.join("; ")));
    }
    let status = match (deleted.is_empty(), errors.is_empty()) {
        (_, true) => DeleteStatus::Ok,
        (false, false) => DeleteStatus::Partial,
        (true, false) => DeleteStatus::Error,
    };
    let message = if parts.is_empty() {
        "No files were selected.".to_string()
    } else {
        parts.join(" ")
    };

    DeleteReport {
        status,
        message,
        deleted,
        errors,
    }
}

/// Remote models split by pricing tier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCategories {
    /// Models usable on free tiers
    pub free: Vec<String>,
    /// Models requiring a paid plan
    pub paid: Vec<String>,
}

fn base_name(model: &str) -> String {
    let without_date = DATE_SUFFIX.replace(model, "");
    VERSION_SUFFIX.replace(&without_date, "").into_owned()
}

fn is_free(kind: ProviderKind, model: &str) -> bool {
    match kind {
        ProviderKind::Groq => true,
        ProviderKind::Gemini => model.contains("flash") || model.contains("1.0-pro"),
        ProviderKind::OpenAi => model.contains("gpt-3.5-turbo"),
        ProviderKind::Local | ProviderKind::VpsProxy => false,
    }
}

/// De-duplicate dated snapshots and split models into free and paid.
///
/// Snapshot suffixes (`-2024-08-06`, `-0613`) are stripped to find each
/// model's base name; the alphabetically first id per base name is kept.
/// OpenAI listings are first narrowed to chat/text models.
///
/// # Examples
///
/// ```
/// use fabula_core::ProviderKind;
/// use fabula_models::categorize_models;
///
/// let ids = vec![
///     "gpt-4o-2024-08-06".to_string(),
///     "gpt-4o".to_string(),
///     "gpt-3.5-turbo-0125".to_string(),
///     "whisper-1".to_string(),
/// ];
/// let categories = categorize_models(ProviderKind::OpenAi, ids);
/// assert_eq!(categories.free, vec!["gpt-3.5-turbo-0125"]);
/// assert_eq!(categories.paid, vec!["gpt-4o"]);
/// ```
pub fn categorize_models(kind: ProviderKind, mut ids: Vec<String>) -> ModelCategories {
    if kind == ProviderKind::OpenAi {
        ids.retain(|id| {
            let lowered = id.to_lowercase();
            lowered.contains("gpt") || lowered.contains("text")
        });
    }
    ids.sort();

    let mut unique: BTreeMap<String, String> = BTreeMap::new();
    for id in ids {
        unique.entry(base_name(&id)).or_insert(id);
    }
    let mut models: Vec<String> = unique.into_values().collect();
    models.sort();

    let (free, paid) = models.into_iter().partition(|m| is_free(kind, m));
    ModelCategories { free, paid }
}
