//! Multi-stage quest generation.
//!
//! A quest is produced by a fixed sequence of LLM calls:
//!
//! ```text
//! concept → architect → (list parse) → director → detailing × N → validating → correcting
//! ```
//!
//! Each stage has a narrowly scoped prompt ([`prompts`]) and output contract
//! ([`parsing`]). The assembled graph is repaired by reachability pruning
//! ([`prune_unreachable`]) before the final proofreading pass.
//! [`QuestGenerator`] drives the sequence and streams [`ProgressEvent`]s;
//! [`build_step`] exposes the same prompts one call at a time.
//!
//! [`ProgressEvent`]: fabula_core::ProgressEvent

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod classify;
mod detailing;
mod manual;
mod orchestrator;
pub mod parsing;
mod parents;
pub mod prompts;
mod validator;

pub use classify::{ErrorCategory, classify, classify_text, describe_failure};
pub use detailing::{ChoiceRecord, SceneArena, SceneRecord};
pub use manual::{ManualPrompt, ManualRequest, ManualStep, build_step};
pub use orchestrator::{GeneratorSettings, ProgressStream, QuestGenerator};
pub use parents::{ParentLink, ParentMap};
pub use validator::prune_unreachable;
