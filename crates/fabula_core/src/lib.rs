//! Core data types for the Fabula quest generator.
//!
//! This crate provides the data model shared by the providers, the generation
//! pipeline and the command-line front end: generation requests, the quest
//! graph at each stage of refinement, and the progress events streamed back
//! to callers.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod event;
mod provider;
mod quest;
mod request;
mod serde_helpers;
mod skeleton;

pub use event::{PipelineStatus, ProgressEvent};
pub use provider::ProviderKind;
pub use quest::{Choice, Quest, Scene};
pub use request::{
    GenerationRequest, GenerationRequestBuilder, PipelineParams, PipelineParamsBuilder,
    DEFAULT_SCENE_COUNT,
};
pub use skeleton::{SceneStub, Skeleton, SkeletonChoice, SkeletonScene};
