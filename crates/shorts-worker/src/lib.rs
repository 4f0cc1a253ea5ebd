//! Job registry and clip pipeline.
//!
//! This crate provides:
//! - The in-process [`JobRegistry`] and its status state machine
//! - The [`Pipeline`] running each job through download, transcription,
//!   clip selection and extraction under a concurrency limit
//! - The [`ClipExtractor`] turning one candidate into a published clip
//! - Re-export of a completed clip with new keyframes

pub mod config;
pub mod error;
pub mod extraction;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod reexport;
pub mod registry;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::WorkerConfig;
pub use error::{RegistryError, RegistryResult, WorkerError, WorkerResult};
pub use extraction::{ClipExtractor, ExtractedClip};
pub use logging::JobLogger;
pub use pipeline::{Pipeline, PipelineContext};
pub use reexport::{reexport_clip, ReexportedClip};
pub use registry::JobRegistry;
