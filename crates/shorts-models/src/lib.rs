//! Shared data models for the shorts clip pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Analysis jobs and their status state machine
//! - Ranked clip candidates and their extracted artifacts
//! - Crop keyframes with range clamping
//! - Diarized transcripts
//! - Sampled frames sent for keyframe estimation

pub mod clip;
pub mod frame;
pub mod job;
pub mod keyframe;
pub mod transcript;

// Re-export common types
pub use clip::{ClipArtifact, ClipCandidate, ClipSet, RejectedCandidate};
pub use frame::SampledFrame;
pub use job::{JobId, JobRecord, JobStatus, TransitionError};
pub use keyframe::{Keyframe, CROP_X_CENTER, CROP_X_MAX, CROP_X_MIN};
pub use transcript::{Transcript, TranscriptLine, TranscriptSegment};
