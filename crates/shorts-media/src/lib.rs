//! Crop window synthesis and FFmpeg CLI wrapper for vertical clips.
//!
//! This crate provides:
//! - The crop window synthesizer turning keyframes into a step function
//! - Type-safe FFmpeg command building with timeouts and stderr capture
//! - FFprobe video information
//! - Audio extraction, frame sampling and vertical clip rendering
//! - The [`MediaEngine`] trait the pipeline renders through

pub mod audio;
pub mod clip;
pub mod command;
pub mod crop;
pub mod engine;
pub mod error;
pub mod filters;
pub mod frames;
pub mod probe;

pub use clip::{render_vertical_clip, RenderRequest};
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use crop::{CropPlan, CropStep, CropWindow};
pub use engine::{FfmpegEngine, MediaEngine};
pub use error::{MediaError, MediaResult};
pub use filters::{vertical_crop_filter, OUTPUT_HEIGHT, OUTPUT_WIDTH};
pub use frames::{frame_count_for, sample_timestamps};
pub use probe::{probe_video, VideoInfo};
