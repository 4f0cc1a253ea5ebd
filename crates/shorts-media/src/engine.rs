//! Transform-engine seam.

use async_trait::async_trait;
use shorts_models::SampledFrame;
use std::path::Path;

use crate::audio::extract_audio;
use crate::clip::{render_vertical_clip, RenderRequest};
use crate::command::FfmpegRunner;
use crate::error::MediaResult;
use crate::frames::sample_clip_frames;
use crate::probe::{probe_video, VideoInfo};

/// Media operations the pipeline needs from a transform engine.
#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// Read dimensions and duration of a video.
    async fn probe(&self, path: &Path) -> MediaResult<VideoInfo>;

    /// Write the audio track of `input` to `output` for transcription.
    async fn extract_audio(&self, input: &Path, output: &Path) -> MediaResult<()>;

    /// Sample `count` downscaled frames from a time range of `input`.
    async fn sample_frames(
        &self,
        input: &Path,
        start: f64,
        duration: f64,
        count: usize,
        work_dir: &Path,
    ) -> MediaResult<Vec<SampledFrame>>;

    /// Cut, crop and encode one vertical clip.
    async fn render(&self, request: &RenderRequest) -> MediaResult<()>;
}

/// [`MediaEngine`] backed by the `ffmpeg` and `ffprobe` binaries.
#[derive(Debug, Clone, Default)]
pub struct FfmpegEngine {
    runner: FfmpegRunner,
}

impl FfmpegEngine {
    /// Create an engine whose FFmpeg invocations are killed after
    /// `timeout_secs`.
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            runner: FfmpegRunner::new().with_timeout(timeout_secs),
        }
    }
}

#[async_trait]
impl MediaEngine for FfmpegEngine {
    async fn probe(&self, path: &Path) -> MediaResult<VideoInfo> {
        probe_video(path).await
    }

    async fn extract_audio(&self, input: &Path, output: &Path) -> MediaResult<()> {
        extract_audio(&self.runner, input, output).await
    }

    async fn sample_frames(
        &self,
        input: &Path,
        start: f64,
        duration: f64,
        count: usize,
        work_dir: &Path,
    ) -> MediaResult<Vec<SampledFrame>> {
        sample_clip_frames(&self.runner, input, start, duration, count, work_dir).await
    }

    async fn render(&self, request: &RenderRequest) -> MediaResult<()> {
        render_vertical_clip(&self.runner, request).await
    }
}
