//! Vertical clip rendering.

use std::path::PathBuf;
use tracing::info;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Video encoder for output clips.
pub const VIDEO_CODEC: &str = "libx264";

/// Encoder preset for output clips.
pub const VIDEO_PRESET: &str = "fast";

/// Audio encoder for output clips.
pub const AUDIO_CODEC: &str = "aac";

/// One transform-engine invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Seconds from the source start
    pub start: f64,
    /// Clip length in seconds
    pub duration: f64,
    /// Complete `-vf` filter chain
    pub filter: String,
}

impl RenderRequest {
    /// Build the FFmpeg command for this request.
    pub fn to_command(&self) -> MediaResult<FfmpegCommand> {
        if !self.start.is_finite() || self.start < 0.0 {
            return Err(MediaError::InvalidRange(format!("start {}", self.start)));
        }
        if !self.duration.is_finite() || self.duration <= 0.0 {
            return Err(MediaError::InvalidRange(format!("duration {}", self.duration)));
        }

        Ok(FfmpegCommand::new(&self.input, &self.output)
            .seek(self.start)
            .duration(self.duration)
            .video_filter(&self.filter)
            .video_codec(VIDEO_CODEC)
            .preset(VIDEO_PRESET)
            .audio_codec(AUDIO_CODEC)
            .output_args(["-movflags", "+faststart"]))
    }
}

/// Render a vertical clip.
pub async fn render_vertical_clip(runner: &FfmpegRunner, request: &RenderRequest) -> MediaResult<()> {
    let cmd = request.to_command()?;

    info!(
        start = request.start,
        duration = request.duration,
        "Rendering clip to {}",
        request.output.display()
    );
    runner.run(&cmd).await?;

    if !request.output.exists() {
        return Err(MediaError::ffmpeg_failed(
            "FFmpeg produced no output file",
            None,
            None,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(start: f64, duration: f64) -> RenderRequest {
        RenderRequest {
            input: PathBuf::from("source.mp4"),
            output: PathBuf::from("clip_1.mp4"),
            start,
            duration,
            filter: "crop=607:1080:'81':0,scale=1080:1920".to_string(),
        }
    }

    #[test]
    fn test_render_command() {
        let args = request(12.5, 30.0).to_command().unwrap().build_args();
        let joined = args.join(" ");
        assert!(joined.contains("-ss 12.500 -t 30.000 -i source.mp4"));
        assert!(joined.contains("-vf crop=607:1080:'81':0,scale=1080:1920"));
        assert!(joined.contains("-c:v libx264 -preset fast -c:a aac"));
    }

    #[test]
    fn test_render_rejects_bad_range() {
        assert!(request(-1.0, 30.0).to_command().is_err());
        assert!(request(0.0, 0.0).to_command().is_err());
        assert!(request(f64::NAN, 10.0).to_command().is_err());
    }
}
