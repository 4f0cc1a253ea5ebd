//! Frame sampling for keyframe estimation.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use shorts_models::SampledFrame;
use std::path::Path;
use tracing::{debug, warn};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;
use crate::filters::sample_frame_filter;

/// Minimum number of frames sampled per clip.
pub const MIN_SAMPLED_FRAMES: usize = 6;

/// Number of frames to sample for a keyframe budget.
pub fn frame_count_for(max_keyframes: usize) -> usize {
    (max_keyframes * 2).max(MIN_SAMPLED_FRAMES)
}

/// Clip-relative timestamps spread uniformly over `[0, duration]`.
pub fn sample_timestamps(duration: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![0.0],
        n => (0..n)
            .map(|i| duration * i as f64 / (n - 1) as f64)
            .collect(),
    }
}

/// Grab `count` frames from `[start, start + duration]` of `input`.
///
/// Frames FFmpeg cannot produce (e.g. a timestamp at the very end of the
/// stream) are skipped, so the result may be shorter than `count`.
pub async fn sample_clip_frames(
    runner: &FfmpegRunner,
    input: &Path,
    start: f64,
    duration: f64,
    count: usize,
    work_dir: &Path,
) -> MediaResult<Vec<SampledFrame>> {
    let mut frames = Vec::with_capacity(count);

    for (i, time) in sample_timestamps(duration, count).into_iter().enumerate() {
        let frame_path = work_dir.join(format!("frame_{i:03}.jpg"));
        let cmd = FfmpegCommand::new(input, &frame_path)
            .seek(start + time)
            .single_frame()
            .video_filter(sample_frame_filter())
            .output_args(["-q:v", "4"]);

        if let Err(e) = runner.run(&cmd).await {
            warn!(time, "Failed to sample frame: {}", e);
            continue;
        }

        let bytes = match tokio::fs::read(&frame_path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(time, "Sampled frame missing: {}", e);
                continue;
            }
        };
        let _ = tokio::fs::remove_file(&frame_path).await;

        frames.push(SampledFrame {
            time,
            jpeg_base64: STANDARD.encode(bytes),
        });
    }

    debug!("Sampled {} of {} frames", frames.len(), count);
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_count() {
        assert_eq!(frame_count_for(1), 6);
        assert_eq!(frame_count_for(3), 6);
        assert_eq!(frame_count_for(4), 8);
    }

    #[test]
    fn test_sample_timestamps_cover_clip() {
        let ts = sample_timestamps(30.0, 6);
        assert_eq!(ts.len(), 6);
        assert_eq!(ts[0], 0.0);
        assert_eq!(ts[5], 30.0);
        assert!((ts[1] - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_sample_timestamps_degenerate() {
        assert!(sample_timestamps(10.0, 0).is_empty());
        assert_eq!(sample_timestamps(10.0, 1), vec![0.0]);
    }
}
