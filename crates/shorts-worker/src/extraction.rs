//! Per-clip extraction: keyframe estimation, crop synthesis, render, publish.

use std::path::Path;

use shorts_media::{frame_count_for, vertical_crop_filter, CropPlan, RenderRequest, VideoInfo};
use shorts_models::{ClipArtifact, ClipCandidate, JobId, Keyframe};
use shorts_storage::{clip_key, DEFAULT_VIDEO_CONTENT_TYPE};

use crate::error::WorkerResult;
use crate::logging::JobLogger;
use crate::metrics;
use crate::pipeline::PipelineContext;

/// Keyframes and published artifact of one extracted clip.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedClip {
    pub rank: u32,
    pub keyframes: Vec<Keyframe>,
    pub artifact: ClipArtifact,
}

/// Turns clip candidates of one source video into published vertical clips.
pub struct ClipExtractor<'a> {
    ctx: &'a PipelineContext,
    job_id: &'a JobId,
    logger: &'a JobLogger,
}

impl<'a> ClipExtractor<'a> {
    pub fn new(ctx: &'a PipelineContext, job_id: &'a JobId, logger: &'a JobLogger) -> Self {
        Self {
            ctx,
            job_id,
            logger,
        }
    }

    /// Estimate keyframes, render and publish one candidate.
    pub async fn extract(
        &self,
        source: &Path,
        video: &VideoInfo,
        candidate: &ClipCandidate,
        work_dir: &Path,
    ) -> WorkerResult<ExtractedClip> {
        let keyframes = self.estimate_keyframes(source, candidate, work_dir).await;
        let artifact = self
            .render_and_publish(source, video, candidate, &keyframes, work_dir)
            .await?;

        Ok(ExtractedClip {
            rank: candidate.rank,
            keyframes,
            artifact,
        })
    }

    /// Keyframes for a clip; never fails.
    ///
    /// Any sampling or estimation problem, or an empty estimate, yields the
    /// single centered keyframe.
    pub async fn estimate_keyframes(
        &self,
        source: &Path,
        candidate: &ClipCandidate,
        work_dir: &Path,
    ) -> Vec<Keyframe> {
        let duration = candidate.duration();
        let max_keyframes = self.ctx.config.max_keyframes;

        let frame_dir = match tempfile::Builder::new()
            .prefix(&format!("frames_{}_", candidate.rank))
            .tempdir_in(work_dir)
        {
            Ok(dir) => dir,
            Err(e) => {
                self.fallback(candidate.rank, "sampling", &e.to_string());
                return vec![Keyframe::centered()];
            }
        };

        let frames = match self
            .ctx
            .media
            .sample_frames(
                source,
                candidate.start_time,
                duration,
                frame_count_for(max_keyframes),
                frame_dir.path(),
            )
            .await
        {
            Ok(frames) if !frames.is_empty() => frames,
            Ok(_) => {
                self.fallback(candidate.rank, "no_frames", "no frames could be sampled");
                return vec![Keyframe::centered()];
            }
            Err(e) => {
                self.fallback(candidate.rank, "sampling", &e.summary());
                return vec![Keyframe::centered()];
            }
        };

        match self
            .ctx
            .estimator
            .estimate(&frames, duration, max_keyframes)
            .await
        {
            Ok(keyframes) if !keyframes.is_empty() => {
                let mut keyframes = Keyframe::normalize_all(keyframes, duration);
                keyframes.truncate(max_keyframes.max(1));
                keyframes
            }
            Ok(_) => {
                self.fallback(candidate.rank, "empty", "estimator returned no keyframes");
                vec![Keyframe::centered()]
            }
            Err(e) => {
                self.fallback(candidate.rank, "estimator", &e.to_string());
                vec![Keyframe::centered()]
            }
        }
    }

    /// Render a clip with the given keyframes and publish it under the
    /// clip's object key.
    ///
    /// The local output file is removed whether or not rendering or
    /// publishing succeeded.
    pub async fn render_and_publish(
        &self,
        source: &Path,
        video: &VideoInfo,
        candidate: &ClipCandidate,
        keyframes: &[Keyframe],
        work_dir: &Path,
    ) -> WorkerResult<ClipArtifact> {
        let plan = CropPlan::synthesize(keyframes, video.width, video.height);
        let request = RenderRequest {
            input: source.to_path_buf(),
            output: work_dir.join(format!("clip_{}.mp4", candidate.rank)),
            start: candidate.start_time,
            duration: candidate.duration(),
            filter: vertical_crop_filter(&plan),
        };
        let key = clip_key(self.job_id, candidate.rank);

        self.logger.log_progress(&format!(
            "Rendering clip {} ({:.1}s-{:.1}s, {} crop steps)",
            candidate.rank,
            candidate.start_time,
            candidate.end_time,
            plan.steps().len()
        ));

        let outcome = self.publish(&request, &key).await;
        if let Err(e) = tokio::fs::remove_file(&request.output).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                self.logger.log_warning(&format!(
                    "Failed to remove {}: {}",
                    request.output.display(),
                    e
                ));
            }
        }

        let video_url = outcome?;
        Ok(ClipArtifact {
            s3_key: key,
            video_url,
        })
    }

    async fn publish(&self, request: &RenderRequest, key: &str) -> WorkerResult<String> {
        self.ctx.media.render(request).await?;
        let url = self
            .ctx
            .store
            .publish(
                &request.output,
                key,
                DEFAULT_VIDEO_CONTENT_TYPE,
                self.ctx.config.clip_url_ttl,
            )
            .await?;
        Ok(url)
    }

    fn fallback(&self, rank: u32, reason: &'static str, detail: &str) {
        metrics::record_keyframe_fallback(reason);
        self.logger.log_warning(&format!(
            "Clip {}: using centered crop ({})",
            rank, detail
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestHarness;
    use shorts_models::SampledFrame;

    fn video() -> VideoInfo {
        VideoInfo {
            duration: 120.0,
            width: 1920,
            height: 1080,
            fps: 30.0,
        }
    }

    fn frame(time: f64) -> SampledFrame {
        SampledFrame {
            time,
            jpeg_base64: "QUJD".to_string(),
        }
    }

    #[tokio::test]
    async fn test_extract_uses_estimated_keyframes() {
        let harness = TestHarness::new();
        harness.media.set_frames(vec![frame(0.0), frame(5.0)]);
        harness.estimator.set_keyframes(vec![
            Keyframe::clamped(5.0, 0.8, "guest", 10.0),
            Keyframe::clamped(0.0, 0.2, "host", 10.0),
        ]);
        let ctx = harness.context();
        let job_id = JobId::from_string("job-1");
        let logger = JobLogger::new(&job_id, "test");
        let work = tempfile::tempdir().unwrap();
        harness.store.insert("src", b"video");

        let candidate = ClipCandidate::new(1, 30.0, 40.0, "", "");
        let extractor = ClipExtractor::new(&ctx, &job_id, &logger);
        let clip = extractor
            .extract(Path::new("/tmp/source.mp4"), &video(), &candidate, work.path())
            .await
            .unwrap();

        assert_eq!(clip.rank, 1);
        assert_eq!(clip.keyframes.len(), 2);
        assert_eq!(clip.keyframes[0].crop_x, 0.2);
        assert_eq!(clip.artifact.s3_key, "clips/job-1/clip_1.mp4");
        assert_eq!(clip.artifact.video_url, "memory://clips/job-1/clip_1.mp4");

        let renders = harness.media.renders();
        assert_eq!(renders.len(), 1);
        assert_eq!(renders[0].start, 30.0);
        assert_eq!(renders[0].duration, 10.0);
        assert_eq!(
            renders[0].filter,
            "crop=607:1080:'if(lt(t,5),81,1233)':0,scale=1080:1920"
        );
        assert!(!work.path().join("clip_1.mp4").exists());
        assert!(harness.store.contains("clips/job-1/clip_1.mp4"));
    }

    #[tokio::test]
    async fn test_estimator_failure_falls_back_to_center() {
        let harness = TestHarness::new();
        harness.media.set_frames(vec![frame(0.0)]);
        harness.estimator.fail_with("model unavailable");
        let ctx = harness.context();
        let job_id = JobId::from_string("job-2");
        let logger = JobLogger::new(&job_id, "test");
        let work = tempfile::tempdir().unwrap();

        let candidate = ClipCandidate::new(3, 0.0, 20.0, "", "");
        let extractor = ClipExtractor::new(&ctx, &job_id, &logger);
        let clip = extractor
            .extract(Path::new("/tmp/source.mp4"), &video(), &candidate, work.path())
            .await
            .unwrap();

        assert_eq!(clip.keyframes, vec![Keyframe::centered()]);
        assert_eq!(harness.estimator.calls(), 1);
        assert_eq!(clip.artifact.s3_key, "clips/job-2/clip_3.mp4");

        let renders = harness.media.renders();
        assert_eq!(renders.len(), 1);
        assert_eq!(renders[0].filter, "crop=607:1080:'657':0,scale=1080:1920");
    }

    #[tokio::test]
    async fn test_no_frames_skips_estimator() {
        let harness = TestHarness::new();
        let ctx = harness.context();
        let job_id = JobId::from_string("job-3");
        let logger = JobLogger::new(&job_id, "test");
        let work = tempfile::tempdir().unwrap();

        let candidate = ClipCandidate::new(1, 0.0, 20.0, "", "");
        let extractor = ClipExtractor::new(&ctx, &job_id, &logger);
        let keyframes = extractor
            .estimate_keyframes(Path::new("/tmp/source.mp4"), &candidate, work.path())
            .await;

        assert_eq!(keyframes, vec![Keyframe::centered()]);
        assert_eq!(harness.estimator.calls(), 0);
    }

    #[tokio::test]
    async fn test_estimates_are_truncated_to_budget() {
        let harness = TestHarness::new();
        harness.media.set_frames(vec![frame(0.0)]);
        harness.estimator.set_keyframes(
            (0..10)
                .map(|i| Keyframe::clamped(i as f64, 0.5, "", 30.0))
                .collect(),
        );
        let ctx = harness.context();
        let job_id = JobId::from_string("job-4");
        let logger = JobLogger::new(&job_id, "test");
        let work = tempfile::tempdir().unwrap();

        let candidate = ClipCandidate::new(1, 0.0, 30.0, "", "");
        let keyframes = ClipExtractor::new(&ctx, &job_id, &logger)
            .estimate_keyframes(Path::new("/tmp/source.mp4"), &candidate, work.path())
            .await;

        assert_eq!(keyframes.len(), ctx.config.max_keyframes);
    }

    #[tokio::test]
    async fn test_render_failure_removes_output() {
        let harness = TestHarness::new();
        harness.media.fail_renders();
        let ctx = harness.context();
        let job_id = JobId::from_string("job-5");
        let logger = JobLogger::new(&job_id, "test");
        let work = tempfile::tempdir().unwrap();

        let candidate = ClipCandidate::new(2, 0.0, 20.0, "", "");
        let result = ClipExtractor::new(&ctx, &job_id, &logger)
            .render_and_publish(
                Path::new("/tmp/source.mp4"),
                &video(),
                &candidate,
                &[Keyframe::centered()],
                work.path(),
            )
            .await;

        let err = result.unwrap_err();
        assert!(err.to_string().starts_with("Transform failed"));
        assert!(!work.path().join("clip_2.mp4").exists());
        assert!(!harness.store.contains("clips/job-5/clip_2.mp4"));
    }

    #[tokio::test]
    async fn test_publish_failure_removes_output() {
        let harness = TestHarness::new();
        harness.store.fail_uploads();
        let ctx = harness.context();
        let job_id = JobId::from_string("job-6");
        let logger = JobLogger::new(&job_id, "test");
        let work = tempfile::tempdir().unwrap();

        let candidate = ClipCandidate::new(1, 0.0, 20.0, "", "");
        let result = ClipExtractor::new(&ctx, &job_id, &logger)
            .render_and_publish(
                Path::new("/tmp/source.mp4"),
                &video(),
                &candidate,
                &[Keyframe::centered()],
                work.path(),
            )
            .await;

        assert!(result.is_err());
        assert!(!work.path().join("clip_1.mp4").exists());
    }
}
