//! Re-render a clip of a completed job with new keyframes.
//!
//! Runs on the caller's request rather than as a background job; failures
//! are returned to the caller and never change the job's status.

use shorts_models::{ClipArtifact, JobId, Keyframe};

use crate::error::{RegistryError, WorkerResult};
use crate::extraction::ClipExtractor;
use crate::logging::JobLogger;
use crate::metrics;
use crate::pipeline::PipelineContext;

/// Outcome of a successful re-export.
#[derive(Debug, Clone, PartialEq)]
pub struct ReexportedClip {
    pub rank: u32,
    pub keyframes: Vec<Keyframe>,
    pub artifact: ClipArtifact,
}

/// Render clip `rank` of a completed job again with `keyframes` (or the
/// centered default) and replace its stored keyframes and artifact.
pub async fn reexport_clip(
    ctx: &PipelineContext,
    job_id: &JobId,
    rank: u32,
    keyframes: Option<Vec<Keyframe>>,
) -> WorkerResult<ReexportedClip> {
    let logger = JobLogger::new(job_id, "reexport");
    let result = run(ctx, job_id, rank, keyframes, &logger).await;
    metrics::record_reexport(result.is_ok());
    match &result {
        Ok(clip) => logger.log_completion(&format!(
            "Clip {} re-exported with {} keyframes",
            clip.rank,
            clip.keyframes.len()
        )),
        Err(e) => logger.log_error(&format!("Re-export of clip {} failed: {}", rank, e)),
    }
    result
}

async fn run(
    ctx: &PipelineContext,
    job_id: &JobId,
    rank: u32,
    keyframes: Option<Vec<Keyframe>>,
    logger: &JobLogger,
) -> WorkerResult<ReexportedClip> {
    let record = ctx.registry.get(job_id).await?;
    let candidate = record
        .result
        .as_ref()
        .ok_or_else(|| RegistryError::NoResult(job_id.clone()))?
        .find(rank)
        .cloned()
        .ok_or_else(|| RegistryError::ClipNotFound {
            job_id: job_id.clone(),
            rank,
        })?;

    let keyframes = Keyframe::normalize_all(keyframes.unwrap_or_default(), candidate.duration());
    logger.log_start(&format!(
        "Re-exporting clip {} with {} keyframes",
        rank,
        keyframes.len()
    ));

    tokio::fs::create_dir_all(&ctx.config.work_dir).await?;
    let work_dir = tempfile::Builder::new()
        .prefix(&format!("reexport_{}_{}_", job_id, rank))
        .tempdir_in(&ctx.config.work_dir)?;
    let source = work_dir.path().join("source.mp4");

    ctx.store.download(&record.source_key, &source).await?;
    let video = ctx.media.probe(&source).await?;

    let artifact = ClipExtractor::new(ctx, job_id, logger)
        .render_and_publish(&source, &video, &candidate, &keyframes, work_dir.path())
        .await?;

    ctx.registry
        .update_clip(job_id, rank, keyframes.clone(), artifact.clone())
        .await?;

    Ok(ReexportedClip {
        rank,
        keyframes,
        artifact,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WorkerError;
    use crate::testing::TestHarness;
    use shorts_models::{ClipCandidate, ClipSet, JobStatus};

    async fn completed_job(harness: &TestHarness, ctx: &PipelineContext) -> JobId {
        harness.store.insert("uploads/u/video.mp4", b"source");
        let id = ctx.registry.create("uploads/u/video.mp4").await;
        ctx.registry.advance(&id, JobStatus::Extracting).await.unwrap();
        let (set, _) = ClipSet::from_candidates(vec![
            ClipCandidate::new(1, 10.0, 40.0, "", ""),
            ClipCandidate::new(2, 60.0, 70.0, "", ""),
        ]);
        ctx.registry.complete(&id, set, Vec::new()).await.unwrap();
        id
    }

    #[tokio::test]
    async fn test_reexport_with_keyframes() {
        let harness = TestHarness::new();
        let ctx = harness.context();
        let id = completed_job(&harness, &ctx).await;

        let clip = reexport_clip(
            &ctx,
            &id,
            2,
            Some(vec![
                Keyframe::clamped(5.0, 0.8, "", 100.0),
                Keyframe::clamped(0.0, 0.2, "", 100.0),
            ]),
        )
        .await
        .unwrap();

        assert_eq!(clip.keyframes[0].time_offset, 0.0);
        assert_eq!(clip.keyframes[1].crop_x, 0.8);
        assert_eq!(clip.artifact.s3_key, format!("clips/{}/clip_2.mp4", id));

        let renders = harness.media.renders();
        assert_eq!(renders.len(), 1);
        assert_eq!(renders[0].start, 60.0);
        assert_eq!(
            renders[0].filter,
            "crop=607:1080:'if(lt(t,5),81,1233)':0,scale=1080:1920"
        );

        let record = ctx.registry.get(&id).await.unwrap();
        assert_eq!(record.status, JobStatus::Completed);
        let stored = record.result.unwrap();
        assert_eq!(stored.find(2).unwrap().keyframes, clip.keyframes);
        assert_eq!(stored.find(2).unwrap().artifact.as_ref(), Some(&clip.artifact));
    }

    #[tokio::test]
    async fn test_reexport_clamps_to_clip_duration() {
        let harness = TestHarness::new();
        let ctx = harness.context();
        let id = completed_job(&harness, &ctx).await;

        let raw = Keyframe {
            time_offset: 25.0,
            crop_x: 1.4,
            notes: String::new(),
        };
        let clip = reexport_clip(&ctx, &id, 2, Some(vec![raw])).await.unwrap();

        assert_eq!(clip.keyframes[0].time_offset, 10.0);
        assert_eq!(clip.keyframes[0].crop_x, 0.9);
    }

    #[tokio::test]
    async fn test_reexport_defaults_to_center() {
        let harness = TestHarness::new();
        let ctx = harness.context();
        let id = completed_job(&harness, &ctx).await;

        let clip = reexport_clip(&ctx, &id, 1, None).await.unwrap();

        assert_eq!(clip.keyframes, vec![Keyframe::centered()]);
        assert_eq!(
            harness.media.renders()[0].filter,
            "crop=607:1080:'657':0,scale=1080:1920"
        );
    }

    #[tokio::test]
    async fn test_unknown_job_and_clip() {
        let harness = TestHarness::new();
        let ctx = harness.context();
        let id = completed_job(&harness, &ctx).await;

        let err = reexport_clip(&ctx, &JobId::from_string("nope"), 1, None)
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let err = reexport_clip(&ctx, &id, 9, None).await.unwrap_err();
        assert!(matches!(
            err,
            WorkerError::Registry(RegistryError::ClipNotFound { rank: 9, .. })
        ));
    }

    #[tokio::test]
    async fn test_render_failure_leaves_job_untouched() {
        let harness = TestHarness::new();
        let ctx = harness.context();
        let id = completed_job(&harness, &ctx).await;
        harness.media.fail_renders();

        let err = reexport_clip(&ctx, &id, 1, None).await.unwrap_err();
        assert!(matches!(err, WorkerError::Transform(_)));

        let record = ctx.registry.get(&id).await.unwrap();
        assert_eq!(record.status, JobStatus::Completed);
        assert!(record.result.unwrap().find(1).unwrap().artifact.is_none());
    }
}
