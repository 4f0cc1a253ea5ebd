//! Analysis pipeline orchestration.
//!
//! A job runs on its own task through download, transcription, clip
//! selection and per-clip extraction. Transcription problems degrade to an
//! empty transcript; every other stage failure ends the job as failed with
//! a descriptive message. A supervisor task turns panics into failures, so
//! no job is ever left in a non-terminal state once its run ends.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use shorts_media::MediaEngine;
use shorts_ml_client::{ClipSelector, KeyframeEstimator, Transcriber};
use shorts_models::{ClipSet, JobId, JobStatus, Transcript};
use shorts_storage::ObjectStore;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::extraction::ClipExtractor;
use crate::logging::JobLogger;
use crate::metrics;
use crate::registry::JobRegistry;

/// Collaborators and settings shared by every job run.
pub struct PipelineContext {
    pub config: WorkerConfig,
    pub registry: JobRegistry,
    pub store: Arc<dyn ObjectStore>,
    pub media: Arc<dyn MediaEngine>,
    pub transcriber: Arc<dyn Transcriber>,
    pub selector: Arc<dyn ClipSelector>,
    pub estimator: Arc<dyn KeyframeEstimator>,
}

/// Handle for submitting jobs. Cheap to clone.
#[derive(Clone)]
pub struct Pipeline {
    ctx: Arc<PipelineContext>,
    permits: Arc<Semaphore>,
}

impl Pipeline {
    pub fn new(ctx: PipelineContext) -> Self {
        let permits = Arc::new(Semaphore::new(ctx.config.max_concurrent_jobs.max(1)));
        Self {
            ctx: Arc::new(ctx),
            permits,
        }
    }

    pub fn context(&self) -> &Arc<PipelineContext> {
        &self.ctx
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.ctx.registry
    }

    /// Register a job for an uploaded source and start it in the background.
    pub async fn submit(&self, source_key: impl Into<String>) -> JobId {
        let id = self.ctx.registry.create(source_key).await;
        // Detached; the supervisor records the outcome in the registry.
        let _ = self.start(id.clone());
        id
    }

    /// Run a registered job in the background.
    ///
    /// The job stays queued until a concurrency permit is free. The returned
    /// handle resolves once the job has reached a terminal state.
    pub fn start(&self, job_id: JobId) -> JoinHandle<()> {
        let ctx = Arc::clone(&self.ctx);
        let permits = Arc::clone(&self.permits);

        tokio::spawn(async move {
            let logger = JobLogger::new(&job_id, "analyze");

            let _permit = match permits.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    logger.log_error("Pipeline shut down before job could start");
                    let _ = ctx.registry.fail(&job_id, "Pipeline shut down").await;
                    return;
                }
            };

            let run = {
                let ctx = Arc::clone(&ctx);
                let job_id = job_id.clone();
                let span = logger.create_span();
                tokio::spawn(async move { run_job(&ctx, &job_id).await }.instrument(span))
            };

            if let Err(e) = run.await {
                let reason = if e.is_panic() { "panicked" } else { "cancelled" };
                let message = WorkerError::Aborted(reason.to_string()).to_string();
                logger.log_error(&message);
                if ctx.registry.fail(&job_id, message).await.is_ok() {
                    metrics::record_job_failed(std::time::Duration::ZERO, "aborted");
                }
            }
        })
    }
}

/// Execute a job and record its terminal state.
async fn run_job(ctx: &PipelineContext, job_id: &JobId) {
    let logger = JobLogger::new(job_id, "analyze");
    let started = Instant::now();
    metrics::record_job_started();
    logger.log_start("Processing uploaded video");

    match execute(ctx, job_id, &logger).await {
        Ok(clips) => {
            metrics::record_job_completed(started.elapsed(), clips);
            logger.log_completion(&format!(
                "{} clips extracted in {:.1}s",
                clips,
                started.elapsed().as_secs_f64()
            ));
        }
        Err(e) => {
            let stage = ctx
                .registry
                .get(job_id)
                .await
                .map(|r| r.status.as_str())
                .unwrap_or("unknown");
            let message = e.to_string();
            logger.log_error(&message);
            metrics::record_job_failed(started.elapsed(), stage);
            if let Err(e) = ctx.registry.fail(job_id, message).await {
                logger.log_error(&format!("Could not record failure: {}", e));
            }
        }
    }
}

/// The stages of a job. Returns the number of clips extracted.
async fn execute(ctx: &PipelineContext, job_id: &JobId, logger: &JobLogger) -> WorkerResult<usize> {
    let record = ctx.registry.get(job_id).await?;

    tokio::fs::create_dir_all(&ctx.config.work_dir).await?;
    // Removed on every exit path when dropped.
    let work_dir = tempfile::Builder::new()
        .prefix(&format!("job_{}_", job_id))
        .tempdir_in(&ctx.config.work_dir)?;
    let source = work_dir.path().join("source.mp4");

    enter_stage(ctx, job_id, logger, JobStatus::Downloading).await?;
    ctx.store.download(&record.source_key, &source).await?;

    enter_stage(ctx, job_id, logger, JobStatus::Transcribing).await?;
    let transcript = transcribe_or_empty(ctx, &source, work_dir.path(), logger).await;
    logger.log_progress(&format!("Transcript has {} segments", transcript.len()));

    enter_stage(ctx, job_id, logger, JobStatus::Analyzing).await?;
    let candidates = ctx
        .selector
        .select(&transcript)
        .await
        .map_err(WorkerError::Selection)?;
    let (mut clip_set, rejected) = ClipSet::from_candidates(candidates);
    for r in &rejected {
        logger.log_warning(&format!("Dropped clip candidate {}: {}", r.rank, r.reason));
    }
    logger.log_progress(&format!("Selected {} clips", clip_set.len()));

    enter_stage(ctx, job_id, logger, JobStatus::Extracting).await?;
    let extracted = extract_all(ctx, job_id, logger, &source, &clip_set, work_dir.path()).await?;

    // Merge by rank; candidates own their identity, not their position.
    for clip in extracted {
        if let Some(candidate) = clip_set.find_mut(clip.rank) {
            candidate.keyframes = clip.keyframes;
            candidate.artifact = Some(clip.artifact);
        }
    }

    let count = clip_set.len();
    ctx.registry
        .complete(job_id, clip_set, transcript.lines())
        .await?;
    Ok(count)
}

async fn enter_stage(
    ctx: &PipelineContext,
    job_id: &JobId,
    logger: &JobLogger,
    status: JobStatus,
) -> WorkerResult<()> {
    logger.log_stage(status);
    ctx.registry.advance(job_id, status).await?;
    Ok(())
}

async fn extract_all(
    ctx: &PipelineContext,
    job_id: &JobId,
    logger: &JobLogger,
    source: &Path,
    clip_set: &ClipSet,
    work_dir: &Path,
) -> WorkerResult<Vec<crate::extraction::ExtractedClip>> {
    if clip_set.is_empty() {
        return Ok(Vec::new());
    }

    let video = ctx.media.probe(source).await?;
    logger.log_progress(&format!(
        "Source is {}x{}, {:.1}s",
        video.width, video.height, video.duration
    ));

    let extractor = ClipExtractor::new(ctx, job_id, logger);
    let total = clip_set.len();
    let mut extracted = Vec::with_capacity(total);

    for (i, candidate) in clip_set.clips.iter().enumerate() {
        ctx.registry
            .set_progress(job_id, format!("Extracting clip {}/{}", i + 1, total))
            .await?;
        extracted.push(extractor.extract(source, &video, candidate, work_dir).await?);
    }

    Ok(extracted)
}

/// Transcript of the source's audio, or an empty transcript on any failure.
async fn transcribe_or_empty(
    ctx: &PipelineContext,
    source: &Path,
    work_dir: &Path,
    logger: &JobLogger,
) -> Transcript {
    let audio = work_dir.join("audio.mp3");
    let outcome = transcribe(ctx, source, &audio).await;
    let _ = tokio::fs::remove_file(&audio).await;

    match outcome {
        Ok(transcript) => transcript,
        Err(e) => {
            metrics::record_transcription_fallback();
            logger.log_warning(&format!("Continuing with empty transcript: {}", e));
            Transcript::default()
        }
    }
}

async fn transcribe(ctx: &PipelineContext, source: &Path, audio: &Path) -> WorkerResult<Transcript> {
    ctx.media.extract_audio(source, audio).await?;
    let bytes = tokio::fs::read(audio).await?;
    ctx.transcriber
        .transcribe(bytes)
        .await
        .map_err(WorkerError::Transcription)
}
