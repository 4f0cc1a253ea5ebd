//! In-process job registry.
//!
//! The registry is the single owner of every [`JobRecord`]. Readers get
//! cloned snapshots; writers go through the lifecycle methods, which apply
//! the status state machine under the write lock. Records are never removed
//! while the process lives.

use std::collections::HashMap;
use std::sync::Arc;

use shorts_models::{ClipArtifact, ClipSet, JobId, JobRecord, JobStatus, Keyframe, TranscriptLine};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{RegistryError, RegistryResult};

/// Shared, cloneable handle to the job table.
#[derive(Debug, Clone, Default)]
pub struct JobRegistry {
    jobs: Arc<RwLock<HashMap<JobId, JobRecord>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a queued job for an uploaded source and return its id.
    pub async fn create(&self, source_key: impl Into<String>) -> JobId {
        let record = JobRecord::new(source_key);
        let id = record.id.clone();
        self.jobs.write().await.insert(id.clone(), record);
        debug!(job_id = %id, "Registered job");
        id
    }

    /// Snapshot of a job.
    pub async fn get(&self, id: &JobId) -> RegistryResult<JobRecord> {
        self.jobs
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(id.clone()))
    }

    /// Apply `f` to a job under the write lock.
    async fn update<T>(
        &self,
        id: &JobId,
        f: impl FnOnce(&mut JobRecord) -> RegistryResult<T>,
    ) -> RegistryResult<T> {
        let mut jobs = self.jobs.write().await;
        let record = jobs
            .get_mut(id)
            .ok_or_else(|| RegistryError::NotFound(id.clone()))?;
        f(record)
    }

    /// Move a job to a later non-terminal stage.
    pub async fn advance(&self, id: &JobId, next: JobStatus) -> RegistryResult<()> {
        self.update(id, |record| Ok(record.advance(next)?)).await
    }

    /// Replace the progress message without changing status.
    ///
    /// Terminal jobs keep their final message.
    pub async fn set_progress(&self, id: &JobId, progress: impl Into<String>) -> RegistryResult<()> {
        let progress = progress.into();
        self.update(id, |record| {
            if !record.status.is_terminal() {
                record.progress = progress;
            }
            Ok(())
        })
        .await
    }

    /// Publish the clip set and transcript and mark the job completed.
    pub async fn complete(
        &self,
        id: &JobId,
        result: ClipSet,
        transcript: Vec<TranscriptLine>,
    ) -> RegistryResult<()> {
        self.update(id, |record| Ok(record.complete(result, transcript)?))
            .await
    }

    /// Record a failure message and mark the job failed.
    pub async fn fail(&self, id: &JobId, message: impl Into<String>) -> RegistryResult<()> {
        let message = message.into();
        self.update(id, |record| Ok(record.fail(message)?)).await
    }

    /// Replace the keyframes and artifact of one clip of a completed job.
    pub async fn update_clip(
        &self,
        id: &JobId,
        rank: u32,
        keyframes: Vec<Keyframe>,
        artifact: ClipArtifact,
    ) -> RegistryResult<()> {
        self.update(id, |record| {
            let result = record
                .result
                .as_mut()
                .ok_or_else(|| RegistryError::NoResult(id.clone()))?;
            let clip = result.find_mut(rank).ok_or_else(|| RegistryError::ClipNotFound {
                job_id: id.clone(),
                rank,
            })?;
            clip.keyframes = keyframes;
            clip.artifact = Some(artifact);
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shorts_models::ClipCandidate;

    fn clip_set() -> ClipSet {
        let (set, _) = ClipSet::from_candidates(vec![
            ClipCandidate::new(1, 10.0, 40.0, "a", "b"),
            ClipCandidate::new(2, 50.0, 90.0, "c", "d"),
        ]);
        set
    }

    async fn completed_job(registry: &JobRegistry) -> JobId {
        let id = registry.create("uploads/x/video.mp4").await;
        for status in [
            JobStatus::Downloading,
            JobStatus::Transcribing,
            JobStatus::Analyzing,
            JobStatus::Extracting,
        ] {
            registry.advance(&id, status).await.unwrap();
        }
        registry.complete(&id, clip_set(), Vec::new()).await.unwrap();
        id
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let registry = JobRegistry::new();
        let id = registry.create("uploads/a/video.mp4").await;

        let record = registry.get(&id).await.unwrap();
        assert_eq!(record.status, JobStatus::Queued);
        assert_eq!(record.progress, "Queued");
        assert_eq!(record.source_key, "uploads/a/video.mp4");
        assert!(record.result.is_none());
    }

    #[tokio::test]
    async fn test_unknown_job() {
        let registry = JobRegistry::new();
        let missing = JobId::from_string("missing");
        assert!(matches!(
            registry.get(&missing).await,
            Err(RegistryError::NotFound(_))
        ));
        assert!(registry.advance(&missing, JobStatus::Downloading).await.is_err());
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let registry = JobRegistry::new();
        let a = registry.create("k").await;
        let b = registry.create("k").await;
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_backward_transition_rejected() {
        let registry = JobRegistry::new();
        let id = registry.create("k").await;
        registry.advance(&id, JobStatus::Analyzing).await.unwrap();

        let err = registry.advance(&id, JobStatus::Downloading).await.unwrap_err();
        assert!(matches!(err, RegistryError::Transition(_)));
        assert_eq!(registry.get(&id).await.unwrap().status, JobStatus::Analyzing);
    }

    #[tokio::test]
    async fn test_terminal_states_are_final() {
        let registry = JobRegistry::new();
        let id = registry.create("k").await;
        registry.fail(&id, "boom").await.unwrap();

        assert!(registry.fail(&id, "again").await.is_err());
        assert!(registry.complete(&id, clip_set(), Vec::new()).await.is_err());
        registry.set_progress(&id, "ignored").await.unwrap();

        let record = registry.get(&id).await.unwrap();
        assert_eq!(record.status, JobStatus::Failed);
        assert_eq!(record.error.as_deref(), Some("boom"));
        assert_eq!(record.progress, "Failed");
        assert!(record.result.is_none());
    }

    #[tokio::test]
    async fn test_progress_message() {
        let registry = JobRegistry::new();
        let id = registry.create("k").await;
        registry.advance(&id, JobStatus::Extracting).await.unwrap();
        registry.set_progress(&id, "Extracting clip 2/3").await.unwrap();

        let record = registry.get(&id).await.unwrap();
        assert_eq!(record.progress, "Extracting clip 2/3");
        assert_eq!(record.status, JobStatus::Extracting);
    }

    #[tokio::test]
    async fn test_update_clip() {
        let registry = JobRegistry::new();
        let id = completed_job(&registry).await;
        let artifact = ClipArtifact {
            s3_key: "clips/j/clip_2.mp4".to_string(),
            video_url: "https://example/clip_2.mp4".to_string(),
        };
        let keyframes = vec![Keyframe::clamped(0.0, 0.8, "guest", 40.0)];

        registry
            .update_clip(&id, 2, keyframes.clone(), artifact.clone())
            .await
            .unwrap();

        let record = registry.get(&id).await.unwrap();
        let result = record.result.unwrap();
        assert_eq!(result.find(2).unwrap().keyframes, keyframes);
        assert_eq!(result.find(2).unwrap().artifact.as_ref(), Some(&artifact));
        assert!(result.find(1).unwrap().artifact.is_none());
    }

    #[tokio::test]
    async fn test_update_clip_errors() {
        let registry = JobRegistry::new();
        let artifact = ClipArtifact {
            s3_key: "k".to_string(),
            video_url: "u".to_string(),
        };

        let pending = registry.create("k").await;
        assert!(matches!(
            registry
                .update_clip(&pending, 1, vec![Keyframe::centered()], artifact.clone())
                .await,
            Err(RegistryError::NoResult(_))
        ));

        let done = completed_job(&registry).await;
        assert!(matches!(
            registry
                .update_clip(&done, 7, vec![Keyframe::centered()], artifact)
                .await,
            Err(RegistryError::ClipNotFound { rank: 7, .. })
        ));
    }
}
