//! Worker error types.

use shorts_media::MediaError;
use shorts_ml_client::MlError;
use shorts_models::{JobId, TransitionError};
use shorts_storage::StorageError;
use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

pub type RegistryResult<T> = Result<T, RegistryError>;

/// Job registry failures.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Job not found: {0}")]
    NotFound(JobId),

    #[error("Job {0} has no result")]
    NoResult(JobId),

    #[error("Clip {rank} not found in job {job_id}")]
    ClipNotFound { job_id: JobId, rank: u32 },

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Transcription failed: {0}")]
    Transcription(MlError),

    #[error("Clip selection failed: {0}")]
    Selection(MlError),

    #[error("Transform failed: {}", .0.summary())]
    Transform(#[from] MediaError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Job run aborted: {0}")]
    Aborted(String),
}

impl WorkerError {
    /// Whether the error stems from an unknown job or clip reference.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            WorkerError::Registry(
                RegistryError::NotFound(_)
                    | RegistryError::NoResult(_)
                    | RegistryError::ClipNotFound { .. }
            )
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_message_uses_ffmpeg_summary() {
        let err = WorkerError::from(MediaError::ffmpeg_failed(
            "FFmpeg exited with non-zero status",
            Some("Error opening input".to_string()),
            Some(1),
        ));
        assert_eq!(
            err.to_string(),
            "Transform failed: FFmpeg exited with non-zero status (exit code 1): Error opening input"
        );
    }

    #[test]
    fn test_not_found_classification() {
        let job = JobId::from_string("j");
        assert!(WorkerError::from(RegistryError::NotFound(job.clone())).is_not_found());
        assert!(WorkerError::from(RegistryError::ClipNotFound { job_id: job, rank: 2 }).is_not_found());
        assert!(!WorkerError::Aborted("x".into()).is_not_found());
    }
}
