//! Analysis job record and its status state machine.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::clip::ClipSet;
use crate::transcript::TranscriptLine;

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pipeline stage of a job.
///
/// Stages only move forward. `Failed` is reachable from every non-terminal
/// stage; `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Queued,
    Downloading,
    Transcribing,
    Analyzing,
    Extracting,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Downloading => "downloading",
            JobStatus::Transcribing => "transcribing",
            JobStatus::Analyzing => "analyzing",
            JobStatus::Extracting => "extracting",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Position along the forward path. `Failed` has no position.
    fn position(&self) -> Option<u8> {
        match self {
            JobStatus::Queued => Some(0),
            JobStatus::Downloading => Some(1),
            JobStatus::Transcribing => Some(2),
            JobStatus::Analyzing => Some(3),
            JobStatus::Extracting => Some(4),
            JobStatus::Completed => Some(5),
            JobStatus::Failed => None,
        }
    }

    /// Whether moving from `self` to `next` keeps the sequence strictly forward.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self.position(), next.position()) {
            (_, None) => true,
            (Some(from), Some(to)) => to > from,
            (None, Some(_)) => false,
        }
    }

    /// Progress text shown while a job sits in this stage.
    pub fn default_progress(&self) -> &'static str {
        match self {
            JobStatus::Queued => "Queued",
            JobStatus::Downloading => "Downloading video",
            JobStatus::Transcribing => "Transcribing audio",
            JobStatus::Analyzing => "Selecting clips",
            JobStatus::Extracting => "Extracting clips",
            JobStatus::Completed => "Done",
            JobStatus::Failed => "Failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Rejected status change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid job transition from {from} to {to}")]
pub struct TransitionError {
    pub from: JobStatus,
    pub to: JobStatus,
}

/// One analysis request and everything the pipeline learned about it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct JobRecord {
    /// Immutable job identifier
    pub id: JobId,

    pub status: JobStatus,

    /// Human-readable description of the current stage
    pub progress: String,

    /// Extracted clips, set once on completion
    pub result: Option<ClipSet>,

    /// Failure message, set once on failure
    pub error: Option<String>,

    /// Object key of the uploaded source video
    pub source_key: String,

    /// Flattened transcript, populated on completion
    #[serde(default)]
    pub transcript: Vec<TranscriptLine>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobRecord {
    /// Create a queued job for an uploaded source video.
    pub fn new(source_key: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            status: JobStatus::Queued,
            progress: JobStatus::Queued.default_progress().to_string(),
            result: None,
            error: None,
            source_key: source_key.into(),
            transcript: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to a later non-terminal stage.
    pub fn advance(&mut self, next: JobStatus) -> Result<(), TransitionError> {
        self.advance_with_progress(next, next.default_progress())
    }

    /// Move to a later stage with a custom progress message.
    pub fn advance_with_progress(
        &mut self,
        next: JobStatus,
        progress: impl Into<String>,
    ) -> Result<(), TransitionError> {
        if next.is_terminal() || !self.status.can_transition_to(next) {
            return Err(TransitionError {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.progress = progress.into();
        self.touch();
        Ok(())
    }

    /// Attach the result and transcript view and mark the job completed.
    pub fn complete(
        &mut self,
        result: ClipSet,
        transcript: Vec<TranscriptLine>,
    ) -> Result<(), TransitionError> {
        if !self.status.can_transition_to(JobStatus::Completed) {
            return Err(TransitionError {
                from: self.status,
                to: JobStatus::Completed,
            });
        }
        self.status = JobStatus::Completed;
        self.progress = JobStatus::Completed.default_progress().to_string();
        self.result = Some(result);
        self.transcript = transcript;
        self.touch();
        Ok(())
    }

    /// Record a failure message and mark the job failed.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), TransitionError> {
        if !self.status.can_transition_to(JobStatus::Failed) {
            return Err(TransitionError {
                from: self.status,
                to: JobStatus::Failed,
            });
        }
        self.status = JobStatus::Failed;
        self.progress = JobStatus::Failed.default_progress().to_string();
        self.error = Some(message.into());
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_status_serde() {
        assert_eq!(
            serde_json::to_string(&JobStatus::Transcribing).unwrap(),
            "\"transcribing\""
        );
        let parsed: JobStatus = serde_json::from_str("\"extracting\"").unwrap();
        assert_eq!(parsed, JobStatus::Extracting);
    }

    #[test]
    fn test_forward_transitions_only() {
        assert!(JobStatus::Queued.can_transition_to(JobStatus::Downloading));
        assert!(JobStatus::Downloading.can_transition_to(JobStatus::Analyzing));
        assert!(!JobStatus::Analyzing.can_transition_to(JobStatus::Transcribing));
        assert!(!JobStatus::Extracting.can_transition_to(JobStatus::Extracting));
    }

    #[test]
    fn test_failed_reachable_from_non_terminal() {
        for status in [
            JobStatus::Queued,
            JobStatus::Downloading,
            JobStatus::Transcribing,
            JobStatus::Analyzing,
            JobStatus::Extracting,
        ] {
            assert!(status.can_transition_to(JobStatus::Failed), "{status}");
        }
        assert!(!JobStatus::Completed.can_transition_to(JobStatus::Failed));
        assert!(!JobStatus::Failed.can_transition_to(JobStatus::Failed));
        assert!(!JobStatus::Failed.can_transition_to(JobStatus::Downloading));
    }

    #[test]
    fn test_record_lifecycle() {
        let mut job = JobRecord::new("uploads/abc/video.mp4");
        assert_eq!(job.status, JobStatus::Queued);

        job.advance(JobStatus::Downloading).unwrap();
        job.advance(JobStatus::Transcribing).unwrap();
        assert_eq!(job.progress, "Transcribing audio");
        assert!(job.advance(JobStatus::Downloading).is_err());

        job.advance(JobStatus::Analyzing).unwrap();
        job.advance(JobStatus::Extracting).unwrap();
        job.complete(ClipSet::default(), Vec::new()).unwrap();

        assert_eq!(job.status, JobStatus::Completed);
        assert!(job.result.is_some());
        assert!(job.error.is_none());
        assert!(job.fail("late").is_err());
    }

    #[test]
    fn test_advance_rejects_terminal_targets() {
        let mut job = JobRecord::new("k");
        let err = job.advance(JobStatus::Completed).unwrap_err();
        assert_eq!(err.to, JobStatus::Completed);
        assert_eq!(job.status, JobStatus::Queued);
    }

    #[test]
    fn test_fail_sets_error_once() {
        let mut job = JobRecord::new("k");
        job.advance(JobStatus::Downloading).unwrap();
        job.fail("source missing").unwrap();
        assert_eq!(job.error.as_deref(), Some("source missing"));
        assert!(job.fail("again").is_err());
        assert_eq!(job.error.as_deref(), Some("source missing"));
    }
}
