//! Structured job logging.
//!
//! Every pipeline and re-export log line carries the job id and the
//! operation so one job's history can be filtered out of the shared stream.

use shorts_models::{JobId, JobStatus};
use tracing::{error, info, warn, Span};

/// Logger bound to one job and one operation.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    operation: &'static str,
}

impl JobLogger {
    /// Create a logger for a job.
    ///
    /// # Arguments
    /// * `job_id` - The job being processed
    /// * `operation` - What is being done to it, e.g. `"analyze"` or `"reexport"`
    pub fn new(job_id: &JobId, operation: &'static str) -> Self {
        Self {
            job_id: job_id.to_string(),
            operation,
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = self.operation,
            "Job started: {}", message
        );
    }

    /// Log entry into a pipeline stage.
    pub fn log_stage(&self, status: JobStatus) {
        info!(
            job_id = %self.job_id,
            operation = self.operation,
            stage = status.as_str(),
            "Job stage: {}", status.default_progress()
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = self.operation,
            "Job progress: {}", message
        );
    }

    /// Log a recoverable problem; the job continues.
    pub fn log_warning(&self, message: &str) {
        warn!(
            job_id = %self.job_id,
            operation = self.operation,
            "Job warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            job_id = %self.job_id,
            operation = self.operation,
            "Job error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = self.operation,
            "Job completed: {}", message
        );
    }

    /// Span wrapping a whole run so nested library logs inherit the job id.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "job",
            job_id = %self.job_id,
            operation = self.operation
        )
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn operation(&self) -> &str {
        self.operation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_logger_creation() {
        let job_id = JobId::from_string("job-123");
        let logger = JobLogger::new(&job_id, "analyze");

        assert_eq!(logger.job_id(), "job-123");
        assert_eq!(logger.operation(), "analyze");
    }

    #[test]
    fn test_logging_does_not_panic_without_subscriber() {
        let logger = JobLogger::new(&JobId::from_string("j"), "reexport");
        logger.log_start("start");
        logger.log_stage(JobStatus::Extracting);
        logger.log_warning("warn");
        let _guard = logger.create_span().entered();
        logger.log_completion("done");
    }
}
