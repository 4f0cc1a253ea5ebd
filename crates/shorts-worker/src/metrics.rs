//! Pipeline metrics.
//!
//! Recorded through the `metrics` facade; the HTTP server installs the
//! Prometheus recorder that exports them.

use std::time::Duration;

use metrics::{counter, histogram};

pub mod names {
    pub const JOBS_STARTED: &str = "shorts_jobs_started_total";
    pub const JOBS_COMPLETED: &str = "shorts_jobs_completed_total";
    pub const JOBS_FAILED: &str = "shorts_jobs_failed_total";
    pub const JOB_DURATION: &str = "shorts_job_duration_seconds";
    pub const CLIPS_EXTRACTED: &str = "shorts_clips_extracted_total";
    pub const KEYFRAME_FALLBACKS: &str = "shorts_keyframe_fallbacks_total";
    pub const TRANSCRIPTION_FALLBACKS: &str = "shorts_transcription_fallbacks_total";
    pub const REEXPORTS: &str = "shorts_reexports_total";
}

pub fn record_job_started() {
    counter!(names::JOBS_STARTED).increment(1);
}

pub fn record_job_completed(elapsed: Duration, clips: usize) {
    counter!(names::JOBS_COMPLETED).increment(1);
    histogram!(names::JOB_DURATION, "outcome" => "completed").record(elapsed.as_secs_f64());
    counter!(names::CLIPS_EXTRACTED).increment(clips as u64);
}

/// `stage` is the status the job was in when it failed.
pub fn record_job_failed(elapsed: Duration, stage: &'static str) {
    counter!(names::JOBS_FAILED, "stage" => stage).increment(1);
    histogram!(names::JOB_DURATION, "outcome" => "failed").record(elapsed.as_secs_f64());
}

pub fn record_keyframe_fallback(reason: &'static str) {
    counter!(names::KEYFRAME_FALLBACKS, "reason" => reason).increment(1);
}

pub fn record_transcription_fallback() {
    counter!(names::TRANSCRIPTION_FALLBACKS).increment(1);
}

pub fn record_reexport(success: bool) {
    let outcome = if success { "success" } else { "error" };
    counter!(names::REEXPORTS, "outcome" => outcome).increment(1);
}
