//! Job submission and status.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use shorts_models::{ClipSet, JobId, JobRecord, JobStatus, TranscriptLine};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::metrics;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub s3_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub job_id: JobId,
}

/// Start the pipeline for an uploaded video.
pub async fn analyze(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<AnalyzeRequest>,
) -> ApiResult<Json<AnalyzeResponse>> {
    let s3_key = request
        .s3_key
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .ok_or_else(|| ApiError::bad_request("No s3_key provided"))?;

    let job_id = state.pipeline.submit(s3_key.clone()).await;
    metrics::record_job_submitted();
    info!(job_id = %job_id, key = %s3_key, "Job submitted");

    Ok(Json(AnalyzeResponse { job_id }))
}

/// Caller-facing view of a job.
#[derive(Debug, Serialize)]
pub struct JobStatusResponse {
    pub job_id: JobId,
    pub status: JobStatus,
    pub progress: String,
    pub result: Option<ClipSet>,
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub transcript: Vec<TranscriptLine>,
}

impl From<JobRecord> for JobStatusResponse {
    fn from(record: JobRecord) -> Self {
        Self {
            job_id: record.id,
            status: record.status,
            progress: record.progress,
            result: record.result,
            error: record.error,
            transcript: record.transcript,
        }
    }
}

pub async fn job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobStatusResponse>> {
    let record = state
        .registry()
        .get(&JobId::from_string(job_id))
        .await
        .map_err(|_| ApiError::not_found("Job not found"))?;

    Ok(Json(record.into()))
}

#[derive(Debug, Serialize)]
pub struct SourceUrlResponse {
    pub url: String,
}

/// Presigned read URL for a job's source video.
pub async fn source_url(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<SourceUrlResponse>> {
    let record = state
        .registry()
        .get(&JobId::from_string(job_id))
        .await
        .map_err(|_| ApiError::not_found("Job not found"))?;

    if record.source_key.is_empty() {
        return Err(ApiError::not_found("No source video for job"));
    }

    let url = state
        .store()
        .presign_download(&record.source_key, state.worker_config().source_url_ttl)
        .await?;

    Ok(Json(SourceUrlResponse { url }))
}
