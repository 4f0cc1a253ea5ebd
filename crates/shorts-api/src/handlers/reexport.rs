//! Re-export a clip with edited keyframes.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use shorts_models::{JobId, Keyframe};
use shorts_worker::reexport_clip;
use validator::Validate;

use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct ReexportRequest {
    #[validate(length(min = 1, max = 64))]
    pub job_id: String,

    #[validate(range(min = 1))]
    pub clip_rank: u32,

    /// Omitted or empty means a centered crop
    #[serde(default)]
    #[validate(length(max = 64))]
    pub keyframes: Option<Vec<Keyframe>>,
}

#[derive(Debug, Serialize)]
pub struct ReexportResponse {
    pub clip_rank: u32,
    pub video_url: String,
    pub s3_key: String,
    pub keyframes: Vec<Keyframe>,
}

/// Render a completed clip again and return its new URL.
///
/// Runs to completion within the request.
pub async fn reexport(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ReexportRequest>,
) -> ApiResult<Json<ReexportResponse>> {
    request.validate()?;

    let clip = reexport_clip(
        state.pipeline.context(),
        &JobId::from_string(request.job_id),
        request.clip_rank,
        request.keyframes,
    )
    .await?;

    Ok(Json(ReexportResponse {
        clip_rank: clip.rank,
        video_url: clip.artifact.video_url,
        s3_key: clip.artifact.s3_key,
        keyframes: clip.keyframes,
    }))
}
