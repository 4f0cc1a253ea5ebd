//! Presigned upload URLs.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use shorts_storage::{upload_key, DEFAULT_VIDEO_CONTENT_TYPE};
use tracing::info;
use validator::Validate;

use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UploadUrlRequest {
    #[serde(default)]
    #[validate(length(max = 255))]
    pub filename: Option<String>,

    #[serde(default)]
    #[validate(length(min = 1, max = 127))]
    pub content_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadUrlResponse {
    pub upload_url: String,
    pub s3_key: String,
    pub content_type: String,
}

/// Issue a fresh upload key and a presigned PUT URL for it.
pub async fn get_upload_url(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<UploadUrlRequest>,
) -> ApiResult<Json<UploadUrlResponse>> {
    request.validate()?;

    let s3_key = upload_key(request.filename.as_deref());
    let content_type = request
        .content_type
        .unwrap_or_else(|| DEFAULT_VIDEO_CONTENT_TYPE.to_string());

    let upload_url = state
        .store()
        .presign_upload(&s3_key, &content_type, state.worker_config().upload_url_ttl)
        .await?;

    info!(key = %s3_key, "Issued upload URL");

    Ok(Json(UploadUrlResponse {
        upload_url,
        s3_key,
        content_type,
    }))
}
