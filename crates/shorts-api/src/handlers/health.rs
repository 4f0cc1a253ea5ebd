//! Health check handlers.

use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use shorts_media::{check_ffmpeg, check_ffprobe};

/// Root response.
#[derive(Serialize)]
pub struct RootResponse {
    pub status: &'static str,
    pub service: &'static str,
}

pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        status: "ok",
        service: env!("CARGO_PKG_NAME"),
    })
}

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Health check endpoint (liveness probe).
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Readiness check response.
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    pub ffmpeg: bool,
    pub ffprobe: bool,
}

/// Readiness check endpoint: the transform engine binaries must be on PATH.
pub async fn ready() -> Result<Json<ReadinessResponse>, (StatusCode, Json<ReadinessResponse>)> {
    let ffmpeg = check_ffmpeg().is_ok();
    let ffprobe = check_ffprobe().is_ok();

    if ffmpeg && ffprobe {
        Ok(Json(ReadinessResponse {
            status: "ready",
            ffmpeg,
            ffprobe,
        }))
    } else {
        Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                status: "degraded",
                ffmpeg,
                ffprobe,
            }),
        ))
    }
}
