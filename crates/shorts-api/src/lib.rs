//! Axum HTTP API for the shorts clip pipeline.
//!
//! This crate provides:
//! - Presigned upload URLs and job submission
//! - Job status polling and source video URLs
//! - Synchronous clip re-export with edited keyframes
//! - Health, readiness and Prometheus metrics endpoints

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
