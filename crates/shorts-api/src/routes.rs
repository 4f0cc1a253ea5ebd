//! API routes.

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

use crate::handlers::{analyze, get_upload_url, health, job_status, ready, reexport, root, source_url};
use crate::metrics::metrics_middleware;
use crate::middleware::{cors_layer, redact_internal_errors, request_id, request_logging};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let job_routes = Router::new()
        .route("/get-upload-url", post(get_upload_url))
        .route("/analyze", post(analyze))
        .route("/status/:job_id", get(job_status))
        .route("/source-url/:job_id", get(source_url))
        .layer(TimeoutLayer::new(state.config.request_timeout));

    // Renders within the request, so no request timeout
    let reexport_routes = Router::new().route("/reexport", post(reexport));

    let health_routes = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/ready", get(ready));

    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    let mut router = Router::new()
        .merge(job_routes)
        .merge(reexport_routes)
        .merge(health_routes)
        .merge(metrics_routes);

    if state.config.is_production() {
        router = router.layer(middleware::from_fn(redact_internal_errors));
    }

    router
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
