//! Prometheus metrics for the API server.

use std::sync::LazyLock;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use regex::Regex;

static JOB_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/(status|source-url)/[^/]+$").unwrap());

/// Install the Prometheus recorder and return the handle that renders it.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    pub const HTTP_REQUESTS_TOTAL: &str = "shorts_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "shorts_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "shorts_http_requests_in_flight";
    pub const JOBS_SUBMITTED_TOTAL: &str = "shorts_jobs_submitted_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

pub fn record_job_submitted() {
    counter!(names::JOBS_SUBMITTED_TOTAL).increment(1);
}

/// Collapse job ids so label cardinality stays bounded.
fn sanitize_path(path: &str) -> String {
    JOB_PATH.replace(path, "/$1/:job_id").into_owned()
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);
    let response = next.run(request).await;
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    record_http_request(
        &method,
        &path,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path() {
        assert_eq!(
            sanitize_path("/status/550e8400-e29b-41d4-a716-446655440000"),
            "/status/:job_id"
        );
        assert_eq!(sanitize_path("/source-url/abc"), "/source-url/:job_id");
        assert_eq!(sanitize_path("/reexport"), "/reexport");
        assert_eq!(sanitize_path("/status/a/b"), "/status/a/b");
    }
}
