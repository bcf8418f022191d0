//! Prometheus metrics for the API server.

use std::time::Instant;

use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and return a handle for rendering.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "shelfscan_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "shelfscan_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "shelfscan_http_requests_in_flight";

    // Catalog metrics
    pub const PREDICTIONS_TOTAL: &str = "shelfscan_predictions_total";
    pub const PRODUCT_LOOKUPS_TOTAL: &str = "shelfscan_product_lookups_total";
    pub const PRICE_UPDATES_TOTAL: &str = "shelfscan_price_updates_total";
}

/// Label used when no route matched.
const UNMATCHED_PATH: &str = "unmatched";

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a served prediction.
pub fn record_prediction(label: &str) {
    let labels = [("label", label.to_string())];
    counter!(names::PREDICTIONS_TOTAL, &labels).increment(1);
}

/// Record whether the predicted label matched a product.
pub fn record_product_lookup(found: bool) {
    let outcome = if found { "hit" } else { "miss" };
    counter!(names::PRODUCT_LOOKUPS_TOTAL, "outcome" => outcome).increment(1);
}

/// Record whether a price update touched a row.
pub fn record_price_update(updated: bool) {
    let outcome = if updated { "updated" } else { "no_match" };
    counter!(names::PRICE_UPDATES_TOTAL, "outcome" => outcome).increment(1);
}

/// Route template for labels, so path parameters never become label values.
fn route_label(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_PATH.to_string())
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = route_label(&request);
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}
