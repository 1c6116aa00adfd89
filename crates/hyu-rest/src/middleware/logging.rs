//! Request logging middleware.

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{info, warn};

/// Logs method, path, status and latency of every request.
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    let duration_ms = start.elapsed().as_millis();
    let status = response.status().as_u16();
    if response.status().is_server_error() {
        warn!(target: "http", method = %method, path = %path, status, duration_ms, "HTTP request failed");
    } else {
        info!(target: "http", method = %method, path = %path, status, duration_ms, "HTTP request completed");
    }

    response
}
