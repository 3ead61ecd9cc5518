use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::info;

use crate::state::AppState;

pub static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Count every request, time it, and tag the response with a request id.
///
/// An incoming `X-Request-ID` is echoed back; otherwise one is generated.
pub async fn track_requests(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let request_id = req
        .headers()
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("req_{}", uuid::Uuid::new_v4().simple()));
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let client_ip = crate::routes::collect::extract_client_ip(req.headers());

    let mut response = next.run(req).await;

    let elapsed = started.elapsed();
    state.counters().record_request(elapsed);

    info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        status_code = response.status().as_u16(),
        duration_ms = (elapsed.as_secs_f64() * 100_000.0).round() / 100.0,
        client_ip = client_ip.as_deref(),
        "request_completed"
    );

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(X_REQUEST_ID.clone(), value);
    }
    response
}
