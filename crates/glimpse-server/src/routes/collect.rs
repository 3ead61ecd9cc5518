use std::sync::Arc;

use axum::{body::Bytes, extract::State, http::HeaderMap, response::IntoResponse, Json};
use serde_json::json;
use tracing::{error, warn};

use glimpse_core::event::EventRecord;

use crate::{error::AppError, state::AppState};

/// `POST /collect`: ingest one tracker event.
///
/// The body is read raw so malformed JSON can be counted as an error before
/// it is rejected. Responds `{ "success": true, "eventId": ... }`.
#[tracing::instrument(skip(state, headers, body))]
pub async fn collect(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let client_ip = extract_client_ip(&headers);

    let mut event = match EventRecord::from_json(&body) {
        Ok(event) => event,
        Err(e) => {
            state.counters().record_error();
            warn!(client_ip = client_ip.as_deref(), error = %e, "invalid_json_received");
            return Err(AppError::BadRequest("Invalid JSON".to_string()));
        }
    };
    event.ip = client_ip;

    let event_id = match state.service.record(event).await {
        Ok(id) => id,
        Err(e) => {
            state.counters().record_error();
            error!(error = %e, "collect_error");
            return Err(e.into());
        }
    };

    Ok(Json(json!({ "success": true, "eventId": event_id })))
}

/// First entry of `X-Forwarded-For`, if present.
pub fn extract_client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
