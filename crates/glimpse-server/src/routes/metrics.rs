use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;

use glimpse_core::{counters::CountersSnapshot, store::StoreTotals};

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    #[serde(flatten)]
    pub counters: CountersSnapshot,
    pub database: StoreTotals,
}

/// `GET /metrics`: process counters plus whole-store totals.
///
/// Totals fall back to zeros when the store cannot be queried.
#[tracing::instrument(skip(state))]
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let database = match state.store().totals().await {
        Ok(totals) => totals,
        Err(e) => {
            tracing::warn!(error = %e, "Metrics: store totals unavailable");
            StoreTotals::default()
        }
    };

    Json(MetricsResponse {
        counters: state.counters().snapshot(),
        database,
    })
}
