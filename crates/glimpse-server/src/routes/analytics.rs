use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    pub range: Option<String>,
    pub hostname: Option<String>,
}

/// `GET /api/analytics?range=24h|7d|30d|all&hostname=...`
///
/// Unknown or missing `range` falls back to `7d`; an empty `hostname` means
/// every site.
#[tracing::instrument(skip(state))]
pub async fn analytics(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let report = state
        .service
        .get_analytics(query.range.as_deref(), query.hostname.as_deref())
        .await?;
    Ok(Json(report))
}
