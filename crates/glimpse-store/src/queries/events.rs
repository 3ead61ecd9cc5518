use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::warn;

use glimpse_core::event::EventRecord;

use crate::backend::sql_timestamp;
use crate::DuckDbStore;

fn append_pushdown_filters(
    cutoff: Option<DateTime<Utc>>,
    hostname: Option<&str>,
    filter_sql: &mut String,
    params: &mut Vec<Box<dyn duckdb::types::ToSql>>,
) {
    let mut param_idx = params.len() + 1;
    if let Some(cutoff) = cutoff {
        // Rows whose client timestamp did not parse have NULL here and drop out.
        filter_sql.push_str(&format!(" AND occurred_at >= CAST(?{} AS TIMESTAMP)", param_idx));
        params.push(Box::new(sql_timestamp(cutoff)));
        param_idx += 1;
    }
    if let Some(hostname) = hostname {
        filter_sql.push_str(&format!(" AND hostname = ?{}", param_idx));
        params.push(Box::new(hostname.to_string()));
    }
}

pub async fn query_events_inner(
    db: &DuckDbStore,
    cutoff: Option<DateTime<Utc>>,
    hostname: Option<&str>,
) -> Result<Vec<EventRecord>> {
    // Lock first: boxed params are not `Send` and must not live across an await.
    let conn = db.conn.lock().await;

    let mut filter_sql = String::new();
    let mut params: Vec<Box<dyn duckdb::types::ToSql>> = Vec::new();
    append_pushdown_filters(cutoff, hostname, &mut filter_sql, &mut params);

    let sql = format!("SELECT id, payload FROM events WHERE 1 = 1{filter_sql}");
    let mut stmt = conn.prepare(&sql)?;
    let param_refs: Vec<&dyn duckdb::types::ToSql> = params.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(param_refs.as_slice(), |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut events = Vec::new();
    for row in rows {
        let (id, payload) = row?;
        match EventRecord::from_json(payload.as_bytes()) {
            Ok(event) => events.push(event),
            Err(e) => warn!(event_id = %id, error = %e, "Skipping unreadable stored event"),
        }
    }
    Ok(events)
}

impl DuckDbStore {
    /// Events whose client timestamp is at or after `cutoff` (all events,
    /// including unparseable ones, when `cutoff` is `None`), optionally for
    /// one exact hostname.
    pub async fn query_events(
        &self,
        cutoff: Option<DateTime<Utc>>,
        hostname: Option<&str>,
    ) -> Result<Vec<EventRecord>> {
        query_events_inner(self, cutoff, hostname).await
    }
}
