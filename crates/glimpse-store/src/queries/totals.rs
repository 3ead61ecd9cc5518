use anyhow::Result;

use glimpse_core::store::StoreTotals;

use crate::DuckDbStore;

impl DuckDbStore {
    /// Whole-table counts. Empty identifiers are not distinct visitors/sessions.
    pub async fn totals(&self) -> Result<StoreTotals> {
        let conn = self.conn.lock().await;
        let (events, visitors, sessions) = conn
            .prepare(
                "SELECT COUNT(*), \
                        COUNT(DISTINCT NULLIF(visitor_id, '')), \
                        COUNT(DISTINCT NULLIF(session_id, '')) \
                 FROM events",
            )?
            .query_row([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?;

        Ok(StoreTotals {
            total_events: events.max(0) as u64,
            total_visitors: visitors.max(0) as u64,
            total_sessions: sessions.max(0) as u64,
        })
    }
}
