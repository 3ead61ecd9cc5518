use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use duckdb::Connection;
use tokio::sync::Mutex;
use tracing::{debug, info};

use glimpse_core::event::EventRecord;

use crate::schema::init_sql;

/// Format an instant the way DuckDB's implicit VARCHAR → TIMESTAMP cast
/// expects it (naive UTC, microsecond precision).
pub(crate) fn sql_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

/// Embedded DuckDB event store.
///
/// DuckDB is single-writer: concurrent reads are fine, but concurrent writes
/// contend. The connection sits behind `Arc<Mutex<_>>` so every statement is
/// serialised while the struct stays cheap to share across handlers.
pub struct DuckDbStore {
    pub(crate) conn: Arc<Mutex<Connection>>,
}

impl DuckDbStore {
    /// Open (or create) a DuckDB database file at `path`.
    ///
    /// `memory_limit` is a DuckDB size string such as `"1GB"` or `"512MB"`.
    pub fn open(path: &str, memory_limit: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(&init_sql(memory_limit))?;
        info!(
            "DuckDB opened at {} with memory_limit={}, threads=2",
            path, memory_limit
        );
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an **in-memory** database. Data is discarded on drop; for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(&init_sql("1GB"))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Assign an id and receive time to `event` and insert it.
    ///
    /// The client timestamp is projected into `occurred_at` only when it
    /// parses; the raw value is always preserved inside `payload`.
    pub async fn insert_event(&self, mut event: EventRecord) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        let received_at = Utc::now();
        event.id = Some(id.clone());
        event.received_at = Some(received_at.to_rfc3339_opts(SecondsFormat::Millis, true));

        let occurred_at = event.parsed_timestamp().map(sql_timestamp);
        let payload = event.to_json()?;

        let conn = self.conn.lock().await;
        conn.execute(
            r#"INSERT INTO events (
                id, event_type, visitor_id, session_id, hostname,
                occurred_at, received_at, payload
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"#,
            duckdb::params![
                id,
                event.event_type.as_str(),
                event.visitor_id,
                event.session_id,
                event.hostname,
                occurred_at,
                sql_timestamp(received_at),
                payload,
            ],
        )?;
        debug!(event_id = %id, event_type = event.event_type.as_str(), "Event stored");
        Ok(id)
    }

    /// Execute `SELECT 1` as a lightweight liveness check.
    pub async fn ping(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute_batch("SELECT 1")?;
        Ok(())
    }

    /// Acquire the connection lock for direct queries.
    ///
    /// Intended for integration tests that need to inspect stored rows.
    pub async fn conn_for_test(&self) -> tokio::sync::MutexGuard<'_, Connection> {
        self.conn.lock().await
    }
}
