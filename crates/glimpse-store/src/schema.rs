/// DuckDB initialization SQL.
///
/// Executed once at database open time via `Connection::execute_batch`.
/// All statements use `IF NOT EXISTS` so they are safe to re-run on every
/// startup.
///
/// `memory_limit` comes from `Config.duckdb_memory_limit`
/// (env `GLIMPSE_DUCKDB_MEMORY`, default `"1GB"`).
pub fn init_sql(memory_limit: &str) -> String {
    format!(
        r#"SET memory_limit = '{memory_limit}';
SET threads = 2;

-- ===========================================
-- EVENTS
-- ===========================================
-- `payload` holds the record exactly as accepted (JSON). The other columns
-- are projections used for pushdown and whole-store counts only.
CREATE TABLE IF NOT EXISTS events (
    id              VARCHAR PRIMARY KEY,           -- UUID v4
    event_type      VARCHAR NOT NULL,
    visitor_id      VARCHAR,
    session_id      VARCHAR,
    hostname        VARCHAR,
    occurred_at     TIMESTAMP,                     -- NULL when the client timestamp did not parse
    received_at     TIMESTAMP NOT NULL,
    payload         VARCHAR NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_events_occurred_at ON events(occurred_at);
CREATE INDEX IF NOT EXISTS idx_events_hostname    ON events(hostname, occurred_at);
"#
    )
}
