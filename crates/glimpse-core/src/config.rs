#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_dir: String,
    pub store: StoreKind,
    pub duckdb_memory_limit: String,
    pub max_file_events: usize,
    pub cors_origins: Vec<String>,
}

/// Which [`EventStore`](crate::store::EventStore) backs the server.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreKind {
    DuckDb,
    /// JSON-lines append log under `data_dir`.
    File,
}

pub const DEFAULT_MAX_FILE_EVENTS: usize = 100_000;

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            port: std::env::var("GLIMPSE_PORT")
                .or_else(|_| std::env::var("PORT"))
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|e| format!("invalid port: {e}"))?,
            data_dir: std::env::var("GLIMPSE_DATA_DIR").unwrap_or_else(|_| "./data".to_string()),
            store: {
                let raw = std::env::var("GLIMPSE_STORE").unwrap_or_else(|_| "duckdb".to_string());
                match raw.as_str() {
                    "duckdb" => StoreKind::DuckDb,
                    "file" => StoreKind::File,
                    other => return Err(format!("invalid GLIMPSE_STORE: {other} (expected duckdb or file)")),
                }
            },
            duckdb_memory_limit: std::env::var("GLIMPSE_DUCKDB_MEMORY")
                .unwrap_or_else(|_| "1GB".to_string()),
            max_file_events: std::env::var("GLIMPSE_MAX_FILE_EVENTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(DEFAULT_MAX_FILE_EVENTS),
            cors_origins: std::env::var("GLIMPSE_CORS_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        })
    }

    pub fn duckdb_path(&self) -> String {
        format!("{}/glimpse.db", self.data_dir)
    }

    pub fn event_log_path(&self) -> String {
        format!("{}/events.jsonl", self.data_dir)
    }
}
