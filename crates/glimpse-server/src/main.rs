use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use glimpse_core::store::EventStore;
use glimpse_server::{
    config::{Config, StoreKind},
    state::AppState,
};
use glimpse_store::{DuckDbStore, FileEventLog};

/// `glimpse health`: liveness probe for Docker HEALTHCHECK.
///
/// Calls `GET http://localhost:$GLIMPSE_PORT/health`.
/// Exits 0 if the server responds with HTTP 200, exits 1 otherwise.
fn run_health_check() -> ! {
    let port = std::env::var("GLIMPSE_PORT")
        .or_else(|_| std::env::var("PORT"))
        .unwrap_or_else(|_| "3000".to_string());
    let url = format!("http://localhost:{}/health", port);
    match ureq::get(&url).call() {
        Ok(resp) if resp.status() == 200 => std::process::exit(0),
        _ => std::process::exit(1),
    }
}

fn open_store(cfg: &Config) -> Result<Arc<dyn EventStore>> {
    std::fs::create_dir_all(&cfg.data_dir)?;
    let store: Arc<dyn EventStore> = match cfg.store {
        StoreKind::DuckDb => Arc::new(DuckDbStore::open(
            &cfg.duckdb_path(),
            &cfg.duckdb_memory_limit,
        )?),
        StoreKind::File => Arc::new(FileEventLog::open(
            cfg.event_log_path(),
            cfg.max_file_events,
        )?),
    };
    Ok(store)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(|s| s.as_str()) == Some("health") {
        run_health_check();
    }
    // Structured JSON logging. Level controlled via RUST_LOG.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("glimpse=info".parse()?),
        )
        .json()
        .init();

    let cfg = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;
    let store = open_store(&cfg)?;
    info!(store = ?cfg.store, data_dir = %cfg.data_dir, "Event store ready");

    let addr = format!("0.0.0.0:{}", cfg.port);
    let state = Arc::new(AppState::new(store, cfg.clone()));
    let app = glimpse_server::app::build_app(state);

    info!(port = cfg.port, "Glimpse listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    info!("Shut down cleanly");
    Ok(())
}
