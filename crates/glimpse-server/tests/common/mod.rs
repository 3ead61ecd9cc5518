#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use chrono::{DateTime, Utc};
use http_body_util::BodyExt;
use serde_json::Value;

use glimpse_core::config::{Config, StoreKind, DEFAULT_MAX_FILE_EVENTS};
use glimpse_core::error::StorageError;
use glimpse_core::event::EventRecord;
use glimpse_core::store::{EventStore, StoreTotals};
use glimpse_server::app::build_app;
use glimpse_server::state::AppState;
use glimpse_store::DuckDbStore;

pub fn test_config() -> Config {
    Config {
        port: 0,
        data_dir: "/tmp/glimpse-test".to_string(),
        store: StoreKind::DuckDb,
        duckdb_memory_limit: "256MB".to_string(),
        max_file_events: DEFAULT_MAX_FILE_EVENTS,
        cors_origins: vec![],
    }
}

pub fn test_state() -> Arc<AppState> {
    let db = DuckDbStore::open_in_memory().expect("in-memory DuckDB");
    Arc::new(AppState::new(Arc::new(db), test_config()))
}

pub fn app_for(state: &Arc<AppState>) -> axum::Router {
    build_app(Arc::clone(state))
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("parse JSON")
}

pub fn post_json(uri: &str, body: impl Into<String>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.into()))
        .expect("build request")
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build request")
}

pub fn iso(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Store whose every call fails, for the degraded paths.
pub struct BrokenStore;

#[async_trait::async_trait]
impl EventStore for BrokenStore {
    async fn append(&self, _event: EventRecord) -> Result<String, StorageError> {
        Err(StorageError::msg("disk full"))
    }

    async fn query(
        &self,
        _cutoff: Option<DateTime<Utc>>,
        _hostname: Option<&str>,
    ) -> Result<Vec<EventRecord>, StorageError> {
        Err(StorageError::msg("disk full"))
    }

    async fn totals(&self) -> Result<StoreTotals, StorageError> {
        Err(StorageError::msg("disk full"))
    }

    async fn ping(&self) -> Result<(), StorageError> {
        Err(StorageError::msg("disk full"))
    }
}

pub fn broken_state() -> Arc<AppState> {
    Arc::new(AppState::new(Arc::new(BrokenStore), test_config()))
}
