//! Persistence boundary consumed by the reporting engine.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::StorageError;
use crate::event::EventRecord;

/// Whole-store counts reported by the `/metrics` endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreTotals {
    pub total_events: u64,
    pub total_visitors: u64,
    pub total_sessions: u64,
}

/// Where events are kept.
///
/// Implementations must store records as received, including ones whose
/// timestamp does not parse: such events can never satisfy a cutoff but are
/// returned by `query(None, ..)`. `query` may pre-filter by cutoff and
/// hostname; results come back in no particular order and the engine
/// re-applies its own filter anyway.
#[async_trait::async_trait]
pub trait EventStore: Send + Sync + 'static {
    /// Persist `event` and return the identifier assigned to it.
    async fn append(&self, event: EventRecord) -> Result<String, StorageError>;

    async fn query(
        &self,
        cutoff: Option<DateTime<Utc>>,
        hostname: Option<&str>,
    ) -> Result<Vec<EventRecord>, StorageError>;

    async fn totals(&self) -> Result<StoreTotals, StorageError>;

    /// Cheap liveness probe for the health endpoint.
    async fn ping(&self) -> Result<(), StorageError>;
}
