use async_trait::async_trait;
use chrono::{DateTime, Utc};

use glimpse_core::error::StorageError;
use glimpse_core::event::EventRecord;
use glimpse_core::store::{EventStore, StoreTotals};

use crate::{DuckDbStore, FileEventLog};

#[async_trait]
impl EventStore for DuckDbStore {
    async fn append(&self, event: EventRecord) -> Result<String, StorageError> {
        Ok(DuckDbStore::insert_event(self, event).await?)
    }

    async fn query(
        &self,
        cutoff: Option<DateTime<Utc>>,
        hostname: Option<&str>,
    ) -> Result<Vec<EventRecord>, StorageError> {
        Ok(DuckDbStore::query_events(self, cutoff, hostname).await?)
    }

    async fn totals(&self) -> Result<StoreTotals, StorageError> {
        Ok(DuckDbStore::totals(self).await?)
    }

    async fn ping(&self) -> Result<(), StorageError> {
        Ok(DuckDbStore::ping(self).await?)
    }
}

#[async_trait]
impl EventStore for FileEventLog {
    async fn append(&self, event: EventRecord) -> Result<String, StorageError> {
        Ok(FileEventLog::append_event(self, event).await?)
    }

    async fn query(
        &self,
        cutoff: Option<DateTime<Utc>>,
        hostname: Option<&str>,
    ) -> Result<Vec<EventRecord>, StorageError> {
        Ok(FileEventLog::query_events(self, cutoff, hostname).await)
    }

    async fn totals(&self) -> Result<StoreTotals, StorageError> {
        Ok(FileEventLog::totals(self).await)
    }

    async fn ping(&self) -> Result<(), StorageError> {
        Ok(FileEventLog::ping(self).await?)
    }
}
