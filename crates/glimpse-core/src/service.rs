use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::counters::ServiceCounters;
use crate::error::StorageError;
use crate::event::EventRecord;
use crate::range::RangeToken;
use crate::report::{build_report, AnalyticsReport};
use crate::store::EventStore;

/// Ingestion and reporting entry points over an [`EventStore`].
///
/// Cheap to clone; handlers hold one through the application state.
#[derive(Clone)]
pub struct AnalyticsService {
    store: Arc<dyn EventStore>,
    counters: Arc<ServiceCounters>,
}

impl AnalyticsService {
    pub fn new(store: Arc<dyn EventStore>, counters: Arc<ServiceCounters>) -> Self {
        Self { store, counters }
    }

    pub fn store(&self) -> &Arc<dyn EventStore> {
        &self.store
    }

    pub fn counters(&self) -> &Arc<ServiceCounters> {
        &self.counters
    }

    /// Append one event. Store failures propagate untouched.
    pub async fn record(&self, event: EventRecord) -> Result<String, StorageError> {
        self.counters.record_store_query();
        let id = self.store.append(event).await?;
        self.counters.record_event();
        Ok(id)
    }

    /// Build the report for `range_token` (default `7d`) and an optional
    /// hostname. An empty hostname means no hostname filter.
    pub async fn get_analytics(
        &self,
        range_token: Option<&str>,
        hostname: Option<&str>,
    ) -> Result<AnalyticsReport, StorageError> {
        self.get_analytics_at(range_token, hostname, Utc::now()).await
    }

    /// Same as [`get_analytics`](Self::get_analytics) with an explicit clock.
    /// `now` is the single reference instant for every comparison in the report.
    pub async fn get_analytics_at(
        &self,
        range_token: Option<&str>,
        hostname: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<AnalyticsReport, StorageError> {
        let range = RangeToken::parse(range_token);
        let hostname = hostname.filter(|h| !h.is_empty());

        self.counters.record_store_query();
        let events = self.store.query(range.cutoff(now), hostname).await?;

        Ok(build_report(&events, range, hostname, now))
    }
}
