use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// How many recent request durations feed the average.
pub const DURATION_WINDOW: usize = 1000;

/// Process-wide service counters.
///
/// Constructed once at startup and shared through `Arc` with both the
/// ingestion and the reporting paths. Values only grow; they reset when the
/// process restarts and at no other time.
#[derive(Debug)]
pub struct ServiceCounters {
    requests_total: AtomicU64,
    events_collected: AtomicU64,
    errors_total: AtomicU64,
    store_queries: AtomicU64,
    durations: Mutex<VecDeque<Duration>>,
    started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountersSnapshot {
    pub requests_total: u64,
    pub events_collected: u64,
    pub errors_total: u64,
    #[serde(rename = "db_queries")]
    pub store_queries: u64,
    pub avg_request_duration_ms: f64,
    pub uptime_since: DateTime<Utc>,
}

impl Default for ServiceCounters {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceCounters {
    pub fn new() -> Self {
        Self {
            requests_total: AtomicU64::new(0),
            events_collected: AtomicU64::new(0),
            errors_total: AtomicU64::new(0),
            store_queries: AtomicU64::new(0),
            durations: Mutex::new(VecDeque::with_capacity(DURATION_WINDOW)),
            started_at: Utc::now(),
        }
    }

    /// Count one finished HTTP request and remember how long it took.
    pub fn record_request(&self, elapsed: Duration) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        let mut window = self
            .durations
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if window.len() == DURATION_WINDOW {
            window.pop_front();
        }
        window.push_back(elapsed);
    }

    pub fn record_event(&self) {
        self.events_collected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_store_query(&self) {
        self.store_queries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CountersSnapshot {
        let avg_ms = {
            let window = self
                .durations
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if window.is_empty() {
                0.0
            } else {
                let total: Duration = window.iter().sum();
                total.as_secs_f64() * 1000.0 / window.len() as f64
            }
        };

        CountersSnapshot {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            events_collected: self.events_collected.load(Ordering::Relaxed),
            errors_total: self.errors_total.load(Ordering::Relaxed),
            store_queries: self.store_queries.load(Ordering::Relaxed),
            avg_request_duration_ms: (avg_ms * 100.0).round() / 100.0,
            uptime_since: self.started_at,
        }
    }
}
