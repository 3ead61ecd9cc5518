use std::sync::Arc;

use glimpse_core::{
    config::Config, counters::ServiceCounters, service::AnalyticsService, store::EventStore,
};

/// Shared application state injected into every Axum handler via
/// [`axum::extract::State`].
pub struct AppState {
    /// Ingestion and reporting over the configured event store.
    pub service: AnalyticsService,

    /// Parsed configuration, loaded once at startup from environment variables.
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire a fresh set of counters to `store`.
    pub fn new(store: Arc<dyn EventStore>, config: Config) -> Self {
        Self::with_counters(store, Arc::new(ServiceCounters::new()), config)
    }

    pub fn with_counters(
        store: Arc<dyn EventStore>,
        counters: Arc<ServiceCounters>,
        config: Config,
    ) -> Self {
        Self {
            service: AnalyticsService::new(store, counters),
            config: Arc::new(config),
        }
    }

    pub fn counters(&self) -> &ServiceCounters {
        self.service.counters()
    }

    pub fn store(&self) -> &Arc<dyn EventStore> {
        self.service.store()
    }
}
