pub mod analytics;
pub mod collect;
pub mod health;
pub mod metrics;
