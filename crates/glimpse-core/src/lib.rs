pub mod aggregate;
pub mod config;
pub mod counters;
pub mod error;
pub mod event;
pub mod range;
pub mod rank;
pub mod referrer;
pub mod report;
pub mod service;
pub mod store;
