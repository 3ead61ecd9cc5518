/// Environment parsing lives in `glimpse-core` so tests can build a
/// `Config` without pulling in the server.
pub use glimpse_core::config::{Config, StoreKind};
