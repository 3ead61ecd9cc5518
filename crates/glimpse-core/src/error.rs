use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failure reported by an [`EventStore`](crate::store::EventStore) adapter.
///
/// Adapters keep `anyhow` internally and convert at the trait boundary, so
/// callers only ever see this one kind for "the store did not answer".
/// Nothing in the engine retries it.
#[derive(Debug, Error)]
#[error("event store unavailable: {0}")]
pub struct StorageError(#[from] anyhow::Error);

impl StorageError {
    pub fn msg(message: impl std::fmt::Display) -> Self {
        Self(anyhow::anyhow!("{message}"))
    }
}
