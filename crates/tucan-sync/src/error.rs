use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    /// Network-level failure after all retries. Transient: the day stays
    /// gapped and is retried next cycle.
    #[error("API connection error: {0}")]
    Connection(String),

    /// The endpoint answered with something that is not a valid index.
    /// Fatal for the affected day, never retried within a cycle.
    #[error("API response error: {0}")]
    Response(String),

    #[error("Store error: {0}")]
    Store(#[from] tucan_store::StoreError),

    #[error(transparent)]
    Core(#[from] tucan_core::CoreError),
}

pub type Result<T> = std::result::Result<T, SyncError>;
