use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notifier configuration error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(#[from] tucan_store::StoreError),
}

pub type Result<T> = std::result::Result<T, NotifyError>;
