use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Store error: {0}")]
    Store(#[from] tucan_store::StoreError),

    #[error(transparent)]
    Core(#[from] tucan_core::CoreError),

    #[error("Article has no stored body: {0}")]
    MissingBody(i64),

    #[error("Analysis failed: {0}")]
    Analysis(#[from] tucan_agent::ResponseError),
}

pub type Result<T> = std::result::Result<T, DownloadError>;
