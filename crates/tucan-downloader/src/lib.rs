pub mod analyzer;
pub mod error;
pub mod fetch;
pub mod processor;
pub mod worker;

pub use error::{DownloadError, Result};
pub use fetch::{ArticleFetcher, FetchError, FetchedArticle, HttpArticleFetcher};
pub use worker::Downloader;
