pub mod api;
pub mod error;
pub mod gaps;
pub mod index;
pub mod updater;
pub mod worker;

pub use error::{Result, SyncError};
pub use worker::Synchronizer;
