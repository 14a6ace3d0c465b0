pub mod batch;
pub mod error;
pub mod format;
pub mod send;
pub mod worker;

pub use error::{NotifyError, Result};
pub use worker::Notifier;
