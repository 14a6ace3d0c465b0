pub mod analysis;
pub mod articles;
pub mod days;
pub mod db;
pub mod delivery;
pub mod error;
pub mod seed;
pub mod store;
pub mod types;

pub use error::{Result, StoreError};
pub use store::Store;
pub use types::{Article, Candidate, DateRange, NewArticle, SmartCategory, Verdict};
