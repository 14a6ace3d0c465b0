use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Transaction};
use tracing::debug;

use crate::db::init_db;
use crate::error::{Result, StoreError};

/// Shared handle over a single SQLite connection.
///
/// Every worker in the process goes through one connection guarded by a
/// mutex; units of work take a scoped transaction via [`Store::with_tx`] so
/// all exit paths either commit or roll back.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Open (or create) the database at `path` and initialise the schema.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        init_db(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run read-only work against the connection.
    ///
    /// Generic over the caller's error type so worker crates can thread
    /// their own errors through (they all convert from [`StoreError`]).
    pub fn with_conn<T, E>(
        &self,
        f: impl FnOnce(&Connection) -> std::result::Result<T, E>,
    ) -> std::result::Result<T, E>
    where
        E: From<StoreError> + std::fmt::Display,
    {
        let conn = self.conn.lock().unwrap();
        f(&conn)
    }

    /// Run `f` inside a transaction: commit on `Ok`, roll back on `Err`.
    pub fn with_tx<T, E>(
        &self,
        f: impl FnOnce(&Transaction) -> std::result::Result<T, E>,
    ) -> std::result::Result<T, E>
    where
        E: From<StoreError> + std::fmt::Display,
    {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn
            .transaction()
            .map_err(StoreError::from)
            .map_err(E::from)?;
        match f(&tx) {
            Ok(value) => {
                tx.commit().map_err(StoreError::from).map_err(E::from)?;
                Ok(value)
            }
            Err(e) => {
                debug!("transaction rolled back: {e}");
                // Dropping the transaction rolls it back.
                Err(e)
            }
        }
    }
}
