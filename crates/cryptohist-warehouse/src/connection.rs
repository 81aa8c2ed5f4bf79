//! Shared `DuckDB` connection handle.
//!
//! The CLI runs one command per process, so a single connection guarded by a
//! mutex is enough. Clones share the same underlying connection.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use ::duckdb::Connection;

use crate::WarehouseError;

struct HandleInner {
    db_path: PathBuf,
    connection: Mutex<Connection>,
}

/// Cloneable handle to the warehouse connection.
#[derive(Clone)]
pub struct ConnectionHandle {
    inner: Arc<HandleInner>,
}

impl ConnectionHandle {
    /// Open (or create) the database file at `path`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or configured.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, WarehouseError> {
        let db_path = path.into();
        let connection = Connection::open(db_path.as_path())?;
        configure_connection(&connection)?;
        Ok(Self {
            inner: Arc::new(HandleInner {
                db_path,
                connection: Mutex::new(connection),
            }),
        })
    }

    /// Lock the connection for the duration of the returned guard.
    ///
    /// # Errors
    /// Returns [`WarehouseError::Poisoned`] if a previous holder panicked.
    pub fn lock(&self) -> Result<MutexGuard<'_, Connection>, WarehouseError> {
        self.inner
            .connection
            .lock()
            .map_err(|_| WarehouseError::Poisoned)
    }

    #[must_use]
    pub fn db_path(&self) -> &Path {
        self.inner.db_path.as_path()
    }
}

fn configure_connection(connection: &Connection) -> Result<(), ::duckdb::Error> {
    connection.execute_batch("PRAGMA disable_progress_bar;")
}
