//! Embedded SQLite storage.
//!
//! A [`Database`] is a cheaply cloneable handle around one shared
//! connection. The local cache and the reference remote store both use it,
//! each with its own DDL. Writes are serialized by the connection lock; no
//! other locking is done.

pub mod sql;

use std::{
    path::Path,
    sync::{Arc, Mutex},
};

use rusqlite::Connection;

use crate::{error::StoreError, schema};

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens (or creates) the local cache at `path`.
    pub fn open_local(path: &Path) -> Result<Self, StoreError> {
        Self::open(path, schema::LOCAL_DDL)
    }

    /// Opens (or creates) the reference remote store at `path`.
    pub fn open_remote(path: &Path) -> Result<Self, StoreError> {
        Self::open(path, schema::REMOTE_DDL)
    }

    pub fn memory_local() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?, schema::LOCAL_DDL)
    }

    pub fn memory_remote() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?, schema::REMOTE_DDL)
    }

    fn open(path: &Path, ddl: &str) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?, ddl)
    }

    fn init(conn: Connection, ddl: &str) -> Result<Self, StoreError> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(ddl)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `f` with exclusive access to the connection.
    pub fn with_connection<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        f(&conn)
    }
}
