//! `DuckDB` connection handle and pool.
//!
//! One root connection is opened per [`DuckDbConnectionManager`]; every
//! connection handed out afterwards is a clone of that root and therefore
//! shares the same database instance (this is what makes in-memory stores
//! usable from several call sites).

use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use ::duckdb::Connection;

use crate::error::WarehouseError;

/// Where the document store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageLocation {
    /// Private in-memory database, gone when the last handle is dropped.
    InMemory,
    /// Database file on disk.
    File(PathBuf),
}

impl StorageLocation {
    /// Human-readable location used in errors and logs.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::InMemory => String::from(":memory:"),
            Self::File(path) => path.to_string_lossy().into_owned(),
        }
    }
}

struct PoolState {
    root: Connection,
    idle: Vec<Connection>,
}

struct PoolInner {
    location: StorageLocation,
    max_pool_size: usize,
    state: Mutex<PoolState>,
}

/// A connection pool manager for `DuckDB` connections.
#[derive(Clone)]
pub struct DuckDbConnectionManager {
    inner: Arc<PoolInner>,
}

impl DuckDbConnectionManager {
    /// Open the root connection, waiting at most `connect_timeout`.
    ///
    /// # Errors
    /// Returns [`WarehouseError::Connect`] when the database cannot be opened and
    /// [`WarehouseError::ConnectTimeout`] when opening takes longer than allowed.
    pub fn connect(
        location: StorageLocation,
        max_pool_size: usize,
        connect_timeout: Duration,
    ) -> Result<Self, WarehouseError> {
        let (sender, receiver) = mpsc::channel();
        let target = location.clone();
        thread::spawn(move || {
            let _ = sender.send(open_connection(&target));
        });

        let root = match receiver.recv_timeout(connect_timeout) {
            Ok(Ok(connection)) => connection,
            Ok(Err(source)) => {
                return Err(WarehouseError::Connect {
                    location: location.describe(),
                    source,
                })
            }
            Err(_) => {
                return Err(WarehouseError::ConnectTimeout {
                    location: location.describe(),
                    timeout_ms: duration_ms(connect_timeout),
                })
            }
        };

        Ok(Self {
            inner: Arc::new(PoolInner {
                location,
                max_pool_size: max_pool_size.max(1),
                state: Mutex::new(PoolState {
                    root,
                    idle: Vec::new(),
                }),
            }),
        })
    }

    /// Acquire a connection from the pool.
    ///
    /// # Errors
    /// Returns an error if cloning the root connection fails.
    ///
    /// # Panics
    /// Panics if the connection pool mutex is poisoned (indicating a previous panic
    /// while holding the lock).
    pub fn acquire(&self) -> Result<PooledConnection, ::duckdb::Error> {
        let mut state = self
            .inner
            .state
            .lock()
            .expect("duckdb connection pool mutex poisoned");
        let connection = match state.idle.pop() {
            Some(connection) => connection,
            None => state.root.try_clone()?,
        };
        drop(state);

        Ok(PooledConnection {
            pool: Arc::clone(&self.inner),
            connection: Some(connection),
        })
    }

    /// Where the underlying database lives.
    #[must_use]
    pub fn location(&self) -> &StorageLocation {
        &self.inner.location
    }
}

/// A pooled connection that returns to the pool when dropped.
pub struct PooledConnection {
    pool: Arc<PoolInner>,
    connection: Option<Connection>,
}

impl Deref for PooledConnection {
    type Target = Connection;

    fn deref(&self) -> &Self::Target {
        self.connection
            .as_ref()
            .expect("pooled connection unexpectedly missing")
    }
}

impl DerefMut for PooledConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.connection
            .as_mut()
            .expect("pooled connection unexpectedly missing")
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        let Some(connection) = self.connection.take() else {
            return;
        };

        let mut state = self
            .pool
            .state
            .lock()
            .expect("duckdb connection pool mutex poisoned");
        if state.idle.len() < self.pool.max_pool_size {
            state.idle.push(connection);
        }
    }
}

pub(crate) fn duration_ms(duration: Duration) -> u64 {
    duration.as_millis().min(u128::from(u64::MAX)) as u64
}

fn open_connection(location: &StorageLocation) -> Result<Connection, ::duckdb::Error> {
    let connection = match location {
        StorageLocation::InMemory => Connection::open_in_memory()?,
        StorageLocation::File(path) => Connection::open(path)?,
    };
    connection.execute_batch("PRAGMA disable_progress_bar;")?;
    Ok(connection)
}
