//! Unit-of-work scoping for repository calls.
//!
//! # Responsibility
//! - Provide the swappable `SessionFactory` seam that yields one connection
//!   per logical operation.
//! - Run closures inside a transaction that commits on success and rolls back
//!   on every error path.
//!
//! # Invariants
//! - Sessions are never cached or shared between calls.
//! - A dropped, uncommitted `Transaction` rolls back; a dropped `Connection`
//!   closes.

use super::open::{open_db, DbLocation, DEFAULT_BUSY_TIMEOUT};
use super::{DbError, DbResult};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Source of short-lived, fully configured connections.
pub trait SessionFactory: Send + Sync {
    fn open_session(&self) -> DbResult<Connection>;
}

impl<F: SessionFactory + ?Sized> SessionFactory for Arc<F> {
    fn open_session(&self) -> DbResult<Connection> {
        (**self).open_session()
    }
}

/// Default session factory opening a new SQLite connection per call.
pub struct SqliteSessionFactory {
    location: DbLocation,
    busy_timeout: Duration,
    // Shared in-memory databases vanish once their last connection closes.
    _anchor: Option<Mutex<Connection>>,
}

impl SqliteSessionFactory {
    pub fn new(location: DbLocation) -> DbResult<Self> {
        Self::with_busy_timeout(location, DEFAULT_BUSY_TIMEOUT)
    }

    pub fn with_busy_timeout(location: DbLocation, busy_timeout: Duration) -> DbResult<Self> {
        let anchor = match &location {
            DbLocation::SharedMemory { .. } => {
                Some(Mutex::new(open_db(&location, busy_timeout)?))
            }
            DbLocation::File { .. } => None,
        };

        Ok(Self {
            location,
            busy_timeout,
            _anchor: anchor,
        })
    }

    /// Shorthand for a file-backed store.
    pub fn file(path: impl Into<PathBuf>) -> DbResult<Self> {
        Self::new(DbLocation::File { path: path.into() })
    }

    /// Shorthand for a named shared in-memory store.
    pub fn shared_memory(name: impl Into<String>) -> DbResult<Self> {
        Self::new(DbLocation::SharedMemory { name: name.into() })
    }

    pub fn location(&self) -> &DbLocation {
        &self.location
    }
}

impl SessionFactory for SqliteSessionFactory {
    fn open_session(&self) -> DbResult<Connection> {
        open_db(&self.location, self.busy_timeout)
    }
}

/// Opens a session, runs `work` inside one transaction and commits.
///
/// The session is released on every exit path; errors from `work` roll the
/// transaction back before they reach the caller.
pub fn with_transaction<S, T, E, W>(
    factory: &S,
    behavior: TransactionBehavior,
    work: W,
) -> Result<T, E>
where
    S: SessionFactory + ?Sized,
    E: From<DbError>,
    W: FnOnce(&Transaction<'_>) -> Result<T, E>,
{
    let mut conn = factory.open_session()?;
    let tx = conn
        .transaction_with_behavior(behavior)
        .map_err(DbError::from)?;
    let value = work(&tx)?;
    tx.commit().map_err(DbError::from)?;
    Ok(value)
}
