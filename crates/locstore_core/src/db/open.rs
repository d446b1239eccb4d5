//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file-backed or named shared in-memory SQLite connections.
//! - Configure connection pragmas required by repository behavior.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`.
//! - Opening a connection never touches the schema; migrations are applied
//!   only through the schema updater.

use super::DbResult;
use log::{debug, error};
use rusqlite::{Connection, OpenFlags};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Busy timeout applied when callers do not configure one.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the localization store lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DbLocation {
    /// SQLite database file, created on first open.
    File { path: PathBuf },
    /// Named in-memory database shared by every connection in the process.
    ///
    /// Contents live only while at least one connection stays open.
    SharedMemory { name: String },
}

impl DbLocation {
    fn mode(&self) -> &'static str {
        match self {
            Self::File { .. } => "file",
            Self::SharedMemory { .. } => "memory",
        }
    }
}

/// Opens one connection to `location` and applies connection pragmas.
///
/// # Side effects
/// - Emits `db_open` debug/error events with duration and status.
pub fn open_db(location: &DbLocation, busy_timeout: Duration) -> DbResult<Connection> {
    let started_at = Instant::now();
    let mode = location.mode();

    let opened = match location {
        DbLocation::File { path } => Connection::open(path),
        DbLocation::SharedMemory { name } => Connection::open_with_flags(
            format!("file:{name}?mode=memory&cache=shared"),
            OpenFlags::default() | OpenFlags::SQLITE_OPEN_URI,
        ),
    };

    let conn = match opened {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    if let Err(err) = configure_connection(&conn, busy_timeout) {
        error!(
            "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_configure_failed error={}",
            started_at.elapsed().as_millis(),
            err
        );
        return Err(err);
    }

    debug!(
        "event=db_open module=db status=ok mode={mode} duration_ms={}",
        started_at.elapsed().as_millis()
    );
    Ok(conn)
}

fn configure_connection(conn: &Connection, busy_timeout: Duration) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(busy_timeout)?;
    Ok(())
}
