//! Storage configuration accepted from hosts.
//!
//! Hosts deserialize `StorageOptions` from their own configuration source
//! and call `build_context` to obtain wired storage services.

use crate::db::{DbLocation, DbResult, SqliteSessionFactory, DEFAULT_BUSY_TIMEOUT};
use crate::registration::ConfigurationContext;
use crate::schema::NullSchemaUpdater;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Who owns schema changes for the configured store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaMode {
    /// Apply embedded migrations at startup.
    #[default]
    Migrate,
    /// Deployment tooling provisions the schema; startup does nothing.
    External,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageOptions {
    pub database: DbLocation,
    #[serde(default)]
    pub schema: SchemaMode,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl StorageOptions {
    /// File-backed store with migrations and default timeouts.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            database: DbLocation::File { path: path.into() },
            schema: SchemaMode::default(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }

    /// Creates the session factory and registers storage services.
    pub fn build_context(&self) -> DbResult<ConfigurationContext> {
        let sessions = SqliteSessionFactory::with_busy_timeout(
            self.database.clone(),
            Duration::from_millis(self.busy_timeout_ms),
        )?;

        let mut context = ConfigurationContext::new();
        match self.schema {
            SchemaMode::Migrate => context.add_sqlite_storage(sessions),
            SchemaMode::External => context.add_sqlite_storage_with(sessions, NullSchemaUpdater),
        };
        Ok(context)
    }
}

fn default_busy_timeout_ms() -> u64 {
    u64::try_from(DEFAULT_BUSY_TIMEOUT.as_millis()).unwrap_or(u64::MAX)
}
