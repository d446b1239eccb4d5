//! Schema update command and its handlers.
//!
//! # Responsibility
//! - Bring the store's structure up to date before data operations run.
//! - Let hosts swap between managed migrations and an external process.
//!
//! # Invariants
//! - Both handlers honor the same `CommandHandler<UpdateSchema>` contract.
//! - Running the migrating handler on an up-to-date store is a no-op.

mod updater;

pub use updater::{MigratingSchemaUpdater, NullSchemaUpdater};

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Request to apply pending structural changes to the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateSchema;

/// Single-operation handler for a command type.
pub trait CommandHandler<C>: Send + Sync {
    fn execute(&self, command: &C) -> Result<(), SchemaError>;
}

/// Failure while updating the store schema.
#[derive(Debug)]
pub enum SchemaError {
    Db(DbError),
}

impl Display for SchemaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "schema update failed: {err}"),
        }
    }
}

impl Error for SchemaError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
        }
    }
}

impl From<DbError> for SchemaError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}
