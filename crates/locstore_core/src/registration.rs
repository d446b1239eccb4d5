//! Host wiring for the SQLite storage adapter.
//!
//! # Responsibility
//! - Register the resource repository and one schema updater variant.
//! - Drive the startup sequence the localization framework runs: schema
//!   update first, then reconciliation of scanned resources.
//!
//! # Invariants
//! - The repository and the migrating updater share one session factory.
//! - `Synchronizer` never caches resources between calls.

use crate::db::SessionFactory;
use crate::model::discovered::DiscoveredResource;
use crate::repo::resource_repo::{
    ReconcileSummary, RepoError, ResourceRepository, SqliteResourceRepository,
};
use crate::schema::{CommandHandler, MigratingSchemaUpdater, SchemaError, UpdateSchema};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type RegistrationResult<T> = Result<T, RegistrationError>;

#[derive(Debug)]
pub enum RegistrationError {
    /// No repository has been registered on the context.
    MissingRepository,
    /// No `UpdateSchema` handler has been registered on the context.
    MissingSchemaUpdater,
    Schema(SchemaError),
    Repo(RepoError),
}

impl Display for RegistrationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRepository => write!(f, "no resource repository registered"),
            Self::MissingSchemaUpdater => write!(f, "no schema updater registered"),
            Self::Schema(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RegistrationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Schema(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::MissingRepository | Self::MissingSchemaUpdater => None,
        }
    }
}

impl From<SchemaError> for RegistrationError {
    fn from(value: SchemaError) -> Self {
        Self::Schema(value)
    }
}

impl From<RepoError> for RegistrationError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Registry of storage services handed to the localization framework.
#[derive(Default, Clone)]
pub struct ConfigurationContext {
    repository: Option<Arc<dyn ResourceRepository>>,
    schema_updater: Option<Arc<dyn CommandHandler<UpdateSchema>>>,
}

impl ConfigurationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers SQLite storage with the migrating schema updater.
    pub fn add_sqlite_storage<F>(&mut self, sessions: F) -> &mut Self
    where
        F: SessionFactory + 'static,
    {
        let sessions = Arc::new(sessions);
        let updater = MigratingSchemaUpdater::new(Arc::clone(&sessions));
        self.add_sqlite_storage_with(sessions, updater)
    }

    /// Registers SQLite storage with a caller-chosen schema updater.
    pub fn add_sqlite_storage_with<F, U>(&mut self, sessions: F, updater: U) -> &mut Self
    where
        F: SessionFactory + 'static,
        U: CommandHandler<UpdateSchema> + 'static,
    {
        self.repository = Some(Arc::new(SqliteResourceRepository::new(sessions)));
        self.schema_updater = Some(Arc::new(updater));
        self
    }

    pub fn repository(&self) -> Option<Arc<dyn ResourceRepository>> {
        self.repository.clone()
    }

    pub fn schema_updater(&self) -> Option<Arc<dyn CommandHandler<UpdateSchema>>> {
        self.schema_updater.clone()
    }

    /// Builds the startup driver; both registrations must be present.
    pub fn synchronizer(&self) -> RegistrationResult<Synchronizer> {
        Ok(Synchronizer {
            repository: self
                .repository()
                .ok_or(RegistrationError::MissingRepository)?,
            schema_updater: self
                .schema_updater()
                .ok_or(RegistrationError::MissingSchemaUpdater)?,
        })
    }
}

/// Startup driver: schema update, then reconciliation.
pub struct Synchronizer {
    repository: Arc<dyn ResourceRepository>,
    schema_updater: Arc<dyn CommandHandler<UpdateSchema>>,
}

impl Synchronizer {
    pub fn update_storage_schema(&self) -> RegistrationResult<()> {
        self.schema_updater.execute(&UpdateSchema)?;
        Ok(())
    }

    /// Loads the persisted snapshot once and reconciles `discovered` against it.
    pub fn sync_resources(
        &self,
        discovered: &[DiscoveredResource],
    ) -> RegistrationResult<ReconcileSummary> {
        let persisted = self.repository.get_all()?;
        let summary = self
            .repository
            .register_discovered_resources(discovered, &persisted)?;
        info!(
            "event=sync_resources module=registration status=ok persisted={} discovered={}",
            persisted.len(),
            discovered.len()
        );
        Ok(summary)
    }

    pub fn repository(&self) -> &Arc<dyn ResourceRepository> {
        &self.repository
    }
}
