//! SQLite storage adapter for a localization resource framework.
//! Persists resources and their per-language translations, reconciles
//! scanner output with stored state, and manages the store schema.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod registration;
pub mod repo;
pub mod schema;
pub mod sync;

pub use config::{SchemaMode, StorageOptions};
pub use db::{DbError, DbLocation, SessionFactory, SqliteSessionFactory};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::discovered::{DiscoveredResource, DiscoveredTranslation};
pub use model::now_epoch_ms;
pub use model::resource::{
    ModelValidationError, Resource, ResourceId, Translation, TranslationId, AUTOMATED_AUTHOR,
    INVARIANT_LANGUAGE,
};
pub use registration::{ConfigurationContext, RegistrationError, Synchronizer};
pub use repo::resource_repo::{
    ReconcileSummary, RepoError, RepoResult, ResourceRepository, SqliteResourceRepository,
};
pub use schema::{
    CommandHandler, MigratingSchemaUpdater, NullSchemaUpdater, SchemaError, UpdateSchema,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
