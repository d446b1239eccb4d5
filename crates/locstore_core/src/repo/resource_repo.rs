//! Resource repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Map every localization-store capability onto one short-lived unit of
//!   work (session + transaction) obtained from a `SessionFactory`.
//! - Reconcile scanner output with persisted resources.
//!
//! # Invariants
//! - Preconditions (blank keys, missing ids) are rejected before any session
//!   is opened.
//! - Storage failures propagate unchanged inside `RepoError::Db`; nothing is
//!   retried here.
//! - Lookups report absence as `Ok(None)`; `NotFound` is only used for writes
//!   that target rows which do not exist.

use super::rows::{
    insert_resource_row, insert_translation_row, load_all_resources, load_resource_by_key,
    persisted_id, update_hidden_flag, update_translation_value,
};
use crate::db::{with_transaction, DbError, SessionFactory};
use crate::model::discovered::DiscoveredResource;
use crate::model::now_epoch_ms;
use crate::model::resource::{
    check_value_length, ModelValidationError, Resource, ResourceId, Translation, TranslationId,
    INVARIANT_LANGUAGE,
};
use crate::sync::reconcile::{
    new_resource_from_discovered, partition_discovered, plan_translation_changes,
    TranslationChange,
};
use log::{debug, info, warn};
use rusqlite::{params, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for resource persistence and reconciliation operations.
#[derive(Debug)]
pub enum RepoError {
    /// Caller violated a precondition; no storage access happened.
    InvalidArgument(String),
    /// Record fields do not fit storage limits.
    Validation(ModelValidationError),
    /// Storage-layer failure, cause attached unmodified.
    Db(DbError),
    /// Update/delete targeted a row that does not exist.
    NotFound { entity: &'static str, id: i64 },
    /// Persisted data cannot be mapped to the domain model.
    InvalidData(String),
}

impl RepoError {
    /// Returns whether the storage layer rejected a write on a constraint.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::Db(err) if err.is_constraint_violation())
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArgument(message) => write!(f, "invalid argument: {message}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::InvalidArgument(_) | Self::NotFound { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<ModelValidationError> for RepoError {
    fn from(value: ModelValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Counters describing what one reconciliation pass wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub inserted_resources: usize,
    pub added_translations: usize,
    pub updated_translations: usize,
    /// Discovered values dropped because a human edited the resource.
    pub suppressed_translations: usize,
    /// Existing resources whose hidden flag actually changed.
    pub hidden_changes: usize,
    /// Existing keys that disappeared between snapshot and update.
    pub skipped_missing: usize,
    /// Discovered resources or translations dropped for exceeding a
    /// column limit. The rest of the batch is still written.
    pub skipped_invalid: usize,
    pub duplicate_keys: usize,
}

/// Storage capability set consumed by the localization framework.
pub trait ResourceRepository: Send + Sync {
    /// Lists distinct stored languages, sorted; optionally appends
    /// [`INVARIANT_LANGUAGE`].
    fn available_languages(&self, include_invariant: bool) -> RepoResult<Vec<String>>;
    /// Fetches one resource with translations.
    fn get_by_key(&self, resource_key: &str) -> RepoResult<Option<Resource>>;
    /// Inserts a resource with attached translations as one write.
    fn insert_resource(&self, resource: &Resource) -> RepoResult<ResourceId>;
    fn add_translation(
        &self,
        resource: &Resource,
        translation: &Translation,
    ) -> RepoResult<TranslationId>;
    fn update_translation(&self, resource: &Resource, translation: &Translation)
        -> RepoResult<()>;
    fn delete_translation(&self, resource: &Resource, translation: &Translation)
        -> RepoResult<()>;
    /// Updates the resource's own fields; translations are left untouched.
    fn update_resource(&self, resource: &Resource) -> RepoResult<()>;
    /// Deletes a resource; its translations cascade.
    fn delete_resource(&self, resource: &Resource) -> RepoResult<()>;
    /// Deletes every resource. Returns the number removed.
    fn delete_all_resources(&self) -> RepoResult<usize>;
    /// Read-only snapshot of all resources with translations.
    fn get_all(&self) -> RepoResult<Vec<Resource>>;
    /// Clears `from_code` on every resource in one statement.
    fn reset_sync_status(&self) -> RepoResult<usize>;
    /// Merges scanner output into storage. `persisted` is the caller's
    /// snapshot and is only used to split new from existing keys.
    fn register_discovered_resources(
        &self,
        discovered: &[DiscoveredResource],
        persisted: &[Resource],
    ) -> RepoResult<ReconcileSummary>;
}

/// SQLite-backed resource repository.
pub struct SqliteResourceRepository<F: SessionFactory> {
    sessions: F,
}

impl<F: SessionFactory> SqliteResourceRepository<F> {
    pub fn new(sessions: F) -> Self {
        Self { sessions }
    }

    fn unit_of_work<T>(
        &self,
        operation: &'static str,
        behavior: TransactionBehavior,
        work: impl FnOnce(&Transaction<'_>) -> RepoResult<T>,
    ) -> RepoResult<T> {
        let started_at = Instant::now();
        let result = with_transaction(&self.sessions, behavior, work);
        log_repo_call(operation, started_at, &result);
        result
    }

    fn reconcile(
        &self,
        discovered: &[DiscoveredResource],
        persisted: &[Resource],
    ) -> RepoResult<ReconcileSummary> {
        let partition = partition_discovered(discovered, persisted);
        let mut summary = ReconcileSummary {
            duplicate_keys: partition.duplicates,
            ..ReconcileSummary::default()
        };

        let now_ms = now_epoch_ms();
        let mut new_resources = Vec::with_capacity(partition.new.len());
        for item in &partition.new {
            let mut resource = new_resource_from_discovered(item, now_ms);
            if let Err(err) = resource.check_column_limits() {
                skip_invalid(&mut summary, &err);
                continue;
            }
            resource
                .translations
                .retain(|translation| match translation.check_column_limits() {
                    Ok(()) => true,
                    Err(err) => {
                        skip_invalid(&mut summary, &err);
                        false
                    }
                });
            new_resources.push(resource);
        }

        let mut conn = self.sessions.open_session()?;

        // Insert phase commits first so new rows have ids before updates run.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        for resource in &new_resources {
            insert_resource_row(&tx, resource)?;
            summary.inserted_resources += 1;
        }
        tx.commit()?;

        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        for item in &partition.existing {
            let Some(stored) = load_resource_by_key(&tx, &item.key)? else {
                summary.skipped_missing += 1;
                continue;
            };
            let resource_id = persisted_id(stored.id)?;

            update_hidden_flag(&tx, resource_id, item.is_hidden)?;
            if stored.is_hidden != Some(item.is_hidden) {
                summary.hidden_changes += 1;
            }

            for change in plan_translation_changes(&stored, item, now_ms) {
                match change {
                    TranslationChange::Add(translation) => {
                        if let Err(err) = translation.check_column_limits() {
                            skip_invalid(&mut summary, &err);
                            continue;
                        }
                        insert_translation_row(&tx, resource_id, &translation)?;
                        summary.added_translations += 1;
                    }
                    TranslationChange::Overwrite {
                        translation_id,
                        value,
                        modification_date,
                    } => {
                        if let Err(err) = check_value_length(&value) {
                            skip_invalid(&mut summary, &err);
                            continue;
                        }
                        update_translation_value(&tx, translation_id, &value, modification_date)?;
                        summary.updated_translations += 1;
                    }
                    TranslationChange::Suppressed { .. } => {
                        summary.suppressed_translations += 1;
                    }
                }
            }
        }
        tx.commit()?;
        Ok(summary)
    }
}

impl<F: SessionFactory> ResourceRepository for SqliteResourceRepository<F> {
    fn available_languages(&self, include_invariant: bool) -> RepoResult<Vec<String>> {
        let mut languages = self.unit_of_work(
            "available_languages",
            TransactionBehavior::Deferred,
            |tx| {
                let mut stmt = tx.prepare(
                    "SELECT DISTINCT language
                     FROM localization_resource_translations
                     ORDER BY language ASC;",
                )?;
                let mut rows = stmt.query([])?;
                let mut languages = Vec::new();
                while let Some(row) = rows.next()? {
                    languages.push(row.get::<_, String>(0)?);
                }
                Ok(languages)
            },
        )?;

        // A stored invariant translation already lists "" once.
        if include_invariant && !languages.iter().any(|lang| lang == INVARIANT_LANGUAGE) {
            languages.push(INVARIANT_LANGUAGE.to_string());
        }
        Ok(languages)
    }

    fn get_by_key(&self, resource_key: &str) -> RepoResult<Option<Resource>> {
        require_key(resource_key)?;
        self.unit_of_work("get_by_key", TransactionBehavior::Deferred, |tx| {
            load_resource_by_key(tx, resource_key)
        })
    }

    fn insert_resource(&self, resource: &Resource) -> RepoResult<ResourceId> {
        require_key(&resource.resource_key)?;
        resource.validate()?;
        self.unit_of_work("insert_resource", TransactionBehavior::Immediate, |tx| {
            insert_resource_row(tx, resource)
        })
    }

    fn add_translation(
        &self,
        resource: &Resource,
        translation: &Translation,
    ) -> RepoResult<TranslationId> {
        let resource_id = require_resource_id(resource)?;
        require_owner(resource_id, translation)?;
        translation.validate()?;
        self.unit_of_work("add_translation", TransactionBehavior::Immediate, |tx| {
            insert_translation_row(tx, resource_id, translation)
        })
    }

    fn update_translation(
        &self,
        resource: &Resource,
        translation: &Translation,
    ) -> RepoResult<()> {
        let resource_id = require_resource_id(resource)?;
        let translation_id = require_translation_id(translation)?;
        require_owner(resource_id, translation)?;
        translation.validate()?;
        self.unit_of_work("update_translation", TransactionBehavior::Immediate, |tx| {
            let changed = tx.execute(
                "UPDATE localization_resource_translations
                 SET language = ?3, value = ?4, modification_date = ?5
                 WHERE id = ?1 AND resource_id = ?2;",
                params![
                    translation_id,
                    resource_id,
                    translation.language.as_str(),
                    translation.value.as_str(),
                    translation.modification_date,
                ],
            )?;
            expect_changed(changed, "translation", translation_id)
        })
    }

    fn delete_translation(
        &self,
        resource: &Resource,
        translation: &Translation,
    ) -> RepoResult<()> {
        let resource_id = require_resource_id(resource)?;
        let translation_id = require_translation_id(translation)?;
        require_owner(resource_id, translation)?;
        self.unit_of_work("delete_translation", TransactionBehavior::Immediate, |tx| {
            let changed = tx.execute(
                "DELETE FROM localization_resource_translations
                 WHERE id = ?1 AND resource_id = ?2;",
                params![translation_id, resource_id],
            )?;
            expect_changed(changed, "translation", translation_id)
        })
    }

    fn update_resource(&self, resource: &Resource) -> RepoResult<()> {
        let resource_id = require_resource_id(resource)?;
        require_key(&resource.resource_key)?;
        resource.validate()?;
        self.unit_of_work("update_resource", TransactionBehavior::Immediate, |tx| {
            let changed = tx.execute(
                "UPDATE localization_resources
                 SET
                    resource_key = ?2,
                    modification_date = ?3,
                    author = ?4,
                    from_code = ?5,
                    is_modified = ?6,
                    is_hidden = ?7,
                    notes = ?8
                 WHERE id = ?1;",
                params![
                    resource_id,
                    resource.resource_key.as_str(),
                    resource.modification_date,
                    resource.author.as_str(),
                    resource.from_code,
                    resource.is_modified,
                    resource.is_hidden,
                    resource.notes.as_str(),
                ],
            )?;
            expect_changed(changed, "resource", resource_id)
        })
    }

    fn delete_resource(&self, resource: &Resource) -> RepoResult<()> {
        let resource_id = require_resource_id(resource)?;
        self.unit_of_work("delete_resource", TransactionBehavior::Immediate, |tx| {
            let changed = tx.execute(
                "DELETE FROM localization_resources WHERE id = ?1;",
                [resource_id],
            )?;
            expect_changed(changed, "resource", resource_id)
        })
    }

    fn delete_all_resources(&self) -> RepoResult<usize> {
        self.unit_of_work(
            "delete_all_resources",
            TransactionBehavior::Immediate,
            |tx| Ok(tx.execute("DELETE FROM localization_resources;", [])?),
        )
    }

    fn get_all(&self) -> RepoResult<Vec<Resource>> {
        self.unit_of_work("get_all", TransactionBehavior::Deferred, |tx| {
            load_all_resources(tx)
        })
    }

    fn reset_sync_status(&self) -> RepoResult<usize> {
        self.unit_of_work("reset_sync_status", TransactionBehavior::Immediate, |tx| {
            Ok(tx.execute("UPDATE localization_resources SET from_code = 0;", [])?)
        })
    }

    fn register_discovered_resources(
        &self,
        discovered: &[DiscoveredResource],
        persisted: &[Resource],
    ) -> RepoResult<ReconcileSummary> {
        if discovered.iter().any(|item| item.key.trim().is_empty()) {
            return Err(RepoError::InvalidArgument(
                "discovered resource key cannot be empty".to_string(),
            ));
        }

        let started_at = Instant::now();
        let result = self.reconcile(discovered, persisted);
        log_repo_call("register_discovered_resources", started_at, &result);
        let summary = result?;

        if summary.skipped_missing > 0 || summary.skipped_invalid > 0 {
            warn!(
                "event=reconcile module=repo status=warn skipped_missing={} skipped_invalid={}",
                summary.skipped_missing, summary.skipped_invalid
            );
        }
        info!(
            "event=reconcile module=repo status=ok discovered={} inserted={} added={} updated={} suppressed={} hidden_changes={} duration_ms={}",
            discovered.len(),
            summary.inserted_resources,
            summary.added_translations,
            summary.updated_translations,
            summary.suppressed_translations,
            summary.hidden_changes,
            started_at.elapsed().as_millis()
        );
        Ok(summary)
    }
}

fn log_repo_call<T>(operation: &str, started_at: Instant, result: &RepoResult<T>) {
    match result {
        Ok(_) => debug!(
            "event=repo_call module=repo op={operation} status=ok duration_ms={}",
            started_at.elapsed().as_millis()
        ),
        Err(err) => warn!(
            "event=repo_call module=repo op={operation} status=error duration_ms={} error={}",
            started_at.elapsed().as_millis(),
            err
        ),
    }
}

fn skip_invalid(summary: &mut ReconcileSummary, err: &ModelValidationError) {
    summary.skipped_invalid += 1;
    warn!("event=reconcile_skip module=repo status=warn reason=invalid error={err}");
}

fn require_key(resource_key: &str) -> RepoResult<()> {
    if resource_key.trim().is_empty() {
        return Err(RepoError::InvalidArgument(
            "resource key cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn require_resource_id(resource: &Resource) -> RepoResult<ResourceId> {
    resource
        .id
        .ok_or_else(|| RepoError::InvalidArgument("resource has not been persisted".to_string()))
}

fn require_translation_id(translation: &Translation) -> RepoResult<TranslationId> {
    translation.id.ok_or_else(|| {
        RepoError::InvalidArgument("translation has not been persisted".to_string())
    })
}

fn require_owner(resource_id: ResourceId, translation: &Translation) -> RepoResult<()> {
    match translation.resource_id {
        Some(owner) if owner != resource_id => Err(RepoError::InvalidArgument(format!(
            "translation belongs to resource {owner}, not {resource_id}"
        ))),
        _ => Ok(()),
    }
}

fn expect_changed(changed: usize, entity: &'static str, id: i64) -> RepoResult<()> {
    if changed == 0 {
        return Err(RepoError::NotFound { entity, id });
    }
    Ok(())
}
