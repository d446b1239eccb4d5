use super::{CommandHandler, SchemaError, UpdateSchema};
use crate::db::migrations::{apply_migrations, latest_version};
use crate::db::SessionFactory;
use log::{error, info};
use std::time::Instant;

/// Applies every pending migration inside a dedicated session.
pub struct MigratingSchemaUpdater<F: SessionFactory> {
    sessions: F,
}

impl<F: SessionFactory> MigratingSchemaUpdater<F> {
    pub fn new(sessions: F) -> Self {
        Self { sessions }
    }
}

impl<F: SessionFactory> CommandHandler<UpdateSchema> for MigratingSchemaUpdater<F> {
    fn execute(&self, _command: &UpdateSchema) -> Result<(), SchemaError> {
        let started_at = Instant::now();
        let result = self
            .sessions
            .open_session()
            .and_then(|mut conn| apply_migrations(&mut conn));

        match result {
            Ok(applied) => {
                info!(
                    "event=schema_update module=schema status=ok mode=migrate applied={} version={} duration_ms={}",
                    applied,
                    latest_version(),
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=schema_update module=schema status=error mode=migrate duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err.into())
            }
        }
    }
}

/// Leaves the schema alone; for stores provisioned by deployment tooling.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSchemaUpdater;

impl CommandHandler<UpdateSchema> for NullSchemaUpdater {
    fn execute(&self, _command: &UpdateSchema) -> Result<(), SchemaError> {
        info!("event=schema_update module=schema status=skipped mode=external");
        Ok(())
    }
}
