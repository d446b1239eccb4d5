//! CLI smoke entry point.
//!
//! # Responsibility
//! - Open (or create) a localization store, apply its schema and print a
//!   short inventory, to verify `locstore_core` wiring outside a host.
//!
//! Usage: `locstore_cli [DB_PATH]`. Set `LOCSTORE_LOG_DIR` (absolute path) to
//! enable file logging.

use locstore_core::{core_version, default_log_level, init_logging, StorageOptions};
use std::process::ExitCode;

const DEFAULT_DB_PATH: &str = "locstore.sqlite3";

fn main() -> ExitCode {
    if let Ok(log_dir) = std::env::var("LOCSTORE_LOG_DIR") {
        if let Err(err) = init_logging(default_log_level(), &log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    let db_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_DB_PATH.to_string());

    match run(&db_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("event=cli_run module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(db_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    println!("locstore_core version={}", core_version());

    let context = StorageOptions::file(db_path).build_context()?;
    let sync = context.synchronizer()?;
    sync.update_storage_schema()?;

    let repo = sync.repository();
    let resources = repo.get_all()?;
    let languages = repo.available_languages(false)?;
    println!("database={db_path}");
    println!("resources={}", resources.len());
    println!("languages={}", languages.join(","));
    Ok(())
}
