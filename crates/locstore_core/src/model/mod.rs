//! Localization resource domain model.
//!
//! # Responsibility
//! - Define persisted resource/translation records and the transient
//!   discovered-resource shape produced by source scanners.
//! - Own field-level validation mirroring storage column limits.
//!
//! # Invariants
//! - `resource_key` is unique across all resources.
//! - A resource holds at most one translation per language.
//! - Timestamps are Unix epoch milliseconds.
//!
//! # See also
//! - migrations/0001_init.sql

pub mod discovered;
pub mod resource;

use std::time::{SystemTime, UNIX_EPOCH};

/// Returns current wall-clock time in Unix epoch milliseconds.
///
/// Clock values before the epoch collapse to `0`.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
