//! Repository layer for localization resources.
//!
//! # Responsibility
//! - Define the storage capability contract consumed by the localization
//!   framework.
//! - Isolate SQLite query details from callers.
//!
//! # Invariants
//! - Write paths validate records before SQL mutations.
//! - Every call runs in its own unit of work.

mod rows;
pub mod resource_repo;
