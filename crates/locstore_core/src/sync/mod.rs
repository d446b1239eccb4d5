//! Reconciliation between scanner output and persisted resources.
//!
//! # Responsibility
//! - Hold the side-effect-free merge rules used by repository reconciliation.
//!
//! # See also
//! - repo/resource_repo.rs (`register_discovered_resources`)

pub mod reconcile;
