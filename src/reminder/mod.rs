//! Task-notification scheduling and lifecycle reconciliation.
//!
//! This module turns a task's due date/time into a single outstanding
//! device notification, keeps that notification in sync across edits and
//! deletes, recovers after the hosting app is killed and relaunched, and
//! purges tasks whose fire instant has passed. The module follows
//! hexagonal architecture:
//!
//! - Domain types and pure time math in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
