//! Port contracts for the reminder engine.
//!
//! Ports define infrastructure-agnostic interfaces for the host facilities
//! the engine consumes: the local-notification centre and durable key-value
//! storage.

pub mod notification;
pub mod storage;

pub use notification::{
    NotificationError, NotificationPayload, NotificationPort, NotificationResult,
};
pub use storage::{KeyValueStorage, StorageError, StorageResult, TASKS_KEY};
