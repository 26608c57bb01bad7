//! Durable storage port: a string key-value store.
//!
//! The engine persists its entire task list as one serialized JSON array
//! under a single key. Full-list writes win over write amplification given
//! expected task counts in the tens.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Storage key holding the serialized task list.
pub const TASKS_KEY: &str = "tickler.tasks";

/// Result type for storage port operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable key-value storage contract.
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    /// Reads the value stored under `key`, or `None` when absent.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Backend`] when the read fails.
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Writes `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Backend`] when the write fails.
    async fn set(&self, key: &str, value: &str) -> StorageResult<()>;
}

/// Errors returned by storage implementations.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// Storage-layer failure.
    #[error("storage backend failure: {0}")]
    Backend(Arc<dyn std::error::Error + Send + Sync>),
}

impl StorageError {
    /// Wraps a backend error.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Arc::new(err))
    }
}
