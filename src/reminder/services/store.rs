//! Ordered task collection with durable persistence.

use chrono::NaiveDateTime;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

use crate::reminder::domain::{Task, TaskId};
use crate::reminder::ports::{KeyValueStorage, StorageError, TASKS_KEY};

/// Result type for task store operations.
pub type TaskStoreResult<T> = Result<T, TaskStoreError>;

/// Errors returned by the task store.
#[derive(Debug, Clone, Error)]
pub enum TaskStoreError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskStoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

impl From<StorageError> for TaskStoreError {
    fn from(err: StorageError) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

/// In-memory ordered task list backed by one durable key-value entry.
///
/// Every mutation writes the full serialized list before returning; when
/// the write fails the in-memory change is rolled back so memory and
/// storage never drift apart. The list lock is held across the persist
/// await, which serialises mutations without further coordination.
///
/// Constructed once at process start and injected; there is no hidden
/// shared instance, so tests isolate themselves with fresh stores.
pub struct TaskStore<S: KeyValueStorage> {
    storage: Arc<S>,
    tasks: RwLock<Vec<Task>>,
}

impl<S: KeyValueStorage> TaskStore<S> {
    /// Creates a store over the given storage backend with an empty list.
    #[must_use]
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            tasks: RwLock::new(Vec::new()),
        }
    }

    /// Loads the persisted task list, dropping entries whose fire instant
    /// is at or before `now`.
    ///
    /// When anything was dropped the trimmed list is immediately
    /// re-persisted, healing state left behind by a process killed past a
    /// task's due time. Returns the restored list.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Persistence`] when the read, the decode,
    /// or the healing write fails.
    pub async fn load(&self, now: NaiveDateTime) -> TaskStoreResult<Vec<Task>> {
        let raw = self.storage.get(TASKS_KEY).await?;
        let mut list: Vec<Task> = match raw {
            Some(json) => serde_json::from_str(&json).map_err(TaskStoreError::persistence)?,
            None => Vec::new(),
        };
        let before = list.len();
        list.retain(|task| !task.is_past_due(now));
        if list.len() < before {
            debug!(dropped = before - list.len(), "dropped expired tasks on load");
            self.persist(&list).await?;
        }
        let mut tasks = self.tasks.write().await;
        tasks.clone_from(&list);
        Ok(list)
    }

    /// Appends a task and persists the list.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::DuplicateTask`] when the identifier is
    /// already present, or [`TaskStoreError::Persistence`] when the write
    /// fails (the in-memory append is rolled back).
    pub async fn add(&self, task: Task) -> TaskStoreResult<()> {
        let mut tasks = self.tasks.write().await;
        if tasks.iter().any(|existing| existing.id() == task.id()) {
            return Err(TaskStoreError::DuplicateTask(task.id()));
        }
        tasks.push(task);
        if let Err(err) = self.persist(&tasks).await {
            tasks.pop();
            return Err(err);
        }
        Ok(())
    }

    /// Replaces the stored task with the same identifier and persists.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::NotFound`] when no task has the given
    /// identifier, or [`TaskStoreError::Persistence`] when the write fails
    /// (the previous record is restored in memory).
    pub async fn update(&self, task: Task) -> TaskStoreResult<()> {
        let mut tasks = self.tasks.write().await;
        let Some(index) = tasks.iter().position(|existing| existing.id() == task.id()) else {
            return Err(TaskStoreError::NotFound(task.id()));
        };
        let Some(slot) = tasks.get_mut(index) else {
            return Err(TaskStoreError::NotFound(task.id()));
        };
        let previous = std::mem::replace(slot, task);
        if let Err(err) = self.persist(&tasks).await {
            if let Some(restored) = tasks.get_mut(index) {
                *restored = previous;
            }
            return Err(err);
        }
        Ok(())
    }

    /// Removes the task with the given identifier and persists.
    ///
    /// Removing an absent identifier is a no-op returning `Ok(None)`; the
    /// sweep and the delivery receipt path may both try to retire the same
    /// task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Persistence`] when the write fails (the
    /// task is reinserted at its previous position).
    pub async fn remove(&self, id: TaskId) -> TaskStoreResult<Option<Task>> {
        let mut tasks = self.tasks.write().await;
        let Some(index) = tasks.iter().position(|existing| existing.id() == id) else {
            return Ok(None);
        };
        let removed = tasks.remove(index);
        if let Err(err) = self.persist(&tasks).await {
            tasks.insert(index, removed);
            return Err(err);
        }
        Ok(Some(removed))
    }

    /// Returns a copy of the task with the given identifier, if present.
    pub async fn get(&self, id: TaskId) -> Option<Task> {
        let tasks = self.tasks.read().await;
        tasks.iter().find(|task| task.id() == id).cloned()
    }

    /// Returns a copy of the task list in insertion order.
    ///
    /// The copy keeps callers from aliasing internal storage.
    pub async fn list(&self) -> Vec<Task> {
        let tasks = self.tasks.read().await;
        tasks.clone()
    }

    async fn persist(&self, tasks: &[Task]) -> TaskStoreResult<()> {
        let json = serde_json::to_string(tasks).map_err(TaskStoreError::persistence)?;
        self.storage.set(TASKS_KEY, &json).await?;
        Ok(())
    }
}
