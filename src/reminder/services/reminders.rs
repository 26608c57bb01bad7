//! Reminder facade: the mutation boundary exposed to the UI layer.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::reminder::domain::{Task, TaskDomainError, TaskId, TaskTitle, time};
use crate::reminder::ports::{KeyValueStorage, NotificationPort};
use crate::reminder::services::scheduler::{NotificationScheduler, ScheduleWarning};
use crate::reminder::services::store::{TaskStore, TaskStoreError};

/// Request payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTaskRequest {
    title: String,
    note: Option<String>,
    due_date: NaiveDate,
    due_time: NaiveTime,
}

impl NewTaskRequest {
    /// Creates a request with the required fields.
    #[must_use]
    pub fn new(title: impl Into<String>, due_date: NaiveDate, due_time: NaiveTime) -> Self {
        Self {
            title: title.into(),
            note: None,
            due_date,
            due_time,
        }
    }

    /// Sets the optional note.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Partial update applied by an edit; unset fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    title: Option<String>,
    note: Option<String>,
    due_date: Option<NaiveDate>,
    due_time: Option<NaiveTime>,
}

impl TaskPatch {
    /// Creates an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Replaces the note.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Replaces the due date.
    #[must_use]
    pub const fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Replaces the due time.
    #[must_use]
    pub const fn with_due_time(mut self, due_time: NaiveTime) -> Self {
        self.due_time = Some(due_time);
        self
    }
}

/// Result of a successful add or edit.
///
/// A `Some` warning means the task was created and persisted but its
/// reminder may not fire; silent success without either a handle or a
/// warning never happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskMutation {
    task: Task,
    warning: Option<ScheduleWarning>,
}

impl TaskMutation {
    /// Returns the task as persisted.
    #[must_use]
    pub const fn task(&self) -> &Task {
        &self.task
    }

    /// Returns the scheduling warning to surface to the user, if any.
    #[must_use]
    pub const fn warning(&self) -> Option<ScheduleWarning> {
        self.warning
    }

    /// Consumes the mutation, returning the task.
    #[must_use]
    pub fn into_task(self) -> Task {
        self.task
    }
}

/// Outcome of one reconciliation sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Identifiers of tasks removed by this sweep.
    pub removed: Vec<TaskId>,
    /// Defensive notification cancels that failed (logged, not fatal).
    pub cancel_failures: usize,
    /// Store removals that failed to persist (the task stays for the next
    /// sweep).
    pub persist_failures: usize,
}

/// Service-level errors for reminder mutations.
#[derive(Debug, Error)]
pub enum ReminderError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
    /// Store or persistence operation failed.
    #[error(transparent)]
    Store(#[from] TaskStoreError),
}

/// Result type for reminder service operations.
pub type ReminderResult<T> = Result<T, ReminderError>;

/// The reminder engine facade.
///
/// All mutation entry points resolve only after both persistence and
/// notification scheduling have completed or failed; a task that "saved"
/// without a confirmed schedule outcome is a correctness bug.
#[derive(Clone)]
pub struct ReminderService<S, N, C>
where
    S: KeyValueStorage,
    N: NotificationPort,
    C: Clock + Send + Sync,
{
    store: Arc<TaskStore<S>>,
    scheduler: NotificationScheduler<N>,
    clock: Arc<C>,
}

impl<S, N, C> ReminderService<S, N, C>
where
    S: KeyValueStorage,
    N: NotificationPort,
    C: Clock + Send + Sync,
{
    /// Creates a service over the given store, notification port, and
    /// clock.
    #[must_use]
    pub fn new(store: Arc<TaskStore<S>>, port: Arc<N>, clock: Arc<C>) -> Self {
        Self {
            store,
            scheduler: NotificationScheduler::new(port),
            clock,
        }
    }

    /// Restores the persisted task list at startup.
    ///
    /// Tasks already past due are dropped and the trimmed list re-saved
    /// before anything is returned.
    ///
    /// # Errors
    ///
    /// Returns [`ReminderError::Store`] when the read or the healing write
    /// fails.
    pub async fn restore(&self) -> ReminderResult<Vec<Task>> {
        Ok(self.store.load(self.now()).await?)
    }

    /// Creates a task, schedules its notification, and persists it.
    ///
    /// A due time at or before now clamps forward one minute rather than
    /// being rejected. Scheduling problems come back as a warning on the
    /// mutation, never as silence.
    ///
    /// # Errors
    ///
    /// Returns [`ReminderError::Domain`] for an empty title, or
    /// [`ReminderError::Store`] when the persist fails (the freshly
    /// scheduled notification is cancelled again before returning).
    pub async fn add_task(&self, request: NewTaskRequest) -> ReminderResult<TaskMutation> {
        let title = TaskTitle::new(request.title)?;
        // One clock read serves both the clamp and the schedule decision,
        // so time advancing mid-mutation cannot produce a task that saved
        // without either a handle or a warning.
        let now = self.now();
        let mut task = Task::new(title, request.note, request.due_date, request.due_time, now);
        let outcome = self.scheduler.schedule(&mut task, now).await;
        if let Err(err) = self.store.add(task.clone()).await {
            self.rollback_schedule(&mut task).await;
            return Err(err.into());
        }
        debug!(task_id = %task.id(), fire_at = %task.fire_instant(), "task added");
        Ok(TaskMutation {
            task,
            warning: outcome.warning(),
        })
    }

    /// Applies a patch to a task: cancels the old notification, merges
    /// fields, recomputes the fire instant, schedules anew, persists.
    ///
    /// Callers never observe a task pairing a stale handle with new
    /// fields.
    ///
    /// # Errors
    ///
    /// Returns [`ReminderError::Store`] when the task is unknown or the
    /// persist fails, [`ReminderError::Domain`] for an empty title.
    pub async fn edit_task(&self, id: TaskId, patch: TaskPatch) -> ReminderResult<TaskMutation> {
        let Some(mut task) = self.store.get(id).await else {
            return Err(TaskStoreError::NotFound(id).into());
        };
        if let Some(title) = patch.title {
            task.set_title(TaskTitle::new(title)?);
        }
        if let Some(note) = patch.note {
            task.set_note(Some(note));
        }
        let due_date = patch.due_date.unwrap_or_else(|| task.due_date());
        let due_time = patch.due_time.unwrap_or_else(|| task.due_time());
        task.set_due(due_date, due_time);
        // Same single clock read as add_task: clamp and schedule must
        // agree on the current instant.
        let now = self.now();
        task.recompute_schedule(now);

        let outcome = self.scheduler.schedule(&mut task, now).await;
        if let Err(err) = self.store.update(task.clone()).await {
            self.rollback_schedule(&mut task).await;
            return Err(err.into());
        }
        debug!(task_id = %task.id(), fire_at = %task.fire_instant(), "task edited");
        Ok(TaskMutation {
            task,
            warning: outcome.warning(),
        })
    }

    /// Deletes a task, cancelling its outstanding notification first.
    ///
    /// The task is removed even when the cancel fails; the failure comes
    /// back as [`ScheduleWarning::CancelFailed`] so the UI can tell the
    /// user the old reminder may still fire.
    ///
    /// # Errors
    ///
    /// Returns [`ReminderError::Store`] when the task is unknown or the
    /// persist fails.
    pub async fn delete_task(&self, id: TaskId) -> ReminderResult<Option<ScheduleWarning>> {
        let Some(mut task) = self.store.get(id).await else {
            return Err(TaskStoreError::NotFound(id).into());
        };
        let warning = match self.scheduler.cancel(&mut task).await {
            Ok(()) => None,
            Err(err) => {
                warn!(task_id = %id, error = %err, "failed to cancel notification during delete");
                Some(ScheduleWarning::CancelFailed)
            }
        };
        self.store.remove(id).await?;
        debug!(task_id = %id, "task deleted");
        Ok(warning)
    }

    /// Returns the task list in insertion order.
    pub async fn list_tasks(&self) -> Vec<Task> {
        self.store.list().await
    }

    /// Returns tasks whose title contains `query`, case-insensitively.
    pub async fn search(&self, query: &str) -> Vec<Task> {
        let needle = query.to_lowercase();
        self.store
            .list()
            .await
            .into_iter()
            .filter(|task| task.title().as_str().to_lowercase().contains(&needle))
            .collect()
    }

    /// Milliseconds from now until the task's fire instant; zero or
    /// negative means due now or past.
    #[must_use]
    pub fn milliseconds_until(&self, task: &Task) -> i64 {
        time::milliseconds_until(task.fire_instant(), self.now())
    }

    /// Human-readable time remaining, e.g. `5 minutes`. Confirmation text
    /// only.
    #[must_use]
    pub fn human_remaining(&self, task: &Task) -> String {
        time::human_remaining(task.fire_instant(), self.now())
    }

    /// Runs one reconciliation sweep: every task whose fire instant is at
    /// or before now has its notification cancelled defensively (it may
    /// already have fired) and is removed from the store.
    ///
    /// This is the sole authority for silent expiry. The sweep operates on
    /// a snapshot taken at invocation time, continues past individual
    /// failures, and is idempotent: re-running it with no intervening
    /// mutation changes nothing.
    pub async fn reconcile(&self) -> ReconcileReport {
        let now = self.now();
        let snapshot = self.store.list().await;
        let mut report = ReconcileReport::default();
        for mut task in snapshot {
            if !task.is_past_due(now) {
                continue;
            }
            if let Err(err) = self.scheduler.cancel(&mut task).await {
                warn!(task_id = %task.id(), error = %err, "sweep failed to cancel notification");
                report.cancel_failures += 1;
            }
            match self.store.remove(task.id()).await {
                Ok(Some(_)) => report.removed.push(task.id()),
                // Already retired by a delivery receipt; nothing to do.
                Ok(None) => {}
                Err(err) => {
                    warn!(task_id = %task.id(), error = %err, "sweep failed to persist removal");
                    report.persist_failures += 1;
                }
            }
        }
        if !report.removed.is_empty() {
            debug!(removed = report.removed.len(), "reconciliation sweep removed expired tasks");
        }
        report
    }

    /// Retires a task whose notification was observed delivered.
    ///
    /// Idempotent with the sweep's passive path: retiring an id that is
    /// already gone returns `Ok(false)`.
    ///
    /// # Errors
    ///
    /// Returns [`ReminderError::Store`] when the removal fails to persist.
    pub async fn retire(&self, id: TaskId) -> ReminderResult<bool> {
        Ok(self.store.remove(id).await?.is_some())
    }

    fn now(&self) -> NaiveDateTime {
        self.clock.local().naive_local()
    }

    /// Cancels a notification scheduled by a mutation whose persist step
    /// failed, so the rollback leaves no orphan.
    async fn rollback_schedule(&self, task: &mut Task) {
        if let Err(err) = self.scheduler.cancel(task).await {
            warn!(task_id = %task.id(), error = %err, "failed to cancel notification while rolling back");
        }
    }
}
