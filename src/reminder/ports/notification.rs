//! Notification port: the host OS local-notification facility.

use crate::reminder::domain::{NotificationHandle, Task, TaskId};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;

/// Result type for notification port operations.
pub type NotificationResult<T> = Result<T, NotificationError>;

/// Payload carried by a scheduled notification.
///
/// The task identifier travels with the notification so a delivery event
/// can be mapped back to the task it retires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    title: String,
    body: String,
    task_id: TaskId,
}

impl NotificationPayload {
    /// Builds the payload for a task: its title, and its note or the
    /// default reminder text as the body.
    #[must_use]
    pub fn for_task(task: &Task) -> Self {
        Self {
            title: task.title().as_str().to_owned(),
            body: task.reminder_body().to_owned(),
            task_id: task.id(),
        }
    }

    /// Returns the notification title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the notification body.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Returns the identifier of the task this notification belongs to.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }
}

/// Local-notification contract.
///
/// Local-only semantics: the engine never assumes push or remote delivery,
/// and delivery guarantees are whatever the host OS provides.
#[async_trait]
pub trait NotificationPort: Send + Sync {
    /// Schedules a notification to fire at the given local instant.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationError::PermissionDenied`] when the host has
    /// declined notification permission, or [`NotificationError::Backend`]
    /// on a transient platform failure.
    async fn schedule_at(
        &self,
        fire_at: NaiveDateTime,
        payload: NotificationPayload,
    ) -> NotificationResult<NotificationHandle>;

    /// Cancels a previously scheduled notification.
    ///
    /// Cancelling a handle that has already fired or was never scheduled is
    /// not an error.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationError::Backend`] on a transient platform
    /// failure.
    async fn cancel(&self, handle: &NotificationHandle) -> NotificationResult<()>;

    /// Subscribes to the delivered-notification event stream.
    ///
    /// Each delivery fans out the payload of the notification the host just
    /// presented to the user.
    fn delivered(&self) -> broadcast::Receiver<NotificationPayload>;
}

/// Errors returned by notification port implementations.
#[derive(Debug, Clone, Error)]
pub enum NotificationError {
    /// The host OS declined notification permission.
    #[error("notification permission denied by the host")]
    PermissionDenied,

    /// Transient platform failure during schedule or cancel.
    #[error("notification backend failure: {0}")]
    Backend(Arc<dyn std::error::Error + Send + Sync>),
}

impl NotificationError {
    /// Wraps a backend error.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Arc::new(err))
    }

    /// Returns `true` when retrying the operation might succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Backend(_))
    }
}
