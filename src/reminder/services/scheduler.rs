//! Notification scheduling: keeping the device's notification state a
//! correct projection of task state.

use chrono::NaiveDateTime;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::reminder::domain::{NotificationHandle, Task, time};
use crate::reminder::ports::{
    NotificationError, NotificationPayload, NotificationPort, NotificationResult,
};

/// Non-fatal notification outcome the mutation caller must surface to the
/// user.
///
/// The task mutation succeeds either way; what is lost is only a
/// guarantee about the device notification, and the UI decides how to
/// tell the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleWarning {
    /// The host OS declined notification permission.
    PermissionDenied,
    /// The platform failed to schedule, including one immediate retry.
    SchedulingFailed,
    /// The platform failed to cancel, including one immediate retry; the
    /// old notification may still fire.
    CancelFailed,
}

impl ScheduleWarning {
    /// Returns user-facing warning text.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::PermissionDenied => {
                "notification permission is denied; this reminder may not fire"
            }
            Self::SchedulingFailed => {
                "the reminder could not be scheduled; the task will still expire on time"
            }
            Self::CancelFailed => "the old reminder could not be cancelled and may still fire",
        }
    }
}

/// Result of a schedule attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleOutcome {
    /// A notification was scheduled and its handle attached to the task.
    Scheduled(NotificationHandle),
    /// The fire instant is due now or past; nothing was scheduled.
    PastDue,
    /// The platform declined; the task carries no handle.
    Declined(ScheduleWarning),
}

impl ScheduleOutcome {
    /// Returns the warning to surface to the caller, if any.
    #[must_use]
    pub const fn warning(&self) -> Option<ScheduleWarning> {
        match self {
            Self::Declined(warning) => Some(*warning),
            Self::Scheduled(_) | Self::PastDue => None,
        }
    }
}

/// Maps each task to at most one outstanding notification.
#[derive(Clone)]
pub struct NotificationScheduler<N: NotificationPort> {
    port: Arc<N>,
}

impl<N: NotificationPort> NotificationScheduler<N> {
    /// Creates a scheduler over the given port.
    #[must_use]
    pub const fn new(port: Arc<N>) -> Self {
        Self { port }
    }

    /// Schedules the task's notification, attaching the resulting handle.
    ///
    /// `now` must be the same instant the task's fire instant was clamped
    /// against; the caller reads the clock once per mutation, so time
    /// advancing mid-mutation cannot turn a just-clamped task past due.
    ///
    /// Any handle the task already holds is cancelled first, never
    /// schedule-then-cancel, so two live notifications for one task cannot
    /// exist even momentarily. A fire instant at or before `now` schedules
    /// nothing. A transient platform failure is retried once immediately;
    /// permission denial and a failed retry surface as
    /// [`ScheduleOutcome::Declined`] with the task left handle-less.
    pub async fn schedule(&self, task: &mut Task, now: NaiveDateTime) -> ScheduleOutcome {
        if let Some(stale) = task.clear_handle() {
            if let Err(err) = self.cancel_handle(&stale).await {
                warn!(task_id = %task.id(), handle = %stale, error = %err, "failed to cancel stale notification");
            }
        }

        let fire_at = task.fire_instant();
        if time::milliseconds_until(fire_at, now) <= 0 {
            return ScheduleOutcome::PastDue;
        }

        let payload = NotificationPayload::for_task(task);
        match self.request(fire_at, payload).await {
            Ok(handle) => {
                debug!(task_id = %task.id(), handle = %handle, %fire_at, "notification scheduled");
                task.attach_handle(handle.clone());
                ScheduleOutcome::Scheduled(handle)
            }
            Err(NotificationError::PermissionDenied) => {
                ScheduleOutcome::Declined(ScheduleWarning::PermissionDenied)
            }
            Err(err) => {
                warn!(task_id = %task.id(), error = %err, "notification scheduling failed after retry");
                ScheduleOutcome::Declined(ScheduleWarning::SchedulingFailed)
            }
        }
    }

    /// Cancels the task's outstanding notification and clears its handle.
    ///
    /// A task without a handle is a no-op. A transient platform failure is
    /// retried once immediately.
    ///
    /// # Errors
    ///
    /// Returns the port's [`NotificationError`] when the cancel call fails
    /// after the retry; the handle is cleared regardless, since the sweep
    /// treats the notification as dead either way.
    pub async fn cancel(&self, task: &mut Task) -> NotificationResult<()> {
        match task.clear_handle() {
            Some(handle) => {
                debug!(task_id = %task.id(), %handle, "cancelling notification");
                self.cancel_handle(&handle).await
            }
            None => Ok(()),
        }
    }

    /// Schedules with one immediate retry on transient failure.
    async fn request(
        &self,
        fire_at: NaiveDateTime,
        payload: NotificationPayload,
    ) -> NotificationResult<NotificationHandle> {
        match self.port.schedule_at(fire_at, payload.clone()).await {
            Ok(handle) => Ok(handle),
            Err(err) if err.is_transient() => {
                debug!(error = %err, "schedule attempt failed, retrying once");
                self.port.schedule_at(fire_at, payload).await
            }
            Err(err) => Err(err),
        }
    }

    /// Cancels with one immediate retry on transient failure.
    async fn cancel_handle(&self, handle: &NotificationHandle) -> NotificationResult<()> {
        match self.port.cancel(handle).await {
            Ok(()) => Ok(()),
            Err(err) if err.is_transient() => {
                debug!(%handle, error = %err, "cancel attempt failed, retrying once");
                self.port.cancel(handle).await
            }
            Err(err) => Err(err),
        }
    }
}
