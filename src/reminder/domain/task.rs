//! Task aggregate root for the reminder engine.

use super::{NotificationHandle, TaskId, TaskTitle, time};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Notification body used when a task carries no note.
pub const DEFAULT_REMINDER_BODY: &str = "Your task is due.";

/// A reminder task: the user's picked due date/time plus the state of the
/// single notification projecting it onto the device.
///
/// Field names serialise in camelCase; the persisted record format is the
/// JSON task list the mobile app stores under one key-value entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    id: TaskId,
    title: TaskTitle,
    note: Option<String>,
    due_date: NaiveDate,
    due_time: NaiveTime,
    notification_handle: Option<NotificationHandle>,
    scheduled_for: NaiveDateTime,
}

impl Task {
    /// Creates a new task with a freshly assigned identifier.
    ///
    /// The effective fire instant is computed against `now`: a pick at or
    /// before it clamps forward by one minute. Callers must reuse the same
    /// `now` for any scheduling decision made on the new task, so the
    /// clamp and the past-due check cannot disagree about the current
    /// instant. A blank note is normalised to `None`.
    #[must_use]
    pub fn new(
        title: TaskTitle,
        note: Option<String>,
        due_date: NaiveDate,
        due_time: NaiveTime,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            id: TaskId::new(),
            title,
            note: normalise_note(note),
            due_date,
            due_time,
            notification_handle: None,
            scheduled_for: time::clamped_fire_instant(due_date, due_time, now),
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the task title.
    #[must_use]
    pub const fn title(&self) -> &TaskTitle {
        &self.title
    }

    /// Returns the optional free-text note.
    #[must_use]
    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    /// Returns the picked calendar date.
    #[must_use]
    pub const fn due_date(&self) -> NaiveDate {
        self.due_date
    }

    /// Returns the picked wall-clock time.
    #[must_use]
    pub const fn due_time(&self) -> NaiveTime {
        self.due_time
    }

    /// Returns the outstanding notification handle, if any.
    #[must_use]
    pub const fn notification_handle(&self) -> Option<&NotificationHandle> {
        self.notification_handle.as_ref()
    }

    /// Returns the effective fire instant.
    ///
    /// This is the clamped value cached at the last create/edit and is the
    /// scheduling authority; `due_date`/`due_time` keep the user's raw pick.
    #[must_use]
    pub const fn fire_instant(&self) -> NaiveDateTime {
        self.scheduled_for
    }

    /// Returns the notification body: the note when present, otherwise the
    /// default reminder text.
    #[must_use]
    pub fn reminder_body(&self) -> &str {
        self.note.as_deref().unwrap_or(DEFAULT_REMINDER_BODY)
    }

    /// Renders the list-screen due line for this task.
    #[must_use]
    pub fn display_due(&self) -> String {
        time::format_due(self.scheduled_for)
    }

    /// Returns `true` when the fire instant is at or before `now`.
    #[must_use]
    pub fn is_past_due(&self, now: NaiveDateTime) -> bool {
        self.scheduled_for <= now
    }

    /// Replaces the title.
    pub fn set_title(&mut self, title: TaskTitle) {
        self.title = title;
    }

    /// Replaces the note, normalising blank text to `None`.
    pub fn set_note(&mut self, note: Option<String>) {
        self.note = normalise_note(note);
    }

    /// Replaces the picked due date and time.
    ///
    /// Callers must follow up with [`Task::recompute_schedule`] before the
    /// task is observed again; the cached fire instant is stale until then.
    pub fn set_due(&mut self, due_date: NaiveDate, due_time: NaiveTime) {
        self.due_date = due_date;
        self.due_time = due_time;
    }

    /// Recomputes the cached fire instant from the picked date/time against
    /// `now`, applying the clamp-forward policy.
    pub fn recompute_schedule(&mut self, now: NaiveDateTime) {
        self.scheduled_for = time::clamped_fire_instant(self.due_date, self.due_time, now);
    }

    /// Attaches a freshly issued notification handle.
    pub fn attach_handle(&mut self, handle: NotificationHandle) {
        self.notification_handle = Some(handle);
    }

    /// Clears and returns the outstanding handle, if any.
    pub fn clear_handle(&mut self) -> Option<NotificationHandle> {
        self.notification_handle.take()
    }
}

fn normalise_note(note: Option<String>) -> Option<String> {
    note.filter(|text| !text.trim().is_empty())
}
