//! Orchestration services for the reminder engine.

pub mod receipt;
pub mod reconciler;
pub mod reminders;
pub mod scheduler;
pub mod store;

pub use receipt::ReceiptHandler;
pub use reconciler::{InvalidReconcileInterval, ReconcileInterval, ReconciliationLoop};
pub use reminders::{
    NewTaskRequest, ReconcileReport, ReminderError, ReminderResult, ReminderService, TaskMutation,
    TaskPatch,
};
pub use scheduler::{NotificationScheduler, ScheduleOutcome, ScheduleWarning};
pub use store::{TaskStore, TaskStoreError, TaskStoreResult};
