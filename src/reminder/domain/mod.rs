//! Domain model for the reminder engine.
//!
//! The reminder domain models a user task with a due date/time, the single
//! notification that projects it onto the host device, and the pure time
//! math that turns the picked date/time into an absolute fire instant. All
//! infrastructure concerns stay outside of the domain boundary.

mod error;
mod ids;
mod task;
pub mod time;

pub use error::TaskDomainError;
pub use ids::{NotificationHandle, TaskId, TaskTitle};
pub use task::{DEFAULT_REMINDER_BODY, Task};
