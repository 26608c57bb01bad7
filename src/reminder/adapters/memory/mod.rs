//! In-memory port adapters.
//!
//! Reference implementations used by tests and by hosts that wire the
//! engine up before platform adapters exist. Both expose failure-injection
//! hooks so callers can exercise the engine's degraded paths.

mod notification;
mod storage;

pub use notification::{InMemoryNotificationCenter, PendingNotification};
pub use storage::InMemoryKeyValueStorage;
