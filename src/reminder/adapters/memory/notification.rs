//! In-memory notification centre adapter.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use crate::reminder::domain::NotificationHandle;
use crate::reminder::ports::{
    NotificationError, NotificationPayload, NotificationPort, NotificationResult,
};

const DELIVERY_CHANNEL_CAPACITY: usize = 16;

/// A scheduled notification held by the in-memory centre.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingNotification {
    fire_at: NaiveDateTime,
    payload: NotificationPayload,
}

impl PendingNotification {
    /// Returns the instant the notification is due to fire.
    #[must_use]
    pub const fn fire_at(&self) -> NaiveDateTime {
        self.fire_at
    }

    /// Returns the scheduled payload.
    #[must_use]
    pub const fn payload(&self) -> &NotificationPayload {
        &self.payload
    }
}

/// Thread-safe in-memory notification centre.
///
/// Records pending notifications keyed by handle, supports
/// permission-denied and transient-failure injection, and fans delivery
/// events out over a broadcast channel.
#[derive(Debug, Clone)]
pub struct InMemoryNotificationCenter {
    state: Arc<RwLock<CenterState>>,
    delivered_tx: broadcast::Sender<NotificationPayload>,
}

#[derive(Debug)]
struct CenterState {
    pending: HashMap<NotificationHandle, PendingNotification>,
    permission_granted: bool,
    schedule_failures_remaining: u32,
    cancel_failures_remaining: u32,
}

impl Default for InMemoryNotificationCenter {
    fn default() -> Self {
        let (delivered_tx, _) = broadcast::channel(DELIVERY_CHANNEL_CAPACITY);
        Self {
            state: Arc::new(RwLock::new(CenterState {
                pending: HashMap::new(),
                permission_granted: true,
                schedule_failures_remaining: 0,
                cancel_failures_remaining: 0,
            })),
            delivered_tx,
        }
    }
}

impl InMemoryNotificationCenter {
    /// Creates a centre with permission granted and no pending entries.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent schedule call fail with permission denied.
    pub fn deny_permission(&self) {
        let mut state = self
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        state.permission_granted = false;
    }

    /// Makes the next `count` schedule calls fail with a transient backend
    /// error.
    pub fn fail_next_schedules(&self, count: u32) {
        let mut state = self
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        state.schedule_failures_remaining = count;
    }

    /// Makes the next `count` cancel calls fail with a transient backend
    /// error, leaving the pending entry in place.
    pub fn fail_next_cancels(&self, count: u32) {
        let mut state = self
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        state.cancel_failures_remaining = count;
    }

    /// Returns the number of notifications currently pending.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.pending.len()
    }

    /// Returns the pending notification for `handle`, if any.
    #[must_use]
    pub fn pending(&self, handle: &NotificationHandle) -> Option<PendingNotification> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.pending.get(handle).cloned()
    }

    /// Simulates the host delivering the notification behind `handle`.
    ///
    /// The entry leaves the pending set and its payload is broadcast to
    /// delivery subscribers. Returns `false` when the handle is unknown.
    pub fn deliver(&self, handle: &NotificationHandle) -> bool {
        let removed = {
            let mut state = self
                .state
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            state.pending.remove(handle)
        };
        match removed {
            Some(pending) => {
                if self.delivered_tx.send(pending.payload).is_err() {
                    debug!(%handle, "delivery event had no subscribers");
                }
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl NotificationPort for InMemoryNotificationCenter {
    async fn schedule_at(
        &self,
        fire_at: NaiveDateTime,
        payload: NotificationPayload,
    ) -> NotificationResult<NotificationHandle> {
        let mut state = self.state.write().map_err(|err| {
            NotificationError::backend(std::io::Error::other(err.to_string()))
        })?;
        if !state.permission_granted {
            return Err(NotificationError::PermissionDenied);
        }
        if state.schedule_failures_remaining > 0 {
            state.schedule_failures_remaining -= 1;
            return Err(NotificationError::backend(std::io::Error::other(
                "injected scheduling failure",
            )));
        }
        let handle = NotificationHandle::new(Uuid::new_v4().to_string());
        state
            .pending
            .insert(handle.clone(), PendingNotification { fire_at, payload });
        Ok(handle)
    }

    async fn cancel(&self, handle: &NotificationHandle) -> NotificationResult<()> {
        let mut state = self.state.write().map_err(|err| {
            NotificationError::backend(std::io::Error::other(err.to_string()))
        })?;
        if state.cancel_failures_remaining > 0 {
            state.cancel_failures_remaining -= 1;
            return Err(NotificationError::backend(std::io::Error::other(
                "injected cancel failure",
            )));
        }
        // Cancelling an unknown or already-fired handle is a no-op.
        state.pending.remove(handle);
        Ok(())
    }

    fn delivered(&self) -> broadcast::Receiver<NotificationPayload> {
        self.delivered_tx.subscribe()
    }
}
