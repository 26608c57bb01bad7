//! Active expiry: retiring tasks whose notification was delivered.

use mockable::Clock;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::reminder::ports::{KeyValueStorage, NotificationPort};
use crate::reminder::services::reminders::ReminderService;

/// Background worker consuming the port's delivered-notification stream.
///
/// On each delivery the task named in the payload is removed from the
/// store. Removal races with the reconciliation sweep are expected and
/// harmless: retiring an id that is already gone is a no-op. The worker is
/// aborted on drop.
pub struct ReceiptHandler {
    worker: JoinHandle<()>,
}

impl ReceiptHandler {
    /// Spawns the handler, subscribing to `port`'s delivery stream before
    /// returning so no event published after this call is missed.
    #[must_use]
    pub fn spawn<S, N, C>(service: Arc<ReminderService<S, N, C>>, port: &N) -> Self
    where
        S: KeyValueStorage + 'static,
        N: NotificationPort + 'static,
        C: Clock + Send + Sync + 'static,
    {
        let mut delivered = port.delivered();
        let worker = tokio::spawn(async move {
            loop {
                match delivered.recv().await {
                    Ok(payload) => {
                        let task_id = payload.task_id();
                        match service.retire(task_id).await {
                            Ok(true) => debug!(%task_id, "task retired after delivery"),
                            Ok(false) => debug!(%task_id, "delivered task already removed"),
                            Err(err) => {
                                warn!(%task_id, error = %err, "failed to retire delivered task");
                            }
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        // The sweep will catch anything we missed.
                        warn!(skipped, "delivery events lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
        Self { worker }
    }
}

impl Drop for ReceiptHandler {
    fn drop(&mut self) {
        self.worker.abort();
    }
}
