//! Periodic and lifecycle-triggered reconciliation.

use mockable::Clock;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::reminder::ports::{KeyValueStorage, NotificationPort};
use crate::reminder::services::reminders::ReminderService;

/// Error returned for a zero-length sweep interval.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("reconcile interval must be non-zero")]
pub struct InvalidReconcileInterval;

/// Validated interval between reconciliation sweeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileInterval(Duration);

impl ReconcileInterval {
    /// The production default: one sweep per minute while active.
    pub const DEFAULT: Self = Self(Duration::from_secs(60));

    /// Creates a validated interval.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidReconcileInterval`] for a zero duration.
    pub const fn new(interval: Duration) -> Result<Self, InvalidReconcileInterval> {
        if interval.is_zero() {
            return Err(InvalidReconcileInterval);
        }
        Ok(Self(interval))
    }

    /// Returns the interval as a duration.
    #[must_use]
    pub const fn as_duration(self) -> Duration {
        self.0
    }
}

impl Default for ReconcileInterval {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Background worker driving the reconciliation sweep.
///
/// Two triggers invoke the same sweep: a fixed-interval timer and an
/// explicit foreground-transition signal. Both funnel into one loop, so a
/// foreground transition coinciding with a timer tick simply runs the
/// (idempotent) sweep twice in sequence. The worker is aborted on drop.
pub struct ReconciliationLoop {
    foreground: Arc<Notify>,
    worker: JoinHandle<()>,
}

impl ReconciliationLoop {
    /// Spawns the loop over the given service.
    ///
    /// The first sweep runs immediately, revalidating state on startup and
    /// on resume-from-background relaunches.
    #[must_use]
    pub fn spawn<S, N, C>(
        service: Arc<ReminderService<S, N, C>>,
        interval: ReconcileInterval,
    ) -> Self
    where
        S: KeyValueStorage + 'static,
        N: NotificationPort + 'static,
        C: Clock + Send + Sync + 'static,
    {
        let foreground = Arc::new(Notify::new());
        let trigger = Arc::clone(&foreground);
        let worker = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval.as_duration());
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    () = trigger.notified() => {
                        debug!("foreground transition triggered reconciliation");
                    }
                }
                let report = service.reconcile().await;
                if !report.removed.is_empty() {
                    debug!(removed = report.removed.len(), "sweep pass complete");
                }
            }
        });
        Self { foreground, worker }
    }

    /// Signals a resume-from-background transition, scheduling an
    /// immediate sweep.
    pub fn trigger_foreground(&self) {
        self.foreground.notify_one();
    }
}

impl Drop for ReconciliationLoop {
    fn drop(&mut self) {
        self.worker.abort();
    }
}
