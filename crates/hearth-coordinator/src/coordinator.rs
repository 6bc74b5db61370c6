//! Polling coordinator: timer + single-flight guard + observer notify.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use hearth_core::config::defaults;
use hearth_core::UpdateFailed;

/// Default refresh interval for coordinators that do not override it.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(defaults::POLL_INTERVAL_SECS);

/// One external data source polled by a coordinator.
///
/// `poll` fetches one snapshot of external state. `Ok(None)` is a valid
/// "source has no data" result (e.g. a repository with no releases yet) and
/// is distinct from a fault.
#[async_trait]
pub trait SnapshotSource: Send + Sync + 'static {
    type Snapshot: Clone + Send + Sync + 'static;

    async fn poll(&self) -> anyhow::Result<Option<Self::Snapshot>>;
}

/// Outcome of the most recent refresh attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// No refresh has completed yet
    Pending,
    /// The last refresh succeeded (possibly with no data)
    Success,
    /// The last refresh faulted; `data` still holds the previous snapshot
    Failed,
}

/// State published to observers after every completed refresh.
#[derive(Debug, Clone)]
pub struct CoordinatorState<T> {
    /// Last successfully fetched snapshot. `None` until the first success,
    /// or when the source legitimately has no data.
    pub data: Option<T>,
    /// Outcome of the most recent refresh.
    pub outcome: RefreshOutcome,
    /// When `data` was last replaced by a successful refresh.
    pub last_updated: Option<DateTime<Utc>>,
}

impl<T> CoordinatorState<T> {
    fn pending() -> Self {
        Self {
            data: None,
            outcome: RefreshOutcome::Pending,
            last_updated: None,
        }
    }

    /// Whether the last refresh succeeded.
    pub fn last_refresh_ok(&self) -> bool {
        self.outcome == RefreshOutcome::Success
    }

    /// Whether observers can rely on `data`: last refresh succeeded and the
    /// source actually had data.
    pub fn is_ready(&self) -> bool {
        self.last_refresh_ok() && self.data.is_some()
    }
}

impl<T> Default for CoordinatorState<T> {
    fn default() -> Self {
        Self::pending()
    }
}

/// Object-safe coordinator facade used by [`crate::CoordinatorSet`].
#[async_trait]
pub trait Coordinator: Send + Sync {
    fn name(&self) -> &str;

    fn interval(&self) -> Duration;

    /// Run one refresh now, outside the schedule.
    async fn refresh(&self) -> Result<(), UpdateFailed>;

    /// Start the interval loop. Idempotent.
    fn start(&self);

    /// Cancel pending ticks and wait for an in-flight fetch to finish.
    async fn shutdown(&self);

    fn last_refresh_ok(&self) -> bool;

    fn has_data(&self) -> bool;
}

/// Periodic-refresh cache for one external data source.
///
/// The refresh body is guarded by a single-flight lock: a manual refresh and
/// an interval tick can never fetch concurrently, and snapshot replacement
/// plus observer notification happen atomically per coordinator (one
/// `watch::send_replace` from a serialized loop).
pub struct PollingCoordinator<S: SnapshotSource> {
    name: String,
    source: Arc<S>,
    poll_interval: Duration,
    state_tx: watch::Sender<CoordinatorState<S::Snapshot>>,
    refresh_lock: Arc<Mutex<()>>,
    shutdown_tx: watch::Sender<bool>,
    task: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl<S: SnapshotSource> PollingCoordinator<S> {
    /// Create a coordinator. The interval loop is not started; call
    /// [`PollingCoordinator::start`] (usually after a first manual refresh).
    pub fn new(name: impl Into<String>, source: S, poll_interval: Duration) -> Self {
        let (state_tx, _) = watch::channel(CoordinatorState::pending());
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            name: name.into(),
            source: Arc::new(source),
            poll_interval,
            state_tx,
            refresh_lock: Arc::new(Mutex::new(())),
            shutdown_tx,
            task: std::sync::Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn interval(&self) -> Duration {
        self.poll_interval
    }

    /// Subscribe to state updates. The receiver immediately holds the
    /// current state; every completed refresh publishes exactly once.
    pub fn subscribe(&self) -> watch::Receiver<CoordinatorState<S::Snapshot>> {
        self.state_tx.subscribe()
    }

    /// Clone of the current state.
    pub fn state(&self) -> CoordinatorState<S::Snapshot> {
        self.state_tx.borrow().clone()
    }

    /// Run one refresh now and publish the result.
    ///
    /// Returns the uniform [`UpdateFailed`] when the source faults; the
    /// fault is also recorded in the published state, so callers that only
    /// care about availability can ignore the result.
    pub async fn refresh(&self) -> Result<(), UpdateFailed> {
        let result = {
            let _guard = self.refresh_lock.lock().await;
            self.source.poll().await
        };
        match result {
            Ok(data) => {
                Self::publish_success(&self.state_tx, data);
                Ok(())
            }
            Err(fault) => {
                tracing::warn!(coordinator = %self.name, error = %fault, "refresh failed");
                Self::publish_failure(&self.state_tx);
                Err(UpdateFailed(fault))
            }
        }
    }

    /// Spawn the interval loop. The first scheduled tick fires one interval
    /// from now; overdue ticks are skipped while a fetch is in flight.
    pub fn start(&self) {
        let mut task = self.task.lock().expect("task slot poisoned");
        if task.is_some() {
            return;
        }

        let name = self.name.clone();
        let source = self.source.clone();
        let state_tx = self.state_tx.clone();
        let refresh_lock = self.refresh_lock.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let poll_interval = self.poll_interval;

        *task = Some(tokio::spawn(async move {
            let mut ticker = interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker.tick().await; // the immediate first tick

            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    _ = ticker.tick() => {}
                }

                let result = {
                    let _guard = refresh_lock.lock().await;
                    source.poll().await
                };

                // An unload may have happened while the fetch was in
                // flight; the result is discarded without notification.
                if *shutdown_rx.borrow() {
                    break;
                }

                match result {
                    Ok(data) => Self::publish_success(&state_tx, data),
                    Err(fault) => {
                        tracing::warn!(coordinator = %name, error = %fault, "refresh failed");
                        Self::publish_failure(&state_tx);
                    }
                }
            }

            tracing::debug!(coordinator = %name, "interval loop stopped");
        }));
    }

    /// Cancel pending ticks and wait for the loop to exit. An in-flight
    /// fetch is allowed to complete; its result is discarded.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        let handle = self.task.lock().expect("task slot poisoned").take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    fn publish_success(
        state_tx: &watch::Sender<CoordinatorState<S::Snapshot>>,
        data: Option<S::Snapshot>,
    ) {
        state_tx.send_replace(CoordinatorState {
            data,
            outcome: RefreshOutcome::Success,
            last_updated: Some(Utc::now()),
        });
    }

    fn publish_failure(state_tx: &watch::Sender<CoordinatorState<S::Snapshot>>) {
        // Retain the previous snapshot; only the outcome changes.
        let (data, last_updated) = {
            let prev = state_tx.borrow();
            (prev.data.clone(), prev.last_updated)
        };
        state_tx.send_replace(CoordinatorState {
            data,
            outcome: RefreshOutcome::Failed,
            last_updated,
        });
    }
}

#[async_trait]
impl<S: SnapshotSource> Coordinator for PollingCoordinator<S> {
    fn name(&self) -> &str {
        PollingCoordinator::name(self)
    }

    fn interval(&self) -> Duration {
        PollingCoordinator::interval(self)
    }

    async fn refresh(&self) -> Result<(), UpdateFailed> {
        PollingCoordinator::refresh(self).await
    }

    fn start(&self) {
        PollingCoordinator::start(self);
    }

    async fn shutdown(&self) {
        PollingCoordinator::shutdown(self).await;
    }

    fn last_refresh_ok(&self) -> bool {
        self.state_tx.borrow().last_refresh_ok()
    }

    fn has_data(&self) -> bool {
        self.state_tx.borrow().data.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_state() {
        let state: CoordinatorState<u32> = CoordinatorState::default();
        assert_eq!(state.outcome, RefreshOutcome::Pending);
        assert!(!state.last_refresh_ok());
        assert!(!state.is_ready());
        assert!(state.data.is_none());
    }

    #[test]
    fn test_ready_requires_data() {
        let no_data: CoordinatorState<u32> = CoordinatorState {
            data: None,
            outcome: RefreshOutcome::Success,
            last_updated: Some(Utc::now()),
        };
        assert!(no_data.last_refresh_ok());
        assert!(!no_data.is_ready());

        let ready = CoordinatorState {
            data: Some(1u32),
            outcome: RefreshOutcome::Success,
            last_updated: Some(Utc::now()),
        };
        assert!(ready.is_ready());
    }
}
