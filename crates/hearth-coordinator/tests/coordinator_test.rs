//! Tests for PollingCoordinator and CoordinatorSet

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use hearth_coordinator::{
    Coordinator, CoordinatorSet, PollingCoordinator, RefreshOutcome, SnapshotSource,
};

/// One scripted poll result.
enum Step {
    Value(u32),
    Empty,
    Fault(&'static str),
}

/// Source that replays a fixed script, then faults.
struct ScriptedSource {
    script: Mutex<VecDeque<Step>>,
}

impl ScriptedSource {
    fn new(steps: Vec<Step>) -> Self {
        Self {
            script: Mutex::new(steps.into()),
        }
    }
}

#[async_trait]
impl SnapshotSource for ScriptedSource {
    type Snapshot = u32;

    async fn poll(&self) -> anyhow::Result<Option<u32>> {
        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Step::Fault("script exhausted"));
        match step {
            Step::Value(v) => Ok(Some(v)),
            Step::Empty => Ok(None),
            Step::Fault(msg) => Err(anyhow::anyhow!(msg)),
        }
    }
}

/// Source that returns its running poll count.
#[derive(Default)]
struct CountingSource {
    polls: Arc<AtomicU32>,
}

#[async_trait]
impl SnapshotSource for CountingSource {
    type Snapshot = u32;

    async fn poll(&self) -> anyhow::Result<Option<u32>> {
        Ok(Some(self.polls.fetch_add(1, Ordering::SeqCst) + 1))
    }
}

/// Source that blocks until released, to exercise in-flight shutdown.
struct BlockingSource {
    entered: Arc<Notify>,
    release: Arc<Notify>,
    polls: Arc<AtomicU32>,
}

#[async_trait]
impl SnapshotSource for BlockingSource {
    type Snapshot = u32;

    async fn poll(&self) -> anyhow::Result<Option<u32>> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        self.release.notified().await;
        Ok(Some(99))
    }
}

#[tokio::test]
async fn test_refresh_replaces_snapshot() {
    let coordinator = PollingCoordinator::new(
        "information",
        ScriptedSource::new(vec![Step::Value(1), Step::Value(2)]),
        Duration::from_secs(30),
    );
    let rx = coordinator.subscribe();

    coordinator.refresh().await.unwrap();
    assert_eq!(rx.borrow().data, Some(1));

    coordinator.refresh().await.unwrap();
    let state = rx.borrow();
    assert_eq!(state.data, Some(2));
    assert_eq!(state.outcome, RefreshOutcome::Success);
    assert!(state.last_updated.is_some());
    assert!(state.is_ready());
}

#[tokio::test]
async fn test_fault_retains_previous_snapshot() {
    let coordinator = PollingCoordinator::new(
        "information",
        ScriptedSource::new(vec![Step::Value(7), Step::Fault("connection reset")]),
        Duration::from_secs(30),
    );

    coordinator.refresh().await.unwrap();

    let err = coordinator.refresh().await.unwrap_err();
    assert!(err.to_string().contains("connection reset"));

    let state = coordinator.state();
    assert_eq!(state.data, Some(7), "snapshot must survive a failed refresh");
    assert_eq!(state.outcome, RefreshOutcome::Failed);
    assert!(!state.last_refresh_ok());
    assert!(!state.is_ready());
}

#[tokio::test]
async fn test_empty_result_is_not_a_failure() {
    let coordinator = PollingCoordinator::new(
        "release",
        ScriptedSource::new(vec![Step::Empty]),
        Duration::from_secs(30),
    );

    coordinator.refresh().await.unwrap();

    let state = coordinator.state();
    assert!(state.data.is_none());
    assert!(state.last_refresh_ok(), "no data is a valid non-error state");
    assert!(!state.is_ready());
}

#[tokio::test(start_paused = true)]
async fn test_interval_loop_publishes_each_tick() {
    let source = CountingSource::default();
    let polls = source.polls.clone();
    let coordinator = PollingCoordinator::new("status", source, Duration::from_secs(30));
    let mut rx = coordinator.subscribe();

    coordinator.start();
    coordinator.start(); // idempotent

    rx.changed().await.unwrap();
    assert_eq!(rx.borrow_and_update().data, Some(1));

    rx.changed().await.unwrap();
    assert_eq!(rx.borrow_and_update().data, Some(2));

    coordinator.shutdown().await;
    let after_shutdown = polls.load(Ordering::SeqCst);

    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(
        polls.load(Ordering::SeqCst),
        after_shutdown,
        "no ticks may fire after shutdown"
    );
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_discards_inflight_result() {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let polls = Arc::new(AtomicU32::new(0));
    let source = BlockingSource {
        entered: entered.clone(),
        release: release.clone(),
        polls: polls.clone(),
    };
    let coordinator = PollingCoordinator::new("status", source, Duration::from_secs(10));

    coordinator.start();
    entered.notified().await; // a fetch is now in flight

    // Shut down while the fetch is pending, then let it complete.
    tokio::join!(coordinator.shutdown(), async {
        release.notify_one();
    });

    assert_eq!(polls.load(Ordering::SeqCst), 1);
    let state = coordinator.state();
    assert_eq!(
        state.outcome,
        RefreshOutcome::Pending,
        "in-flight result must be discarded without notification"
    );
    assert!(state.data.is_none());
}

#[tokio::test]
async fn test_set_preserves_insertion_order() {
    let info: Arc<dyn Coordinator> = Arc::new(PollingCoordinator::new(
        "information",
        CountingSource::default(),
        Duration::from_secs(30),
    ));
    let release: Arc<dyn Coordinator> = Arc::new(PollingCoordinator::new(
        "release",
        CountingSource::default(),
        Duration::from_secs(30),
    ));

    let mut set = CoordinatorSet::new().with(info).with(release);
    assert_eq!(set.names(), vec!["information", "release"]);
    assert_eq!(set.len(), 2);
    assert!(set.get("release").is_some());
    assert!(set.get("missing").is_none());

    // Same name replaces in place, order unchanged.
    let replacement: Arc<dyn Coordinator> = Arc::new(PollingCoordinator::new(
        "information",
        CountingSource::default(),
        Duration::from_secs(60),
    ));
    set.insert(replacement);
    assert_eq!(set.len(), 2);
    assert_eq!(set.names(), vec!["information", "release"]);
    assert_eq!(
        set.get("information").unwrap().interval(),
        Duration::from_secs(60)
    );
}

#[tokio::test]
async fn test_set_refresh_all() {
    let healthy = CountingSource::default();
    let polls = healthy.polls.clone();
    let set = CoordinatorSet::new()
        .with(Arc::new(PollingCoordinator::new(
            "information",
            healthy,
            Duration::from_secs(30),
        )) as Arc<dyn Coordinator>)
        .with(Arc::new(PollingCoordinator::new(
            "release",
            ScriptedSource::new(vec![Step::Empty]),
            Duration::from_secs(30),
        )) as Arc<dyn Coordinator>);

    set.refresh_all().await.unwrap();
    assert_eq!(polls.load(Ordering::SeqCst), 1);
    assert!(set.get("information").unwrap().last_refresh_ok());
    assert!(set.get("release").unwrap().last_refresh_ok());
    assert!(!set.get("release").unwrap().has_data());

    // A faulting member surfaces through refresh_all.
    let faulty = CoordinatorSet::new().with(Arc::new(PollingCoordinator::new(
        "release",
        ScriptedSource::new(vec![]),
        Duration::from_secs(30),
    )) as Arc<dyn Coordinator>);
    assert!(faulty.refresh_all().await.is_err());

    set.shutdown_all().await;
}
