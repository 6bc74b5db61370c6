//! Hearth Coordinator - Periodic Refresh Engine
//!
//! A [`PollingCoordinator`] wraps one data source, refreshes it on a fixed
//! interval on the shared tokio runtime, caches the last successful snapshot,
//! and notifies observers through a watch channel. Fetch faults are converted
//! to coordinator state; they never escape to the scheduler.
//!
//! Coordinators belonging to one logical resource are grouped in a
//! [`CoordinatorSet`] for bulk lifecycle operations.

pub mod coordinator;
pub mod set;

pub use coordinator::{
    Coordinator, CoordinatorState, PollingCoordinator, RefreshOutcome, SnapshotSource,
    DEFAULT_INTERVAL,
};
pub use set::CoordinatorSet;
