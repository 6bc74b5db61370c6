//! Named coordinator groups.

use std::sync::Arc;

use futures::future::try_join_all;

use hearth_core::UpdateFailed;

use crate::coordinator::Coordinator;

/// Ordered group of named coordinators sharing one lifecycle.
///
/// Pure aggregation: everything delegates to the members. Iteration order is
/// insertion order, so bulk operations are deterministic.
#[derive(Default)]
pub struct CoordinatorSet {
    entries: Vec<Arc<dyn Coordinator>>,
}

impl CoordinatorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a coordinator. A member with the same name is replaced in place.
    pub fn insert(&mut self, coordinator: Arc<dyn Coordinator>) {
        match self
            .entries
            .iter_mut()
            .find(|c| c.name() == coordinator.name())
        {
            Some(slot) => *slot = coordinator,
            None => self.entries.push(coordinator),
        }
    }

    /// Builder-style [`CoordinatorSet::insert`].
    pub fn with(mut self, coordinator: Arc<dyn Coordinator>) -> Self {
        self.insert(coordinator);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Coordinator>> {
        self.entries.iter().find(|c| c.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Coordinator>> {
        self.entries.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|c| c.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Refresh every member concurrently; the first fault is returned.
    pub async fn refresh_all(&self) -> Result<(), UpdateFailed> {
        try_join_all(self.entries.iter().map(|c| c.refresh())).await?;
        Ok(())
    }

    /// Start every member's interval loop.
    pub fn start_all(&self) {
        for coordinator in &self.entries {
            coordinator.start();
        }
    }

    /// Shut every member down, in insertion order.
    pub async fn shutdown_all(&self) {
        for coordinator in &self.entries {
            coordinator.shutdown().await;
        }
    }
}

impl std::fmt::Debug for CoordinatorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordinatorSet")
            .field("names", &self.names())
            .finish()
    }
}
