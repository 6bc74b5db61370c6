//! Repository coordinators.
//!
//! One repository is tracked by two coordinators sharing a lifecycle:
//! metadata and latest release. They are grouped in a
//! [`hearth_coordinator::CoordinatorSet`] for bulk operations.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use hearth_coordinator::{Coordinator, CoordinatorSet, PollingCoordinator, SnapshotSource};

use crate::client::{HostingApi, ReleaseSnapshot, RepositorySnapshot};

/// Polls repository metadata.
pub struct RepositoryInfoSource {
    client: Arc<dyn HostingApi>,
    repository: String,
}

impl RepositoryInfoSource {
    pub fn new(client: Arc<dyn HostingApi>, repository: impl Into<String>) -> Self {
        Self {
            client,
            repository: repository.into(),
        }
    }
}

#[async_trait]
impl SnapshotSource for RepositoryInfoSource {
    type Snapshot = RepositorySnapshot;

    async fn poll(&self) -> anyhow::Result<Option<RepositorySnapshot>> {
        let info = self.client.repository(&self.repository).await?;
        Ok(Some(info))
    }
}

/// Polls the latest release. A repository with no releases yet yields an
/// absent snapshot, not a failure.
pub struct LatestReleaseSource {
    client: Arc<dyn HostingApi>,
    repository: String,
}

impl LatestReleaseSource {
    pub fn new(client: Arc<dyn HostingApi>, repository: impl Into<String>) -> Self {
        Self {
            client,
            repository: repository.into(),
        }
    }
}

#[async_trait]
impl SnapshotSource for LatestReleaseSource {
    type Snapshot = ReleaseSnapshot;

    async fn poll(&self) -> anyhow::Result<Option<ReleaseSnapshot>> {
        let releases = self.client.releases(&self.repository).await?;
        Ok(releases.into_iter().next())
    }
}

/// The coordinators belonging to one tracked repository.
pub struct RepositoryCoordinators {
    pub repository: String,
    pub information: Arc<PollingCoordinator<RepositoryInfoSource>>,
    pub release: Arc<PollingCoordinator<LatestReleaseSource>>,
}

impl RepositoryCoordinators {
    pub fn new(
        client: Arc<dyn HostingApi>,
        repository: impl Into<String>,
        interval: Duration,
    ) -> Self {
        let repository = repository.into();
        Self {
            information: Arc::new(PollingCoordinator::new(
                "information",
                RepositoryInfoSource::new(client.clone(), repository.clone()),
                interval,
            )),
            release: Arc::new(PollingCoordinator::new(
                "release",
                LatestReleaseSource::new(client, repository.clone()),
                interval,
            )),
            repository,
        }
    }

    /// All coordinators as an ordered set for bulk lifecycle operations.
    pub fn set(&self) -> CoordinatorSet {
        CoordinatorSet::new()
            .with(self.information.clone() as Arc<dyn Coordinator>)
            .with(self.release.clone() as Arc<dyn Coordinator>)
    }
}
