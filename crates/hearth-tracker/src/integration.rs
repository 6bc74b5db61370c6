//! Tracker integration lifecycle.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use hearth_core::config::defaults;
use hearth_core::{StateSink, UpdateFailed};

use crate::client::{HostingApi, ReleaseSnapshot, RepositorySnapshot};
use crate::coordinator::RepositoryCoordinators;
use crate::sensor::{SensorEntity, RELEASE_SENSORS, REPOSITORY_SENSORS};

/// Tracker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Base URL of the hosting service API
    pub base_url: String,
    /// API token, when required
    #[serde(default)]
    pub token: Option<String>,
    /// Repositories to track, `owner/name`
    pub repositories: Vec<String>,
    /// Refresh interval in seconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,
}

fn default_poll_interval() -> u64 {
    defaults::REMOTE_POLL_INTERVAL_SECS
}

/// One tracked repository: its coordinators and sensor entities.
pub struct TrackedRepository {
    pub repository: String,
    coordinators: RepositoryCoordinators,
    repository_sensors: Vec<SensorEntity<RepositorySnapshot>>,
    release_sensors: Vec<SensorEntity<ReleaseSnapshot>>,
}

impl TrackedRepository {
    pub fn coordinators(&self) -> &RepositoryCoordinators {
        &self.coordinators
    }

    pub fn repository_sensors(&self) -> &[SensorEntity<RepositorySnapshot>] {
        &self.repository_sensors
    }

    pub fn release_sensors(&self) -> &[SensorEntity<ReleaseSnapshot>] {
        &self.release_sensors
    }
}

/// A running tracker integration.
pub struct TrackerIntegration {
    repositories: Vec<TrackedRepository>,
}

impl TrackerIntegration {
    /// Set up tracking for every configured repository.
    ///
    /// Each repository's coordinators are refreshed once before anything
    /// starts; a fault aborts setup so the caller can retry later. Release
    /// sensors are only created when the repository already has a release -
    /// "no releases yet" is a valid state that simply produces fewer
    /// entities.
    pub async fn setup(
        client: Arc<dyn HostingApi>,
        config: &TrackerConfig,
        sink: Arc<dyn StateSink>,
    ) -> Result<Self, UpdateFailed> {
        let interval = Duration::from_secs(config.poll_interval);
        let mut repositories = Vec::with_capacity(config.repositories.len());

        for repository in &config.repositories {
            let coordinators =
                RepositoryCoordinators::new(client.clone(), repository.clone(), interval);
            coordinators.set().refresh_all().await?;

            let repository_sensors: Vec<_> = REPOSITORY_SENSORS
                .iter()
                .map(|descriptor| {
                    SensorEntity::new(
                        repository,
                        descriptor,
                        coordinators.information.subscribe(),
                        sink.clone(),
                    )
                })
                .collect();

            let release_sensors: Vec<_> = if coordinators.release.state().data.is_some() {
                RELEASE_SENSORS
                    .iter()
                    .map(|descriptor| {
                        SensorEntity::new(
                            repository,
                            descriptor,
                            coordinators.release.subscribe(),
                            sink.clone(),
                        )
                    })
                    .collect()
            } else {
                tracing::info!(repository = %repository, "no releases yet, skipping release sensors");
                Vec::new()
            };

            repositories.push(TrackedRepository {
                repository: repository.clone(),
                coordinators,
                repository_sensors,
                release_sensors,
            });
        }

        // Everything refreshed; bring the integration live.
        for tracked in &repositories {
            for sensor in &tracked.repository_sensors {
                sensor.start();
            }
            for sensor in &tracked.release_sensors {
                sensor.start();
            }
            tracked.coordinators.set().start_all();
            tracing::info!(
                repository = %tracked.repository,
                sensors = tracked.repository_sensors.len() + tracked.release_sensors.len(),
                "tracking repository"
            );
        }

        Ok(Self { repositories })
    }

    pub fn repositories(&self) -> &[TrackedRepository] {
        &self.repositories
    }

    pub fn get(&self, repository: &str) -> Option<&TrackedRepository> {
        self.repositories
            .iter()
            .find(|t| t.repository == repository)
    }

    /// Stop all coordinators and sensors. In-flight fetches complete but
    /// their results are discarded.
    pub async fn unload(&self) {
        for tracked in &self.repositories {
            tracked.coordinators.set().shutdown_all().await;
            for sensor in &tracked.repository_sensors {
                sensor.shutdown();
            }
            for sensor in &tracked.release_sensors {
                sensor.shutdown();
            }
            tracing::info!(repository = %tracked.repository, "repository unloaded");
        }
    }
}
