//! Hearth Tracker - Remote Repository Integration
//!
//! Tracks repositories on a source-code-hosting service. Each repository
//! gets two coordinators - repository metadata and latest release - grouped
//! in a [`RepositoryCoordinators`] set, plus declarative sensor entities
//! extracting fields from the snapshots.
//!
//! The hosting service is behind the [`HostingApi`] trait;
//! [`RestHostingClient`] is the reqwest implementation.

pub mod client;
pub mod coordinator;
pub mod integration;
pub mod sensor;

pub use client::{ClientError, HostingApi, ReleaseSnapshot, RepositorySnapshot, RestHostingClient};
pub use coordinator::{LatestReleaseSource, RepositoryCoordinators, RepositoryInfoSource};
pub use integration::{TrackedRepository, TrackerConfig, TrackerIntegration};
pub use sensor::{SensorDescriptor, SensorEntity, RELEASE_SENSORS, REPOSITORY_SENSORS};
