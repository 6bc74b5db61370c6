//! Declarative repository sensors.
//!
//! Each sensor pairs a static descriptor - display metadata plus a field
//! extraction function - with a coordinator observer. The descriptor tables
//! are fixed; entity ordering follows their declaration order.

use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use hearth_coordinator::CoordinatorState;
use hearth_core::{StateSink, StateValue};

use crate::client::{ReleaseSnapshot, RepositorySnapshot};

/// Static metadata for one sensor over snapshot type `T`.
pub struct SensorDescriptor<T: 'static> {
    pub key: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
    pub unit: Option<&'static str>,
    /// Extracts this sensor's value from a snapshot
    pub state: fn(&T) -> StateValue,
}

/// Sensors over repository metadata.
pub static REPOSITORY_SENSORS: &[SensorDescriptor<RepositorySnapshot>] = &[
    SensorDescriptor {
        key: "updated_at",
        name: "Updated",
        icon: "mdi:source-repository",
        unit: None,
        state: |data| StateValue::Timestamp(data.updated_at),
    },
    SensorDescriptor {
        key: "stargazers_count",
        name: "Stars",
        icon: "mdi:star",
        unit: Some("stars"),
        state: |data| StateValue::from(data.stargazers_count),
    },
    SensorDescriptor {
        key: "watchers_count",
        name: "Watchers",
        icon: "mdi:glasses",
        unit: Some("watchers"),
        state: |data| StateValue::from(data.watchers_count),
    },
    SensorDescriptor {
        key: "forks_count",
        name: "Forks",
        icon: "mdi:source-fork",
        unit: Some("forks"),
        state: |data| StateValue::from(data.forks_count),
    },
    SensorDescriptor {
        key: "default_branch",
        name: "Default branch",
        icon: "mdi:source-branch",
        unit: None,
        state: |data| StateValue::Text(data.default_branch.clone()),
    },
];

/// Sensors over the latest release.
pub static RELEASE_SENSORS: &[SensorDescriptor<ReleaseSnapshot>] = &[
    SensorDescriptor {
        key: "name",
        name: "Release Name",
        icon: "mdi:tag",
        unit: None,
        // Untitled releases fall back to the tag.
        state: |data| {
            StateValue::Text(data.name.clone().unwrap_or_else(|| data.tag_name.clone()))
        },
    },
    SensorDescriptor {
        key: "published_at",
        name: "Release Published",
        icon: "mdi:tag",
        unit: None,
        state: |data| StateValue::Timestamp(data.published_at),
    },
    SensorDescriptor {
        key: "html_url",
        name: "Release URL",
        icon: "mdi:web",
        unit: None,
        state: |data| StateValue::Text(data.html_url.clone()),
    },
];

/// One sensor entity driven by a coordinator watch channel.
pub struct SensorEntity<T: Clone + Send + Sync + 'static> {
    entity_id: String,
    name: String,
    descriptor: &'static SensorDescriptor<T>,
    state_rx: watch::Receiver<CoordinatorState<T>>,
    sink: Arc<dyn StateSink>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Clone + Send + Sync + 'static> SensorEntity<T> {
    pub fn new(
        repository: &str,
        descriptor: &'static SensorDescriptor<T>,
        state_rx: watch::Receiver<CoordinatorState<T>>,
        sink: Arc<dyn StateSink>,
    ) -> Self {
        Self {
            entity_id: format!("{repository}:{}", descriptor.key),
            name: format!("{repository} {}", descriptor.name),
            descriptor,
            state_rx,
            sink,
            task: Mutex::new(None),
        }
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptor(&self) -> &'static SensorDescriptor<T> {
        self.descriptor
    }

    /// Current value, extracted fresh from the coordinator snapshot.
    pub fn value(&self) -> StateValue {
        self.state_rx
            .borrow()
            .data
            .as_ref()
            .map_or(StateValue::Null, self.descriptor.state)
    }

    /// Fresh availability: the coordinator's last refresh produced data.
    pub fn available(&self) -> bool {
        self.state_rx.borrow().is_ready()
    }

    /// Start pushing coordinator updates into the state sink. Idempotent.
    pub fn start(&self) {
        let mut task = self.task.lock().expect("task slot poisoned");
        if task.is_some() {
            return;
        }

        let mut rx = self.state_rx.clone();
        let descriptor = self.descriptor;
        let sink = self.sink.clone();
        let entity_id = self.entity_id.clone();

        *task = Some(tokio::spawn(async move {
            loop {
                {
                    let state = rx.borrow_and_update();
                    let value = state
                        .data
                        .as_ref()
                        .map_or(StateValue::Null, descriptor.state);
                    sink.write_state(&entity_id, value, state.is_ready());
                }
                if rx.changed().await.is_err() {
                    break;
                }
            }
        }));
    }

    /// Stop observing; no state writes happen after this returns.
    pub fn shutdown(&self) {
        if let Some(task) = self.task.lock().expect("task slot poisoned").take() {
            task.abort();
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Drop for SensorEntity<T> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
