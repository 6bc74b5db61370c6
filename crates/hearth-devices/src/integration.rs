//! Device integration lifecycle.
//!
//! Wires one configured appliance into the platform: a status coordinator
//! polling the driver, and the number entities the model's feature mask
//! calls for.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use hearth_coordinator::PollingCoordinator;
use hearth_core::config::defaults;
use hearth_core::StateSink;

use crate::driver::{DeviceDriver, StatusSource};
use crate::entity::NumberEntity;
use crate::factory::build_number_entities;
use crate::features::features_for_model;

/// One configured device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Stable device identifier; generated when absent
    pub id: Option<String>,
    /// Human-readable device name
    pub name: String,
    /// Model identifier, resolved against the capability registry
    pub model: String,
    /// Network address of the device
    pub host: String,
    /// Protocol token, when the device requires one
    pub token: Option<String>,
    /// Status refresh interval in seconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,
}

fn default_poll_interval() -> u64 {
    defaults::POLL_INTERVAL_SECS
}

/// A running device integration: one status coordinator plus its entities.
pub struct DeviceIntegration {
    device_uid: String,
    coordinator: Arc<PollingCoordinator<StatusSource>>,
    entities: Vec<NumberEntity>,
}

impl DeviceIntegration {
    /// Set up a device: first refresh, entity construction, polling.
    ///
    /// A failed first refresh is tolerated - the device may be offline at
    /// boot - and the entities start stale. An unknown model produces an
    /// integration with no entities; the status coordinator still runs.
    pub async fn setup(
        config: &DeviceConfig,
        driver: Arc<dyn DeviceDriver>,
        sink: Arc<dyn StateSink>,
    ) -> Self {
        let device_uid = config
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let coordinator = Arc::new(PollingCoordinator::new(
            "status",
            StatusSource::new(driver.clone()),
            Duration::from_secs(config.poll_interval),
        ));

        if coordinator.refresh().await.is_err() {
            tracing::warn!(
                device = %device_uid,
                model = %config.model,
                "initial status refresh failed, entities start stale"
            );
        }

        let entities = match features_for_model(&config.model) {
            Some(features) => build_number_entities(
                &config.model,
                features,
                &device_uid,
                &config.name,
                driver,
                coordinator.subscribe(),
                sink,
            ),
            None => {
                tracing::info!(model = %config.model, "model not in capability registry");
                Vec::new()
            }
        };

        for entity in &entities {
            entity.start();
        }
        coordinator.start();

        tracing::info!(
            device = %device_uid,
            model = %config.model,
            entities = entities.len(),
            "device integration ready"
        );

        Self {
            device_uid,
            coordinator,
            entities,
        }
    }

    pub fn device_uid(&self) -> &str {
        &self.device_uid
    }

    pub fn coordinator(&self) -> &Arc<PollingCoordinator<StatusSource>> {
        &self.coordinator
    }

    pub fn entities(&self) -> &[NumberEntity] {
        &self.entities
    }

    /// Tear the integration down. Pending ticks are cancelled; an in-flight
    /// status fetch completes but is discarded, and no entity writes state
    /// afterwards.
    pub async fn unload(&self) {
        self.coordinator.shutdown().await;
        for entity in &self.entities {
            entity.shutdown();
        }
        tracing::info!(device = %self.device_uid, "device integration unloaded");
    }
}
