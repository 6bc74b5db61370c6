//! Entity factory.

use std::sync::Arc;

use tokio::sync::watch;

use hearth_coordinator::CoordinatorState;
use hearth_core::StateSink;

use crate::driver::{DeviceDriver, DeviceSnapshot};
use crate::entity::NumberEntity;
use crate::features::{bounds_override, Features, ATTRIBUTE_TYPES};

/// Build one [`NumberEntity`] per feature bit the model supports.
///
/// Iterates the registry in declaration order, so entity ordering (and
/// entity ids) are stable for a given model. A mask bit with no registered
/// descriptor is skipped: device fleets evolve faster than the registry,
/// and an unknown capability is not an error.
pub fn build_number_entities(
    model: &str,
    features: Features,
    device_uid: &str,
    device_name: &str,
    driver: Arc<dyn DeviceDriver>,
    state_rx: watch::Receiver<CoordinatorState<DeviceSnapshot>>,
    sink: Arc<dyn StateSink>,
) -> Vec<NumberEntity> {
    let mut entities = Vec::new();

    for (feature, descriptor) in ATTRIBUTE_TYPES {
        if !features.contains(*feature) {
            continue;
        }

        let mut descriptor = descriptor.clone();
        if let Some(bounds) = bounds_override(model, descriptor.key) {
            descriptor.bounds = Some(bounds);
        }

        entities.push(NumberEntity::new(
            format!("{}_{}", descriptor.key, device_uid),
            format!("{} {}", device_name, descriptor.name),
            descriptor,
            driver.clone(),
            state_rx.clone(),
            sink.clone(),
        ));
    }

    entities
}
