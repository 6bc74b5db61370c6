//! Controllable number entities.
//!
//! A [`NumberEntity`] pairs one attribute descriptor with the shared device
//! driver and an observer on the device's status coordinator. It is *stale*
//! until the first successful tick or user-set, then *synced*; a failed tick
//! never clears the last-known value, only availability.

use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use hearth_coordinator::CoordinatorState;
use hearth_core::{StateSink, StateValue};

use crate::driver::{DeviceDriver, DeviceSnapshot, DriverError};
use crate::features::{AttributeDescriptor, SetterOp};

/// Invoke the driver operation named by a descriptor.
async fn dispatch_setter(
    driver: &dyn DeviceDriver,
    op: SetterOp,
    value: i64,
) -> Result<(), DriverError> {
    match op {
        SetterOp::MotorSpeed => driver.set_motor_speed(value).await,
        SetterOp::FavoriteLevel => driver.set_favorite_level(value).await,
        SetterOp::FanLevel => driver.set_fan_level(value).await,
        SetterOp::Volume => driver.set_volume(value).await,
        SetterOp::OscillationAngle => driver.set_oscillation_angle(value).await,
        // Configured in minutes, the device takes seconds.
        SetterOp::DelayOffCountdown => driver.set_delay_off(value * 60).await,
        SetterOp::LedBrightness => driver.set_led_brightness(value).await,
        SetterOp::LedBrightnessLevel => driver.set_led_brightness_level(value).await,
        SetterOp::FavoriteRpm => driver.set_favorite_rpm(value).await,
    }
}

/// One controllable numeric attribute of a device.
pub struct NumberEntity {
    entity_id: String,
    name: String,
    descriptor: AttributeDescriptor,
    driver: Arc<dyn DeviceDriver>,
    state_rx: watch::Receiver<CoordinatorState<DeviceSnapshot>>,
    sink: Arc<dyn StateSink>,
    value: Arc<Mutex<Option<f64>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl NumberEntity {
    pub fn new(
        entity_id: String,
        name: String,
        descriptor: AttributeDescriptor,
        driver: Arc<dyn DeviceDriver>,
        state_rx: watch::Receiver<CoordinatorState<DeviceSnapshot>>,
        sink: Arc<dyn StateSink>,
    ) -> Self {
        // Seed from whatever the coordinator already holds.
        let value = state_rx
            .borrow()
            .data
            .as_ref()
            .and_then(|snapshot| snapshot.attribute(descriptor.key));
        Self {
            entity_id,
            name,
            descriptor,
            driver,
            state_rx,
            sink,
            value: Arc::new(Mutex::new(value)),
            task: Mutex::new(None),
        }
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptor(&self) -> &AttributeDescriptor {
        &self.descriptor
    }

    /// Last-known value; `None` while the entity is stale.
    pub fn value(&self) -> Option<f64> {
        *self.value.lock().expect("value lock poisoned")
    }

    /// Availability, evaluated fresh against the coordinator's current
    /// state: the last refresh must have produced data, and an attribute
    /// that is not controllable while powered off requires the device on.
    pub fn available(&self) -> bool {
        Self::compute_available(&self.state_rx.borrow(), &self.descriptor)
    }

    fn compute_available(
        state: &CoordinatorState<DeviceSnapshot>,
        descriptor: &AttributeDescriptor,
    ) -> bool {
        match &state.data {
            Some(snapshot) if state.last_refresh_ok() => {
                descriptor.available_when_off || snapshot.is_on
            }
            _ => false,
        }
    }

    /// Start observing coordinator ticks. Idempotent.
    pub fn start(&self) {
        let mut task = self.task.lock().expect("task slot poisoned");
        if task.is_some() {
            return;
        }

        let mut rx = self.state_rx.clone();
        let descriptor = self.descriptor.clone();
        let value = self.value.clone();
        let sink = self.sink.clone();
        let entity_id = self.entity_id.clone();

        *task = Some(tokio::spawn(async move {
            loop {
                let state = rx.borrow_and_update().clone();
                Self::apply_state(&state, &descriptor, &value, sink.as_ref(), &entity_id);
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

    fn apply_state(
        state: &CoordinatorState<DeviceSnapshot>,
        descriptor: &AttributeDescriptor,
        value: &Mutex<Option<f64>>,
        sink: &dyn StateSink,
        entity_id: &str,
    ) {
        // A successful tick overwrites the value; a failed one keeps it.
        if state.last_refresh_ok() {
            if let Some(snapshot) = &state.data {
                *value.lock().expect("value lock poisoned") =
                    snapshot.attribute(descriptor.key);
            }
        }
        let current = *value.lock().expect("value lock poisoned");
        sink.write_state(
            entity_id,
            StateValue::from(current),
            Self::compute_available(state, descriptor),
        );
    }

    /// Forward a user-initiated value change to the device driver.
    ///
    /// On driver failure the last-known value is kept and the error is
    /// returned to the caller; it is never propagated into the scheduler.
    pub async fn set_value(&self, value: f64) -> Result<(), DriverError> {
        if let Some(bounds) = &self.descriptor.bounds {
            if value < bounds.min || value > bounds.max {
                return Err(DriverError::InvalidValue {
                    attribute: self.descriptor.key.to_string(),
                    value,
                });
            }
        }

        match dispatch_setter(self.driver.as_ref(), self.descriptor.setter, value as i64).await {
            Ok(()) => {
                *self.value.lock().expect("value lock poisoned") = Some(value);
                self.sink
                    .write_state(&self.entity_id, StateValue::Float(value), self.available());
                Ok(())
            }
            Err(err) => {
                tracing::warn!(entity = %self.entity_id, error = %err, "set_value failed");
                Err(err)
            }
        }
    }
}

impl Drop for NumberEntity {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for NumberEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NumberEntity")
            .field("entity_id", &self.entity_id)
            .field("key", &self.descriptor.key)
            .field("value", &self.value())
            .finish()
    }
}
