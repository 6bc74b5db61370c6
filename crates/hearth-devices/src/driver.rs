//! Device driver boundary.
//!
//! The vendor protocol library sits behind [`DeviceDriver`]: one readable
//! status snapshot plus one setter per controllable attribute. The driver
//! handle is shared read-mostly across all entities of a physical device;
//! setter calls are independent requests with no cross-attribute atomicity.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use hearth_coordinator::SnapshotSource;

/// Errors raised by device driver operations.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// Communication error
    #[error("communication error: {0}")]
    Communication(String),

    /// Operation timed out
    #[error("operation timed out after {0}ms")]
    Timeout(u64),

    /// The device rejected the value
    #[error("invalid value for {attribute}: {value}")]
    InvalidValue { attribute: String, value: f64 },

    /// Operation not supported by this device
    #[error("unsupported operation: {0}")]
    Unsupported(String),
}

/// One observed state of a device at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    /// Whether the device is powered on
    pub is_on: bool,
    /// Reported numeric attributes, keyed by attribute key
    pub attributes: HashMap<String, f64>,
}

impl DeviceSnapshot {
    pub fn new(is_on: bool) -> Self {
        Self {
            is_on,
            attributes: HashMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: f64) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Value of one attribute, if the device reports it.
    pub fn attribute(&self, key: &str) -> Option<f64> {
        self.attributes.get(key).copied()
    }
}

/// Vendor device driver for one physical appliance.
///
/// Each setter issues one request to the device and resolves once the
/// device acknowledges. Setters are not serialized by this layer.
#[async_trait]
pub trait DeviceDriver: Send + Sync {
    /// Fetch the device's current state.
    async fn status(&self) -> Result<DeviceSnapshot, DriverError>;

    /// Set the target motor speed in rpm.
    async fn set_motor_speed(&self, rpm: i64) -> Result<(), DriverError>;

    /// Set the favorite level.
    async fn set_favorite_level(&self, level: i64) -> Result<(), DriverError>;

    /// Set the fan level.
    async fn set_fan_level(&self, level: i64) -> Result<(), DriverError>;

    /// Set the speaker volume.
    async fn set_volume(&self, volume: i64) -> Result<(), DriverError>;

    /// Set the oscillation angle in degrees.
    async fn set_oscillation_angle(&self, degrees: i64) -> Result<(), DriverError>;

    /// Schedule a delayed power-off, in seconds. Zero cancels.
    async fn set_delay_off(&self, seconds: i64) -> Result<(), DriverError>;

    /// Set the led brightness percentage.
    async fn set_led_brightness(&self, brightness: i64) -> Result<(), DriverError>;

    /// Set the discrete led brightness level.
    async fn set_led_brightness_level(&self, level: i64) -> Result<(), DriverError>;

    /// Set the favorite motor speed in rpm.
    async fn set_favorite_rpm(&self, rpm: i64) -> Result<(), DriverError>;
}

/// Adapts [`DeviceDriver::status`] to the coordinator's source contract.
pub struct StatusSource {
    driver: Arc<dyn DeviceDriver>,
}

impl StatusSource {
    pub fn new(driver: Arc<dyn DeviceDriver>) -> Self {
        Self { driver }
    }
}

#[async_trait]
impl SnapshotSource for StatusSource {
    type Snapshot = DeviceSnapshot;

    async fn poll(&self) -> anyhow::Result<Option<DeviceSnapshot>> {
        let snapshot = self.driver.status().await?;
        Ok(Some(snapshot))
    }
}

/// Mock driver for testing.
///
/// Serves a scripted snapshot, records every setter call, and can be
/// switched into a failing mode.
pub struct MockDriver {
    snapshot: Mutex<DeviceSnapshot>,
    calls: Mutex<Vec<(&'static str, i64)>>,
    failing: AtomicBool,
}

impl MockDriver {
    pub fn new(snapshot: DeviceSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
            calls: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    /// Replace the snapshot served by `status`.
    pub fn set_snapshot(&self, snapshot: DeviceSnapshot) {
        *self.snapshot.lock().unwrap() = snapshot;
    }

    /// Make every subsequent operation fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Recorded setter calls, in order.
    pub fn calls(&self) -> Vec<(&'static str, i64)> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, op: &'static str, value: i64) -> Result<(), DriverError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DriverError::Communication("mock failure".to_string()));
        }
        self.calls.lock().unwrap().push((op, value));
        Ok(())
    }
}

#[async_trait]
impl DeviceDriver for MockDriver {
    async fn status(&self) -> Result<DeviceSnapshot, DriverError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DriverError::Communication("mock failure".to_string()));
        }
        Ok(self.snapshot.lock().unwrap().clone())
    }

    async fn set_motor_speed(&self, rpm: i64) -> Result<(), DriverError> {
        self.record("set_motor_speed", rpm)
    }

    async fn set_favorite_level(&self, level: i64) -> Result<(), DriverError> {
        self.record("set_favorite_level", level)
    }

    async fn set_fan_level(&self, level: i64) -> Result<(), DriverError> {
        self.record("set_fan_level", level)
    }

    async fn set_volume(&self, volume: i64) -> Result<(), DriverError> {
        self.record("set_volume", volume)
    }

    async fn set_oscillation_angle(&self, degrees: i64) -> Result<(), DriverError> {
        self.record("set_oscillation_angle", degrees)
    }

    async fn set_delay_off(&self, seconds: i64) -> Result<(), DriverError> {
        self.record("set_delay_off", seconds)
    }

    async fn set_led_brightness(&self, brightness: i64) -> Result<(), DriverError> {
        self.record("set_led_brightness", brightness)
    }

    async fn set_led_brightness_level(&self, level: i64) -> Result<(), DriverError> {
        self.record("set_led_brightness_level", level)
    }

    async fn set_favorite_rpm(&self, rpm: i64) -> Result<(), DriverError> {
        self.record("set_favorite_rpm", rpm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_builder() {
        let snapshot = DeviceSnapshot::new(true)
            .with_attribute("angle", 60.0)
            .with_attribute("volume", 40.0);

        assert!(snapshot.is_on);
        assert_eq!(snapshot.attribute("angle"), Some(60.0));
        assert_eq!(snapshot.attribute("missing"), None);
    }

    #[tokio::test]
    async fn test_mock_driver_records_calls() {
        let driver = MockDriver::new(DeviceSnapshot::new(true));
        driver.set_fan_level(2).await.unwrap();
        driver.set_volume(55).await.unwrap();
        assert_eq!(driver.calls(), vec![("set_fan_level", 2), ("set_volume", 55)]);

        driver.set_failing(true);
        assert!(driver.set_volume(60).await.is_err());
        assert_eq!(driver.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_status_source_wraps_driver() {
        let driver = Arc::new(MockDriver::new(
            DeviceSnapshot::new(false).with_attribute("angle", 90.0),
        ));
        let source = StatusSource::new(driver.clone());

        let snapshot = source.poll().await.unwrap().unwrap();
        assert!(!snapshot.is_on);

        driver.set_failing(true);
        assert!(source.poll().await.is_err());
    }
}
