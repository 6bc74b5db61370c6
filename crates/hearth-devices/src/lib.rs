//! Hearth Devices - Capability-Driven Entity Layer
//!
//! This crate turns a device model identifier into a set of live,
//! controllable entities:
//!
//! - **Features**: bitmask of controllable attributes a model supports
//! - **CapabilityRegistry tables**: feature bit -> attribute descriptor,
//!   model -> feature mask (with protocol-family fallbacks), and per-model
//!   numeric-range overrides
//! - **EntityFactory**: resolves a model's mask and instantiates one
//!   [`NumberEntity`] per matching feature
//! - **NumberEntity**: pairs a descriptor with the shared device driver and
//!   a status-coordinator observer
//!
//! The device protocol itself is behind the [`DeviceDriver`] trait; this
//! crate never talks to hardware directly.

pub mod driver;
pub mod entity;
pub mod factory;
pub mod features;
pub mod integration;

pub use driver::{DeviceDriver, DeviceSnapshot, DriverError, MockDriver, StatusSource};
pub use entity::NumberEntity;
pub use factory::build_number_entities;
pub use features::{
    bounds_override, features_for_model, AttributeDescriptor, Features, SetterOp, ValueBounds,
    ATTRIBUTE_TYPES,
};
pub use integration::{DeviceConfig, DeviceIntegration};
