//! Tests for the capability-driven entity factory

use std::sync::Arc;

use tokio::sync::watch;

use hearth_coordinator::CoordinatorState;
use hearth_core::RecordingSink;
use hearth_devices::features::{
    FEATURES_FAN_ZA5, FEATURES_PURIFIER_GEN2,
};
use hearth_devices::{
    build_number_entities, features_for_model, DeviceSnapshot, Features, MockDriver, NumberEntity,
};

fn build(model: &str, features: Features) -> Vec<NumberEntity> {
    let (_tx, rx) = watch::channel(CoordinatorState::<DeviceSnapshot>::default());
    build_number_entities(
        model,
        features,
        "dev1",
        "Bedroom Fan",
        Arc::new(MockDriver::new(DeviceSnapshot::new(true))),
        rx,
        Arc::new(RecordingSink::new()),
    )
}

fn keys(entities: &[NumberEntity]) -> Vec<&'static str> {
    entities.iter().map(|e| e.descriptor().key).collect()
}

#[tokio::test]
async fn test_build_matches_mask_in_declaration_order() {
    let entities = build("fan-za5", FEATURES_FAN_ZA5);
    assert_eq!(
        keys(&entities),
        vec!["buzzer_volume", "angle", "delay_off_countdown", "led_brightness"]
    );
}

#[tokio::test]
async fn test_build_group_fallback_mask() {
    // purifier-4 is only listed in the gen2 protocol family.
    let features = features_for_model("purifier-4").unwrap();
    assert_eq!(features, FEATURES_PURIFIER_GEN2);

    let entities = build("purifier-4", features);
    assert_eq!(
        keys(&entities),
        vec!["favorite_level", "fan_level", "led_brightness_level", "favorite_rpm"]
    );
}

#[tokio::test]
async fn test_unknown_model_produces_nothing() {
    assert!(features_for_model("toaster-9000").is_none());
}

#[tokio::test]
async fn test_unregistered_feature_bit_is_skipped() {
    let features = Features::SET_FAN_LEVEL | Features::from_bits_retain(1 << 30);
    let entities = build("fan-p9", features);
    assert_eq!(keys(&entities), vec!["fan_level"]);
}

#[tokio::test]
async fn test_entity_ids_are_key_plus_device_uid() {
    let entities = build("fan-p9", features_for_model("fan-p9").unwrap());
    let ids: Vec<_> = entities.iter().map(NumberEntity::entity_id).collect();
    assert_eq!(ids, vec!["angle_dev1", "delay_off_countdown_dev1"]);
    assert_eq!(entities[0].name(), "Bedroom Fan Oscillation Angle");
}

#[tokio::test]
async fn test_model_override_replaces_angle_bounds() {
    let entities = build("fan-p9", features_for_model("fan-p9").unwrap());
    let angle = entities
        .iter()
        .find(|e| e.descriptor().key == "angle")
        .unwrap();

    let bounds = angle.descriptor().bounds.unwrap();
    assert_eq!(bounds.min, 30.0);
    assert_eq!(bounds.max, 150.0);
    assert_eq!(bounds.step, 30.0);

    // Other attributes of the same model keep registry defaults.
    let delay = entities
        .iter()
        .find(|e| e.descriptor().key == "delay_off_countdown")
        .unwrap();
    assert_eq!(delay.descriptor().bounds.unwrap().max, 480.0);
}

#[tokio::test]
async fn test_models_without_override_keep_default_bounds() {
    let entities = build("fan-v2", features_for_model("fan-v2").unwrap());
    let angle = entities
        .iter()
        .find(|e| e.descriptor().key == "angle")
        .unwrap();

    let bounds = angle.descriptor().bounds.unwrap();
    assert_eq!(bounds.min, 1.0);
    assert_eq!(bounds.max, 120.0);
    assert_eq!(bounds.step, 1.0);
}
