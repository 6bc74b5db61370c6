//! Capability registry: static tables mapping device models to the
//! controllable attributes they expose.
//!
//! Three tables, read-only after process start:
//!
//! 1. [`ATTRIBUTE_TYPES`] - feature bit to attribute descriptor, in fixed
//!    declaration order (entity ordering follows it)
//! 2. [`MODEL_FEATURES`] - exact model to feature mask, with the two
//!    protocol-family groups as fallback
//! 3. [`OSCILLATION_ANGLE_BOUNDS`] - per-model range overrides for the one
//!    attribute whose legal range varies by hardware

use bitflags::bitflags;

bitflags! {
    /// Controllable attributes a device model can expose, one bit each.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Features: u32 {
        const SET_MOTOR_SPEED = 1 << 0;
        const SET_FAVORITE_LEVEL = 1 << 1;
        const SET_FAN_LEVEL = 1 << 2;
        const SET_VOLUME = 1 << 3;
        const SET_BUZZER_VOLUME = 1 << 4;
        const SET_OSCILLATION_ANGLE = 1 << 5;
        const SET_DELAY_OFF_COUNTDOWN = 1 << 6;
        const SET_LED_BRIGHTNESS = 1 << 7;
        const SET_LED_BRIGHTNESS_LEVEL = 1 << 8;
        const SET_FAVORITE_RPM = 1 << 9;
    }
}

/// Setter operation an attribute dispatches to on the device driver.
///
/// A tagged variant instead of a method name: an unknown operation cannot
/// be registered, and dispatch is a single match at the call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetterOp {
    MotorSpeed,
    FavoriteLevel,
    FanLevel,
    Volume,
    OscillationAngle,
    DelayOffCountdown,
    LedBrightness,
    LedBrightnessLevel,
    FavoriteRpm,
}

/// Legal numeric range of an attribute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueBounds {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

/// Static metadata for one controllable attribute.
///
/// Never mutated after registration; the factory clones it per entity and
/// applies model overrides to the clone.
#[derive(Debug, Clone)]
pub struct AttributeDescriptor {
    /// Attribute key, also the field extracted from device snapshots
    pub key: &'static str,
    /// Display name
    pub name: &'static str,
    pub icon: &'static str,
    pub unit: Option<&'static str>,
    /// Legal range, when the attribute is numeric
    pub bounds: Option<ValueBounds>,
    /// Whether the attribute stays controllable while the device is off
    pub available_when_off: bool,
    /// Driver operation invoked on user-initiated set
    pub setter: SetterOp,
}

pub const ATTR_MOTOR_SPEED: &str = "motor_speed";
pub const ATTR_FAVORITE_LEVEL: &str = "favorite_level";
pub const ATTR_FAN_LEVEL: &str = "fan_level";
pub const ATTR_VOLUME: &str = "volume";
pub const ATTR_BUZZER_VOLUME: &str = "buzzer_volume";
pub const ATTR_OSCILLATION_ANGLE: &str = "angle";
pub const ATTR_DELAY_OFF_COUNTDOWN: &str = "delay_off_countdown";
pub const ATTR_LED_BRIGHTNESS: &str = "led_brightness";
pub const ATTR_LED_BRIGHTNESS_LEVEL: &str = "led_brightness_level";
pub const ATTR_FAVORITE_RPM: &str = "favorite_rpm";

/// The universe of controllable attributes across all supported models.
/// Declaration order is the entity build order.
pub static ATTRIBUTE_TYPES: &[(Features, AttributeDescriptor)] = &[
    (
        Features::SET_MOTOR_SPEED,
        AttributeDescriptor {
            key: ATTR_MOTOR_SPEED,
            name: "Motor Speed",
            icon: "mdi:fast-forward-outline",
            unit: Some("rpm"),
            bounds: Some(ValueBounds {
                min: 200.0,
                max: 2000.0,
                step: 10.0,
            }),
            available_when_off: false,
            setter: SetterOp::MotorSpeed,
        },
    ),
    (
        Features::SET_FAVORITE_LEVEL,
        AttributeDescriptor {
            key: ATTR_FAVORITE_LEVEL,
            name: "Favorite Level",
            icon: "mdi:star-cog",
            unit: None,
            bounds: Some(ValueBounds {
                min: 0.0,
                max: 17.0,
                step: 1.0,
            }),
            available_when_off: true,
            setter: SetterOp::FavoriteLevel,
        },
    ),
    (
        Features::SET_FAN_LEVEL,
        AttributeDescriptor {
            key: ATTR_FAN_LEVEL,
            name: "Fan Level",
            icon: "mdi:fan",
            unit: None,
            bounds: Some(ValueBounds {
                min: 1.0,
                max: 3.0,
                step: 1.0,
            }),
            available_when_off: true,
            setter: SetterOp::FanLevel,
        },
    ),
    (
        Features::SET_VOLUME,
        AttributeDescriptor {
            key: ATTR_VOLUME,
            name: "Volume",
            icon: "mdi:volume-high",
            unit: None,
            bounds: Some(ValueBounds {
                min: 0.0,
                max: 100.0,
                step: 1.0,
            }),
            available_when_off: true,
            setter: SetterOp::Volume,
        },
    ),
    // Same control surface as volume, different attribute key.
    (
        Features::SET_BUZZER_VOLUME,
        AttributeDescriptor {
            key: ATTR_BUZZER_VOLUME,
            name: "Buzzer Volume",
            icon: "mdi:volume-high",
            unit: None,
            bounds: Some(ValueBounds {
                min: 0.0,
                max: 100.0,
                step: 1.0,
            }),
            available_when_off: true,
            setter: SetterOp::Volume,
        },
    ),
    (
        Features::SET_OSCILLATION_ANGLE,
        AttributeDescriptor {
            key: ATTR_OSCILLATION_ANGLE,
            name: "Oscillation Angle",
            icon: "mdi:angle-acute",
            unit: Some("°"),
            bounds: Some(ValueBounds {
                min: 1.0,
                max: 120.0,
                step: 1.0,
            }),
            available_when_off: true,
            setter: SetterOp::OscillationAngle,
        },
    ),
    (
        Features::SET_DELAY_OFF_COUNTDOWN,
        AttributeDescriptor {
            key: ATTR_DELAY_OFF_COUNTDOWN,
            name: "Delay Off Countdown",
            icon: "mdi:fan-off",
            unit: Some("min"),
            bounds: Some(ValueBounds {
                min: 0.0,
                max: 480.0,
                step: 1.0,
            }),
            available_when_off: true,
            setter: SetterOp::DelayOffCountdown,
        },
    ),
    (
        Features::SET_LED_BRIGHTNESS,
        AttributeDescriptor {
            key: ATTR_LED_BRIGHTNESS,
            name: "Led Brightness",
            icon: "mdi:brightness-6",
            unit: None,
            bounds: Some(ValueBounds {
                min: 0.0,
                max: 100.0,
                step: 1.0,
            }),
            available_when_off: true,
            setter: SetterOp::LedBrightness,
        },
    ),
    (
        Features::SET_LED_BRIGHTNESS_LEVEL,
        AttributeDescriptor {
            key: ATTR_LED_BRIGHTNESS_LEVEL,
            name: "Led Brightness",
            icon: "mdi:brightness-6",
            unit: None,
            bounds: Some(ValueBounds {
                min: 0.0,
                max: 8.0,
                step: 1.0,
            }),
            available_when_off: true,
            setter: SetterOp::LedBrightnessLevel,
        },
    ),
    (
        Features::SET_FAVORITE_RPM,
        AttributeDescriptor {
            key: ATTR_FAVORITE_RPM,
            name: "Favorite Motor Speed",
            icon: "mdi:star-cog",
            unit: Some("rpm"),
            bounds: Some(ValueBounds {
                min: 300.0,
                max: 2200.0,
                step: 10.0,
            }),
            available_when_off: true,
            setter: SetterOp::FavoriteRpm,
        },
    ),
];

pub const FEATURES_FAN: Features = Features::SET_OSCILLATION_ANGLE
    .union(Features::SET_DELAY_OFF_COUNTDOWN);
pub const FEATURES_FAN_1C: Features = Features::SET_DELAY_OFF_COUNTDOWN;
pub const FEATURES_FAN_P5: Features = FEATURES_FAN;
pub const FEATURES_FAN_P9: Features = FEATURES_FAN;
pub const FEATURES_FAN_P10_P11: Features = FEATURES_FAN;
pub const FEATURES_FAN_ZA5: Features = FEATURES_FAN
    .union(Features::SET_LED_BRIGHTNESS)
    .union(Features::SET_BUZZER_VOLUME);
pub const FEATURES_AIRFRESH: Features = Features::SET_VOLUME
    .union(Features::SET_LED_BRIGHTNESS);
pub const FEATURES_HUMIDIFIER_CA_CB: Features = Features::SET_LED_BRIGHTNESS;
pub const FEATURES_HUMIDIFIER_CA4: Features = Features::SET_MOTOR_SPEED
    .union(Features::SET_LED_BRIGHTNESS);
pub const FEATURES_PURIFIER_2S: Features = Features::SET_FAVORITE_LEVEL
    .union(Features::SET_LED_BRIGHTNESS);
pub const FEATURES_PURIFIER_3C: Features = Features::SET_FAVORITE_RPM
    .union(Features::SET_LED_BRIGHTNESS_LEVEL);
pub const FEATURES_PURIFIER_PRO: Features = Features::SET_FAVORITE_LEVEL
    .union(Features::SET_VOLUME);
pub const FEATURES_PURIFIER_V1: Features = Features::SET_FAVORITE_LEVEL
    .union(Features::SET_VOLUME)
    .union(Features::SET_LED_BRIGHTNESS);
pub const FEATURES_PURIFIER_V3: Features = Features::SET_FAVORITE_LEVEL
    .union(Features::SET_VOLUME);

/// Fallback mask for first-generation purifier protocol models.
pub const FEATURES_PURIFIER_GEN1: Features = Features::SET_FAVORITE_LEVEL
    .union(Features::SET_LED_BRIGHTNESS);
/// Fallback mask for second-generation purifier protocol models.
pub const FEATURES_PURIFIER_GEN2: Features = Features::SET_FAVORITE_LEVEL
    .union(Features::SET_FAN_LEVEL)
    .union(Features::SET_FAVORITE_RPM)
    .union(Features::SET_LED_BRIGHTNESS_LEVEL);

/// Exact model table. Checked before the protocol-family groups.
pub static MODEL_FEATURES: &[(&str, Features)] = &[
    ("airfresh-va2", FEATURES_AIRFRESH),
    ("humidifier-ca1", FEATURES_HUMIDIFIER_CA_CB),
    ("humidifier-ca4", FEATURES_HUMIDIFIER_CA4),
    ("humidifier-cb1", FEATURES_HUMIDIFIER_CA_CB),
    ("purifier-2s", FEATURES_PURIFIER_2S),
    ("purifier-3c", FEATURES_PURIFIER_3C),
    ("purifier-pro", FEATURES_PURIFIER_PRO),
    ("purifier-pro-v7", FEATURES_PURIFIER_PRO),
    ("purifier-v1", FEATURES_PURIFIER_V1),
    ("purifier-v3", FEATURES_PURIFIER_V3),
    ("fan-1c", FEATURES_FAN_1C),
    ("fan-p5", FEATURES_FAN_P5),
    ("fan-p9", FEATURES_FAN_P9),
    ("fan-p10", FEATURES_FAN_P10_P11),
    ("fan-p11", FEATURES_FAN_P10_P11),
    ("fan-sa1", FEATURES_FAN),
    ("fan-v2", FEATURES_FAN),
    ("fan-v3", FEATURES_FAN),
    ("fan-za1", FEATURES_FAN),
    ("fan-za3", FEATURES_FAN),
    ("fan-za4", FEATURES_FAN),
    ("fan-za5", FEATURES_FAN_ZA5),
];

/// First-generation purifier protocol family.
pub static MODELS_PURIFIER_GEN1: &[&str] =
    &["purifier-v2", "purifier-v5", "purifier-m1", "purifier-m2"];

/// Second-generation purifier protocol family.
pub static MODELS_PURIFIER_GEN2: &[&str] =
    &["purifier-3h", "purifier-4", "purifier-4-pro", "purifier-mb4"];

/// Per-model oscillation angle ranges. Fans support different discrete
/// angle sets depending on the motor fitted.
pub static OSCILLATION_ANGLE_BOUNDS: &[(&str, ValueBounds)] = &[
    (
        "fan-p5",
        ValueBounds {
            min: 30.0,
            max: 140.0,
            step: 30.0,
        },
    ),
    (
        "fan-za5",
        ValueBounds {
            min: 30.0,
            max: 120.0,
            step: 30.0,
        },
    ),
    (
        "fan-p9",
        ValueBounds {
            min: 30.0,
            max: 150.0,
            step: 30.0,
        },
    ),
    (
        "fan-p10",
        ValueBounds {
            min: 30.0,
            max: 140.0,
            step: 30.0,
        },
    ),
    (
        "fan-p11",
        ValueBounds {
            min: 30.0,
            max: 140.0,
            step: 30.0,
        },
    ),
];

/// Resolve the feature mask for a model.
///
/// Order: exact table, then the gen1 family, then gen2. A model in none of
/// them is unsupported and produces no entities.
pub fn features_for_model(model: &str) -> Option<Features> {
    if let Some((_, features)) = MODEL_FEATURES.iter().find(|(m, _)| *m == model) {
        return Some(*features);
    }
    if MODELS_PURIFIER_GEN1.contains(&model) {
        return Some(FEATURES_PURIFIER_GEN1);
    }
    if MODELS_PURIFIER_GEN2.contains(&model) {
        return Some(FEATURES_PURIFIER_GEN2);
    }
    None
}

/// Model-specific range override for an attribute, if one is registered.
pub fn bounds_override(model: &str, attribute_key: &str) -> Option<ValueBounds> {
    if attribute_key != ATTR_OSCILLATION_ANGLE {
        return None;
    }
    OSCILLATION_ANGLE_BOUNDS
        .iter()
        .find(|(m, _)| *m == model)
        .map(|(_, bounds)| *bounds)
}
