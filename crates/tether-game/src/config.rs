//! Movement tuning
//!
//! Every constant the controllers use lives here, grouped by mechanic and
//! loadable from TOML. Options can also be edited one at a time by name,
//! which is how tools and console commands tweak a running controller.

use serde::{Deserialize, Serialize};
use tether_physics::LayerMask;

use crate::error::ConfigError;

/// Walking, running, jumping and looking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocomotionConfig {
    /// Walking speed in meters per second
    pub walk_speed: f32,
    /// Running speed (run modifier + forward)
    pub run_speed: f32,
    /// Speed multiplier while crouched
    pub crouch_speed_factor: f32,
    /// Base speed while a traversal mechanic is active
    pub traversal_speed: f32,
    /// Jump apex above the take-off point
    pub jump_height: f32,
    /// Gravity magnitude used for character integration
    pub gravity: f32,
    /// Seconds of lost contact still treated as grounded
    pub grounded_grace: f32,
    /// Fraction of carried horizontal velocity left after one second on the ground
    pub ground_friction: f32,
    /// Carried horizontal speed below which it snaps to zero
    pub friction_cutoff_speed: f32,
    /// Carried speed (as a fraction of move speed) above which input halves it
    pub carried_speed_threshold: f32,
    /// Multiplier applied to carried velocity past the threshold
    pub carried_speed_damping: f32,
    /// Input scale while airborne
    pub air_control: f32,
    /// Horizontal velocity kept per tick while airborne
    pub air_drag: f32,
    /// Vertical velocity held while standing so the controller keeps contact
    pub grounded_stick_velocity: f32,
    /// Highest pitch in degrees
    pub max_look_up: f32,
    /// Lowest pitch in degrees
    pub max_look_down: f32,
    /// Degrees of rotation per unit of look delta
    pub look_sensitivity: f32,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            walk_speed: 6.0,
            run_speed: 14.0,
            crouch_speed_factor: 0.5,
            traversal_speed: 8.0,
            jump_height: 2.0,
            gravity: 9.81,
            grounded_grace: 0.2,
            ground_friction: 0.3,
            friction_cutoff_speed: 0.5,
            carried_speed_threshold: 0.5,
            carried_speed_damping: 0.5,
            air_control: 0.5,
            air_drag: 0.99,
            grounded_stick_velocity: -2.0,
            max_look_up: 90.0,
            max_look_down: -90.0,
            look_sensitivity: 0.1,
        }
    }
}

/// Crouch height and stand-up clearance check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrouchConfig {
    pub standing_height: f32,
    pub crouch_height: f32,
    /// Time constant of the height smoothing
    pub smooth_time: f32,
    /// Height above the feet of the clearance check
    pub stand_marker_height: f32,
    pub stand_check_radius: f32,
    /// Obstacles whose bottom is below the check height + clearance block standing
    pub stand_clearance: f32,
    /// Minimum seconds between clearance checks
    pub stand_check_cooldown: f32,
    /// Layers that can block standing up
    pub obstacle_layers: LayerMask,
}

impl Default for CrouchConfig {
    fn default() -> Self {
        Self {
            standing_height: 1.8,
            crouch_height: 1.2,
            smooth_time: 0.2,
            stand_marker_height: 1.9,
            stand_check_radius: 0.2,
            stand_clearance: 0.01,
            stand_check_cooldown: 0.1,
            obstacle_layers: LayerMask::ALL,
        }
    }
}

/// Grapple-jump tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrappleConfig {
    /// Range of the target ray
    pub max_grapple_distance: f32,
    /// Wind-up between acquiring a target and launching
    pub grapple_delay: f32,
    /// How far the arc peaks above the higher endpoint
    pub overshoot_y_axis: f32,
    /// Cooldown after a grapple ends
    pub grapple_cooldown: f32,
    /// Fraction of the cooldown applied after a miss
    pub failed_cooldown_factor: f32,
    /// Launch velocity multiplier
    pub speed_multiplier: f32,
    /// Steering scale during flight
    pub air_control: f32,
    /// Delay before the launch velocity takes over
    pub velocity_handoff_delay: f32,
    /// Flight is cut off after this long
    pub flight_timeout: f32,
    /// Layers the grapple can hook onto
    pub grappleable: LayerMask,
}

impl Default for GrappleConfig {
    fn default() -> Self {
        Self {
            max_grapple_distance: 50.0,
            grapple_delay: 0.15,
            overshoot_y_axis: 3.0,
            grapple_cooldown: 1.0,
            failed_cooldown_factor: 0.5,
            speed_multiplier: 1.5,
            air_control: 0.3,
            velocity_handoff_delay: 0.02,
            flight_timeout: 3.0,
            grappleable: LayerMask::GRAPPLEABLE,
        }
    }
}

/// Rope swing tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwingConfig {
    /// Range of the prediction queries
    pub max_swing_distance: f32,
    /// Radius of the forgiving sphere cast
    pub prediction_radius: f32,
    /// Strafe and forward thrust
    pub horizontal_thrust: f32,
    /// Thrust toward the anchor while pulling
    pub forward_thrust: f32,
    /// Cable let out per tick while holding back
    pub extend_cable_speed: f32,
    /// No thrust is added at or above this speed
    pub max_swing_speed: f32,
    /// Cable max length as a fraction of the current distance
    pub max_ratio: f32,
    /// Cable min length as a fraction of the current distance
    pub min_ratio: f32,
    /// Smallest max length while reeling in
    pub pull_max_floor: f32,
    /// Smallest min length while reeling in
    pub pull_min_floor: f32,
    /// Scale of the rope-frame steering assist
    pub assist_factor: f32,
    pub spring: f32,
    pub damper: f32,
    /// Linear damping of the body while swinging
    pub linear_damping: f32,
    /// Horizontal velocity kept on release
    pub release_horizontal_retain: f32,
    /// Vertical velocity kept on release
    pub release_vertical_retain: f32,
    /// Layers a swing cable can attach to
    pub grappleable: LayerMask,
}

impl Default for SwingConfig {
    fn default() -> Self {
        Self {
            max_swing_distance: 25.0,
            prediction_radius: 2.0,
            horizontal_thrust: 12.0,
            forward_thrust: 18.0,
            extend_cable_speed: 0.5,
            max_swing_speed: 25.0,
            max_ratio: 0.8,
            min_ratio: 0.25,
            pull_max_floor: 2.0,
            pull_min_floor: 0.5,
            assist_factor: 0.5,
            spring: 10.0,
            damper: 3.0,
            linear_damping: 0.1,
            release_horizontal_retain: 0.6,
            release_vertical_retain: 0.8,
            grappleable: LayerMask::GRAPPLEABLE,
        }
    }
}

/// Complete controller configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub locomotion: LocomotionConfig,
    pub crouch: CrouchConfig,
    pub grapple: GrappleConfig,
    pub swing: SwingConfig,
}

const TABLES: [&str; 4] = ["locomotion", "crouch", "grapple", "swing"];

impl ControllerConfig {
    /// Parse and validate a TOML document; missing fields keep their defaults
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: ControllerConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Set one numeric option by name.
    ///
    /// `name` is `table.field`, a field name that appears in only one
    /// table, or its camelCase spelling (`maxGrappleDistance`). The config
    /// is left untouched if the new value fails validation.
    pub fn set_option(&mut self, name: &str, value: f32) -> Result<(), ConfigError> {
        let name = to_snake_case(name);
        let (table_name, field) = match name.split_once('.') {
            Some((table, field)) => (table.to_string(), field.to_string()),
            None => (self.table_of(&name)?.to_string(), name.clone()),
        };

        let mut root = toml::Value::try_from(&*self)?;
        let slot = root
            .get_mut(&table_name)
            .and_then(|table| table.get_mut(&field))
            .ok_or_else(|| ConfigError::UnknownOption(name.clone()))?;

        *slot = match slot {
            toml::Value::Float(_) => toml::Value::Float(f64::from(value)),
            toml::Value::Integer(_) => toml::Value::Integer(value as i64),
            toml::Value::Boolean(_) => toml::Value::Boolean(value != 0.0),
            _ => return Err(ConfigError::UnknownOption(name)),
        };

        let updated: ControllerConfig = root.try_into()?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Read one numeric option by name (same naming rules as [`set_option`](Self::set_option))
    pub fn option(&self, name: &str) -> Result<f32, ConfigError> {
        let name = to_snake_case(name);
        let (table_name, field) = match name.split_once('.') {
            Some((table, field)) => (table.to_string(), field.to_string()),
            None => (self.table_of(&name)?.to_string(), name.clone()),
        };

        let root = toml::Value::try_from(self)?;
        match root.get(&table_name).and_then(|table| table.get(&field)) {
            Some(toml::Value::Float(v)) => Ok(*v as f32),
            Some(toml::Value::Integer(v)) => Ok(*v as f32),
            _ => Err(ConfigError::UnknownOption(name)),
        }
    }

    /// Reject values the controllers cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let loco = &self.locomotion;
        positive("locomotion.gravity", loco.gravity)?;
        positive("locomotion.walk_speed", loco.walk_speed)?;
        positive("locomotion.run_speed", loco.run_speed)?;
        non_negative("locomotion.grounded_grace", loco.grounded_grace)?;
        unit_interval("locomotion.ground_friction", loco.ground_friction)?;
        unit_interval("locomotion.air_drag", loco.air_drag)?;
        if loco.max_look_down > loco.max_look_up {
            return Err(invalid("locomotion.max_look_down", "must not exceed max_look_up"));
        }

        let crouch = &self.crouch;
        positive("crouch.crouch_height", crouch.crouch_height)?;
        positive("crouch.smooth_time", crouch.smooth_time)?;
        non_negative("crouch.stand_check_cooldown", crouch.stand_check_cooldown)?;
        if crouch.crouch_height > crouch.standing_height {
            return Err(invalid("crouch.crouch_height", "must not exceed standing_height"));
        }

        let grapple = &self.grapple;
        positive("grapple.max_grapple_distance", grapple.max_grapple_distance)?;
        positive("grapple.overshoot_y_axis", grapple.overshoot_y_axis)?;
        positive("grapple.flight_timeout", grapple.flight_timeout)?;
        non_negative("grapple.grapple_delay", grapple.grapple_delay)?;
        non_negative("grapple.grapple_cooldown", grapple.grapple_cooldown)?;
        non_negative("grapple.velocity_handoff_delay", grapple.velocity_handoff_delay)?;
        unit_interval("grapple.failed_cooldown_factor", grapple.failed_cooldown_factor)?;

        let swing = &self.swing;
        positive("swing.max_swing_distance", swing.max_swing_distance)?;
        non_negative("swing.prediction_radius", swing.prediction_radius)?;
        positive("swing.max_swing_speed", swing.max_swing_speed)?;
        // A zero bound would collapse the cable onto the anchor
        ratio("swing.max_ratio", swing.max_ratio)?;
        ratio("swing.min_ratio", swing.min_ratio)?;
        if swing.min_ratio > swing.max_ratio {
            return Err(invalid("swing.min_ratio", "must not exceed max_ratio"));
        }
        positive("swing.pull_max_floor", swing.pull_max_floor)?;
        positive("swing.pull_min_floor", swing.pull_min_floor)?;
        if swing.pull_min_floor > swing.pull_max_floor {
            return Err(invalid("swing.pull_min_floor", "must not exceed pull_max_floor"));
        }
        unit_interval("swing.release_horizontal_retain", swing.release_horizontal_retain)?;
        unit_interval("swing.release_vertical_retain", swing.release_vertical_retain)?;

        Ok(())
    }

    fn table_of(&self, field: &str) -> Result<&'static str, ConfigError> {
        let root = toml::Value::try_from(self)?;
        let mut found = TABLES
            .iter()
            .copied()
            .filter(|table| root.get(table).and_then(|t| t.get(field)).is_some());

        match (found.next(), found.next()) {
            (Some(table), None) => Ok(table),
            (Some(_), Some(_)) => Err(ConfigError::AmbiguousOption(field.to_string())),
            _ => Err(ConfigError::UnknownOption(field.to_string())),
        }
    }
}

fn invalid(option: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        option,
        reason: reason.to_string(),
    }
}

fn positive(option: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            option,
            reason: format!("{value} is not positive"),
        })
    }
}

fn non_negative(option: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            option,
            reason: format!("{value} is negative"),
        })
    }
}

fn unit_interval(option: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            option,
            reason: format!("{value} is outside [0, 1]"),
        })
    }
}

fn ratio(option: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            option,
            reason: format!("{value} is outside (0, 1]"),
        })
    }
}

/// `maxGrappleDistance` -> `max_grapple_distance`; snake_case passes through
fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 && !out.ends_with(['.', '_']) {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ControllerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.grapple.max_grapple_distance, 50.0);
        assert_eq!(config.swing.max_swing_speed, 25.0);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ControllerConfig::from_toml_str(
            r#"
            [grapple]
            grapple_cooldown = 2.5

            [swing]
            spring = 4.0
            "#,
        )
        .unwrap();

        assert_eq!(config.grapple.grapple_cooldown, 2.5);
        assert_eq!(config.swing.spring, 4.0);
        assert_eq!(config.grapple.overshoot_y_axis, 3.0);
        assert_eq!(config.locomotion, LocomotionConfig::default());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = ControllerConfig::default();
        config.locomotion.run_speed = 20.0;
        let text = config.to_toml_string().unwrap();
        assert_eq!(ControllerConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_invalid_gravity_rejected() {
        let err = ControllerConfig::from_toml_str("[locomotion]\ngravity = 0.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { option: "locomotion.gravity", .. }));
    }

    #[test]
    fn test_zero_length_cable_rejected() {
        let mut config = ControllerConfig::default();
        config.swing.max_ratio = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { option: "swing.max_ratio", .. })
        ));

        let mut config = ControllerConfig::default();
        assert!(matches!(
            config.set_option("swing.min_ratio", 0.0),
            Err(ConfigError::Invalid { option: "swing.min_ratio", .. })
        ));
        assert!(matches!(
            config.set_option("pull_min_floor", 0.0),
            Err(ConfigError::Invalid { option: "swing.pull_min_floor", .. })
        ));
        assert!(matches!(
            config.set_option("pull_min_floor", 3.0),
            Err(ConfigError::Invalid { option: "swing.pull_min_floor", .. })
        ));
        assert!(matches!(
            config.set_option("min_ratio", 0.9),
            Err(ConfigError::Invalid { option: "swing.min_ratio", .. })
        ));
        assert_eq!(config, ControllerConfig::default());
    }

    #[test]
    fn test_set_option_names() {
        let mut config = ControllerConfig::default();

        config.set_option("maxGrappleDistance", 80.0).unwrap();
        config.set_option("grappleCooldown", 0.25).unwrap();
        config.set_option("maxSwingSpeed", 30.0).unwrap();
        config.set_option("overshootYAxis", 5.0).unwrap();
        config.set_option("locomotion.walk_speed", 4.0).unwrap();
        config.set_option("jump_height", 3.0).unwrap();

        assert_eq!(config.grapple.max_grapple_distance, 80.0);
        assert_eq!(config.grapple.grapple_cooldown, 0.25);
        assert_eq!(config.swing.max_swing_speed, 30.0);
        assert_eq!(config.grapple.overshoot_y_axis, 5.0);
        assert_eq!(config.locomotion.walk_speed, 4.0);
        assert_eq!(config.option("locomotion.jumpHeight").unwrap(), 3.0);
    }

    #[test]
    fn test_set_option_errors_leave_config_untouched() {
        let mut config = ControllerConfig::default();

        assert!(matches!(
            config.set_option("warpSpeed", 1.0),
            Err(ConfigError::UnknownOption(_))
        ));
        assert!(matches!(
            config.set_option("air_control", 1.0),
            Err(ConfigError::AmbiguousOption(_))
        ));
        assert!(matches!(
            config.set_option("overshootYAxis", -1.0),
            Err(ConfigError::Invalid { .. })
        ));
        assert_eq!(config, ControllerConfig::default());

        config.set_option("grapple.air_control", 0.6).unwrap();
        assert_eq!(config.grapple.air_control, 0.6);
        assert_eq!(config.locomotion.air_control, 0.5);
    }
}
