//! Parameter loading for the square test
//!
//! Parameters are read from a TOML file. Every field is optional; a missing
//! field falls back to the values the robot was originally tuned with.

use crate::common::RangeUnit;
use crate::error::{CoreError, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Top level parameters
#[derive(Clone, Debug, Deserialize)]
pub struct SquareConfig {
    /// Control loop rate in Hz (default: 10)
    #[serde(default = "default_loop_rate")]
    pub loop_rate_hz: f64,

    #[serde(default)]
    pub motion: MotionParams,

    #[serde(default)]
    pub proximity: ProximityConfig,

    #[serde(default)]
    pub topics: TopicConfig,
}

/// Kinematic parameters of the square
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct MotionParams {
    /// Forward speed in m/s (default: 0.05)
    #[serde(default = "default_linear_speed")]
    pub linear_speed: f64,

    /// Turning speed in rad/s (default: pi / 4)
    #[serde(default = "default_angular_speed")]
    pub angular_speed: f64,

    /// Side length of the square in m (default: 0.5)
    #[serde(default = "default_side_length")]
    pub side_length: f64,

    /// Angle turned at each corner in rad (default: pi / 2)
    #[serde(default = "default_turn_angle")]
    pub turn_angle: f64,

    /// Stop time after each side and each turn in s (default: 1.0)
    #[serde(default = "default_pause_secs")]
    pub pause_secs: f64,
}

/// Proximity warning settings
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ProximityConfig {
    /// Readings strictly below this value raise a warning (default: 150)
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Unit of both the readings and the threshold (default: millimeters)
    #[serde(default)]
    pub unit: RangeUnit,
}

/// ROS topic names
#[derive(Clone, Debug, Deserialize)]
pub struct TopicConfig {
    #[serde(default = "default_cmd_vel_topic")]
    pub cmd_vel: String,
    #[serde(default = "default_state_topic")]
    pub state: String,
    #[serde(default = "default_front_topic")]
    pub front: String,
    #[serde(default = "default_left_topic")]
    pub left: String,
    #[serde(default = "default_right_topic")]
    pub right: String,
}

// Default value functions
fn default_loop_rate() -> f64 {
    10.0
}
fn default_linear_speed() -> f64 {
    0.05
}
fn default_angular_speed() -> f64 {
    std::f64::consts::FRAC_PI_4
}
fn default_side_length() -> f64 {
    0.5
}
fn default_turn_angle() -> f64 {
    std::f64::consts::FRAC_PI_2
}
fn default_pause_secs() -> f64 {
    1.0
}
fn default_threshold() -> f64 {
    150.0
}
fn default_cmd_vel_topic() -> String {
    "/cmd_vel".to_string()
}
fn default_state_topic() -> String {
    "/square_test/state".to_string()
}
fn default_front_topic() -> String {
    "/ir_front_sensor".to_string()
}
fn default_left_topic() -> String {
    "/ir_left_sensor".to_string()
}
fn default_right_topic() -> String {
    "/ir_right_sensor".to_string()
}

impl Default for SquareConfig {
    fn default() -> Self {
        SquareConfig {
            loop_rate_hz: default_loop_rate(),
            motion: MotionParams::default(),
            proximity: ProximityConfig::default(),
            topics: TopicConfig::default(),
        }
    }
}

impl Default for MotionParams {
    fn default() -> Self {
        MotionParams {
            linear_speed: default_linear_speed(),
            angular_speed: default_angular_speed(),
            side_length: default_side_length(),
            turn_angle: default_turn_angle(),
            pause_secs: default_pause_secs(),
        }
    }
}

impl Default for ProximityConfig {
    fn default() -> Self {
        ProximityConfig {
            threshold: default_threshold(),
            unit: RangeUnit::default(),
        }
    }
}

impl Default for TopicConfig {
    fn default() -> Self {
        TopicConfig {
            cmd_vel: default_cmd_vel_topic(),
            state: default_state_topic(),
            front: default_front_topic(),
            left: default_left_topic(),
            right: default_right_topic(),
        }
    }
}

impl SquareConfig {
    /// Load and validate parameters from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate parameters from a TOML string
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: SquareConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.loop_period()?;
        self.motion.phase_durations()?;
        self.proximity.validate()
    }

    /// Period of the control loop; must be representable and non-zero
    pub fn loop_period(&self) -> Result<Duration> {
        let rate = positive("loop_rate_hz", self.loop_rate_hz)?;
        let period = seconds("loop_rate_hz", 1.0 / rate)?;
        if period.is_zero() {
            return Err(CoreError::invalid(
                "loop_rate_hz",
                format!("{} Hz gives a zero loop period", rate),
            ));
        }
        Ok(period)
    }
}

/// Durations of the advance, turn and pause phases
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseDurations {
    pub advance: Duration,
    pub turn: Duration,
    pub pause: Duration,
}

impl MotionParams {
    /// Compute how long each phase of the square lasts
    pub fn phase_durations(&self) -> Result<PhaseDurations> {
        let linear_speed = positive("linear_speed", self.linear_speed)?;
        let angular_speed = positive("angular_speed", self.angular_speed)?;
        let side_length = non_negative("side_length", self.side_length)?;
        let turn_angle = non_negative("turn_angle", self.turn_angle)?;
        let pause_secs = non_negative("pause_secs", self.pause_secs)?;

        Ok(PhaseDurations {
            advance: seconds("side_length / linear_speed", side_length / linear_speed)?,
            turn: seconds("turn_angle / angular_speed", turn_angle / angular_speed)?,
            pause: seconds("pause_secs", pause_secs)?,
        })
    }
}

impl ProximityConfig {
    pub fn validate(&self) -> Result<()> {
        non_negative("proximity.threshold", self.threshold).map(|_| ())
    }
}

fn positive(name: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(CoreError::invalid(
            name,
            format!("must be a positive number, got {}", value),
        ))
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(CoreError::invalid(
            name,
            format!("must be a non-negative number, got {}", value),
        ))
    }
}

fn seconds(name: &'static str, secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs).map_err(|e| CoreError::invalid(name, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = SquareConfig::from_toml_str("").unwrap();
        assert_eq!(config.loop_rate_hz, 10.0);
        assert_eq!(config.motion, MotionParams::default());
        assert_eq!(config.proximity.threshold, 150.0);
        assert_eq!(config.proximity.unit, RangeUnit::Millimeters);
        assert_eq!(config.topics.cmd_vel, "/cmd_vel");
        assert_eq!(config.loop_period().unwrap(), Duration::from_millis(100));
    }

    #[test]
    fn default_durations_match_square() {
        let durations = MotionParams::default().phase_durations().unwrap();
        assert_eq!(durations.advance, Duration::from_secs(10));
        assert_eq!(durations.turn, Duration::from_secs(2));
        assert_eq!(durations.pause, Duration::from_secs(1));
    }

    #[test]
    fn partial_sections_override_fields() {
        let config = SquareConfig::from_toml_str(
            r#"
            [motion]
            side_length = 1.0

            [proximity]
            threshold = 0.15
            unit = "meters"
            "#,
        )
        .unwrap();
        assert_eq!(config.motion.side_length, 1.0);
        assert_eq!(config.motion.linear_speed, 0.05);
        assert_eq!(config.proximity.unit, RangeUnit::Meters);
        assert_eq!(config.proximity.threshold, 0.15);
    }

    #[test]
    fn zero_speed_is_rejected() {
        let err = SquareConfig::from_toml_str("[motion]\nlinear_speed = 0.0").unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidParameter {
                name: "linear_speed",
                ..
            }
        ));
    }

    #[test]
    fn negative_threshold_is_rejected() {
        let err = SquareConfig::from_toml_str("[proximity]\nthreshold = -1.0").unwrap_err();
        assert!(matches!(err, CoreError::InvalidParameter { .. }));
    }

    #[test]
    fn loop_rate_too_low_for_a_duration_is_rejected() {
        let err = SquareConfig::from_toml_str("loop_rate_hz = 1e-20").unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidParameter {
                name: "loop_rate_hz",
                ..
            }
        ));
    }

    #[test]
    fn loop_rate_with_zero_period_is_rejected() {
        let err = SquareConfig::from_toml_str("loop_rate_hz = 1e12").unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidParameter {
                name: "loop_rate_hz",
                ..
            }
        ));
    }

    #[test]
    fn loop_period_rechecks_a_mutated_rate() {
        let mut config = SquareConfig::default();
        config.loop_rate_hz = 0.0;
        assert!(config.loop_period().is_err());
        config.loop_rate_hz = 20.0;
        assert_eq!(config.loop_period().unwrap(), Duration::from_millis(50));
    }

    #[test]
    fn malformed_toml_is_reported() {
        let err = SquareConfig::from_toml_str("loop_rate_hz = \"fast\"").unwrap_err();
        assert!(matches!(err, CoreError::Toml(_)));
    }

    #[test]
    fn shipped_parameter_file_is_valid() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/square_params.toml");
        let config = SquareConfig::load(path).unwrap();
        assert_eq!(config.motion, MotionParams::default());
    }
}
