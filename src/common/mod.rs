//! Common types shared by the control and perception stacks

use serde::Deserialize;
use std::fmt;

/// Common types and utilities used across the codebase
pub mod types {
    /// A 2D pose (x, y, theta)
    pub type Pose2D = (f64, f64, f64);
}

/// Mounting position of a range sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Front,
    Left,
    Right,
}

impl Side {
    /// All sides, in the order warnings are reported
    pub const ALL: [Side; 3] = [Side::Front, Side::Right, Side::Left];

    /// Heading of the sensor relative to the robot's forward axis, in radians
    pub fn mounting_angle(self) -> f64 {
        match self {
            Side::Front => 0.0,
            Side::Left => std::f64::consts::FRAC_PI_2,
            Side::Right => -std::f64::consts::FRAC_PI_2,
        }
    }

    fn index(self) -> usize {
        match self {
            Side::Front => 0,
            Side::Left => 1,
            Side::Right => 2,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Side::Front => "front",
            Side::Left => "left",
            Side::Right => "right",
        };
        f.write_str(name)
    }
}

/// Fixed-size storage with one slot per [`Side`]
#[derive(Debug, Default)]
pub struct PerSide<T> {
    slots: [T; 3],
}

impl<T> PerSide<T> {
    pub fn get(&self, side: Side) -> &T {
        &self.slots[side.index()]
    }
}

/// Unit in which range readings and the warning threshold are expressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeUnit {
    #[default]
    Millimeters,
    Meters,
}

impl RangeUnit {
    /// Convert a distance in this unit to meters
    pub fn to_meters(self, value: f64) -> f64 {
        match self {
            RangeUnit::Millimeters => value / 1000.0,
            RangeUnit::Meters => value,
        }
    }

    /// Convert a distance in meters to this unit
    pub fn from_meters(self, meters: f64) -> f64 {
        match self {
            RangeUnit::Millimeters => meters * 1000.0,
            RangeUnit::Meters => meters,
        }
    }
}

/// Latest distance reported by one range sensor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeReading {
    pub distance: f64,
}

impl RangeReading {
    pub fn new(distance: f64) -> Self {
        RangeReading { distance }
    }
}

/// Velocity command for the robot
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VelocityCommand {
    pub linear_x: f64,
    pub angular_z: f64,
}

impl VelocityCommand {
    pub fn new(linear_x: f64, angular_z: f64) -> Self {
        VelocityCommand {
            linear_x,
            angular_z,
        }
    }

    /// Zero velocity
    pub fn stop() -> Self {
        VelocityCommand::default()
    }

    pub fn is_stop(&self) -> bool {
        self.linear_x == 0.0 && self.angular_z == 0.0
    }
}
