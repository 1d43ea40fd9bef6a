//! Range sensor interfaces

use crate::common::types::Pose2D;
use crate::common::{RangeReading, RangeUnit, Side};
use nalgebra::{Point2, Vector2};

/// A sensor that reports a distance from the robot's pose
pub trait RangeSensor {
    /// Mounting position of the sensor
    fn side(&self) -> Side;

    /// Measure the range seen from `pose`
    fn measure(&self, pose: Pose2D) -> RangeReading;
}

/// Axis-aligned rectangular enclosure
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arena {
    pub min: Point2<f64>,
    pub max: Point2<f64>,
}

impl Arena {
    pub fn new(min: Point2<f64>, max: Point2<f64>) -> Self {
        Arena { min, max }
    }

    /// Enclosure around a square of `side_length` starting at the origin,
    /// with `margin` between the square and each wall
    pub fn around_square(side_length: f64, margin: f64) -> Self {
        Arena {
            min: Point2::new(-margin, -margin),
            max: Point2::new(side_length + margin, side_length + margin),
        }
    }

    /// Distance from `origin` along `direction` (unit length) to the first wall.
    ///
    /// Zero if `origin` is outside the arena.
    pub fn ray_distance(&self, origin: Point2<f64>, direction: Vector2<f64>) -> f64 {
        let mut distance = f64::INFINITY;
        for axis in 0..2 {
            let d = direction[axis];
            if d.abs() < 1e-12 {
                continue;
            }
            let wall = if d > 0.0 { self.max[axis] } else { self.min[axis] };
            distance = distance.min((wall - origin[axis]) / d);
        }
        distance.max(0.0)
    }
}

/// Infrared sensor simulated by ray casting inside an [`Arena`]
#[derive(Debug, Clone)]
pub struct SimulatedRangeSensor {
    side: Side,
    arena: Arena,
    unit: RangeUnit,
    /// Longest range the sensor reports, in meters
    max_range: f64,
}

impl SimulatedRangeSensor {
    pub fn new(side: Side, arena: Arena, unit: RangeUnit, max_range: f64) -> Self {
        SimulatedRangeSensor {
            side,
            arena,
            unit,
            max_range,
        }
    }
}

impl RangeSensor for SimulatedRangeSensor {
    fn side(&self) -> Side {
        self.side
    }

    fn measure(&self, pose: Pose2D) -> RangeReading {
        let (x, y, theta) = pose;
        let heading = theta + self.side.mounting_angle();
        let direction = Vector2::new(heading.cos(), heading.sin());
        let meters = self
            .arena
            .ray_distance(Point2::new(x, y), direction)
            .min(self.max_range);
        RangeReading::new(self.unit.from_meters(meters))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sensor(side: Side) -> SimulatedRangeSensor {
        SimulatedRangeSensor::new(
            side,
            Arena::around_square(0.5, 0.1),
            RangeUnit::Millimeters,
            2.0,
        )
    }

    #[test]
    fn readings_at_start_pose() {
        let pose = (0.0, 0.0, 0.0);
        assert_relative_eq!(sensor(Side::Front).measure(pose).distance, 600.0, epsilon = 1e-9);
        assert_relative_eq!(sensor(Side::Left).measure(pose).distance, 600.0, epsilon = 1e-9);
        assert_relative_eq!(sensor(Side::Right).measure(pose).distance, 100.0, epsilon = 1e-9);
    }

    #[test]
    fn front_reading_at_first_corner() {
        let reading = sensor(Side::Front).measure((0.5, 0.0, 0.0));
        assert_relative_eq!(reading.distance, 100.0, epsilon = 1e-9);
    }

    #[test]
    fn range_is_clamped() {
        let arena = Arena::around_square(10.0, 1.0);
        let sensor = SimulatedRangeSensor::new(Side::Front, arena, RangeUnit::Meters, 2.0);
        assert_eq!(sensor.measure((0.0, 0.0, 0.0)).distance, 2.0);
    }

    #[test]
    fn outside_arena_reads_zero() {
        let arena = Arena::around_square(1.0, 0.0);
        let d = arena.ray_distance(Point2::new(2.0, 0.5), Vector2::new(1.0, 0.0));
        assert_eq!(d, 0.0);
    }
}
