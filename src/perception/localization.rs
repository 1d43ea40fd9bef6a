//! Open-loop pose prediction

use crate::common::types::Pose2D;
use crate::common::VelocityCommand;
use nalgebra::{Isometry2, Vector2};
use std::time::Duration;

/// Integrates commanded velocities into a predicted pose.
///
/// Nothing here is measured: the prediction is only as good as the robot's
/// velocity tracking.
#[derive(Debug, Clone)]
pub struct DeadReckoning {
    pose: Isometry2<f64>,
}

impl DeadReckoning {
    /// Start at the origin facing +x
    pub fn new() -> Self {
        DeadReckoning {
            pose: Isometry2::identity(),
        }
    }

    /// Advance the prediction by holding `command` for `dt`
    pub fn integrate(&mut self, command: VelocityCommand, dt: Duration) {
        let dt = dt.as_secs_f64();
        let dtheta = command.angular_z * dt;
        let distance = command.linear_x * dt;

        // Displacement along an arc, expressed in the robot frame
        let local = if dtheta.abs() < 1e-9 {
            Vector2::new(distance, 0.0)
        } else {
            let radius = distance / dtheta;
            Vector2::new(radius * dtheta.sin(), radius * (1.0 - dtheta.cos()))
        };

        self.pose *= Isometry2::new(local, dtheta);
    }

    /// Get the current pose estimate, theta in (-pi, pi]
    pub fn get_pose(&self) -> Pose2D {
        (
            self.pose.translation.x,
            self.pose.translation.y,
            self.pose.rotation.angle(),
        )
    }
}

impl Default for DeadReckoning {
    fn default() -> Self {
        Self::new()
    }
}
