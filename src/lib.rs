pub mod common;
pub mod config;
pub mod control;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod perception;

use crate::common::VelocityCommand;
use crate::config::SquareConfig;
use crate::control::sequencer::SequencerState;
use crate::control::ControlStack;
use crate::error::Result;
use crate::lifecycle::LifecycleNode;
use crate::perception::proximity::{ProximityMonitor, ProximityWarning};
use crate::perception::PerceptionStack;
use log::warn;
use std::sync::Arc;
use std::time::Instant;

/// Everything produced by one pass of the control loop
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutput {
    /// Command to publish
    pub command: VelocityCommand,
    pub warnings: Vec<ProximityWarning>,
    /// Sequencer state after the tick
    pub state: SequencerState,
    /// Whether the tick moved the sequencer to a new state
    pub transitioned: bool,
}

/// Core functionality for the square test
pub struct SquareTestCore {
    control: ControlStack,
    perception: PerceptionStack,
}

impl SquareTestCore {
    /// Create a new instance from validated parameters
    pub fn new(config: &SquareConfig) -> Result<Self> {
        config.validate()?;
        Ok(SquareTestCore {
            control: ControlStack::new(config.motion.clone())?,
            perception: PerceptionStack::new(config.proximity.clone()),
        })
    }

    fn components(&mut self) -> [&mut dyn LifecycleNode; 2] {
        [&mut self.perception, &mut self.control]
    }

    /// Configure and activate all components
    pub fn init(&mut self) -> Result<()> {
        for component in self.components() {
            component.on_configure()?;
            component.on_activate()?;
        }
        Ok(())
    }

    /// Deactivate and clean up all components
    pub fn shutdown(&mut self) -> Result<()> {
        for component in self.components() {
            component.on_deactivate()?;
            component.on_cleanup()?;
        }
        Ok(())
    }

    /// Run one pass of the control loop: proximity check, then sequencer tick.
    ///
    /// Warnings are logged and returned; they never change the command.
    pub fn step(&mut self, now: Instant) -> TickOutput {
        let warnings = self.perception.check();
        for warning in &warnings {
            warn!(
                "Collision risk! The robot is {:.2} meters from an obstacle on the {} side",
                warning.meters, warning.side
            );
        }

        let before = self.control.state();
        let command = self.control.tick(now);
        let state = self.control.state();

        TickOutput {
            command,
            warnings,
            state,
            transitioned: state != before,
        }
    }

    /// Shared handle for feeding sensor readings
    pub fn monitor(&self) -> Arc<ProximityMonitor> {
        self.perception.monitor()
    }

    pub fn control(&self) -> &ControlStack {
        &self.control
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{RangeReading, Side};
    use std::time::Duration;

    #[test]
    fn warnings_do_not_alter_the_command() {
        let mut core = SquareTestCore::new(&SquareConfig::default()).unwrap();
        core.init().unwrap();
        let t0 = Instant::now();

        let quiet = core.step(t0);
        core.monitor().update(Side::Front, RangeReading::new(10.0));
        let warned = core.step(t0 + Duration::from_millis(100));

        assert!(quiet.warnings.is_empty());
        assert_eq!(warned.warnings.len(), 1);
        assert_eq!(quiet.command, warned.command);
        assert_eq!(warned.state, SequencerState::Advancing);
    }

    #[test]
    fn uninitialised_core_stays_still() {
        let mut core = SquareTestCore::new(&SquareConfig::default()).unwrap();
        core.monitor().update(Side::Left, RangeReading::new(0.0));
        let out = core.step(Instant::now());
        assert!(out.command.is_stop());
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn shutdown_requires_init() {
        let mut core = SquareTestCore::new(&SquareConfig::default()).unwrap();
        assert!(core.shutdown().is_err());
        core.init().unwrap();
        core.shutdown().unwrap();
        assert!(core.step(Instant::now()).command.is_stop());
    }
}
