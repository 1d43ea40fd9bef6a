//! Control module for the square test
pub mod sequencer;

use self::sequencer::{MotionSequencer, SequencerState};
use crate::common::VelocityCommand;
use crate::config::MotionParams;
use crate::error::Result;
use crate::lifecycle::{LifecycleNode, LifecycleNodeBase};
use log::info;
use std::time::Instant;

/// Control stack for the robot
pub struct ControlStack {
    base: LifecycleNodeBase,
    sequencer: MotionSequencer,
    restart_pending: bool,
}

impl ControlStack {
    /// Create a new control stack
    pub fn new(params: MotionParams) -> Result<Self> {
        Ok(ControlStack {
            base: LifecycleNodeBase::new("control_stack"),
            sequencer: MotionSequencer::new(params, Instant::now())?,
            restart_pending: false,
        })
    }

    /// Compute the velocity command for this tick.
    ///
    /// Commands a stop while the stack is not active. The first tick after
    /// activation starts a fresh side.
    pub fn tick(&mut self, now: Instant) -> VelocityCommand {
        if !self.base.is_active() {
            return VelocityCommand::stop();
        }
        if self.restart_pending {
            self.sequencer.restart(now);
            self.restart_pending = false;
        }
        self.sequencer.tick(now)
    }

    pub fn state(&self) -> SequencerState {
        self.sequencer.state()
    }

    pub fn sequencer(&self) -> &MotionSequencer {
        &self.sequencer
    }
}

impl LifecycleNode for ControlStack {
    fn on_configure(&mut self) -> Result<()> {
        info!("Configuring control stack");
        self.base.configure()
    }

    fn on_activate(&mut self) -> Result<()> {
        info!("Activating control stack");
        self.base.activate()?;
        self.restart_pending = true;
        Ok(())
    }

    fn on_deactivate(&mut self) -> Result<()> {
        info!(
            "Deactivating control stack after {} sides ({} laps)",
            self.sequencer.sides_completed(),
            self.sequencer.laps_completed()
        );
        self.base.deactivate()
    }

    fn on_cleanup(&mut self) -> Result<()> {
        info!("Cleaning up control stack");
        self.base.cleanup()
    }
}
