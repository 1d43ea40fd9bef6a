//! Perception module for the square test
pub mod localization;
pub mod proximity;
pub mod sensors;

use self::proximity::{ProximityMonitor, ProximityWarning};
use crate::config::ProximityConfig;
use crate::error::Result;
use crate::lifecycle::{LifecycleNode, LifecycleNodeBase};
use log::info;
use std::sync::Arc;

/// Perception stack for the robot
pub struct PerceptionStack {
    base: LifecycleNodeBase,
    monitor: Arc<ProximityMonitor>,
}

impl PerceptionStack {
    /// Create a new perception stack
    pub fn new(config: ProximityConfig) -> Self {
        PerceptionStack {
            base: LifecycleNodeBase::new("perception_stack"),
            monitor: Arc::new(ProximityMonitor::new(config)),
        }
    }

    /// Shared handle for sensor callbacks
    pub fn monitor(&self) -> Arc<ProximityMonitor> {
        Arc::clone(&self.monitor)
    }

    /// Proximity warnings, empty while the stack is not active
    pub fn check(&self) -> Vec<ProximityWarning> {
        if !self.base.is_active() {
            return Vec::new();
        }
        self.monitor.check()
    }
}

impl LifecycleNode for PerceptionStack {
    fn on_configure(&mut self) -> Result<()> {
        let config = self.monitor.config();
        info!(
            "Configuring perception stack (threshold {} {:?})",
            config.threshold, config.unit
        );
        self.base.configure()
    }

    fn on_activate(&mut self) -> Result<()> {
        info!("Activating perception stack");
        self.base.activate()
    }

    fn on_deactivate(&mut self) -> Result<()> {
        info!("Deactivating perception stack");
        self.base.deactivate()
    }

    fn on_cleanup(&mut self) -> Result<()> {
        info!("Cleaning up perception stack");
        self.base.cleanup()?;
        self.monitor.clear();
        Ok(())
    }
}
