//! Lifecycle management for square test components

use crate::error::{CoreError, Result};
use log::debug;

/// Trait for components that follow a lifecycle pattern
pub trait LifecycleNode: Send {
    /// Configure the node
    fn on_configure(&mut self) -> Result<()>;

    /// Activate the node
    fn on_activate(&mut self) -> Result<()>;

    /// Deactivate the node
    fn on_deactivate(&mut self) -> Result<()>;

    /// Clean up the node
    fn on_cleanup(&mut self) -> Result<()>;
}

/// Base implementation for lifecycle nodes
#[derive(Debug)]
pub struct LifecycleNodeBase {
    pub name: String,
    state: State,
}

/// State of a lifecycle node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Unconfigured,
    Inactive,
    Active,
}

impl LifecycleNodeBase {
    /// Create a new lifecycle node base
    pub fn new(name: &str) -> Self {
        LifecycleNodeBase {
            name: name.to_string(),
            state: State::Unconfigured,
        }
    }

    /// Get the current state
    pub fn get_state(&self) -> State {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == State::Active
    }

    /// Move from `from` to `to`, failing if the node is not currently in `from`
    pub fn transition(&mut self, transition: &'static str, from: State, to: State) -> Result<()> {
        if self.state != from {
            return Err(CoreError::Lifecycle {
                node: self.name.clone(),
                transition,
                from: self.state,
            });
        }
        debug!("{}: {} ({:?} -> {:?})", self.name, transition, from, to);
        self.state = to;
        Ok(())
    }

    pub fn configure(&mut self) -> Result<()> {
        self.transition("configure", State::Unconfigured, State::Inactive)
    }

    pub fn activate(&mut self) -> Result<()> {
        self.transition("activate", State::Inactive, State::Active)
    }

    pub fn deactivate(&mut self) -> Result<()> {
        self.transition("deactivate", State::Active, State::Inactive)
    }

    pub fn cleanup(&mut self) -> Result<()> {
        self.transition("cleanup", State::Inactive, State::Unconfigured)
    }
}
