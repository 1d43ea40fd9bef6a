//! Error types for the square test core

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Cannot read the parameter file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot parse the parameter file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Lifecycle error in {node}: cannot {transition} from {from:?}")]
    Lifecycle {
        node: String,
        transition: &'static str,
        from: crate::lifecycle::State,
    },
}

impl CoreError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        CoreError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
