//! Error types
//!
//! `DriverError` covers everything that can go wrong while the benchmark
//! matrix runs; `ConfigError` covers loading and validating settings.

use std::path::PathBuf;

use crate::benchmark::ArraySize;

/// Errors raised by the benchmark driver
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("Executable not found: {}", .0.display())]
    MissingExecutable(PathBuf),

    #[error("Failed to launch {}: {source}", executable.display())]
    Launch {
        executable: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Step for array size {0} must be positive")]
    InvalidStep(ArraySize),

    #[error("Invalid variant label: {0}")]
    InvalidVariant(String),

    #[error("Invalid array size: {0}")]
    InvalidArraySize(String),

    #[error("Report output error: {0}")]
    Report(#[from] std::io::Error),
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(key: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias using DriverError
pub type DriverResult<T> = Result<T, DriverError>;
