//! valuebench - Adaptive benchmark driver for the value_ptr containers
//!
//! The C++ side of the project builds one performance executable per
//! container variant and array size (`performance_<container>_<reserve>_<size>`).
//! This crate runs them: every round it invokes each variant with a growing
//! iteration count, in shuffled order, and stops calling a variant for the
//! current array size once a single call takes longer than the timeout.
//!
//! # Architecture
//!
//! - **benchmark**: variants, step schedule, executor, driver loop, statistics
//! - **config**: environment configuration
//! - **cli**: command-line overrides and subcommands

pub mod benchmark;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use error::{ConfigError, DriverError, DriverResult};
