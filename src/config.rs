//! Application configuration management
//!
//! Settings are read from a `.env` file and environment variables, then the
//! command line may override any of them. Everything has a default, so an
//! empty environment reproduces the reference run.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::{
    benchmark::{ArraySize, DriverSettings, StepPolicy, Variant},
    constants::{
        DEFAULT_ARRAY_SIZES, DEFAULT_BIN_DIR, DEFAULT_LOG_FILTER, DEFAULT_MAX_ITERATIONS,
        DEFAULT_STEP, DEFAULT_TIMEOUT_SECONDS, DEFAULT_VARIANTS, env_vars,
    },
    error::ConfigError,
};

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub matrix: MatrixConfig,
    pub driver: DriverConfig,
    pub output: OutputConfig,
}

/// What gets benchmarked
#[derive(Debug, Clone)]
pub struct MatrixConfig {
    /// Variant set, in configured order, without duplicates
    pub variants: Vec<Variant>,
    /// Array sizes, processed in this order
    pub array_sizes: Vec<ArraySize>,
}

/// Loop parameters
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub step: StepPolicy,
    pub timeout_secs: f64,
    /// Exclusive ceiling on the iteration count
    pub max_iterations: u64,
    /// Shuffle seed; drawn from the OS when absent
    pub seed: Option<u64>,
}

/// Where executables live and where results go
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub bin_dir: PathBuf,
    /// Report file; stdout when absent
    pub report_path: Option<PathBuf>,
    pub merge_stderr: bool,
    pub summary_json: Option<PathBuf>,
    pub log_filter: String,
}

impl Config {
    /// Load configuration from `.env` and environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Values are parsed but not validated; call [`Config::validate`] once
    /// command-line overrides have been applied.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            matrix: MatrixConfig::from_lookup(&lookup)?,
            driver: DriverConfig::from_lookup(&lookup)?,
            output: OutputConfig::from_lookup(&lookup)?,
        })
    }

    /// Check invariants the driver relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.driver.step.default_step() == 0 {
            return Err(ConfigError::invalid(env_vars::STEP, "step must be positive"));
        }
        if let Some((size, _)) = self.driver.step.overrides().iter().find(|(_, step)| **step == 0) {
            return Err(ConfigError::invalid(
                env_vars::STEP_OVERRIDES,
                format!("step for array size {} must be positive", size),
            ));
        }
        if !self.driver.timeout_secs.is_finite() || self.driver.timeout_secs < 0.0 {
            return Err(ConfigError::invalid(
                env_vars::TIMEOUT_SECONDS,
                "timeout must be a non-negative number of seconds",
            ));
        }
        if self.driver.max_iterations == 0 {
            return Err(ConfigError::invalid(
                env_vars::MAX_ITERATIONS,
                "iteration ceiling must be positive",
            ));
        }
        Ok(())
    }

    /// Limits handed to the driver
    pub fn settings(&self) -> DriverSettings {
        DriverSettings {
            timeout_secs: self.driver.timeout_secs,
            max_iterations: self.driver.max_iterations,
        }
    }
}

impl MatrixConfig {
    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let variants: Vec<Variant> = match lookup(env_vars::VARIANTS) {
            Some(value) => parse_list(env_vars::VARIANTS, &value)?,
            None => DEFAULT_VARIANTS
                .iter()
                .map(|label| parse_value(env_vars::VARIANTS, label))
                .collect::<Result<_, _>>()?,
        };
        let array_sizes: Vec<ArraySize> = match lookup(env_vars::ARRAY_SIZES) {
            Some(value) => parse_list(env_vars::ARRAY_SIZES, &value)?,
            None => DEFAULT_ARRAY_SIZES
                .iter()
                .map(|size| parse_value(env_vars::ARRAY_SIZES, &size.to_string()))
                .collect::<Result<_, _>>()?,
        };

        Ok(Self {
            variants,
            array_sizes,
        })
    }
}

impl DriverConfig {
    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let default_step = lookup_or(lookup, env_vars::STEP, DEFAULT_STEP)?;
        let mut step = StepPolicy::new(default_step);
        if let Some(value) = lookup(env_vars::STEP_OVERRIDES) {
            for entry in value.split(',').filter(|e| !e.trim().is_empty()) {
                let (size, size_step) = parse_step_override(entry)
                    .map_err(|reason| ConfigError::invalid(env_vars::STEP_OVERRIDES, reason))?;
                step = step.with_override(size, size_step);
            }
        }

        Ok(Self {
            step,
            timeout_secs: lookup_or(lookup, env_vars::TIMEOUT_SECONDS, DEFAULT_TIMEOUT_SECONDS)?,
            max_iterations: lookup_or(lookup, env_vars::MAX_ITERATIONS, DEFAULT_MAX_ITERATIONS)?,
            seed: lookup(env_vars::SEED)
                .map(|value| parse_value::<u64>(env_vars::SEED, &value))
                .transpose()?,
        })
    }
}

impl OutputConfig {
    /// Whether benchmark stderr goes into the report stream.
    ///
    /// A report file always gets it: the binaries print their timing on
    /// stderr, and without it every result line would be left open.
    pub fn stderr_to_report(&self) -> bool {
        self.merge_stderr || self.report_path.is_some()
    }

    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let merge_stderr = match lookup(env_vars::MERGE_STDERR) {
            Some(value) => parse_bool(&value)
                .ok_or_else(|| ConfigError::invalid(env_vars::MERGE_STDERR, "expected a boolean"))?,
            None => false,
        };

        Ok(Self {
            bin_dir: PathBuf::from(
                lookup(env_vars::BIN_DIR)
                    .filter(|p| !p.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_BIN_DIR.to_string()),
            ),
            report_path: lookup(env_vars::OUTPUT)
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
            merge_stderr,
            summary_json: lookup(env_vars::SUMMARY_JSON)
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
            log_filter: lookup(env_vars::RUST_LOG)
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        })
    }
}

/// Parse `SIZE=STEP`
pub fn parse_step_override(entry: &str) -> Result<(ArraySize, u64), String> {
    let (size, step) = entry
        .split_once('=')
        .ok_or_else(|| format!("expected SIZE=STEP, got {:?}", entry))?;
    let size = size.parse::<ArraySize>().map_err(|e| e.to_string())?;
    let step = step
        .trim()
        .parse::<u64>()
        .map_err(|_| format!("invalid step {:?}", step))?;
    if step == 0 {
        return Err(format!("step for array size {} must be positive", size));
    }
    Ok((size, step))
}

/// Parse a comma-separated list, dropping empty entries and duplicates
fn parse_list<T>(key: &str, value: &str) -> Result<Vec<T>, ConfigError>
where
    T: FromStr + PartialEq,
    T::Err: std::fmt::Display,
{
    let mut items: Vec<T> = Vec::new();
    for entry in value.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let item = parse_value(key, entry)?;
        if !items.contains(&item) {
            items.push(item);
        }
    }
    Ok(items)
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::invalid(key, e.to_string()))
}

fn lookup_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(value) => parse_value(key, &value),
        None => Ok(default),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
