//! Command-line interface
//!
//! Flags override values loaded from the environment.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{
    benchmark::{ArraySize, StepPolicy, Variant},
    config::{Config, parse_step_override},
};

#[derive(Debug, Parser)]
#[command(
    name = "valuebench",
    version,
    about = "Runs the container performance binaries at escalating iteration counts"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub overrides: Overrides,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Run the benchmark matrix (default)
    Run,
    /// Show the executables the configured matrix would invoke
    Plan,
    /// List every performance executable the C++ build produces
    Catalog,
}

#[derive(Debug, Args)]
pub struct Overrides {
    /// Comma-separated variant labels, e.g. vector_NO_RESERVE
    #[arg(long, value_delimiter = ',', global = true)]
    pub variants: Option<Vec<Variant>>,

    /// Comma-separated array sizes, processed in order
    #[arg(long, value_delimiter = ',', global = true)]
    pub array_sizes: Option<Vec<ArraySize>>,

    /// Increment between iteration counts
    #[arg(long, global = true)]
    pub step: Option<u64>,

    /// Step for one array size, as SIZE=STEP (repeatable)
    #[arg(long = "step-override", value_parser = parse_step_override, global = true)]
    pub step_overrides: Vec<(ArraySize, u64)>,

    /// Seconds after which a variant is retired for the current array size
    #[arg(long, global = true)]
    pub timeout_seconds: Option<f64>,

    /// Exclusive ceiling on the iteration count
    #[arg(long, global = true)]
    pub max_iterations: Option<u64>,

    /// Directory holding the performance executables
    #[arg(long, global = true)]
    pub bin_dir: Option<PathBuf>,

    /// Append results to this file instead of stdout
    #[arg(long, global = true)]
    pub output: Option<PathBuf>,

    /// Route benchmark stderr into the report stream
    #[arg(long, global = true)]
    pub merge_stderr: bool,

    /// Seed for the per-round shuffle
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Write a JSON run summary to this file
    #[arg(long, global = true)]
    pub summary_json: Option<PathBuf>,
}

impl Overrides {
    /// Apply every flag that was given on top of `config`
    pub fn apply(self, config: &mut Config) {
        if let Some(variants) = self.variants {
            config.matrix.variants = dedup(variants);
        }
        if let Some(array_sizes) = self.array_sizes {
            config.matrix.array_sizes = dedup(array_sizes);
        }
        if let Some(step) = self.step {
            let mut policy = StepPolicy::new(step);
            for (size, size_step) in config.driver.step.overrides() {
                policy = policy.with_override(*size, *size_step);
            }
            config.driver.step = policy;
        }
        for (size, size_step) in self.step_overrides {
            config.driver.step = config.driver.step.clone().with_override(size, size_step);
        }
        if let Some(timeout) = self.timeout_seconds {
            config.driver.timeout_secs = timeout;
        }
        if let Some(max_iterations) = self.max_iterations {
            config.driver.max_iterations = max_iterations;
        }
        if let Some(seed) = self.seed {
            config.driver.seed = Some(seed);
        }
        if let Some(bin_dir) = self.bin_dir {
            config.output.bin_dir = bin_dir;
        }
        if let Some(output) = self.output {
            config.output.report_path = Some(output);
        }
        if self.merge_stderr {
            config.output.merge_stderr = true;
        }
        if let Some(summary_json) = self.summary_json {
            config.output.summary_json = Some(summary_json);
        }
    }
}

fn dedup<T: PartialEq>(items: Vec<T>) -> Vec<T> {
    let mut unique = Vec::with_capacity(items.len());
    for item in items {
        if !unique.contains(&item) {
            unique.push(item);
        }
    }
    unique
}
