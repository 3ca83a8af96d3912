//! Application-wide constants
//!
//! Reference values of the benchmark run. Every one of them can be
//! overridden through configuration; these are only the defaults.

// =============================================================================
// EXECUTABLE NAMING
// =============================================================================

/// Prefix shared by every performance executable
pub const EXECUTABLE_PREFIX: &str = "performance";

/// Separator between the fields of an executable name
pub const NAME_SEPARATOR: char = '_';

/// Default directory holding the performance executables
pub const DEFAULT_BIN_DIR: &str = ".";

// =============================================================================
// DRIVER DEFAULTS
// =============================================================================

/// Variants benchmarked when none are configured
pub const DEFAULT_VARIANTS: &[&str] = &["deque_NO_RESERVE", "list_NO_RESERVE", "vector_NO_RESERVE"];

/// Array sizes benchmarked when none are configured
pub const DEFAULT_ARRAY_SIZES: &[u32] = &[500, 1000];

/// Increment between successive iteration counts
pub const DEFAULT_STEP: u64 = 1_000_000;

/// Wall-clock seconds after which a variant is retired
pub const DEFAULT_TIMEOUT_SECONDS: f64 = 100.5;

/// Exclusive ceiling on the iteration count
pub const DEFAULT_MAX_ITERATIONS: u64 = 100_000_000;

/// Default log filter
pub const DEFAULT_LOG_FILTER: &str = "valuebench=info";

// =============================================================================
// CATALOG
// =============================================================================

/// Array sizes every performance executable is built for
pub const CATALOG_ARRAY_SIZES: &[u32] = &[1, 10, 40, 50, 60, 100, 200, 500, 1000];

// =============================================================================
// ENVIRONMENT VARIABLES
// =============================================================================

pub mod env_vars {
    pub const VARIANTS: &str = "VALUEBENCH_VARIANTS";
    pub const ARRAY_SIZES: &str = "VALUEBENCH_ARRAY_SIZES";
    pub const STEP: &str = "VALUEBENCH_STEP";
    pub const STEP_OVERRIDES: &str = "VALUEBENCH_STEP_OVERRIDES";
    pub const TIMEOUT_SECONDS: &str = "VALUEBENCH_TIMEOUT_SECONDS";
    pub const MAX_ITERATIONS: &str = "VALUEBENCH_MAX_ITERATIONS";
    pub const BIN_DIR: &str = "VALUEBENCH_BIN_DIR";
    pub const OUTPUT: &str = "VALUEBENCH_OUTPUT";
    pub const MERGE_STDERR: &str = "VALUEBENCH_MERGE_STDERR";
    pub const SEED: &str = "VALUEBENCH_SEED";
    pub const SUMMARY_JSON: &str = "VALUEBENCH_SUMMARY_JSON";
    pub const RUST_LOG: &str = "RUST_LOG";
}
