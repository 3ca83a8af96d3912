//! Benchmark execution engine
//!
//! The driver sweeps a matrix of container variants and array sizes:
//!
//! 1. **Variants** (`variant.rs`): which performance executable to run and
//!    how its file name is formed.
//! 2. **Schedule** (`schedule.rs`): how far the iteration count advances
//!    between rounds for each array size.
//! 3. **Executor** (`executor.rs`): launching one executable and waiting
//!    for it.
//! 4. **Driver** (`driver.rs`): the round loop, shuffling and retirement.

pub mod driver;
pub mod executor;
pub mod metrics;
pub mod report;
pub mod schedule;
pub mod variant;

pub use driver::{BenchmarkDriver, DriverSettings};
pub use executor::{Invocation, LaunchOutcome, Launcher, ProcessLauncher};
pub use metrics::{ClassMetrics, RunSummary, VariantStats};
pub use report::ReportSink;
pub use schedule::{StepPolicy, StepSchedule};
pub use variant::{ArraySize, ContainerKind, ExecutableNaming, ReserveMode, Variant, executable_name};
