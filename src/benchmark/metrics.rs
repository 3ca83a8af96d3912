//! Run statistics
//!
//! Collected alongside the report stream for logging and the optional JSON
//! summary. Nothing here feeds back into the driver's decisions.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{ArraySize, LaunchOutcome, Variant};

/// Wall-time statistics of one variant within an array-size class
#[derive(Debug, Clone, Default, Serialize)]
pub struct VariantStats {
    pub invocations: u64,
    pub time_min_secs: f64,
    pub time_avg_secs: f64,
    pub time_max_secs: f64,
    /// Invocations that exited non-zero or were killed by a signal
    pub failed_exits: u64,
    /// Iteration count of the invocation that retired the variant
    pub retired_at: Option<u64>,
    #[serde(skip)]
    total_secs: f64,
}

impl VariantStats {
    fn record(&mut self, elapsed: Duration, outcome: LaunchOutcome) {
        let secs = elapsed.as_secs_f64();
        if self.invocations == 0 {
            self.time_min_secs = secs;
            self.time_max_secs = secs;
        } else {
            self.time_min_secs = self.time_min_secs.min(secs);
            self.time_max_secs = self.time_max_secs.max(secs);
        }
        self.invocations += 1;
        self.total_secs += secs;
        self.time_avg_secs = self.total_secs / self.invocations as f64;
        if !outcome.is_success() {
            self.failed_exits += 1;
        }
    }
}

/// Statistics of one array-size class
#[derive(Debug, Clone, Serialize)]
pub struct ClassMetrics {
    pub array_size: ArraySize,
    pub step: u64,
    /// Rounds in which at least one variant was still active
    pub rounds: u64,
    /// Largest iteration count invoked
    pub last_iteration: Option<u64>,
    pub variants: BTreeMap<Variant, VariantStats>,
}

impl ClassMetrics {
    pub fn new(array_size: ArraySize, step: u64) -> Self {
        Self {
            array_size,
            step,
            rounds: 0,
            last_iteration: None,
            variants: BTreeMap::new(),
        }
    }

    pub fn record_round(&mut self) {
        self.rounds += 1;
    }

    pub fn record_invocation(
        &mut self,
        variant: Variant,
        iterations: u64,
        elapsed: Duration,
        outcome: LaunchOutcome,
    ) {
        self.last_iteration = Some(iterations);
        self.variants
            .entry(variant)
            .or_default()
            .record(elapsed, outcome);
    }

    pub fn record_retirement(&mut self, variant: Variant, iterations: u64) {
        self.variants.entry(variant).or_default().retired_at = Some(iterations);
    }

    /// Total subprocess invocations in this class
    pub fn invocations(&self) -> u64 {
        self.variants.values().map(|v| v.invocations).sum()
    }

    /// Variants retired in this class
    pub fn retired(&self) -> impl Iterator<Item = &Variant> {
        self.variants
            .iter()
            .filter(|(_, stats)| stats.retired_at.is_some())
            .map(|(variant, _)| variant)
    }
}

/// Aggregated result of a whole run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub timeout_secs: f64,
    pub max_iterations: u64,
    pub classes: Vec<ClassMetrics>,
}

impl RunSummary {
    pub fn new(timeout_secs: f64, max_iterations: u64) -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            timeout_secs,
            max_iterations,
            classes: Vec::new(),
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Total subprocess invocations across all classes
    pub fn invocations(&self) -> u64 {
        self.classes.iter().map(ClassMetrics::invocations).sum()
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
