//! Iteration step schedule

use std::collections::BTreeMap;

use super::ArraySize;
use crate::constants::DEFAULT_STEP;

/// Maps an array size to the increment between successive iteration counts
pub trait StepSchedule {
    fn step(&self, array_size: ArraySize) -> u64;
}

impl<F> StepSchedule for F
where
    F: Fn(ArraySize) -> u64,
{
    fn step(&self, array_size: ArraySize) -> u64 {
        self(array_size)
    }
}

/// Default step with optional per-size overrides
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepPolicy {
    default: u64,
    overrides: BTreeMap<ArraySize, u64>,
}

impl StepPolicy {
    pub fn new(default: u64) -> Self {
        Self {
            default,
            overrides: BTreeMap::new(),
        }
    }

    /// Use `step` for `array_size` instead of the default
    pub fn with_override(mut self, array_size: ArraySize, step: u64) -> Self {
        self.overrides.insert(array_size, step);
        self
    }

    pub fn default_step(&self) -> u64 {
        self.default
    }

    pub fn overrides(&self) -> &BTreeMap<ArraySize, u64> {
        &self.overrides
    }
}

impl Default for StepPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_STEP)
    }
}

impl StepSchedule for StepPolicy {
    fn step(&self, array_size: ArraySize) -> u64 {
        self.overrides
            .get(&array_size)
            .copied()
            .unwrap_or(self.default)
    }
}
