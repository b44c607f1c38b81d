use crate::types::errors::ValueError;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::num::NonZeroUsize;
use std::str::FromStr;
use std::time::Duration;

/// Largest batch the generator accepts. Larger batches are legal SQL but make
/// pacing meaningless at demo rates.
pub const MAX_BATCH_SIZE: usize = 100_000;

/// Target throughput in transaction records per second.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct TargetRate(f64);

impl TargetRate {
    pub fn new(records_per_second: f64) -> Result<Self, ValueError> {
        if !records_per_second.is_finite() {
            return Err(ValueError::InvalidRate(format!("Rate [{records_per_second}] is not a finite number")));
        }

        if records_per_second <= 0.0 {
            return Err(ValueError::InvalidRate(format!("Rate [{records_per_second}] must be positive")));
        }

        Ok(Self(records_per_second))
    }

    pub fn per_second(&self) -> f64 {
        self.0
    }

    /// Wall-clock time a batch of `rows` is allowed to take at this rate.
    pub fn budget_for(&self, rows: usize) -> Duration {
        Duration::from_secs_f64(rows as f64 / self.0)
    }
}

impl Display for TargetRate {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}/s", self.0)
    }
}

impl FromStr for TargetRate {
    type Err = ValueError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let parsed: f64 = value.trim().parse()?;
        TargetRate::new(parsed)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd)]
pub struct BatchSize(NonZeroUsize);

impl BatchSize {
    pub fn new(size: usize) -> Result<Self, ValueError> {
        if size > MAX_BATCH_SIZE {
            return Err(ValueError::InvalidBatchSize(format!("Batch size [{size}] exceeds the maximum of {MAX_BATCH_SIZE}")));
        }

        NonZeroUsize::new(size)
            .map(Self)
            .ok_or_else(|| ValueError::InvalidBatchSize("Batch size must be at least 1".to_string()))
    }

    pub fn get(&self) -> usize {
        self.0.get()
    }
}

impl Display for BatchSize {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl FromStr for BatchSize {
    type Err = ValueError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let parsed: usize = value.trim().parse()?;
        BatchSize::new(parsed)
    }
}
