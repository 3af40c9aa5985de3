//! Activation schedules.

use ferroclust_common::config::ScheduleConfig;
use ferroclust_common::error::{FerroclustError, Result};
use serde::{Deserialize, Serialize};

/// Predicate over the 1-based iteration number: active iff
/// `iteration >= start` and `(iteration - start) % period == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    start: u32,
    period: u32,
}

impl Schedule {
    /// A non-positive `period` is a configuration error.
    pub fn new(start: u32, period: i64) -> Result<Self> {
        if period <= 0 {
            return Err(FerroclustError::Config(format!(
                "schedule period must be positive, got {period}"
            )));
        }
        let period = u32::try_from(period).map_err(|_| {
            FerroclustError::Config(format!("schedule period {period} is out of range"))
        })?;
        Ok(Self { start, period })
    }

    /// Active from the first iteration on, every iteration.
    pub fn every_iteration() -> Self {
        Self { start: 1, period: 1 }
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn period(&self) -> u32 {
        self.period
    }

    pub fn is_active(&self, iteration: u32) -> bool {
        iteration >= self.start && (iteration - self.start) % self.period == 0
    }
}

impl TryFrom<ScheduleConfig> for Schedule {
    type Error = FerroclustError;

    fn try_from(config: ScheduleConfig) -> Result<Self> {
        Self::new(config.start, config.period)
    }
}
