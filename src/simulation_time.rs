use crate::core::units::{HOURS_PER_DAY, HOURS_PER_MONTH, HOURS_PER_YEAR, MONTHS_PER_YEAR};
use serde::{Deserialize, Serialize};
use serde_valid::Validate;
use thiserror::Error;

/// A window `[start, end)` of hours within the annual hour index, sampled every `step` hours.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize, Validate)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(deny_unknown_fields)]
pub struct SimulationTime {
    #[validate(maximum = 8759)]
    pub start: u32,
    #[validate(minimum = 1)]
    #[validate(maximum = 8760)]
    pub end: u32,
    #[serde(default = "default_step")]
    #[validate(minimum = 1)]
    pub step: u32,
}

fn default_step() -> u32 {
    1
}

#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum InvalidSimulationTime {
    #[error("Simulation start hour {start} must be before end hour {end}")]
    EmptyWindow { start: u32, end: u32 },
    #[error("Simulation end hour {0} is beyond the end of the year ({HOURS_PER_YEAR})")]
    BeyondEndOfYear(u32),
    #[error("Sampling step must be at least one hour")]
    ZeroStep,
}

impl SimulationTime {
    pub fn new(start: u32, end: u32, step: u32) -> Result<Self, InvalidSimulationTime> {
        let simulation_time = Self { start, end, step };
        simulation_time.check()?;

        Ok(simulation_time)
    }

    /// Cross-field checks that the per-field range validation cannot express.
    pub fn check(&self) -> Result<(), InvalidSimulationTime> {
        if self.step == 0 {
            return Err(InvalidSimulationTime::ZeroStep);
        }
        if self.end > HOURS_PER_YEAR {
            return Err(InvalidSimulationTime::BeyondEndOfYear(self.end));
        }
        if self.start >= self.end {
            return Err(InvalidSimulationTime::EmptyWindow {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }

    pub fn total_hours(&self) -> usize {
        (self.end - self.start) as usize
    }

    pub fn total_steps(&self) -> usize {
        self.total_hours().div_ceil(self.step as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = SimulationTimeIteration> + '_ {
        (self.start..self.end)
            .step_by(self.step as usize)
            .enumerate()
            .map(|(index, hour)| SimulationTimeIteration { index, hour })
    }

    /// Absolute start hour of every day that overlaps the window, in order.
    pub fn day_start_hours(&self) -> impl Iterator<Item = u32> {
        let first_day = self.start / HOURS_PER_DAY;
        let last_day = (self.end - 1) / HOURS_PER_DAY;
        (first_day..=last_day).map(|day| day * HOURS_PER_DAY)
    }

    pub fn contains(&self, hour: u32) -> bool {
        (self.start..self.end).contains(&hour)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationTimeIteration {
    /// Position of this sample within the window
    pub index: usize,
    /// Absolute hour of the year
    pub hour: u32,
}

/// Zero-based month for an hour of the year, wrapping to January after 8760 hours.
pub fn month_index_for_hour(hour: u32) -> usize {
    let hour_of_year = hour % HOURS_PER_YEAR;
    ((hour_of_year / HOURS_PER_MONTH).min(MONTHS_PER_YEAR - 1)) as usize
}

/// How far through its month an hour lies, in `[0, 1)`.
pub fn fraction_of_month(hour: u32) -> f64 {
    (hour % HOURS_PER_MONTH) as f64 / HOURS_PER_MONTH as f64
}
