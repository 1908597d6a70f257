//! The seam to the external electrochemical/thermal battery simulator.
//!
//! The simulator is configured with a model, a set of model options, a mapping of named
//! physical parameters to values and an experiment script, and on success yields the
//! volumetric heat generation (W/m3) across its spatial discretisation for every output
//! time step.

use crate::core::units::MILLIAMPS_PER_AMP;
use crate::statistics::mean;
use indexmap::IndexMap;
use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimulatorError {
    #[error("Battery simulation did not converge: {0}")]
    Divergence(String),
    #[error("Could not run battery simulator: {0}")]
    Launch(#[from] io::Error),
    #[error("Battery simulator returned a malformed solution: {0}")]
    MalformedSolution(String),
}

pub trait ElectrochemicalSimulator {
    fn solve(&self, request: &SimulationRequest) -> Result<HeatGenerationSolution, SimulatorError>;
}

impl<T: ElectrochemicalSimulator + ?Sized> ElectrochemicalSimulator for &T {
    fn solve(&self, request: &SimulationRequest) -> Result<HeatGenerationSolution, SimulatorError> {
        (**self).solve(request)
    }
}

impl<T: ElectrochemicalSimulator + ?Sized> ElectrochemicalSimulator for Box<T> {
    fn solve(&self, request: &SimulationRequest) -> Result<HeatGenerationSolution, SimulatorError> {
        (**self).solve(request)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SimulationRequest {
    pub model: String,
    pub options: IndexMap<String, String>,
    pub parameters: IndexMap<String, f64>,
    pub experiment: Experiment,
}

impl SimulationRequest {
    pub fn parameter(&self, name: &str) -> Option<f64> {
        self.parameters.get(name).copied()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ExperimentStep {
    /// Discharge at a C-rate until a cut-off voltage, for at most `max_hours`
    Discharge {
        c_rate: f64,
        max_hours: f64,
        cutoff_voltage: f64,
    },
    Rest { hours: f64 },
    /// Constant-current charge (A) up to a cut-off voltage
    Charge { current: f64, cutoff_voltage: f64 },
    /// Constant-voltage hold until the current tapers to `cutoff_current` (A)
    Hold { voltage: f64, cutoff_current: f64 },
}

impl Display for ExperimentStep {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ExperimentStep::Discharge {
                c_rate,
                max_hours,
                cutoff_voltage,
            } => write!(
                f,
                "Discharge at {c_rate}C for {max_hours} {} or until {cutoff_voltage} V",
                hours_unit(*max_hours)
            ),
            ExperimentStep::Rest { hours } => write!(f, "Rest for {hours} {}", hours_unit(*hours)),
            ExperimentStep::Charge {
                current,
                cutoff_voltage,
            } => write!(f, "Charge at {current} A until {cutoff_voltage} V"),
            ExperimentStep::Hold {
                voltage,
                cutoff_current,
            } => write!(
                f,
                "Hold at {voltage} V until {} mA",
                cutoff_current * MILLIAMPS_PER_AMP as f64
            ),
        }
    }
}

fn hours_unit(hours: f64) -> &'static str {
    if hours == 1. {
        "hour"
    } else {
        "hours"
    }
}

/// A cycle of steps run a number of times in succession.
#[derive(Clone, Debug, PartialEq)]
pub struct Experiment {
    cycle: Vec<ExperimentStep>,
    cycles: u32,
}

impl Experiment {
    pub fn new(cycle: Vec<ExperimentStep>, cycles: u32) -> Self {
        Self { cycle, cycles }
    }

    /// Discharge at 4C, rest, charge at 1 A then hold at 4.1 V, rest; repeated `cycles` times.
    pub fn discharge_rest_charge(cycles: u32) -> Self {
        Self::new(
            vec![
                ExperimentStep::Discharge {
                    c_rate: 4.,
                    max_hours: 10.,
                    cutoff_voltage: 3.3,
                },
                ExperimentStep::Rest { hours: 1. },
                ExperimentStep::Charge {
                    current: 1.,
                    cutoff_voltage: 4.1,
                },
                ExperimentStep::Hold {
                    voltage: 4.1,
                    cutoff_current: 0.05,
                },
                ExperimentStep::Rest { hours: 1. },
            ],
            cycles,
        )
    }

    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    pub fn steps(&self) -> impl Iterator<Item = &ExperimentStep> {
        (0..self.cycles).flat_map(move |_| self.cycle.iter())
    }
}

impl Serialize for Experiment {
    /// Serialised as a list of cycles, each a list of step instructions.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let cycle = self.cycle.iter().map(ToString::to_string).collect::<Vec<_>>();
        let mut seq = serializer.serialize_seq(Some(self.cycles as usize))?;
        for _ in 0..self.cycles {
            seq.serialize_element(&cycle)?;
        }
        seq.end()
    }
}

/// Volumetric heat generation (W/m3), one row per spatial point and one column per time step.
#[derive(Clone, Debug, PartialEq)]
pub struct HeatGenerationSolution {
    entries: Vec<Vec<f64>>,
}

impl HeatGenerationSolution {
    pub fn new(entries: Vec<Vec<f64>>) -> Result<Self, SimulatorError> {
        let time_steps = entries.first().map(Vec::len).unwrap_or_default();
        if time_steps == 0 {
            return Err(SimulatorError::Divergence(
                "solution contains no time steps".to_string(),
            ));
        }
        if let Some(row) = entries.iter().position(|row| row.len() != time_steps) {
            return Err(SimulatorError::MalformedSolution(format!(
                "spatial point {row} has {} time steps, expected {time_steps}",
                entries[row].len()
            )));
        }
        if entries.iter().flatten().any(|value| !value.is_finite()) {
            return Err(SimulatorError::Divergence(
                "solution contains non-finite heat generation".to_string(),
            ));
        }

        Ok(Self { entries })
    }

    pub fn time_steps(&self) -> usize {
        self.entries[0].len()
    }

    /// Heat generation summed over the spatial discretisation, per time step
    pub fn totals_per_time_step(&self) -> Vec<f64> {
        (0..self.time_steps())
            .map(|t_idx| self.entries.iter().map(|row| row[t_idx]).sum())
            .collect()
    }

    /// Mean over all time steps of the spatially summed heat generation (W/m3)
    pub fn mean_total_heating(&self) -> f64 {
        mean(&self.totals_per_time_step())
    }
}
