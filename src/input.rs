use crate::simulation_time::SimulationTime;
use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use serde_valid::Validate;
use std::io::Read;

pub fn ingest_input(json: impl Read) -> Result<Input, anyhow::Error> {
    let input: Input = serde_json::from_reader(json)?;
    input
        .validate()
        .and_then(|_| input.simulation_time.validate())
        .and_then(|_| input.physical_constants.validate())
        .and_then(|_| input.battery_simulation.validate())
        .map_err(|e| anyhow!("Input failed validation: {e}"))?;
    input.simulation_time.check()?;

    Ok(input)
}

#[derive(Debug, Deserialize, Validate)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct Input {
    /// Selects the region's table in the climate sheet
    pub region: String,
    pub simulation_time: SimulationTime,
    /// Interior set-point, in ºF
    #[serde(default = "default_set_point")]
    pub set_point: f64,
    /// Overrides the HVAC unit count given in the housing configuration; zero starts sizing
    /// from no HVAC at all
    pub initial_hvac_units: Option<u32>,
    #[serde(default = "default_max_sizing_attempts")]
    #[validate(minimum = 1)]
    pub max_sizing_attempts: u32,
    #[serde(default)]
    pub physical_constants: PhysicalConstants,
    #[serde(default)]
    pub battery_simulation: BatterySimulation,
}

fn default_set_point() -> f64 {
    75.
}

fn default_max_sizing_attempts() -> u32 {
    100
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize, Validate)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(deny_unknown_fields)]
pub struct PhysicalConstants {
    /// Specific heat at constant pressure of the housing (a steel/air average), in kJ/(kg.K)
    #[validate(exclusive_minimum = 0.)]
    pub specific_heat: f64,
    /// Convection heat transfer coefficient of the envelope, in W/(m2.K)
    #[validate(minimum = 0.)]
    pub convection_coefficient: f64,
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        Self {
            specific_heat: 0.7585,
            convection_coefficient: 10.,
        }
    }
}

/// How the heat of one cell is scaled up to the whole installation.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(rename_all = "snake_case")]
pub enum InstallationScaling {
    /// By the square of the installed cell count, as legacy results were calculated
    #[default]
    Squared,
    /// By the installed cell count
    Linear,
}

impl InstallationScaling {
    pub fn exponent(&self) -> i32 {
        match self {
            InstallationScaling::Squared => 2,
            InstallationScaling::Linear => 1,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize, Validate)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(deny_unknown_fields, default)]
pub struct BatterySimulation {
    pub model: String,
    pub thermal_option: String,
    #[validate(minimum = 1)]
    pub cycles: u32,
    #[validate(minimum = 0.)]
    #[validate(maximum = 1.)]
    pub negative_electrode_active_material_volume_fraction: f64,
    #[validate(minimum = 0.)]
    #[validate(maximum = 1.)]
    pub negative_electrode_porosity: f64,
    #[validate(minimum = 0.)]
    #[validate(maximum = 1.)]
    pub positive_electrode_active_material_volume_fraction: f64,
    #[validate(minimum = 0.)]
    #[validate(maximum = 1.)]
    pub positive_electrode_porosity: f64,
    /// Added to twice the negative electrode thickness to give the cell thickness, in m
    #[validate(minimum = 0.)]
    pub cell_thickness_allowance: f64,
    pub installation_scaling: InstallationScaling,
}

impl Default for BatterySimulation {
    fn default() -> Self {
        Self {
            model: "SPMe".to_string(),
            thermal_option: "x-full".to_string(),
            cycles: 3,
            negative_electrode_active_material_volume_fraction: 0.75,
            negative_electrode_porosity: 0.25,
            positive_electrode_active_material_volume_fraction: 0.665,
            positive_electrode_porosity: 0.335,
            cell_thickness_allowance: 0.000025,
            installation_scaling: Default::default(),
        }
    }
}
