//! Heat generated by the battery installation, from an external electrochemical simulation
//! of a single cell scaled up to every cell in the housing.

pub mod external_process;
pub mod recorded;
pub mod simulator;

use crate::core::units::{millimetres_to_metres, JOULES_PER_KILOJOULE};
use crate::input::{BatterySimulation, InstallationScaling};
use crate::read_reference_data::{ReferenceDataLookupError, Table};
use indexmap::IndexMap;
use simulator::{ElectrochemicalSimulator, Experiment, SimulationRequest, SimulatorError};
use tracing::{debug, warn};

const POSITIVE_CURRENT_COLLECTOR: &str = "Positive current collector";
const NEGATIVE_CURRENT_COLLECTOR: &str = "Negative current collector";
const NEGATIVE_ELECTRODE: &str = "Negative electrode";
const POSITIVE_ELECTRODE: &str = "Positive electrode";
const SEPARATOR: &str = "Separator";

const THICKNESS: &str = "Thickness [m]";

/// Cell construction and how many cells make up the installation.
#[derive(Clone, Debug, PartialEq)]
pub struct BatteryInstallation {
    /// all thicknesses in m
    pub positive_current_collector_thickness: f64,
    pub negative_current_collector_thickness: f64,
    pub negative_electrode_thickness: f64,
    pub positive_electrode_thickness: f64,
    pub separator_thickness: f64,
    pub separator_porosity: f64,
    /// in m
    pub cell_width: f64,
    /// in m
    pub cell_length: f64,
    pub cells_per_module: u32,
    pub modules_per_rack: u32,
    pub racks: u32,
}

impl BatteryInstallation {
    pub fn from_tables(
        cell: &Table,
        module: &Table,
        rack: &Table,
        housing: &Table,
    ) -> Result<Self, ReferenceDataLookupError> {
        Ok(Self {
            positive_current_collector_thickness: cell
                .lookup_numeric(POSITIVE_CURRENT_COLLECTOR, THICKNESS)?,
            negative_current_collector_thickness: cell
                .lookup_numeric(NEGATIVE_CURRENT_COLLECTOR, THICKNESS)?,
            negative_electrode_thickness: cell.lookup_numeric(NEGATIVE_ELECTRODE, THICKNESS)?,
            positive_electrode_thickness: cell.lookup_numeric(POSITIVE_ELECTRODE, THICKNESS)?,
            separator_thickness: cell.lookup_numeric(SEPARATOR, THICKNESS)?,
            separator_porosity: cell.lookup_numeric(SEPARATOR, "Porosity (%)")?,
            cell_width: millimetres_to_metres(cell.lookup_numeric(NEGATIVE_ELECTRODE, "Width [mm]")?),
            cell_length: millimetres_to_metres(
                cell.lookup_numeric(NEGATIVE_ELECTRODE, "Length [mm]")?,
            ),
            cells_per_module: module.lookup_count("Cell", "Number per module")?,
            modules_per_rack: rack.lookup_count("Module", "Number per rack")?,
            racks: housing.lookup_count("Rack", "Number")?,
        })
    }

    /// Volume of one cell (m3); its thickness is two negative electrodes plus an allowance
    pub fn cell_volume(&self, thickness_allowance: f64) -> f64 {
        (self.negative_electrode_thickness * 2. + thickness_allowance)
            * self.cell_width
            * self.cell_length
    }

    /// Cells in the whole housing; kept as a float since the product can exceed `u32`
    pub fn total_cells(&self) -> f64 {
        self.cells_per_module as f64 * self.modules_per_rack as f64 * self.racks as f64
    }
}

/// Reduces a simulated charge/discharge/rest cycle to one representative heat output for
/// the whole installation.
#[derive(Debug)]
pub struct BatteryHeatModel<'a, S> {
    simulator: S,
    installation: &'a BatteryInstallation,
    settings: &'a BatterySimulation,
}

impl<'a, S: ElectrochemicalSimulator> BatteryHeatModel<'a, S> {
    pub fn new(
        simulator: S,
        installation: &'a BatteryInstallation,
        settings: &'a BatterySimulation,
    ) -> Self {
        Self {
            simulator,
            installation,
            settings,
        }
    }

    /// The simulator configuration for a cell held at `ambient_temperature` (K)
    pub fn simulation_request(&self, ambient_temperature: f64) -> SimulationRequest {
        let installation = self.installation;
        let settings = self.settings;

        let parameters = IndexMap::from([
            ("Ambient temperature [K]".to_string(), ambient_temperature),
            (
                "Negative current collector thickness [m]".to_string(),
                installation.negative_current_collector_thickness,
            ),
            (
                "Positive current collector thickness [m]".to_string(),
                installation.positive_current_collector_thickness,
            ),
            (
                "Negative electrode active material volume fraction".to_string(),
                settings.negative_electrode_active_material_volume_fraction,
            ),
            (
                "Negative electrode porosity".to_string(),
                settings.negative_electrode_porosity,
            ),
            (
                "Negative electrode thickness [m]".to_string(),
                installation.negative_electrode_thickness,
            ),
            (
                "Positive electrode active material volume fraction".to_string(),
                settings.positive_electrode_active_material_volume_fraction,
            ),
            (
                "Positive electrode porosity".to_string(),
                settings.positive_electrode_porosity,
            ),
            (
                "Positive electrode thickness [m]".to_string(),
                installation.positive_electrode_thickness,
            ),
            (
                "Separator porosity".to_string(),
                installation.separator_porosity,
            ),
            (
                "Separator thickness [m]".to_string(),
                installation.separator_thickness,
            ),
        ]);

        SimulationRequest {
            model: settings.model.clone(),
            options: IndexMap::from([("thermal".to_string(), settings.thermal_option.clone())]),
            parameters,
            experiment: Experiment::discharge_rest_charge(settings.cycles),
        }
    }

    /// Average heat generated by the whole installation over the simulated cycles, in kJ
    pub fn average_heat(&self, ambient_temperature: f64) -> Result<f64, SimulatorError> {
        let request = self.simulation_request(ambient_temperature);
        let solution = self.simulator.solve(&request)?;
        let mean_heating = solution.mean_total_heating();

        let scaling = self.settings.installation_scaling;
        if scaling == InstallationScaling::Squared {
            warn!("Scaling battery heat by the square of the installed cell count");
        }
        let installed = self.installation.total_cells().powi(scaling.exponent());
        let cell_volume = self
            .installation
            .cell_volume(self.settings.cell_thickness_allowance);

        let heat = mean_heating * cell_volume * installed / JOULES_PER_KILOJOULE as f64;
        debug!(
            "battery heat {heat} kJ from mean heating {mean_heating} W/m3 over {} time steps",
            solution.time_steps()
        );

        Ok(heat)
    }
}
