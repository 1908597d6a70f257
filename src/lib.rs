pub mod core;
pub mod errors;
pub mod external_conditions;
pub mod input;
pub mod output;
pub mod read_reference_data;
pub mod simulation_time;
mod statistics;

pub use crate::core::thermal_balance::{SizingAttempt, SizingOutcome, Verdict};
pub use crate::errors::BessThermalError;

use crate::core::battery::simulator::ElectrochemicalSimulator;
use crate::core::battery::{BatteryHeatModel, BatteryInstallation};
use crate::core::cooling_systems::hvac_unit::HvacUnit;
use crate::core::housing::{EnvelopeHeatModel, HousingGeometry};
use crate::core::thermal_balance::{HeatSources, ThermalBalance};
use crate::core::units::{fahrenheit_to_kelvin, kelvin_to_fahrenheit};
use crate::errors::OutputError;
use crate::external_conditions::{ClimateNormals, ClimateSeriesBuilder};
use crate::input::ingest_input;
use crate::output::Output;
use crate::read_reference_data::load_table;
use crate::simulation_time::SimulationTime;
use csv::WriterBuilder;
use itertools::izip;
use std::io::Read;
use tracing::{debug, info, instrument};

pub const CLIMATE_SHEET: &str = "climate";
pub const COMPONENTS_SHEET: &str = "components";

/// Runs a thermal simulation of the housing described by the components sheet, in the
/// climate of the input's region, adding HVAC units until the interior is held close enough
/// to the set-point.
///
/// Arguments:
/// * `input` - JSON run input
/// * `climate_sheet` - CSV of monthly temperature normals, one table per region
/// * `components_sheet` - CSV of cell, module, rack and housing configuration
/// * `simulator` - source of the battery cell's heat generation
/// * `output` - where the `results` and `results_summary` CSV files are written
#[instrument(skip_all)]
pub fn run_project(
    input: impl Read,
    climate_sheet: impl Read,
    components_sheet: impl Read,
    simulator: impl ElectrochemicalSimulator,
    output: impl Output,
) -> Result<SizingOutcome, BessThermalError> {
    let input = ingest_input(input)?;

    let climate = load_table(CLIMATE_SHEET, climate_sheet, "region", "month")?;
    let components = load_table(
        COMPONENTS_SHEET,
        components_sheet,
        "configuration",
        "component",
    )?;

    let normals = ClimateNormals::from_table(climate.table(&input.region)?)?;
    let ambient = ClimateSeriesBuilder::new(&normals).build(&input.simulation_time);
    debug!("built ambient series of {} hours", ambient.len());

    let housing = HousingGeometry::from_table(components.table("housing")?)?;
    let installation = BatteryInstallation::from_tables(
        components.table("cell")?,
        components.table("module")?,
        components.table("rack")?,
        components.table("housing")?,
    )?;

    let set_point = fahrenheit_to_kelvin(input.set_point);
    let constants = input.physical_constants;

    let envelope = EnvelopeHeatModel::new(&housing, constants.convection_coefficient);
    let convective = envelope.convective_heat_gain(
        &ambient,
        set_point,
        input.simulation_time.step as usize,
    );

    // the cell is simulated with its surroundings held at the set-point
    let battery = BatteryHeatModel::new(simulator, &installation, &input.battery_simulation)
        .average_heat(set_point)?;

    let balance = ThermalBalance::new(
        &ambient,
        HeatSources {
            convective,
            battery,
            hvac_unit: HvacUnit::from_housing(&housing),
        },
        envelope.effective_mass(),
        constants.specific_heat,
        set_point,
    );

    let initial_unit_count = input
        .initial_hvac_units
        .unwrap_or(housing.hvac_units_installed);
    let outcome = balance.size_hvac(initial_unit_count, input.max_sizing_attempts)?;
    info!(
        "sized HVAC at {} unit(s) after {} attempt(s)",
        outcome.unit_count,
        outcome.attempts.len()
    );

    if !output.is_noop() {
        write_results_file(&output, &input.simulation_time, &ambient, &outcome)
            .map_err(OutputError::new)?;
        write_results_summary_file(&output, &outcome).map_err(OutputError::new)?;
    }

    Ok(outcome)
}

fn write_results_file(
    output: &impl Output,
    simulation_time: &SimulationTime,
    ambient: &[f64],
    outcome: &SizingOutcome,
) -> anyhow::Result<()> {
    let writer = output.writer_for_location_key("results", "csv")?;
    let mut writer = WriterBuilder::new().flexible(true).from_writer(writer);

    writer.write_record([
        "Hour",
        "Ambient temp",
        "Interior temp",
        "Ambient temp",
        "Interior temp",
    ])?;
    writer.write_record(["[hour]", "[K]", "[K]", "[ºF]", "[ºF]"])?;

    for (step, ambient, interior) in izip!(
        simulation_time.iter(),
        ambient.iter().step_by(simulation_time.step as usize),
        &outcome.trace
    ) {
        writer.write_record([
            step.hour.to_string(),
            ambient.to_string(),
            interior.to_string(),
            kelvin_to_fahrenheit(*ambient).to_string(),
            kelvin_to_fahrenheit(*interior).to_string(),
        ])?;
    }

    writer.flush()?;

    Ok(())
}

fn write_results_summary_file(output: &impl Output, outcome: &SizingOutcome) -> anyhow::Result<()> {
    let writer = output.writer_for_location_key("results_summary", "csv")?;
    let mut writer = WriterBuilder::new().flexible(true).from_writer(writer);

    writer.write_record(["HVAC sizing attempts"])?;
    writer.write_record(["Unit count", "Average interior temp", "Verdict"])?;
    writer.write_record(["[count]", "[K]", ""])?;
    for attempt in &outcome.attempts {
        writer.write_record([
            attempt.unit_count.to_string(),
            attempt.average_temperature.to_string(),
            attempt.verdict.to_string(),
        ])?;
    }

    let trace = &outcome.trace;
    writer.write_record([""])?;
    writer.write_record(["Interior temperature of accepted sizing"])?;
    writer.write_record([
        "HVAC units".to_string(),
        outcome.unit_count.to_string(),
        "[count]".to_string(),
    ])?;
    for (label, value) in [
        ("Minimum", statistics::min(trace)),
        ("Maximum", statistics::max(trace)),
        ("Mean", statistics::mean(trace)),
        ("95th percentile", statistics::percentile(trace, 95)),
    ] {
        writer.write_record([label.to_string(), value.to_string(), "[K]".to_string()])?;
    }

    writer.flush()?;

    Ok(())
}
