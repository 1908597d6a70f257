use crate::core::units::millimetres_to_metres;
use crate::read_reference_data::{ReferenceDataLookupError, Table};

const RACK_ROW: &str = "Rack";
const ENCLOSURE_ROW: &str = "Enclosure";
const HVAC_ROW: &str = "HVAC";

/// Dimensions and mass of the housing, and the HVAC equipment installed in it.
#[derive(Clone, Debug, PartialEq)]
pub struct HousingGeometry {
    /// in m
    pub width: f64,
    /// in m
    pub height: f64,
    /// in m
    pub depth: f64,
    /// in kg
    pub mass: f64,
    /// rated cooling capacity of one HVAC unit, in BTU
    pub hvac_cooling_capacity: f64,
    pub hvac_units_installed: u32,
    pub racks: u32,
}

impl HousingGeometry {
    pub fn from_table(housing: &Table) -> Result<Self, ReferenceDataLookupError> {
        Ok(Self {
            width: millimetres_to_metres(housing.lookup_numeric(ENCLOSURE_ROW, "Width (mm)")?),
            height: millimetres_to_metres(housing.lookup_numeric(ENCLOSURE_ROW, "Height (mm)")?),
            depth: millimetres_to_metres(housing.lookup_numeric(ENCLOSURE_ROW, "Depth (mm)")?),
            mass: housing.lookup_numeric(ENCLOSURE_ROW, "Weight (kg)")?,
            hvac_cooling_capacity: housing.lookup_numeric(HVAC_ROW, "BTU Rating (cooling)")?,
            hvac_units_installed: housing.lookup_count(HVAC_ROW, "Number")?,
            racks: housing.lookup_count(RACK_ROW, "Number")?,
        })
    }

    /// Surface area of the enclosure (m2), counting all three pairs of faces
    pub fn total_area(&self) -> f64 {
        2. * self.depth * self.height + 2. * self.height * self.width + 2. * self.depth * self.width
    }

    /// Surface area (m2) less one footprint, which is taken up by rack mounting
    pub fn used_area(&self) -> f64 {
        self.total_area() - self.depth * self.width
    }

    /// Mass of the housing (kg) prorated to the area in use
    pub fn effective_mass(&self) -> f64 {
        self.mass / self.total_area() * self.used_area()
    }
}

/// Convective heat exchange between the outside air and the housing envelope.
#[derive(Debug)]
pub struct EnvelopeHeatModel<'a> {
    geometry: &'a HousingGeometry,
    /// in W/(m2.K)
    convection_coefficient: f64,
}

impl<'a> EnvelopeHeatModel<'a> {
    pub fn new(geometry: &'a HousingGeometry, convection_coefficient: f64) -> Self {
        Self {
            geometry,
            convection_coefficient,
        }
    }

    /// Heat gain for every `step`th hour of the ambient series, given the interior set-point
    /// (K). Positive where the set-point is warmer than the ambient air.
    pub fn convective_heat_gain(&self, ambient: &[f64], set_point: f64, step: usize) -> Vec<f64> {
        let total_area = self.geometry.total_area();
        ambient
            .iter()
            .step_by(step.max(1))
            .map(|temp| self.convection_coefficient * total_area * (set_point - temp))
            .collect()
    }

    pub fn effective_mass(&self) -> f64 {
        self.geometry.effective_mass()
    }
}
