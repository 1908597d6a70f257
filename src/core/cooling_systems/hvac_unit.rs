use crate::core::housing::HousingGeometry;
use crate::core::units::btu_to_kilojoules;

/// This module provides the cooling model for the HVAC units fitted to a housing.

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HvacUnit {
    cooling_capacity_in_btu: f64,
}

impl HvacUnit {
    /// Construct an HVAC unit
    ///
    /// Arguments:
    /// * `cooling_capacity_in_btu` - rated cooling capacity of one unit, in BTU
    pub fn new(cooling_capacity_in_btu: f64) -> Self {
        Self {
            cooling_capacity_in_btu,
        }
    }

    pub fn from_housing(housing: &HousingGeometry) -> Self {
        Self::new(housing.hvac_cooling_capacity)
    }

    /// Heat removed by one unit, in kJ
    pub fn heat_removal(&self) -> f64 {
        btu_to_kilojoules(self.cooling_capacity_in_btu)
    }

    /// Heat removed by `unit_count` units running at `duty` of their rated capacity, in kJ
    pub fn heat_removal_for(&self, unit_count: u32, duty: f64) -> f64 {
        self.heat_removal() * unit_count as f64 * duty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::*;

    #[fixture]
    fn hvac_unit() -> HvacUnit {
        HvacUnit::new(10_000.)
    }

    #[rstest]
    fn test_heat_removal(hvac_unit: HvacUnit) {
        assert_relative_eq!(hvac_unit.heat_removal(), 10_550.56, epsilon = 1e-9);
    }

    #[rstest]
    #[case(0, 1., 0.)]
    #[case(1, 1., 10_550.56)]
    #[case(3, 1., 31_651.68)]
    #[case(3, 0.5, 15_825.84)]
    fn test_heat_removal_for_unit_count(
        hvac_unit: HvacUnit,
        #[case] unit_count: u32,
        #[case] duty: f64,
        #[case] expected: f64,
    ) {
        assert_relative_eq!(
            hvac_unit.heat_removal_for(unit_count, duty),
            expected,
            epsilon = 1e-9
        );
    }
}
