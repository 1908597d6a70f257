//! Lumped-capacitance energy balance of the housing interior, and the search for the number
//! of HVAC units needed to hold it near its set-point.

use crate::core::cooling_systems::hvac_unit::HvacUnit;
use crate::core::units::offset_kelvin_by_fahrenheit;
use crate::statistics::mean;
use serde::Serialize;
use strum::Display;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Half-width of the acceptable band around the set-point, in ºF
const ACCEPTANCE_BAND_F: f64 = 10.;
/// Fraction of rated HVAC capacity applied while the interior is at or below set-point
const STANDBY_DUTY: f64 = 0.5;

#[derive(Clone, Copy, Debug, Display, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Verdict {
    WithinBand,
    /// Adding a unit raised the average; escalation stops here
    NoLongerImproving,
    Rejected,
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Verdict::Rejected)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AcceptanceBand {
    /// in K
    pub lower: f64,
    /// in K
    pub upper: f64,
}

impl AcceptanceBand {
    pub fn around(set_point: f64) -> Self {
        Self {
            lower: offset_kelvin_by_fahrenheit(set_point, -ACCEPTANCE_BAND_F),
            upper: offset_kelvin_by_fahrenheit(set_point, ACCEPTANCE_BAND_F),
        }
    }

    pub fn verdict(&self, average: f64, previous_average: f64) -> Verdict {
        if (self.lower..=self.upper).contains(&average) {
            Verdict::WithinBand
        } else if average > previous_average {
            Verdict::NoLongerImproving
        } else {
            Verdict::Rejected
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SizingAttempt {
    pub unit_count: u32,
    /// Mean interior temperature over the trace, in K
    pub average_temperature: f64,
    pub verdict: Verdict,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SizingOutcome {
    pub unit_count: u32,
    /// Interior temperature (K) at the start of each sampled hour
    pub trace: Vec<f64>,
    pub attempts: Vec<SizingAttempt>,
}

impl SizingOutcome {
    pub fn accepted_attempt(&self) -> Option<&SizingAttempt> {
        self.attempts.last().filter(|attempt| attempt.verdict.is_accepted())
    }
}

#[derive(Clone, Copy, Debug, Error, PartialEq)]
#[error("No acceptable HVAC sizing found after {attempts} attempts (last tried {last_unit_count} units, average interior temperature {last_average_temperature} K)")]
pub struct SizingNotAchieved {
    pub attempts: u32,
    pub last_unit_count: u32,
    pub last_average_temperature: f64,
}

/// Heat flows into and out of the housing, each in kJ per sampled hour.
#[derive(Clone, Debug, PartialEq)]
pub struct HeatSources {
    pub convective: Vec<f64>,
    pub battery: f64,
    pub hvac_unit: HvacUnit,
}

#[derive(Debug)]
pub struct ThermalBalance<'a> {
    ambient: &'a [f64],
    heat: HeatSources,
    /// thermal capacity of the housing, in kJ/K
    heat_capacity: f64,
    /// in K
    set_point: f64,
}

impl<'a> ThermalBalance<'a> {
    /// Arguments:
    /// * `ambient` - hourly ambient temperature, in K; the first value seeds the interior
    /// * `heat` - convective gain, battery heat and HVAC removal
    /// * `effective_mass` - housing mass taking part in the exchange, in kg
    /// * `specific_heat` - in kJ/(kg.K)
    /// * `set_point` - interior set-point, in K
    pub fn new(
        ambient: &'a [f64],
        heat: HeatSources,
        effective_mass: f64,
        specific_heat: f64,
        set_point: f64,
    ) -> Self {
        Self {
            ambient,
            heat,
            heat_capacity: effective_mass * specific_heat,
            set_point,
        }
    }

    /// Interior temperature trace for a given number of HVAC units.
    ///
    /// Each value is the temperature entering that hour; the hour's net heat then moves the
    /// interior on by one explicit step. HVAC runs at full capacity while the interior is above
    /// set-point and at half capacity otherwise.
    pub fn simulate(&self, unit_count: u32) -> Vec<f64> {
        let Some(&seed) = self.ambient.first() else {
            return vec![];
        };
        let full_removal = self.heat.hvac_unit.heat_removal_for(unit_count, 1.);
        let standby_removal = self.heat.hvac_unit.heat_removal_for(unit_count, STANDBY_DUTY);

        let mut trace = Vec::with_capacity(self.heat.convective.len());
        let mut temperature = seed;
        for convective in &self.heat.convective {
            trace.push(temperature);
            let removal = if temperature > self.set_point {
                full_removal
            } else {
                standby_removal
            };
            temperature += (convective + self.heat.battery - removal) / self.heat_capacity;
        }

        trace
    }

    /// Add HVAC units one at a time, from `initial_unit_count`, until the mean interior
    /// temperature is acceptable.
    #[instrument(skip(self))]
    pub fn size_hvac(
        &self,
        initial_unit_count: u32,
        max_attempts: u32,
    ) -> Result<SizingOutcome, SizingNotAchieved> {
        let band = AcceptanceBand::around(self.set_point);
        debug!(
            "acceptance band {} K to {} K about set-point {} K",
            band.lower, band.upper, self.set_point
        );

        let mut attempts = vec![];
        let mut previous_average = f64::INFINITY;
        let mut unit_count = initial_unit_count;

        loop {
            let trace = self.simulate(unit_count);
            let average_temperature = mean(&trace);
            let verdict = band.verdict(average_temperature, previous_average);
            attempts.push(SizingAttempt {
                unit_count,
                average_temperature,
                verdict,
            });

            match verdict {
                Verdict::WithinBand => {
                    info!("HVAC is sufficient with {unit_count} unit(s), average interior temperature {average_temperature} K");
                }
                Verdict::NoLongerImproving => {
                    warn!("Average interior temperature rose to {average_temperature} K with {unit_count} unit(s) (previously {previous_average} K); stopping");
                }
                Verdict::Rejected => {
                    info!("HVAC is not sufficient with {unit_count} unit(s), average interior temperature {average_temperature} K");
                }
            }

            if verdict.is_accepted() {
                return Ok(SizingOutcome {
                    unit_count,
                    trace,
                    attempts,
                });
            }
            if attempts.len() >= max_attempts as usize {
                return Err(SizingNotAchieved {
                    attempts: attempts.len() as u32,
                    last_unit_count: unit_count,
                    last_average_temperature: average_temperature,
                });
            }

            previous_average = average_temperature;
            unit_count += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::units::fahrenheit_to_kelvin;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    /// An HVAC unit removing exactly `kj` kJ per hour
    fn hvac_removing(kj: f64) -> HvacUnit {
        HvacUnit::new(kj / 1.055056)
    }

    fn balance(
        ambient: &[f64],
        convective: Vec<f64>,
        battery: f64,
        set_point: f64,
    ) -> ThermalBalance<'_> {
        ThermalBalance::new(
            ambient,
            HeatSources {
                convective,
                battery,
                hvac_unit: hvac_removing(100.),
            },
            100.,
            1.,
            set_point,
        )
    }

    #[fixture]
    fn set_point() -> f64 {
        fahrenheit_to_kelvin(75.)
    }

    #[fixture]
    fn ambient() -> Vec<f64> {
        vec![310.; 10]
    }

    #[rstest]
    fn should_record_temperature_entering_each_hour() {
        let ambient = [300., 300., 300.];
        let trace = balance(&ambient, vec![0.; 3], 0., 295.).simulate(1);

        assert_eq!(trace.len(), 3);
        assert_eq!(trace[0], 300.);
        assert_relative_eq!(trace[1], 299., epsilon = 1e-9);
        assert_relative_eq!(trace[2], 298., epsilon = 1e-9);
    }

    #[rstest]
    fn should_run_hvac_at_half_capacity_at_or_below_set_point() {
        let ambient = [290., 290.];
        let trace = balance(&ambient, vec![100., 100.], 50., 295.).simulate(1);

        assert_eq!(trace[0], 290.);
        // (100 + 50 - 0.5 * 100) / (100 * 1)
        assert_relative_eq!(trace[1], 291., epsilon = 1e-9);
    }

    #[rstest]
    fn should_treat_exactly_set_point_as_not_above() {
        let ambient = [295., 295.];
        let trace = balance(&ambient, vec![0., 0.], 0., 295.).simulate(2);
        assert_relative_eq!(trace[1], 294., epsilon = 1e-9);
    }

    #[rstest]
    fn should_produce_one_value_per_convective_sample(ambient: Vec<f64>) {
        let convective = vec![0.; 4];
        let trace = balance(&ambient, convective, 0., 297.).simulate(1);
        assert_eq!(trace.len(), 4);
    }

    #[rstest]
    fn should_produce_empty_trace_without_ambient() {
        assert!(balance(&[], vec![], 0., 297.).simulate(1).is_empty());
    }

    #[rstest]
    fn should_reproduce_identical_trace(ambient: Vec<f64>, set_point: f64) {
        let balance = balance(&ambient, vec![0.; 10], 500., set_point);
        assert_eq!(balance.simulate(7), balance.simulate(7));
    }

    #[rstest]
    fn should_build_band_ten_fahrenheit_either_side(set_point: f64) {
        let band = AcceptanceBand::around(set_point);
        assert_relative_eq!(band.lower, fahrenheit_to_kelvin(65.), epsilon = 1e-9);
        assert_relative_eq!(band.upper, fahrenheit_to_kelvin(85.), epsilon = 1e-9);
    }

    #[rstest]
    #[case(297., f64::INFINITY, Verdict::WithinBand)]
    #[case(297., 290., Verdict::WithinBand)]
    #[case(310., f64::INFINITY, Verdict::Rejected)]
    #[case(310., 315., Verdict::Rejected)]
    #[case(310., 305., Verdict::NoLongerImproving)]
    #[case(280., 285., Verdict::Rejected)]
    fn should_judge_average_temperature(
        set_point: f64,
        #[case] average: f64,
        #[case] previous_average: f64,
        #[case] expected: Verdict,
    ) {
        assert_eq!(
            AcceptanceBand::around(set_point).verdict(average, previous_average),
            expected
        );
    }

    #[rstest]
    fn should_escalate_one_unit_at_a_time_until_within_band(ambient: Vec<f64>, set_point: f64) {
        // battery adds 5 K per hour; each unit removes 1 K per hour while above set-point
        let balance = balance(&ambient, vec![0.; 10], 500., set_point);
        let outcome = balance.size_hvac(1, 100).unwrap();

        assert_eq!(
            outcome
                .attempts
                .iter()
                .map(|attempt| attempt.unit_count)
                .collect::<Vec<_>>(),
            (1..=7).collect::<Vec<_>>()
        );
        assert!(outcome.attempts[..6]
            .iter()
            .all(|attempt| attempt.verdict == Verdict::Rejected));
        assert_eq!(outcome.unit_count, 7);
        assert_eq!(outcome.accepted_attempt().unwrap().verdict, Verdict::WithinBand);
        assert_relative_eq!(outcome.attempts[0].average_temperature, 328., epsilon = 1e-9);
        assert_relative_eq!(outcome.attempts[5].average_temperature, 305.5, epsilon = 1e-9);
        assert_relative_eq!(outcome.attempts[6].average_temperature, 301.7, epsilon = 1e-9);
        assert_eq!(outcome.trace, balance.simulate(7));
    }

    #[rstest]
    fn should_accept_initial_unit_count_when_already_within_band(
        ambient: Vec<f64>,
        set_point: f64,
    ) {
        let balance = balance(&ambient, vec![0.; 10], 500., set_point);
        let outcome = balance.size_hvac(7, 100).unwrap();
        assert_eq!(outcome.attempts.len(), 1);
        assert_eq!(outcome.unit_count, 7);
    }

    #[rstest]
    fn should_fail_when_attempts_run_out(ambient: Vec<f64>, set_point: f64) {
        let balance = balance(&ambient, vec![0.; 10], 500., set_point);
        let err = balance.size_hvac(1, 3).unwrap_err();
        assert_eq!(err.attempts, 3);
        assert_eq!(err.last_unit_count, 3);
        assert_relative_eq!(err.last_average_temperature, 319., epsilon = 1e-9);
    }
}
