//! Synthesis of an hourly ambient temperature series from monthly climate normals.

use crate::core::units::{fahrenheit_to_kelvin, HOURS_PER_DAY, MONTHS_PER_YEAR};
use crate::read_reference_data::{ReferenceDataMissing, Table};
use crate::simulation_time::{fraction_of_month, month_index_for_hour, SimulationTime};
use strum::{Display, EnumIter, IntoEnumIterator};

/// Hour of day at which overnight cooling reaches the daily minimum.
const LOW_TIME: u32 = 6;
/// Hour of day at which daytime warming reaches the daily maximum.
const HIGH_TIME: u32 = 15;

#[derive(Clone, Copy, Debug, Display, EnumIter, PartialEq)]
pub enum NormalBound {
    #[strum(serialize = "MLY-TMAX-NORMAL")]
    Max,
    #[strum(serialize = "MLY-TMIN-NORMAL")]
    Min,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MonthlyNormal {
    /// in K
    pub max: f64,
    /// in K
    pub min: f64,
}

impl MonthlyNormal {
    fn bound(&self, bound: NormalBound) -> f64 {
        match bound {
            NormalBound::Max => self.max,
            NormalBound::Min => self.min,
        }
    }

    /// Difference between the month's daily maximum and minimum normals
    pub fn diurnal_swing(&self) -> f64 {
        self.max - self.min
    }
}

/// Monthly max/min temperature normals for one climate region.
#[derive(Clone, Debug, PartialEq)]
pub struct ClimateNormals {
    months: [MonthlyNormal; MONTHS_PER_YEAR as usize],
}

impl ClimateNormals {
    /// Read normals (given in ºF, rows keyed "1" to "12") from a region's climate table.
    pub fn from_table(table: &Table) -> Result<Self, ReferenceDataMissing> {
        let mut months = [MonthlyNormal::default(); MONTHS_PER_YEAR as usize];
        for (month_idx, normal) in months.iter_mut().enumerate() {
            let month = (month_idx + 1).to_string();
            for bound in NormalBound::iter() {
                let temp_k =
                    fahrenheit_to_kelvin(table.lookup_numeric(&month, &bound.to_string())?);
                match bound {
                    NormalBound::Max => normal.max = temp_k,
                    NormalBound::Min => normal.min = temp_k,
                }
            }
        }

        Ok(Self { months })
    }

    /// Normals for a month numbered 1 to 12.
    pub fn month(&self, month: usize) -> &MonthlyNormal {
        &self.months[(month - 1) % MONTHS_PER_YEAR as usize]
    }

    /// Change in a normal from the given month (1 to 12) to the next, with December
    /// comparing against January.
    pub fn monthly_change(&self, month: usize, bound: NormalBound) -> f64 {
        let next_month = month % MONTHS_PER_YEAR as usize + 1;
        self.month(next_month).bound(bound) - self.month(month).bound(bound)
    }

    /// Daily minimum and maximum for the day starting at `hour`, drifting linearly from this
    /// month's normals towards next month's as the month progresses.
    pub fn daily_bounds(&self, hour: u32) -> (f64, f64) {
        let month = month_index_for_hour(hour) + 1;
        let fraction = fraction_of_month(hour);
        let normal = self.month(month);

        (
            normal.min + self.monthly_change(month, NormalBound::Min) * fraction,
            normal.max + self.monthly_change(month, NormalBound::Max) * fraction,
        )
    }
}

/// Hourly temperatures for one day from its bounds and the month's diurnal swing.
///
/// Falls from the evening value towards `min_temp` until 6am, rises towards `max_temp` until
/// 3pm and then falls back towards the next morning's starting value. Element `k` holds the
/// temperature for hour-of-day `k`, evaluated at the end of that hour.
pub fn daily_profile(min_temp: f64, max_temp: f64, diurnal_swing: f64) -> [f64; 24] {
    let night_hours = ((HOURS_PER_DAY - HIGH_TIME) + LOW_TIME) as f64;
    let cooling_rate = diurnal_swing / night_hours;
    let warming_rate = diurnal_swing / (HIGH_TIME - LOW_TIME) as f64;
    let start_temp = max_temp - cooling_rate * (HOURS_PER_DAY - HIGH_TIME) as f64;

    let mut hourly = [0.; HOURS_PER_DAY as usize];
    for (hour_of_day, temp) in hourly.iter_mut().enumerate() {
        let i = hour_of_day as u32 + 1;
        *temp = if i < LOW_TIME {
            (start_temp - cooling_rate * i as f64).max(min_temp)
        } else if i < HIGH_TIME {
            (min_temp + warming_rate * (i - LOW_TIME) as f64).min(max_temp)
        } else {
            max_temp - cooling_rate * (i - HIGH_TIME) as f64
        };
    }

    hourly
}

/// Builds the hourly ambient temperature series (K) for a region over a window of the year.
#[derive(Debug)]
pub struct ClimateSeriesBuilder<'a> {
    normals: &'a ClimateNormals,
}

impl<'a> ClimateSeriesBuilder<'a> {
    pub fn new(normals: &'a ClimateNormals) -> Self {
        Self { normals }
    }

    /// One value per hour in `[start, end)`, regardless of the sampling step.
    pub fn build(&self, simulation_time: &SimulationTime) -> Vec<f64> {
        let mut series = Vec::with_capacity(simulation_time.total_hours());

        for day_start in simulation_time.day_start_hours() {
            let (day_min, day_max) = self.normals.daily_bounds(day_start);
            let month = month_index_for_hour(day_start) + 1;
            let diurnal_swing = self.normals.month(month).diurnal_swing();

            series.extend(
                daily_profile(day_min, day_max, diurnal_swing)
                    .into_iter()
                    .zip(day_start..)
                    .filter(|(_, hour)| simulation_time.contains(*hour))
                    .map(|(temp, _)| temp),
            );
        }

        series
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::read_reference_data::load_table;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    const MAX_F: [f64; 12] = [
        44.9, 48.6, 57.2, 67.1, 75.4, 83.3, 87.1, 85.9, 79.4, 68.8, 57.6, 47.4,
    ];
    const MIN_F: [f64; 12] = [
        27.3, 29.4, 36.1, 45.0, 54.4, 63.6, 68.2, 66.9, 59.6, 47.3, 37.4, 30.0,
    ];

    #[fixture]
    fn climate_table() -> Table {
        let mut sheet = String::from("region,month,MLY-TMAX-NORMAL,MLY-TMIN-NORMAL\n");
        for month in 0..12 {
            sheet.push_str(&format!("1,{},{},{}\n", month + 1, MAX_F[month], MIN_F[month]));
        }
        load_table("climate", sheet.as_bytes(), "region", "month")
            .unwrap()
            .table("1")
            .unwrap()
            .clone()
    }

    #[fixture]
    fn normals(climate_table: Table) -> ClimateNormals {
        ClimateNormals::from_table(&climate_table).unwrap()
    }

    #[rstest]
    fn should_read_normals_in_kelvin(normals: ClimateNormals) {
        assert_relative_eq!(normals.month(1).max, fahrenheit_to_kelvin(44.9));
        assert_relative_eq!(normals.month(12).min, fahrenheit_to_kelvin(30.0));
        assert_relative_eq!(
            normals.month(7).diurnal_swing(),
            (87.1 - 68.2) / 1.8,
            epsilon = 1e-9
        );
    }

    #[rstest]
    fn should_fail_when_a_month_is_missing() {
        let mut table = Table::new("climate[1]");
        table.insert("1", "MLY-TMAX-NORMAL", 44.9);
        table.insert("1", "MLY-TMIN-NORMAL", 27.3);
        let err = ClimateNormals::from_table(&table).unwrap_err();
        assert_eq!(err.row_key, "2");
        assert_eq!(err.column, "MLY-TMAX-NORMAL");
    }

    #[rstest]
    fn should_wrap_monthly_change_from_december_to_january(normals: ClimateNormals) {
        assert_relative_eq!(
            normals.monthly_change(12, NormalBound::Max),
            normals.month(1).max - normals.month(12).max
        );
        assert_relative_eq!(
            normals.monthly_change(12, NormalBound::Min),
            (27.3 - 30.0) / 1.8,
            epsilon = 1e-9
        );
        assert_relative_eq!(
            normals.monthly_change(3, NormalBound::Max),
            (67.1 - 57.2) / 1.8,
            epsilon = 1e-9
        );
    }

    #[rstest]
    fn should_interpolate_daily_bounds_within_month(normals: ClimateNormals) {
        let (min_at_start, max_at_start) = normals.daily_bounds(730);
        assert_relative_eq!(min_at_start, normals.month(2).min);
        assert_relative_eq!(max_at_start, normals.month(2).max);

        let (min_mid, max_mid) = normals.daily_bounds(730 + 365);
        assert_relative_eq!(
            min_mid,
            (normals.month(2).min + normals.month(3).min) / 2.,
            epsilon = 1e-9
        );
        assert_relative_eq!(
            max_mid,
            (normals.month(2).max + normals.month(3).max) / 2.,
            epsilon = 1e-9
        );
    }

    #[rstest]
    fn should_shape_daily_profile() {
        let (min_temp, max_temp, swing) = (280., 290., 10.);
        let profile = daily_profile(min_temp, max_temp, swing);

        assert_relative_eq!(profile[5], min_temp);
        assert_relative_eq!(profile[14], max_temp);
        // evening cooling lands back on the next morning's starting value
        assert_relative_eq!(profile[23], max_temp - swing / 15. * 9.);
        assert!(profile[0] > profile[4]);
        assert!(profile[6] > profile[5] && profile[13] > profile[6]);
        assert!(profile[15] < profile[14] && profile[23] < profile[15]);
    }

    #[rstest]
    fn should_clamp_daily_profile_at_bounds() {
        // a swing much larger than the day's bounds allows forces both clamps to trigger
        let (min_temp, max_temp) = (280., 282.);
        let profile = daily_profile(min_temp, max_temp, 30.);

        for temp in &profile[0..6] {
            assert!(*temp >= min_temp);
        }
        for temp in &profile[6..15] {
            assert!(*temp <= max_temp);
        }
        assert_eq!(profile[4], min_temp);
        assert_eq!(profile[13], max_temp);
    }

    #[rstest]
    #[case(0, 1)]
    #[case(0, 24)]
    #[case(6000, 6100)]
    #[case(6013, 6014)]
    #[case(8000, 8760)]
    #[case(0, 8760)]
    fn should_build_one_value_per_hour(
        normals: ClimateNormals,
        #[case] start: u32,
        #[case] end: u32,
    ) {
        let simulation_time = SimulationTime::new(start, end, 1).unwrap();
        let series = ClimateSeriesBuilder::new(&normals).build(&simulation_time);
        assert_eq!(series.len(), (end - start) as usize);
    }

    #[rstest]
    fn should_offset_series_to_window(normals: ClimateNormals) {
        let builder = ClimateSeriesBuilder::new(&normals);
        let whole_day = builder.build(&SimulationTime::new(6000, 6024, 1).unwrap());
        let part_day = builder.build(&SimulationTime::new(6010, 6020, 1).unwrap());
        assert_eq!(part_day, whole_day[10..20].to_vec());
    }

    #[rstest]
    fn should_keep_series_within_plausible_range(normals: ClimateNormals) {
        let series = ClimateSeriesBuilder::new(&normals)
            .build(&SimulationTime::new(0, 8760, 1).unwrap());
        let coldest = fahrenheit_to_kelvin(MIN_F.iter().cloned().fold(f64::MAX, f64::min) - 20.);
        let hottest = fahrenheit_to_kelvin(MAX_F.iter().cloned().fold(f64::MIN, f64::max) + 20.);
        assert!(series.iter().all(|t| (coldest..hottest).contains(t)));
    }
}
