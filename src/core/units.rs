pub const JOULES_PER_KILOJOULE: u32 = 1_000;
pub const JOULES_PER_BTU: f64 = 1_055.056;
pub const MILLIMETRES_IN_METRE: u32 = 1_000;
pub const HOURS_PER_DAY: u32 = 24;
pub const DAYS_PER_YEAR: u32 = 365;
pub const MONTHS_PER_YEAR: u32 = 12;
/// Every month is treated as 365/12 days long, so a year is twelve blocks of 730 hours.
pub const HOURS_PER_MONTH: u32 = HOURS_PER_DAY * DAYS_PER_YEAR / MONTHS_PER_YEAR;
pub const HOURS_PER_YEAR: u32 = HOURS_PER_DAY * DAYS_PER_YEAR;
pub const MILLIAMPS_PER_AMP: u32 = 1_000;

const KELVIN_AT_ZERO_CELSIUS: f64 = 273.15;
const FAHRENHEIT_AT_ZERO_CELSIUS: f64 = 32.;
const FAHRENHEIT_PER_KELVIN: f64 = 1.8;

pub fn fahrenheit_to_kelvin(temp_f: f64) -> f64 {
    (temp_f - FAHRENHEIT_AT_ZERO_CELSIUS) / FAHRENHEIT_PER_KELVIN + KELVIN_AT_ZERO_CELSIUS
}

pub fn kelvin_to_fahrenheit(temp_k: f64) -> f64 {
    FAHRENHEIT_PER_KELVIN * (temp_k - KELVIN_AT_ZERO_CELSIUS) + FAHRENHEIT_AT_ZERO_CELSIUS
}

/// Shift a Kelvin temperature by a number of Fahrenheit degrees, e.g. to build a ±10ºF
/// band around a set-point.
pub fn offset_kelvin_by_fahrenheit(temp_k: f64, delta_f: f64) -> f64 {
    fahrenheit_to_kelvin(kelvin_to_fahrenheit(temp_k) + delta_f)
}

pub fn btu_to_kilojoules(btu: f64) -> f64 {
    btu * JOULES_PER_BTU / JOULES_PER_KILOJOULE as f64
}

pub fn millimetres_to_metres(length_mm: f64) -> f64 {
    length_mm / MILLIMETRES_IN_METRE as f64
}
