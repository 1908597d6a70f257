/// A simple statistics module with utility functions for summarising temperature traces.
use statrs::statistics::{Data, OrderStatistics, Statistics};

/// Arithmetic mean; NaN for an empty slice.
pub fn mean(numbers: &[f64]) -> f64 {
    numbers.iter().mean()
}

pub fn percentile(numbers: &[f64], percentile: usize) -> f64 {
    let mut data = Data::new(numbers.to_vec());

    data.percentile(percentile)
}

pub fn min(numbers: &[f64]) -> f64 {
    Statistics::min(numbers.iter())
}

pub fn max(numbers: &[f64]) -> f64 {
    Statistics::max(numbers.iter())
}
