//! Category-level summary statistics.

use serde::{Deserialize, Serialize};

use crate::series::CategorySeries;

/// Long-run aggregates of a category's history.
///
/// Serves as the correction model's stand-in for unknown future windows and
/// as response metadata (`category_insights`).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CategoryStats {
    /// Mean total volume
    #[serde(rename = "avg_volume")]
    pub average_volume: f64,
    /// Mean growth trend
    #[serde(rename = "growth_rate")]
    pub average_growth_rate: f64,
    /// Sample standard deviation of volume divided by its mean
    pub volatility: f64,
}

impl CategoryStats {
    /// Compute statistics for a series. An empty series yields all zeros.
    pub fn from_series(series: &CategorySeries) -> Self {
        let volumes = series.volumes();
        let growth: Vec<f64> = series.observations().iter().map(|o| o.growth_trend).collect();

        let average_volume = mean(&volumes);
        let volatility = if average_volume.abs() > f64::EPSILON {
            sample_std_dev(&volumes) / average_volume
        } else {
            0.0
        };

        Self {
            average_volume,
            average_growth_rate: mean(&growth),
            volatility,
        }
    }
}

/// Arithmetic mean, 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Population standard deviation (divides by n).
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
}

/// Sample standard deviation (divides by n - 1), 0 below two values.
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64).sqrt()
}
