//! Per-category demand series.

use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};
use crate::period::Period;

/// One historical observation of a category's demand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub period: Period,
    /// Total sales volume (currency units)
    pub total_volume: f64,
    pub economic_index: f64,
    pub growth_trend: f64,
}

/// Ordered demand history for a single category.
///
/// Periods are non-decreasing: several regions may report the same month.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySeries {
    category: String,
    observations: Vec<Observation>,
}

impl CategorySeries {
    /// Create a series, rejecting out-of-order periods and non-finite values.
    pub fn new(category: impl Into<String>, observations: Vec<Observation>) -> Result<Self> {
        let category = category.into();

        if let Some(pos) = observations
            .windows(2)
            .position(|w| w[1].period < w[0].period)
        {
            return Err(ForecastError::InvalidInput(format!(
                "Series '{}' is not ordered: {} follows {}",
                category,
                observations[pos + 1].period,
                observations[pos].period
            )));
        }

        if let Some(obs) = observations.iter().find(|o| {
            !o.total_volume.is_finite() || !o.economic_index.is_finite() || !o.growth_trend.is_finite()
        }) {
            return Err(ForecastError::InvalidInput(format!(
                "Series '{}' has a non-finite value at {}",
                category, obs.period
            )));
        }

        Ok(Self {
            category,
            observations,
        })
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.total_volume).collect()
    }

    pub fn first_period(&self) -> Option<Period> {
        self.observations.first().map(|o| o.period)
    }

    pub fn last_period(&self) -> Option<Period> {
        self.observations.last().map(|o| o.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(period: &str, volume: f64) -> Observation {
        Observation {
            period: period.parse().unwrap(),
            total_volume: volume,
            economic_index: 100.0,
            growth_trend: 0.05,
        }
    }

    #[test]
    fn test_accepts_repeated_periods() {
        let series = CategorySeries::new(
            "groceries",
            vec![obs("2024-01", 1.0), obs("2024-01", 2.0), obs("2024-02", 3.0)],
        )
        .unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.first_period().unwrap().to_string(), "2024-01");
        assert_eq!(series.last_period().unwrap().to_string(), "2024-02");
        assert_eq!(series.volumes(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_rejects_unordered_periods() {
        let err = CategorySeries::new("groceries", vec![obs("2024-02", 1.0), obs("2024-01", 2.0)])
            .unwrap_err();
        assert!(matches!(err, ForecastError::InvalidInput(_)));
    }

    #[test]
    fn test_rejects_nan() {
        let err = CategorySeries::new("groceries", vec![obs("2024-01", f64::NAN)]).unwrap_err();
        assert!(matches!(err, ForecastError::InvalidInput(_)));
    }
}
