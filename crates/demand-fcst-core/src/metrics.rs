//! Evaluation metrics for forecast accuracy.
//!
//! - **Scale-dependent metrics**: MAE, MSE, RMSE
//! - **Percentage metrics**: MAPE (as a fraction, so 0.30 means 30%)
//!
//! | Metric | Use When |
//! |--------|----------|
//! | MAE | Need interpretable error in original units |
//! | RMSE | Want to penalize large errors more heavily |
//! | MAPE | Need a scale-free acceptance gate across categories |

use crate::error::{ForecastError, Result};

/// Calculates Mean Absolute Error between actual and predicted values.
///
/// # Formula
/// MAE = (1/n) * Σ|actual_i - forecast_i|
///
/// # Example
/// ```
/// use demand_fcst_core::metrics::mae;
/// let actual = vec![1.0, 2.0, 3.0];
/// let forecast = vec![1.1, 2.2, 2.8];
/// let error = mae(&actual, &forecast).unwrap();
/// assert!((error - 0.166).abs() < 0.01);
/// ```
pub fn mae(actual: &[f64], forecast: &[f64]) -> Result<f64> {
    validate_inputs(actual, forecast)?;
    let sum: f64 = actual
        .iter()
        .zip(forecast.iter())
        .map(|(a, f)| (a - f).abs())
        .sum();
    Ok(sum / actual.len() as f64)
}

/// Calculates Mean Squared Error between actual and predicted values.
///
/// # Formula
/// MSE = (1/n) * Σ(actual_i - forecast_i)²
pub fn mse(actual: &[f64], forecast: &[f64]) -> Result<f64> {
    validate_inputs(actual, forecast)?;
    let sum: f64 = actual
        .iter()
        .zip(forecast.iter())
        .map(|(a, f)| (a - f).powi(2))
        .sum();
    Ok(sum / actual.len() as f64)
}

/// Calculates Root Mean Squared Error between actual and predicted values.
pub fn rmse(actual: &[f64], forecast: &[f64]) -> Result<f64> {
    Ok(mse(actual, forecast)?.sqrt())
}

/// Calculates Mean Absolute Percentage Error as a fraction.
///
/// Zero actuals are skipped. Returns NaN if every actual value is zero.
///
/// # Formula
/// MAPE = (1/n) * Σ|actual_i - forecast_i| / |actual_i|
///
/// # Example
/// ```
/// use demand_fcst_core::metrics::mape;
/// let error = mape(&[100.0, 200.0], &[110.0, 180.0]).unwrap();
/// assert!((error - 0.10).abs() < 1e-12);
/// ```
pub fn mape(actual: &[f64], forecast: &[f64]) -> Result<f64> {
    validate_inputs(actual, forecast)?;
    let (sum, count) = actual
        .iter()
        .zip(forecast.iter())
        .filter(|(a, _)| a.abs() > f64::EPSILON)
        .fold((0.0, 0usize), |(sum, count), (a, f)| {
            (sum + ((a - f) / a).abs(), count + 1)
        });
    if count == 0 {
        return Ok(f64::NAN);
    }
    Ok(sum / count as f64)
}

fn validate_inputs(actual: &[f64], forecast: &[f64]) -> Result<()> {
    if actual.len() != forecast.len() {
        return Err(ForecastError::InvalidInput(format!(
            "Actual and forecast arrays must have the same length: {} vs {}",
            actual.len(),
            forecast.len()
        )));
    }
    if actual.is_empty() {
        return Err(ForecastError::InvalidInput("Cannot evaluate empty arrays".into()));
    }
    Ok(())
}
