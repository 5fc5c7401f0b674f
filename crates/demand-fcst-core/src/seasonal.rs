//! Seasonal forecast model: linear trend, yearly Fourier seasonality and one
//! exogenous regressor (the economic index), fitted by OLS.
//!
//! ```text
//! y = intercept + slope * t
//!     + Σ_k (a_k sin(2πk(m-1)/12) + b_k cos(2πk(m-1)/12))
//!     + beta * (economic_index - mean) / scale
//! ```
//!
//! `t` is measured in years since the first training month and `m` is the
//! calendar month. Intervals use the residual standard error with a
//! Student-t quantile and widen with the distance from the last training
//! month.

use std::collections::BTreeSet;
use std::f64::consts::PI;

use anofox_regression::prelude::*;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::error::{ForecastError, Result};
use crate::period::Period;
use crate::series::CategorySeries;

/// Options for fitting a [`SeasonalModel`].
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonalOptions {
    /// Minimum number of observations required to fit
    pub min_observations: usize,
    /// Requested yearly Fourier order (capped by the data)
    pub fourier_order: usize,
    /// Central coverage of the prediction interval (0-1)
    pub interval_width: f64,
}

impl Default for SeasonalOptions {
    fn default() -> Self {
        Self {
            min_observations: 10,
            fourier_order: 3,
            interval_width: 0.95,
        }
    }
}

/// One projected month.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeasonalPoint {
    pub period: Period,
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
}

/// Fitted seasonal model for a single category. Immutable after fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalModel {
    origin: Period,
    last_period: Period,
    n_obs: usize,
    intercept: f64,
    /// Trend per year
    slope: f64,
    /// `(sin, cos)` coefficients per harmonic
    harmonics: Vec<(f64, f64)>,
    exog_mean: f64,
    exog_scale: f64,
    /// Coefficient on the standardized economic index (0 if the index never varied)
    exog_coef: f64,
    /// Residual standard error
    sigma: f64,
    /// Student-t quantile for the configured interval width
    quantile: f64,
    interval_width: f64,
}

/// Which columns the design matrix carries.
struct Design {
    trend: bool,
    order: usize,
    exog: bool,
}

impl Design {
    fn n_params(&self) -> usize {
        1 + usize::from(self.trend) + 2 * self.order + usize::from(self.exog)
    }
}

fn seasonal_terms(period: Period, order: usize) -> impl Iterator<Item = (f64, f64)> {
    let phase = 2.0 * PI * f64::from(period.month() - 1) / 12.0;
    (1..=order).map(move |k| {
        let angle = phase * k as f64;
        (angle.sin(), angle.cos())
    })
}

/// Fit a seasonal model to a category series.
///
/// # Errors
/// * `InsufficientData` below `options.min_observations`
/// * `InvalidParameter` for an interval width outside (0, 1)
/// * `ComputationError` if the least-squares fit fails
pub fn fit(series: &CategorySeries, options: &SeasonalOptions) -> Result<SeasonalModel> {
    let n = series.len();
    let needed = options.min_observations.max(3);
    if n < needed {
        return Err(ForecastError::InsufficientData { needed, got: n });
    }
    if !(options.interval_width > 0.0 && options.interval_width < 1.0) {
        return Err(ForecastError::InvalidParameter {
            param: "interval_width".into(),
            value: options.interval_width.to_string(),
            reason: "must be between 0 and 1 (exclusive)".into(),
        });
    }

    let obs = series.observations();
    let origin = obs[0].period;
    let last_period = obs[n - 1].period;

    let distinct_periods: BTreeSet<Period> = obs.iter().map(|o| o.period).collect();
    let distinct_months: BTreeSet<u32> = obs.iter().map(|o| o.period.month()).collect();

    let index: Vec<f64> = obs.iter().map(|o| o.economic_index).collect();
    let exog_mean = index.iter().sum::<f64>() / n as f64;
    let exog_scale =
        (index.iter().map(|v| (v - exog_mean).powi(2)).sum::<f64>() / n as f64).sqrt();

    let mut design = Design {
        trend: distinct_periods.len() > 1,
        order: options
            .fourier_order
            .min(distinct_months.len().saturating_sub(2) / 2),
        exog: exog_scale > 1e-12,
    };
    while design.order > 0 && design.n_params() >= n {
        design.order -= 1;
    }
    let n_params = design.n_params();

    // Column-major design without the intercept (added by the regressor)
    let mut columns: Vec<Vec<f64>> = Vec::with_capacity(n_params - 1);
    if design.trend {
        columns.push(
            obs.iter()
                .map(|o| origin.months_until(o.period) as f64 / 12.0)
                .collect(),
        );
    }
    let terms: Vec<Vec<(f64, f64)>> = obs
        .iter()
        .map(|o| seasonal_terms(o.period, design.order).collect())
        .collect();
    for k in 0..design.order {
        columns.push(terms.iter().map(|t| t[k].0).collect());
        columns.push(terms.iter().map(|t| t[k].1).collect());
    }
    if design.exog {
        columns.push(index.iter().map(|v| (v - exog_mean) / exog_scale).collect());
    }

    let y = series.volumes();
    let (intercept, coefficients) = fit_ols(&y, &columns)?;

    let mut coef = coefficients.into_iter();
    let slope = if design.trend {
        coef.next().unwrap_or(0.0)
    } else {
        0.0
    };
    let harmonics: Vec<(f64, f64)> = (0..design.order)
        .map(|_| (coef.next().unwrap_or(0.0), coef.next().unwrap_or(0.0)))
        .collect();
    let exog_coef = if design.exog {
        coef.next().unwrap_or(0.0)
    } else {
        0.0
    };

    let df = n.saturating_sub(n_params).max(1);
    let ordered = coefficient_list(slope, &harmonics, exog_coef, &design);
    let sse: f64 = y
        .iter()
        .enumerate()
        .map(|(i, actual)| {
            let fitted = intercept
                + columns
                    .iter()
                    .zip(&ordered)
                    .map(|(col, c)| col[i] * c)
                    .sum::<f64>();
            (actual - fitted).powi(2)
        })
        .sum();
    let sigma = (sse / df as f64).sqrt();

    let quantile = StudentsT::new(0.0, 1.0, df as f64)
        .map_err(|_| {
            ForecastError::ComputationError(format!("invalid t distribution (df = {df})"))
        })?
        .inverse_cdf(0.5 + options.interval_width / 2.0);

    tracing::debug!(
        category = series.category(),
        n_obs = n,
        fourier_order = design.order,
        trend = design.trend,
        exog = design.exog,
        sigma,
        "fitted seasonal model"
    );

    Ok(SeasonalModel {
        origin,
        last_period,
        n_obs: n,
        intercept,
        slope,
        harmonics,
        exog_mean,
        exog_scale: if design.exog { exog_scale } else { 1.0 },
        exog_coef,
        sigma,
        quantile,
        interval_width: options.interval_width,
    })
}

/// Coefficients in design-column order.
fn coefficient_list(
    slope: f64,
    harmonics: &[(f64, f64)],
    exog_coef: f64,
    design: &Design,
) -> Vec<f64> {
    let mut list = Vec::with_capacity(design.n_params());
    if design.trend {
        list.push(slope);
    }
    for &(a, b) in harmonics {
        list.push(a);
        list.push(b);
    }
    if design.exog {
        list.push(exog_coef);
    }
    list
}

/// OLS with intercept. Returns the intercept and one coefficient per column;
/// aliased (non-finite) coefficients are treated as dropped columns.
fn fit_ols(y: &[f64], columns: &[Vec<f64>]) -> Result<(f64, Vec<f64>)> {
    let n = y.len();
    let k = columns.len();

    if k == 0 {
        return Ok((y.iter().sum::<f64>() / n as f64, vec![]));
    }

    let x_mat = faer::Mat::from_fn(n, k, |i, j| columns[j][i]);
    let y_col = faer::Col::from_fn(n, |i| y[i]);

    let fitted = OlsRegressor::builder()
        .with_intercept(true)
        .build()
        .fit(&x_mat, &y_col)
        .map_err(|_| ForecastError::ComputationError("OLS fit of seasonal model failed".into()))?;

    let intercept = fitted.intercept().unwrap_or(0.0);
    let coeffs_col = fitted.coefficients();
    let coeffs = (0..coeffs_col.nrows())
        .map(|i| coeffs_col[i])
        .map(|c| if c.is_finite() { c } else { 0.0 })
        .collect();

    if !intercept.is_finite() {
        return Err(ForecastError::ComputationError(
            "OLS fit produced a non-finite intercept".into(),
        ));
    }

    Ok((intercept, coeffs))
}

impl SeasonalModel {
    /// Project `horizon` months forward, starting with the month after `today`.
    ///
    /// The economic index is held at `economic_index` for every month.
    pub fn predict(
        &self,
        economic_index: f64,
        horizon: usize,
        today: NaiveDate,
    ) -> Vec<SeasonalPoint> {
        Period::following(today, horizon)
            .into_iter()
            .map(|period| {
                let yhat = self.point(period, economic_index);
                let steps = self.last_period.months_until(period).max(0) as f64;
                let half_width =
                    self.quantile * self.sigma * (1.0 + steps / self.n_obs as f64).sqrt();
                SeasonalPoint {
                    period,
                    yhat,
                    yhat_lower: yhat - half_width,
                    yhat_upper: yhat + half_width,
                }
            })
            .collect()
    }

    /// Point estimate for a single month.
    pub fn point(&self, period: Period, economic_index: f64) -> f64 {
        let t = self.origin.months_until(period) as f64 / 12.0;
        let seasonal: f64 = seasonal_terms(period, self.harmonics.len())
            .zip(&self.harmonics)
            .map(|((sin, cos), (a, b))| a * sin + b * cos)
            .sum();
        let exog = self.exog_coef * (economic_index - self.exog_mean) / self.exog_scale;
        self.intercept + self.slope * t + seasonal + exog
    }

    /// Interval coverage the model was fitted for.
    pub fn interval_width(&self) -> f64 {
        self.interval_width
    }

    /// Last month seen in training.
    pub fn last_period(&self) -> Period {
        self.last_period
    }

    /// Coefficient of the economic index in original units.
    pub fn economic_index_effect(&self) -> f64 {
        self.exog_coef / self.exog_scale
    }

    pub fn residual_std_error(&self) -> f64 {
        self.sigma
    }
}
