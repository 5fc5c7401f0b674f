//! Correction model: a random forest predicting next-month volume from a
//! rolling window of recent observations.
//!
//! Training windows span `window` consecutive observations. Each window
//! yields the feature vector named by [`WINDOW_FEATURE_NAMES`]: mean month,
//! mean growth trend, mean economic index and mean month-over-month % change
//! of volume. The label is the volume of the observation right after the window.
//!
//! At inference the real window is unknown (it lies in the future), so the
//! features are rebuilt from the category's long-run growth rate, the
//! requested economic index and a fixed volume trend. The forest never saw
//! such vectors during training; treat corrected values as an approximation.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};
use crate::forest::RandomForestRegressor;
use crate::metrics::{mae, mape};
use crate::period::Period;
use crate::series::{CategorySeries, Observation};
use crate::stats::CategoryStats;

/// Names of the window features, in feature-vector order.
pub const WINDOW_FEATURE_NAMES: [&str; 4] =
    ["month", "growth_trend", "economic_index", "volume_trend"];

/// Options for fitting a [`CorrectionModel`].
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectionOptions {
    /// Minimum observations before a correction model is attempted
    pub min_observations: usize,
    /// Observations per training window
    pub window: usize,
    /// Minimum number of training windows
    pub min_windows: usize,
    /// Models with held-out MAPE at or above this are discarded
    pub mape_threshold: f64,
    /// Trees in the forest
    pub n_estimators: usize,
    /// Seed for the train/test split and the bootstrap samples
    pub random_state: u64,
    /// Share of windows held out for evaluation
    pub test_fraction: f64,
    /// Maximum tree depth (None = grow until leaves are pure)
    pub max_depth: Option<usize>,
    /// Volume-trend feature used at inference
    pub inference_volume_trend: f64,
}

impl Default for CorrectionOptions {
    fn default() -> Self {
        Self {
            min_observations: 20,
            window: 3,
            min_windows: 10,
            mape_threshold: 0.30,
            n_estimators: 50,
            random_state: 42,
            test_fraction: 0.2,
            max_depth: None,
            inference_volume_trend: 0.05,
        }
    }
}

/// Fitted correction model for a single category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionModel {
    forest: RandomForestRegressor,
    holdout_mape: f64,
    holdout_mae: f64,
    n_windows: usize,
    inference_volume_trend: f64,
}

/// Mean period-over-period change, skipping changes from a zero base.
fn mean_pct_change(window: &[Observation]) -> f64 {
    let changes: Vec<f64> = window
        .windows(2)
        .filter(|w| w[0].total_volume.abs() > f64::EPSILON)
        .map(|w| (w[1].total_volume - w[0].total_volume) / w[0].total_volume)
        .collect();
    if changes.is_empty() {
        0.0
    } else {
        changes.iter().sum::<f64>() / changes.len() as f64
    }
}

fn window_features(window: &[Observation]) -> [f64; 4] {
    let n = window.len() as f64;
    let mean = |f: fn(&Observation) -> f64| window.iter().map(f).sum::<f64>() / n;
    [
        mean(|o| f64::from(o.period.month())),
        mean(|o| o.growth_trend),
        mean(|o| o.economic_index),
        mean_pct_change(window),
    ]
}

/// Build rolling-window training examples.
///
/// Returns one feature vector and label per window; empty when the series
/// has no more than `window` observations.
pub fn build_windows(series: &CategorySeries, window: usize) -> (Vec<[f64; 4]>, Vec<f64>) {
    let obs = series.observations();
    if window == 0 || obs.len() <= window {
        return (vec![], vec![]);
    }

    (0..obs.len() - window)
        .map(|i| (window_features(&obs[i..i + window]), obs[i + window].total_volume))
        .unzip()
}

/// Shuffled split into (train, test) index sets; the test set size is rounded up.
fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let n_test = ((n as f64 * test_fraction).ceil() as usize)
        .max(1)
        .min(n.saturating_sub(1));
    let mut permutation: Vec<usize> = (0..n).collect();
    permutation.shuffle(&mut StdRng::seed_from_u64(seed));
    let train = permutation.split_off(n_test);
    (train, permutation)
}

/// Fit and evaluate a correction model.
///
/// # Errors
/// * `InsufficientData` when the series is shorter than
///   `options.min_observations` or yields fewer than `options.min_windows` windows
/// * `CorrectionModelRejected` when the held-out MAPE is not below the threshold
pub fn fit(series: &CategorySeries, options: &CorrectionOptions) -> Result<CorrectionModel> {
    if series.len() < options.min_observations {
        return Err(ForecastError::InsufficientData {
            needed: options.min_observations,
            got: series.len(),
        });
    }

    let (features, labels) = build_windows(series, options.window);
    let needed = options.min_windows.max(2);
    if features.len() < needed {
        return Err(ForecastError::InsufficientData {
            needed,
            got: features.len(),
        });
    }

    let (train, test) =
        train_test_split(features.len(), options.test_fraction, options.random_state);
    let x_train: Vec<[f64; 4]> = train.iter().map(|&i| features[i]).collect();
    let y_train: Vec<f64> = train.iter().map(|&i| labels[i]).collect();
    let x_test: Vec<[f64; 4]> = test.iter().map(|&i| features[i]).collect();
    let y_test: Vec<f64> = test.iter().map(|&i| labels[i]).collect();

    let mut forest = RandomForestRegressor::new(options.n_estimators)
        .with_max_depth(options.max_depth)
        .with_random_state(options.random_state);
    forest.fit(&x_train, &y_train)?;

    let predictions = forest.predict(&x_test);
    let holdout_mape = mape(&y_test, &predictions)?;
    let holdout_mae = mae(&y_test, &predictions)?;

    // NaN (all-zero actuals) fails the gate as well.
    if !(holdout_mape < options.mape_threshold) {
        return Err(ForecastError::CorrectionModelRejected {
            mape: holdout_mape,
            threshold: options.mape_threshold,
        });
    }

    Ok(CorrectionModel {
        forest,
        holdout_mape,
        holdout_mae,
        n_windows: features.len(),
        inference_volume_trend: options.inference_volume_trend,
    })
}

impl CorrectionModel {
    /// Corrected volume for `period`.
    ///
    /// The feature vector is `[period month, long-run growth rate,
    /// economic_index, fixed volume trend]`.
    pub fn predict(&self, stats: &CategoryStats, period: Period, economic_index: f64) -> f64 {
        self.forest
            .predict_one(&self.inference_features(stats, period, economic_index))
    }

    fn inference_features(
        &self,
        stats: &CategoryStats,
        period: Period,
        economic_index: f64,
    ) -> [f64; 4] {
        [
            f64::from(period.month()),
            stats.average_growth_rate,
            economic_index,
            self.inference_volume_trend,
        ]
    }

    /// Held-out MAPE measured at training time (fraction).
    pub fn mape(&self) -> f64 {
        self.holdout_mape
    }

    /// Held-out MAE measured at training time.
    pub fn mae(&self) -> f64 {
        self.holdout_mae
    }

    /// Number of rolling windows the model was built from.
    pub fn n_windows(&self) -> usize {
        self.n_windows
    }
}
