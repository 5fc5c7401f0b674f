//! Regression trees and a bagged random forest.
//!
//! - CART regression trees split on the threshold that minimizes the summed
//!   squared error of both children (midpoint between adjacent values)
//! - The forest fits each tree on a bootstrap sample and averages their
//!   predictions
//!
//! Trees only store split structure and leaf means, so fitted forests are
//! small enough to persist as JSON.

use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};

/// A node in a regression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RegressionTreeNode {
    /// Internal node: samples with `feature <= threshold` go left.
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<RegressionTreeNode>,
        right: Box<RegressionTreeNode>,
    },
    /// Leaf predicting the mean target of its training samples.
    Leaf { value: f64, n_samples: usize },
}

impl RegressionTreeNode {
    fn predict(&self, row: &[f64]) -> f64 {
        match self {
            RegressionTreeNode::Leaf { value, .. } => *value,
            RegressionTreeNode::Split {
                feature_idx,
                threshold,
                left,
                right,
            } => {
                if row[*feature_idx] <= *threshold {
                    left.predict(row)
                } else {
                    right.predict(row)
                }
            }
        }
    }

    /// Leaves have depth 0.
    pub fn depth(&self) -> usize {
        match self {
            RegressionTreeNode::Leaf { .. } => 0,
            RegressionTreeNode::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

/// CART regression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTreeRegressor {
    root: Option<RegressionTreeNode>,
    n_features: usize,
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
}

impl Default for DecisionTreeRegressor {
    fn default() -> Self {
        Self::new()
    }
}

struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    sse: f64,
}

/// Sum of squared deviations from the mean, from running sums.
fn sse(sum: f64, sum_sq: f64, n: usize) -> f64 {
    if n == 0 {
        0.0
    } else {
        (sum_sq - sum * sum / n as f64).max(0.0)
    }
}

impl DecisionTreeRegressor {
    pub fn new() -> Self {
        Self {
            root: None,
            n_features: 0,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }

    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Fit on the rows of `x` selected by `indices` (repeats allowed).
    fn fit_indices<R: AsRef<[f64]>>(&mut self, x: &[R], y: &[f64], indices: Vec<usize>) {
        self.n_features = x.first().map_or(0, |r| r.as_ref().len());
        self.root = Some(self.build(x, y, indices, 0));
    }

    /// Fit the tree to every row of `x`.
    pub fn fit<R: AsRef<[f64]>>(&mut self, x: &[R], y: &[f64]) -> Result<()> {
        validate_training_data(x, y)?;
        self.fit_indices(x, y, (0..y.len()).collect());
        Ok(())
    }

    fn build<R: AsRef<[f64]>>(
        &self,
        x: &[R],
        y: &[f64],
        indices: Vec<usize>,
        depth: usize,
    ) -> RegressionTreeNode {
        let n = indices.len();
        let (sum, sum_sq) = indices
            .iter()
            .fold((0.0, 0.0), |(s, sq), &i| (s + y[i], sq + y[i] * y[i]));
        let node_sse = sse(sum, sum_sq, n);
        let leaf = RegressionTreeNode::Leaf {
            value: if n == 0 { 0.0 } else { sum / n as f64 },
            n_samples: n,
        };

        let at_max_depth = self.max_depth.is_some_and(|d| depth >= d);
        if n < self.min_samples_split || at_max_depth || node_sse / (n as f64) < 1e-10 {
            return leaf;
        }

        let Some(best) = self.best_split(x, y, &indices) else {
            return leaf;
        };
        if best.sse >= node_sse {
            return leaf;
        }

        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| x[i].as_ref()[best.feature_idx] <= best.threshold);

        RegressionTreeNode::Split {
            feature_idx: best.feature_idx,
            threshold: best.threshold,
            left: Box::new(self.build(x, y, left, depth + 1)),
            right: Box::new(self.build(x, y, right, depth + 1)),
        }
    }

    /// Scan every feature with sorted running sums.
    fn best_split<R: AsRef<[f64]>>(
        &self,
        x: &[R],
        y: &[f64],
        indices: &[usize],
    ) -> Option<SplitCandidate> {
        let n = indices.len();
        let (total_sum, total_sq) = indices
            .iter()
            .fold((0.0, 0.0), |(s, sq), &i| (s + y[i], sq + y[i] * y[i]));
        let mut best: Option<SplitCandidate> = None;
        let mut order = indices.to_vec();

        for feature_idx in 0..self.n_features {
            let value = |i: usize| x[i].as_ref()[feature_idx];
            order.sort_by(|&a, &b| value(a).total_cmp(&value(b)));

            let (mut left_sum, mut left_sq) = (0.0, 0.0);
            for pos in 0..n - 1 {
                let yi = y[order[pos]];
                left_sum += yi;
                left_sq += yi * yi;

                let n_left = pos + 1;
                let n_right = n - n_left;
                let (current, next) = (value(order[pos]), value(order[pos + 1]));
                if current == next
                    || n_left < self.min_samples_leaf
                    || n_right < self.min_samples_leaf
                {
                    continue;
                }

                let split_sse = sse(left_sum, left_sq, n_left)
                    + sse(total_sum - left_sum, total_sq - left_sq, n_right);
                if best.as_ref().map_or(true, |b| split_sse < b.sse) {
                    best = Some(SplitCandidate {
                        feature_idx,
                        threshold: (current + next) / 2.0,
                        sse: split_sse,
                    });
                }
            }
        }

        best
    }

    /// Predict a single row.
    ///
    /// An unfitted tree predicts 0.
    pub fn predict_one(&self, row: &[f64]) -> f64 {
        self.root.as_ref().map_or(0.0, |root| root.predict(row))
    }

    pub fn depth(&self) -> usize {
        self.root.as_ref().map_or(0, RegressionTreeNode::depth)
    }
}

/// Random forest regressor (bagging over CART trees).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    trees: Vec<DecisionTreeRegressor>,
    n_estimators: usize,
    max_depth: Option<usize>,
    random_state: Option<u64>,
}

impl Default for RandomForestRegressor {
    fn default() -> Self {
        Self::new(50)
    }
}

impl RandomForestRegressor {
    /// Creates a forest with `n_estimators` trees.
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            max_depth: None,
            random_state: None,
        }
    }

    /// Limits the depth of every tree.
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets the random state for reproducibility. Tree `i` uses `seed + i`.
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Fits every tree on its own bootstrap sample.
    ///
    /// # Errors
    /// `InvalidInput` on empty data, mismatched lengths or ragged rows;
    /// `InvalidParameter` when `n_estimators` is 0.
    pub fn fit<R: AsRef<[f64]>>(&mut self, x: &[R], y: &[f64]) -> Result<()> {
        validate_training_data(x, y)?;
        if self.n_estimators == 0 {
            return Err(ForecastError::InvalidParameter {
                param: "n_estimators".into(),
                value: "0".into(),
                reason: "a forest needs at least one tree".into(),
            });
        }

        self.trees = (0..self.n_estimators)
            .map(|i| {
                let seed = self.random_state.map(|s| s.wrapping_add(i as u64));
                let mut tree = DecisionTreeRegressor::new().with_max_depth(self.max_depth);
                tree.fit_indices(x, y, bootstrap_sample(y.len(), seed));
                tree
            })
            .collect();

        Ok(())
    }

    /// Average of the tree predictions for one row.
    pub fn predict_one(&self, row: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        self.trees.iter().map(|t| t.predict_one(row)).sum::<f64>() / self.trees.len() as f64
    }

    pub fn predict<R: AsRef<[f64]>>(&self, x: &[R]) -> Vec<f64> {
        x.iter().map(|row| self.predict_one(row.as_ref())).collect()
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }
}

/// Draw `n_samples` indices with replacement.
fn bootstrap_sample(n_samples: usize, random_state: Option<u64>) -> Vec<usize> {
    let dist = Uniform::from(0..n_samples);
    match random_state {
        Some(seed) => {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..n_samples).map(|_| dist.sample(&mut rng)).collect()
        }
        None => {
            let mut rng = rand::thread_rng();
            (0..n_samples).map(|_| dist.sample(&mut rng)).collect()
        }
    }
}

fn validate_training_data<R: AsRef<[f64]>>(x: &[R], y: &[f64]) -> Result<()> {
    if x.len() != y.len() {
        return Err(ForecastError::InvalidInput(format!(
            "Number of samples in X and y must match: {} vs {}",
            x.len(),
            y.len()
        )));
    }
    if y.is_empty() {
        return Err(ForecastError::InvalidInput(
            "Cannot fit with zero samples".into(),
        ));
    }
    let width = x[0].as_ref().len();
    if x.iter().any(|row| row.as_ref().len() != width) {
        return Err(ForecastError::InvalidInput(
            "All rows must have the same number of features".into(),
        ));
    }
    Ok(())
}
