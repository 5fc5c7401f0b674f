//! Batch training of every category.

use std::collections::BTreeMap;
use std::fmt;

use rayon::prelude::*;
use tracing::{info, warn};

use crate::correction::{self, CorrectionOptions};
use crate::error::ForecastError;
use crate::registry::{CategoryModel, ModelRegistry};
use crate::seasonal::{self, SeasonalOptions};
use crate::series::CategorySeries;
use crate::stats::CategoryStats;

/// Options for [`train`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingOptions {
    pub seasonal: SeasonalOptions,
    pub correction: CorrectionOptions,
}

/// What happened to one category during training.
#[derive(Debug, Clone, PartialEq)]
pub enum TrainingOutcome {
    /// Seasonal model only; too few observations for a correction model
    SeasonalOnly,
    /// Seasonal and correction model
    Corrected { mape: f64 },
    /// Correction model fitted but discarded
    CorrectionRejected { mape: f64 },
    /// Correction model could not be fitted; seasonal model kept
    CorrectionFailed(String),
    /// No model trained
    Skipped(String),
}

impl TrainingOutcome {
    pub fn is_trained(&self) -> bool {
        !matches!(self, TrainingOutcome::Skipped(_))
    }
}

impl fmt::Display for TrainingOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrainingOutcome::SeasonalOnly => write!(f, "seasonal"),
            TrainingOutcome::Corrected { mape } => write!(f, "seasonal + correction (MAPE {mape:.3})"),
            TrainingOutcome::CorrectionRejected { mape } => {
                write!(f, "seasonal, correction rejected (MAPE {mape:.3})")
            }
            TrainingOutcome::CorrectionFailed(reason) => {
                write!(f, "seasonal, correction failed: {reason}")
            }
            TrainingOutcome::Skipped(reason) => write!(f, "skipped: {reason}"),
        }
    }
}

/// Per-category outcomes of a training run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingReport {
    pub outcomes: BTreeMap<String, TrainingOutcome>,
}

impl TrainingReport {
    pub fn trained(&self) -> usize {
        self.outcomes.values().filter(|o| o.is_trained()).count()
    }

    pub fn corrected(&self) -> usize {
        self.outcomes
            .values()
            .filter(|o| matches!(o, TrainingOutcome::Corrected { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.trained()
    }
}

/// Result of [`train`].
#[derive(Debug, Clone)]
pub struct TrainingRun {
    pub registry: ModelRegistry,
    pub report: TrainingReport,
}

type Trained = (Option<(CategoryModel, CategoryStats)>, TrainingOutcome);

fn train_category(series: &CategorySeries, options: &TrainingOptions) -> Trained {
    let category = series.category();

    let seasonal = match seasonal::fit(series, &options.seasonal) {
        Ok(model) => model,
        Err(e) => {
            warn!(category, error = %e, "skipping category");
            return (None, TrainingOutcome::Skipped(e.to_string()));
        }
    };
    let stats = CategoryStats::from_series(series);

    if series.len() < options.correction.min_observations {
        info!(category, n_obs = series.len(), "trained seasonal model");
        return (
            Some((CategoryModel::SeasonalOnly(seasonal), stats)),
            TrainingOutcome::SeasonalOnly,
        );
    }

    match correction::fit(series, &options.correction) {
        Ok(model) => {
            let mape = model.mape();
            info!(category, n_obs = series.len(), mape, "trained seasonal and correction models");
            (
                Some((CategoryModel::SeasonalWithCorrection(seasonal, model), stats)),
                TrainingOutcome::Corrected { mape },
            )
        }
        Err(ForecastError::CorrectionModelRejected { mape, threshold }) => {
            warn!(category, mape, threshold, "correction model rejected");
            (
                Some((CategoryModel::SeasonalOnly(seasonal), stats)),
                TrainingOutcome::CorrectionRejected { mape },
            )
        }
        Err(e) => {
            warn!(category, error = %e, "correction model failed");
            (
                Some((CategoryModel::SeasonalOnly(seasonal), stats)),
                TrainingOutcome::CorrectionFailed(e.to_string()),
            )
        }
    }
}

/// Train models for every category in parallel.
///
/// A failing category is reported and left out of the registry; it never
/// aborts the run.
pub fn train(series: &BTreeMap<String, CategorySeries>, options: &TrainingOptions) -> TrainingRun {
    let results: Vec<(String, Trained)> = series
        .par_iter()
        .map(|(category, s)| (category.clone(), train_category(s, options)))
        .collect();

    let mut models = BTreeMap::new();
    let mut stats = BTreeMap::new();
    let mut report = TrainingReport::default();
    for (category, (trained, outcome)) in results {
        if let Some((model, category_stats)) = trained {
            models.insert(category.clone(), model);
            stats.insert(category.clone(), category_stats);
        }
        report.outcomes.insert(category, outcome);
    }

    info!(
        categories = report.outcomes.len(),
        trained = report.trained(),
        corrected = report.corrected(),
        skipped = report.skipped(),
        "training finished"
    );

    TrainingRun {
        registry: ModelRegistry::new(models, stats),
        report,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::Period;
    use crate::registry::{ForecastRequest, ForecastSource};
    use crate::series::Observation;
    use chrono::NaiveDate;

    fn series(category: &str, n: usize) -> CategorySeries {
        let start = Period::new(2022, 1).unwrap();
        let observations = (0..n)
            .map(|i| Observation {
                period: start.plus_months(i as u32),
                total_volume: 2000.0 + 10.0 * i as f64,
                economic_index: 100.0 + (i % 3) as f64,
                growth_trend: 0.03,
            })
            .collect();
        CategorySeries::new(category, observations).unwrap()
    }

    #[test]
    fn test_train_tiers() {
        let mut input = BTreeMap::new();
        for (name, n) in [("sparse", 5), ("medium", 15), ("rich", 36)] {
            input.insert(name.to_string(), series(name, n));
        }

        let run = train(&input, &TrainingOptions::default());
        assert!(matches!(run.report.outcomes["sparse"], TrainingOutcome::Skipped(_)));
        assert_eq!(run.report.outcomes["medium"], TrainingOutcome::SeasonalOnly);
        assert!(matches!(run.report.outcomes["rich"], TrainingOutcome::Corrected { .. }));

        assert_eq!(run.report.trained(), 2);
        assert_eq!(run.report.corrected(), 1);
        assert_eq!(run.report.skipped(), 1);

        assert!(run.registry.model("sparse").is_none());
        assert!(run.registry.model("medium").unwrap().correction().is_none());
        assert!(run.registry.model("rich").unwrap().correction().is_some());
        assert!(run.registry.stats("medium").is_some());
    }

    #[test]
    fn test_rejected_correction_serves_seasonal() {
        // Log-uniform volumes from a linear congruential sequence leave the
        // next month unpredictable from the window.
        let start = Period::new(2020, 1).unwrap();
        let mut state: u64 = 12345;
        let observations = (0..60)
            .map(|i| {
                state = (state * 1_103_515_245 + 12_345) % (1 << 31);
                Observation {
                    period: start.plus_months(i),
                    total_volume: 10.0 * 10f64.powf((state % 1000) as f64 / 250.0),
                    economic_index: 100.0 + f64::from(i),
                    growth_trend: 0.1,
                }
            })
            .collect();
        let mut input = BTreeMap::new();
        input.insert(
            "erratic".to_string(),
            CategorySeries::new("erratic", observations).unwrap(),
        );

        let run = train(&input, &TrainingOptions::default());
        match run.report.outcomes["erratic"] {
            TrainingOutcome::CorrectionRejected { mape } => assert!(mape >= 0.30),
            ref other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(run.report.trained(), 1);
        assert_eq!(run.report.corrected(), 0);
        assert!(run.registry.model("erratic").unwrap().correction().is_none());

        let req = ForecastRequest::new("erratic", "REG_MSK", 100.0, 3).unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 5, 14).unwrap();
        assert_eq!(
            run.registry.forecast_at(&req, today).source,
            ForecastSource::Seasonal
        );
    }

    #[test]
    fn test_train_is_deterministic() {
        let mut input = BTreeMap::new();
        input.insert("rich".to_string(), series("rich", 30));
        let a = train(&input, &TrainingOptions::default());
        let b = train(&input, &TrainingOptions::default());
        assert_eq!(a.registry, b.registry);
        assert_eq!(a.report, b.report);
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(
            TrainingOutcome::Corrected { mape: 0.1234 }.to_string(),
            "seasonal + correction (MAPE 0.123)"
        );
    }
}
