//! Forecast serving: category model lookup, blending and the default forecast.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, warn};

use crate::correction::CorrectionModel;
use crate::error::{ForecastError, Result};
use crate::locale::Locale;
use crate::period::Period;
use crate::recommend::{derive_recommendations, Recommendation};
use crate::seasonal::SeasonalModel;
use crate::stats::CategoryStats;

/// Default economic index of a request.
pub const DEFAULT_ECONOMIC_INDEX: f64 = 100.0;
/// Default forecast horizon in months.
pub const DEFAULT_HORIZON: usize = 3;
/// Longest supported horizon in months.
pub const MAX_HORIZON: usize = 12;

/// Base volume of the default forecast.
pub const DEFAULT_BASE_VOLUME: f64 = 50_000_000.0;
/// Monthly compounding growth of the default forecast.
pub const DEFAULT_GROWTH: f64 = 0.10;
/// Relative half-width of the default forecast bounds.
pub const DEFAULT_MARGIN: f64 = 0.15;
/// Confidence reported with the default forecast.
pub const DEFAULT_CONFIDENCE: f64 = 0.80;
/// Volatility reported with the default forecast.
pub const DEFAULT_VOLATILITY: f64 = 0.20;
/// Confidence reported with every month of a model-based forecast.
pub const SEASONAL_CONFIDENCE: f64 = 0.95;

/// Trained models of one category.
#[derive(Debug, Clone, PartialEq)]
pub enum CategoryModel {
    SeasonalOnly(SeasonalModel),
    SeasonalWithCorrection(SeasonalModel, CorrectionModel),
}

impl CategoryModel {
    pub fn seasonal(&self) -> &SeasonalModel {
        match self {
            CategoryModel::SeasonalOnly(s) | CategoryModel::SeasonalWithCorrection(s, _) => s,
        }
    }

    pub fn correction(&self) -> Option<&CorrectionModel> {
        match self {
            CategoryModel::SeasonalOnly(_) => None,
            CategoryModel::SeasonalWithCorrection(_, c) => Some(c),
        }
    }
}

/// Which models produced a forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastSource {
    /// No trained model; fixed growth curve
    Default,
    /// Seasonal model only
    Seasonal,
    /// Correction model point estimates inside seasonal bounds
    Corrected,
}

/// The models a category resolves to.
#[derive(Debug, Clone, Copy)]
pub enum Resolution<'a> {
    Default,
    Seasonal(&'a SeasonalModel),
    Corrected {
        seasonal: &'a SeasonalModel,
        correction: &'a CorrectionModel,
        stats: &'a CategoryStats,
    },
}

impl Resolution<'_> {
    pub fn source(&self) -> ForecastSource {
        match self {
            Resolution::Default => ForecastSource::Default,
            Resolution::Seasonal(_) => ForecastSource::Seasonal,
            Resolution::Corrected { .. } => ForecastSource::Corrected,
        }
    }
}

/// A validated forecast query.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRequest {
    category: String,
    region: String,
    economic_index: f64,
    horizon: usize,
}

impl ForecastRequest {
    /// # Errors
    /// * `InvalidInput` for an empty category
    /// * `InvalidParameter` for a negative or non-finite economic index, or a
    ///   horizon outside `1..=12`
    pub fn new(
        category: impl Into<String>,
        region: impl Into<String>,
        economic_index: f64,
        horizon: usize,
    ) -> Result<Self> {
        let category = category.into();
        if category.trim().is_empty() {
            return Err(ForecastError::InvalidInput("category must not be empty".into()));
        }
        if !economic_index.is_finite() || economic_index < 0.0 {
            return Err(ForecastError::InvalidParameter {
                param: "economic_index".into(),
                value: economic_index.to_string(),
                reason: "must be a finite value >= 0".into(),
            });
        }
        if !(1..=MAX_HORIZON).contains(&horizon) {
            return Err(ForecastError::InvalidParameter {
                param: "horizon".into(),
                value: horizon.to_string(),
                reason: format!("must be between 1 and {MAX_HORIZON}"),
            });
        }
        Ok(Self {
            category,
            region: region.into(),
            economic_index,
            horizon,
        })
    }

    /// Request with the default economic index and horizon.
    pub fn with_defaults(category: impl Into<String>, region: impl Into<String>) -> Result<Self> {
        Self::new(category, region, DEFAULT_ECONOMIC_INDEX, DEFAULT_HORIZON)
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn economic_index(&self) -> f64 {
        self.economic_index
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }
}

/// Forecast for one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyForecast {
    #[serde(rename = "date")]
    pub period: Period,
    pub month_name: String,
    pub predicted_volume: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub confidence: f64,
}

/// Response to a [`ForecastRequest`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    pub category: String,
    pub region: String,
    pub forecast_period: String,
    pub forecasts: Vec<MonthlyForecast>,
    pub category_insights: CategoryStats,
    pub recommendations: Vec<String>,
    pub source: ForecastSource,
}

/// Immutable set of trained category models.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelRegistry {
    pub(crate) models: BTreeMap<String, CategoryModel>,
    pub(crate) stats: BTreeMap<String, CategoryStats>,
    locale: Locale,
}

impl ModelRegistry {
    pub fn new(
        models: BTreeMap<String, CategoryModel>,
        stats: BTreeMap<String, CategoryStats>,
    ) -> Self {
        Self {
            models,
            stats,
            locale: Locale::default(),
        }
    }

    /// Render month names and recommendations in `locale`.
    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Trained category names in order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    pub fn model(&self, category: &str) -> Option<&CategoryModel> {
        self.models.get(category)
    }

    pub fn stats(&self, category: &str) -> Option<&CategoryStats> {
        self.stats.get(category)
    }

    /// Like [`Self::model`], but an untrained category is an error.
    pub fn require(&self, category: &str) -> Result<&CategoryModel> {
        self.models
            .get(category)
            .ok_or_else(|| ForecastError::UnknownCategory(category.to_string()))
    }

    /// Resolve the models that will serve `category`.
    pub fn resolve(&self, category: &str) -> Resolution<'_> {
        match self.models.get(category) {
            None => Resolution::Default,
            Some(CategoryModel::SeasonalOnly(seasonal)) => Resolution::Seasonal(seasonal),
            Some(CategoryModel::SeasonalWithCorrection(seasonal, correction)) => {
                match self.stats.get(category) {
                    Some(stats) => Resolution::Corrected {
                        seasonal,
                        correction,
                        stats,
                    },
                    None => {
                        warn!(category, "correction model has no category stats, serving seasonal forecast");
                        Resolution::Seasonal(seasonal)
                    }
                }
            }
        }
    }

    /// Forecast starting with the month after the current local date.
    pub fn forecast(&self, request: &ForecastRequest) -> ForecastResult {
        self.forecast_at(request, chrono::Local::now().date_naive())
    }

    /// Forecast starting with the month after `today`.
    pub fn forecast_at(&self, request: &ForecastRequest, today: NaiveDate) -> ForecastResult {
        let resolution = self.resolve(request.category());
        debug!(
            category = request.category(),
            source = ?resolution.source(),
            horizon = request.horizon(),
            "resolved forecast tier"
        );

        let (forecasts, insights) = match resolution {
            Resolution::Default => {
                warn!(
                    category = request.category(),
                    "no trained model for category, using default forecast"
                );
                let forecasts = self.default_path(request.horizon(), today);
                let insights = CategoryStats {
                    average_volume: DEFAULT_BASE_VOLUME,
                    average_growth_rate: DEFAULT_GROWTH,
                    volatility: DEFAULT_VOLATILITY,
                };
                (forecasts, insights)
            }
            Resolution::Seasonal(seasonal) => (
                self.seasonal_path(seasonal, None, request, today),
                self.stats(request.category()).copied().unwrap_or_default(),
            ),
            Resolution::Corrected {
                seasonal,
                correction,
                stats,
            } => (
                self.seasonal_path(seasonal, Some((correction, stats)), request, today),
                *stats,
            ),
        };

        let recommendations = match resolution {
            Resolution::Default => vec![
                Recommendation::InsufficientData,
                Recommendation::CollectMoreData,
            ],
            _ => {
                let path: Vec<(Period, f64)> = forecasts
                    .iter()
                    .map(|f| (f.period, f.predicted_volume))
                    .collect();
                derive_recommendations(&path)
            }
        };

        ForecastResult {
            category: request.category().to_string(),
            region: request.region().to_string(),
            forecast_period: self.locale.horizon_label(request.horizon()),
            forecasts,
            category_insights: insights,
            recommendations: recommendations
                .iter()
                .map(|r| r.message(self.locale).to_string())
                .collect(),
            source: resolution.source(),
        }
    }

    fn seasonal_path(
        &self,
        seasonal: &SeasonalModel,
        correction: Option<(&CorrectionModel, &CategoryStats)>,
        request: &ForecastRequest,
        today: NaiveDate,
    ) -> Vec<MonthlyForecast> {
        seasonal
            .predict(request.economic_index(), request.horizon(), today)
            .into_iter()
            .map(|point| {
                let predicted_volume = match correction {
                    Some((model, stats)) => {
                        model.predict(stats, point.period, request.economic_index())
                    }
                    None => point.yhat,
                };
                MonthlyForecast {
                    period: point.period,
                    month_name: self.locale.month_name(point.period),
                    predicted_volume,
                    lower_bound: point.yhat_lower,
                    upper_bound: point.yhat_upper,
                    confidence: SEASONAL_CONFIDENCE,
                }
            })
            .collect()
    }

    fn default_path(&self, horizon: usize, today: NaiveDate) -> Vec<MonthlyForecast> {
        Period::following(today, horizon)
            .into_iter()
            .zip(1..)
            .map(|(period, i)| {
                let volume = DEFAULT_BASE_VOLUME * (1.0 + DEFAULT_GROWTH).powi(i);
                MonthlyForecast {
                    period,
                    month_name: self.locale.month_name(period),
                    predicted_volume: volume,
                    lower_bound: volume * (1.0 - DEFAULT_MARGIN),
                    upper_bound: volume * (1.0 + DEFAULT_MARGIN),
                    confidence: DEFAULT_CONFIDENCE,
                }
            })
            .collect()
    }
}
