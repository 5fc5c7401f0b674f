//! Core library for category demand forecasting.
//!
//! Trains a seasonal model and an optional correction forest per product
//! category, blends them at inference time and derives purchasing
//! recommendations from the forecast path.

pub mod correction;
pub mod error;
pub mod features;
pub mod forest;
pub mod locale;
pub mod metrics;
pub mod period;
pub mod persistence;
pub mod recommend;
pub mod registry;
pub mod seasonal;
pub mod series;
pub mod stats;
pub mod training;

// Re-exports for convenience
pub use correction::{CorrectionModel, CorrectionOptions};
pub use error::{ForecastError, Result};
pub use features::{
    flatten_records, group_by_category, load_demand_records, DemandRecord, FlatRecord,
};
pub use forest::{DecisionTreeRegressor, RandomForestRegressor};
pub use locale::Locale;
pub use metrics::{mae, mape, mse, rmse};
pub use period::Period;
pub use recommend::{derive_recommendations, Recommendation};
pub use registry::{
    CategoryModel, ForecastRequest, ForecastResult, ForecastSource, ModelRegistry,
    MonthlyForecast, Resolution,
};
pub use seasonal::{SeasonalModel, SeasonalOptions, SeasonalPoint};
pub use series::{CategorySeries, Observation};
pub use stats::CategoryStats;
pub use training::{train, TrainingOptions, TrainingOutcome, TrainingReport, TrainingRun};
