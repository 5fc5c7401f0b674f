//! Command-line parsing for the demand forecasting tool.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use demand_fcst_core::Locale;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "demand-fcst", version, about = "Category demand forecasting")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Train models for every category and save them.
    Train(TrainArgs),
    /// Forecast demand for one category with saved models.
    Forecast(ForecastArgs),
}

#[derive(Debug, Args, Clone)]
pub struct TrainArgs {
    /// JSON array of demand records.
    #[arg(
        long,
        env = "DEMAND_DATA_PATH",
        default_value = "data/synthetic/demand_forecast_data.json"
    )]
    pub data: PathBuf,

    /// Directory the trained models are written to.
    #[arg(long, env = "DEMAND_MODELS_DIR", default_value = "models/saved_models")]
    pub models_dir: PathBuf,

    /// Write a sample prediction (electronics, REG_MSK) to this file.
    #[arg(long)]
    pub samples: Option<PathBuf>,

    /// Correction models at or above this held-out MAPE are discarded.
    #[arg(long, default_value_t = 0.30)]
    pub mape_threshold: f64,

    /// Trees per correction forest.
    #[arg(long, default_value_t = 50)]
    pub trees: usize,

    /// Seed for train/test splits and bootstrap samples.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

#[derive(Debug, Args, Clone)]
pub struct ForecastArgs {
    #[arg(long)]
    pub category: String,

    #[arg(long, default_value = "REG_UNKNOWN")]
    pub region: String,

    #[arg(long, default_value_t = 100.0)]
    pub economic_index: f64,

    /// Months to forecast (1-12).
    #[arg(long, default_value_t = 3)]
    pub horizon: usize,

    #[arg(long, env = "DEMAND_MODELS_DIR", default_value = "models/saved_models")]
    pub models_dir: PathBuf,

    #[arg(long, env = "DEMAND_LOCALE", default_value = "ru")]
    pub locale: Locale,

    /// Forecast as of this date (YYYY-MM-DD) instead of today.
    #[arg(long)]
    pub today: Option<String>,

    /// Fail instead of serving the default forecast for untrained categories.
    #[arg(long)]
    pub require_trained: bool,
}
