//! Command dispatch. `src/main.rs` only sets up the environment and logging.

use std::fs;

use chrono::NaiveDate;
use clap::Parser;
use demand_fcst_core::{
    flatten_records, group_by_category, load_demand_records, train, CorrectionOptions,
    ForecastError, ForecastRequest, ForecastResult, ModelRegistry, TrainingOptions,
    TrainingReport,
};
use tracing::info;

use crate::cli::{Cli, Command, ForecastArgs, TrainArgs};
use crate::error::AppError;

/// Category, region and economic index of the sample prediction.
const SAMPLE_REQUEST: (&str, &str, f64) = ("electronics", "REG_MSK", 105.0);

/// Entry point for the `demand-fcst` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Train(args) => {
            let report = train_models(&args)?;
            for (category, outcome) in &report.outcomes {
                println!("{category}: {outcome}");
            }
            println!(
                "trained {} of {} categories ({} with correction)",
                report.trained(),
                report.outcomes.len(),
                report.corrected()
            );
            Ok(())
        }
        Command::Forecast(args) => {
            let result = forecast(&args)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
    }
}

/// Load records, train every category and save the registry.
pub fn train_models(args: &TrainArgs) -> Result<TrainingReport, AppError> {
    let records = load_demand_records(&args.data)?;
    let rows = flatten_records(&records);
    if rows.is_empty() {
        return Err(ForecastError::InvalidInput(format!(
            "no category figures in {}",
            args.data.display()
        ))
        .into());
    }
    let series = group_by_category(&rows)?;
    info!(records = records.len(), rows = rows.len(), categories = series.len(), "loaded training data");

    let options = TrainingOptions {
        correction: CorrectionOptions {
            mape_threshold: args.mape_threshold,
            n_estimators: args.trees,
            random_state: args.seed,
            ..Default::default()
        },
        ..Default::default()
    };
    let run = train(&series, &options);
    run.registry.save(&args.models_dir)?;

    if let Some(path) = &args.samples {
        let (category, region, index) = SAMPLE_REQUEST;
        let request = ForecastRequest::new(category, region, index, 3)?;
        let sample = serde_json::json!({ "demand_forecast": run.registry.forecast(&request) });
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(&sample)?)?;
        info!(path = %path.display(), "wrote sample prediction");
    }

    Ok(run.report)
}

/// Load saved models and forecast one category.
pub fn forecast(args: &ForecastArgs) -> Result<ForecastResult, AppError> {
    let request = ForecastRequest::new(
        args.category.as_str(),
        args.region.as_str(),
        args.economic_index,
        args.horizon,
    )?;
    let registry = ModelRegistry::load(&args.models_dir)?.with_locale(args.locale);
    if args.require_trained {
        registry.require(request.category())?;
    }

    let result = match &args.today {
        Some(raw) => {
            let today = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| ForecastError::InvalidDateFormat(raw.clone()))?;
            registry.forecast_at(&request, today)
        }
        None => registry.forecast(&request),
    };
    Ok(result)
}
