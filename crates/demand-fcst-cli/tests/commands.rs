//! End-to-end tests of the train and forecast commands.

use std::fs;
use std::path::Path;

use demand_fcst_cli::app::{forecast, train_models};
use demand_fcst_cli::cli::{ForecastArgs, TrainArgs};
use demand_fcst_core::{ForecastSource, Locale, TrainingOutcome};
use serde_json::json;

/// Two regions over `months` months; "electronics" in every record,
/// "books" only in the first eight months of one region.
fn write_records(path: &Path, months: u32) {
    let mut records = Vec::new();
    for m in 0..months {
        let year = 2022 + m / 12;
        let month = m % 12 + 1;
        for (r, region) in ["REG_MSK", "REG_SPB"].iter().enumerate() {
            let base = 1_000_000.0 + 10_000.0 * f64::from(m) + 1_000.0 * r as f64;
            let mut categories = json!({
                "electronics": {
                    "transaction_count": 500.0 + f64::from(m),
                    "total_volume": base,
                    "avg_transaction": base / 500.0,
                    "growth_trend": 0.05
                }
            });
            if r == 0 && m < 8 {
                categories["books"] = json!({
                    "transaction_count": 50.0,
                    "total_volume": 20_000.0,
                    "avg_transaction": 400.0,
                    "growth_trend": 0.0
                });
            }
            records.push(json!({
                "region_id": region,
                "period": format!("{year:04}-{month:02}"),
                "category_data": categories,
                "external_factors": { "economic_index": 100.0 + f64::from(m % 6) }
            }));
        }
    }
    fs::write(path, serde_json::to_string(&records).unwrap()).unwrap();
}

fn train_args(dir: &Path) -> TrainArgs {
    TrainArgs {
        data: dir.join("demand.json"),
        models_dir: dir.join("models"),
        samples: Some(dir.join("reports/sample_predictions.json")),
        mape_threshold: 0.30,
        trees: 20,
        seed: 42,
    }
}

fn forecast_args(dir: &Path, category: &str) -> ForecastArgs {
    ForecastArgs {
        category: category.to_string(),
        region: "REG_MSK".to_string(),
        economic_index: 100.0,
        horizon: 3,
        models_dir: dir.join("models"),
        locale: Locale::Ru,
        today: Some("2025-05-14".to_string()),
        require_trained: false,
    }
}

#[test]
fn test_train_then_forecast() {
    let dir = tempfile::tempdir().unwrap();
    write_records(&dir.path().join("demand.json"), 18);

    let report = train_models(&train_args(dir.path())).unwrap();
    // Volumes stay within 1.0M..1.2M, so any forest prediction is within 20%.
    assert!(matches!(
        report.outcomes["electronics"],
        TrainingOutcome::Corrected { .. }
    ));
    assert!(matches!(report.outcomes["books"], TrainingOutcome::Skipped(_)));
    assert!(dir.path().join("models/category_stats.json").is_file());

    let sample: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(dir.path().join("reports/sample_predictions.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(sample["demand_forecast"]["category"], "electronics");
    assert_eq!(sample["demand_forecast"]["region"], "REG_MSK");

    let result = forecast(&forecast_args(dir.path(), "electronics")).unwrap();
    assert_eq!(result.source, ForecastSource::Corrected);
    assert_eq!(result.forecasts.len(), 3);
    assert_eq!(result.forecasts[0].period.to_string(), "2025-06");

    let fallback = forecast(&forecast_args(dir.path(), "books")).unwrap();
    assert_eq!(fallback.source, ForecastSource::Default);
}

#[test]
fn test_forecast_without_models_uses_default() {
    let dir = tempfile::tempdir().unwrap();
    let result = forecast(&forecast_args(dir.path(), "electronics")).unwrap();
    assert_eq!(result.source, ForecastSource::Default);
    assert!((result.forecasts[0].predicted_volume - 55_000_000.0).abs() < 1e-3);
}

#[test]
fn test_forecast_errors_map_to_exit_codes() {
    let dir = tempfile::tempdir().unwrap();

    let mut args = forecast_args(dir.path(), "electronics");
    args.require_trained = true;
    assert_eq!(forecast(&args).unwrap_err().exit_code(), 8);

    let mut args = forecast_args(dir.path(), "electronics");
    args.horizon = 24;
    assert_eq!(forecast(&args).unwrap_err().exit_code(), 11);

    let mut args = forecast_args(dir.path(), "electronics");
    args.today = Some("14.05.2025".to_string());
    assert_eq!(forecast(&args).unwrap_err().exit_code(), 10);
}

#[test]
fn test_train_missing_data_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = train_models(&train_args(dir.path())).unwrap_err();
    assert_eq!(err.exit_code(), 12);
}
