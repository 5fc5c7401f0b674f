//! Feature extraction from nested demand records.
//!
//! The data-preparation stage delivers one record per (region, month) with
//! per-category figures nested inside. Training needs the opposite shape: a
//! flat table keyed by (region, period, category), then one ordered series
//! per category.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::period::Period;
use crate::series::{CategorySeries, Observation};

/// Names of the flat regressors, in [`FlatRecord::feature_vector`] order.
/// The target column is `total_volume`.
pub const FEATURE_NAMES: [&str; 4] = [
    "transaction_count",
    "avg_transaction",
    "growth_trend",
    "economic_index",
];

/// Figures reported for one category in one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryFigures {
    pub transaction_count: f64,
    pub total_volume: f64,
    pub avg_transaction: f64,
    pub growth_trend: f64,
}

/// Macro-economic context of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalFactors {
    pub economic_index: f64,
}

/// Raw nested record as produced by the data-preparation stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandRecord {
    pub region_id: String,
    pub period: Period,
    pub category_data: BTreeMap<String, CategoryFigures>,
    pub external_factors: ExternalFactors,
}

/// One row of the flattened demand table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatRecord {
    pub region: String,
    pub period: Period,
    pub category: String,
    pub transaction_count: f64,
    pub total_volume: f64,
    pub avg_transaction: f64,
    pub growth_trend: f64,
    pub economic_index: f64,
}

impl FlatRecord {
    /// Regressors in [`FEATURE_NAMES`] order.
    pub fn feature_vector(&self) -> [f64; 4] {
        [
            self.transaction_count,
            self.avg_transaction,
            self.growth_trend,
            self.economic_index,
        ]
    }

    fn observation(&self) -> Observation {
        Observation {
            period: self.period,
            total_volume: self.total_volume,
            economic_index: self.economic_index,
            growth_trend: self.growth_trend,
        }
    }
}

/// Read a JSON array of [`DemandRecord`]s.
pub fn load_demand_records(path: &Path) -> Result<Vec<DemandRecord>> {
    let raw = fs::read_to_string(path)?;
    let records: Vec<DemandRecord> = serde_json::from_str(&raw)?;
    tracing::debug!(path = %path.display(), records = records.len(), "loaded demand records");
    Ok(records)
}

/// Flatten nested records into one row per (record, category).
pub fn flatten_records(records: &[DemandRecord]) -> Vec<FlatRecord> {
    records
        .iter()
        .flat_map(|record| {
            record
                .category_data
                .iter()
                .map(move |(category, figures)| FlatRecord {
                    region: record.region_id.clone(),
                    period: record.period,
                    category: category.clone(),
                    transaction_count: figures.transaction_count,
                    total_volume: figures.total_volume,
                    avg_transaction: figures.avg_transaction,
                    growth_trend: figures.growth_trend,
                    economic_index: record.external_factors.economic_index,
                })
        })
        .collect()
}

/// Split the flat table into one period-ordered series per category.
///
/// Rows sharing a period keep their input order.
pub fn group_by_category(rows: &[FlatRecord]) -> Result<BTreeMap<String, CategorySeries>> {
    let mut grouped: BTreeMap<&str, Vec<Observation>> = BTreeMap::new();
    for row in rows {
        grouped
            .entry(row.category.as_str())
            .or_default()
            .push(row.observation());
    }

    grouped
        .into_iter()
        .map(|(category, mut observations)| {
            observations.sort_by_key(|o| o.period);
            CategorySeries::new(category, observations).map(|s| (category.to_string(), s))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {
            "region_id": "REG_MOSCOW",
            "period": "2024-03",
            "category_data": {
                "electronics": {
                    "transaction_count": 52000,
                    "total_volume": 200000000,
                    "avg_transaction": 4000,
                    "growth_trend": 0.1,
                    "seasonality": {"q1": 0.95}
                },
                "groceries": {
                    "transaction_count": 400000,
                    "total_volume": 450000000,
                    "avg_transaction": 1100,
                    "growth_trend": 0.05
                }
            },
            "external_factors": {"economic_index": 101.5, "weather_impact": 0.9},
            "forecast_3months": {}
        },
        {
            "region_id": "REG_KAZAN",
            "period": "2024-01",
            "category_data": {
                "electronics": {
                    "transaction_count": 30000,
                    "total_volume": 120000000,
                    "avg_transaction": 3900,
                    "growth_trend": 0.07
                }
            },
            "external_factors": {"economic_index": 97.0}
        }
    ]"#;

    #[test]
    fn test_flatten_ignores_unknown_fields() {
        let records: Vec<DemandRecord> = serde_json::from_str(SAMPLE).unwrap();
        let rows = flatten_records(&records);
        assert_eq!(rows.len(), 3);

        let first = &rows[0];
        assert_eq!(first.region, "REG_MOSCOW");
        assert_eq!(first.category, "electronics");
        assert_eq!(first.economic_index, 101.5);
        assert_eq!(first.feature_vector(), [52000.0, 4000.0, 0.1, 101.5]);
    }

    #[test]
    fn test_group_orders_by_period() {
        let records: Vec<DemandRecord> = serde_json::from_str(SAMPLE).unwrap();
        let grouped = group_by_category(&flatten_records(&records)).unwrap();

        assert_eq!(grouped.len(), 2);
        let electronics = &grouped["electronics"];
        assert_eq!(electronics.len(), 2);
        assert_eq!(electronics.observations()[0].period.to_string(), "2024-01");
        assert_eq!(electronics.observations()[0].total_volume, 120_000_000.0);
        assert_eq!(electronics.observations()[1].period.to_string(), "2024-03");
        assert_eq!(grouped["groceries"].len(), 1);
    }

    #[test]
    fn test_load_demand_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demand.json");
        std::fs::write(&path, SAMPLE).unwrap();

        let records = load_demand_records(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert!(load_demand_records(&dir.path().join("missing.json")).is_err());
    }
}
