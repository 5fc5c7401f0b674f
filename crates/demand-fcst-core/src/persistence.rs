//! On-disk model registry.
//!
//! Layout of a models directory:
//!
//! ```text
//! seasonal_<slug>.json     one per trained category
//! correction_<slug>.json   only for categories with a retained correction model
//! category_stats.json      statistics of every trained category
//! ```
//!
//! Every model file records the exact category name, so the slug in the file
//! name is never parsed back.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::correction::CorrectionModel;
use crate::error::{ForecastError, Result};
use crate::registry::{CategoryModel, ModelRegistry};
use crate::seasonal::SeasonalModel;
use crate::stats::CategoryStats;

const SEASONAL_PREFIX: &str = "seasonal_";
const CORRECTION_PREFIX: &str = "correction_";
const STATS_FILE: &str = "category_stats.json";

#[derive(Serialize)]
struct BlobRef<'a, M> {
    category: &'a str,
    model: &'a M,
}

#[derive(Deserialize)]
struct Blob<M> {
    category: String,
    model: M,
}

/// File-name stem for a category: spaces become underscores, path separators
/// and other punctuation are dropped.
pub fn slug(category: &str) -> String {
    category
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('_'),
            c if c.is_alphanumeric() || c == '_' || c == '-' => Some(c),
            _ => None,
        })
        .collect()
}

fn is_model_file(name: &str) -> bool {
    name.ends_with(".json")
        && (name.starts_with(SEASONAL_PREFIX) || name.starts_with(CORRECTION_PREFIX))
}

fn read_blob<M: DeserializeOwned>(path: &Path) -> Result<Blob<M>> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    fs::write(path, serde_json::to_vec_pretty(value)?)?;
    Ok(())
}

impl ModelRegistry {
    /// Write every model and the statistics table to `dir`.
    ///
    /// Model files from an earlier save in the same directory are removed
    /// first, so a category that lost its correction model does not keep a
    /// stale one.
    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_name().to_str().is_some_and(is_model_file) {
                fs::remove_file(entry.path())?;
            }
        }

        let mut used = HashSet::new();
        for (category, model) in &self.models {
            let base = slug(category);
            let mut stem = base.clone();
            let mut n = 2;
            while !used.insert(stem.clone()) {
                stem = format!("{base}-{n}");
                n += 1;
            }

            write_json(
                &dir.join(format!("{SEASONAL_PREFIX}{stem}.json")),
                &BlobRef {
                    category,
                    model: model.seasonal(),
                },
            )?;
            if let Some(correction) = model.correction() {
                write_json(
                    &dir.join(format!("{CORRECTION_PREFIX}{stem}.json")),
                    &BlobRef {
                        category,
                        model: correction,
                    },
                )?;
            }
        }

        write_json(&dir.join(STATS_FILE), &self.stats)?;
        info!(dir = %dir.display(), categories = self.models.len(), "saved models");
        Ok(())
    }

    /// Load a registry from `dir`.
    ///
    /// A missing directory yields an empty registry, which serves the default
    /// forecast for every category. Unreadable model files are skipped.
    ///
    /// # Errors
    /// `Io` if the directory exists but cannot be listed.
    pub fn load(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            let err = ForecastError::PersistenceUnavailable(dir.to_path_buf());
            warn!(error = %err, "serving default forecasts only");
            return Ok(Self::default());
        }

        let mut seasonal: BTreeMap<String, SeasonalModel> = BTreeMap::new();
        let mut corrections: BTreeMap<String, CorrectionModel> = BTreeMap::new();

        let mut paths: Vec<_> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .collect();
        paths.sort();

        for path in &paths {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !is_model_file(name) {
                continue;
            }
            if name.starts_with(SEASONAL_PREFIX) {
                match read_blob::<SeasonalModel>(path) {
                    Ok(blob) => {
                        seasonal.insert(blob.category, blob.model);
                    }
                    Err(e) => warn!(file = name, error = %e, "skipping unreadable seasonal model"),
                }
            } else {
                match read_blob::<CorrectionModel>(path) {
                    Ok(blob) => {
                        corrections.insert(blob.category, blob.model);
                    }
                    Err(e) => {
                        warn!(file = name, error = %e, "skipping unreadable correction model")
                    }
                }
            }
        }

        let stats_path = dir.join(STATS_FILE);
        let stats: BTreeMap<String, CategoryStats> = if stats_path.is_file() {
            match fs::read(&stats_path)
                .map_err(ForecastError::from)
                .and_then(|bytes| serde_json::from_slice(&bytes).map_err(ForecastError::from))
            {
                Ok(stats) => stats,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable category statistics");
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };

        for category in corrections.keys() {
            if !seasonal.contains_key(category) {
                warn!(category = category.as_str(), "ignoring correction model without a seasonal model");
            }
        }

        let models: BTreeMap<String, CategoryModel> = seasonal
            .into_iter()
            .map(|(category, s)| {
                let model = match corrections.remove(&category) {
                    Some(c) => CategoryModel::SeasonalWithCorrection(s, c),
                    None => CategoryModel::SeasonalOnly(s),
                };
                (category, model)
            })
            .collect();

        info!(dir = %dir.display(), categories = models.len(), "loaded models");
        Ok(Self::new(models, stats))
    }
}
