//! Seed dataset loading
//!
//! On startup the service imports bundled JSON datasets into the
//! profile cache so lookups work before any analysis has run. Each
//! dataset is imported once, tracked by a settings flag keyed on the
//! file stem, and seeding never overwrites rows produced by analyses.

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

use terp_core::{
    classify_terpene_profile, normalize_readings, normalize_strain_name, SourceKind, SourceMeta,
    UnitConvention,
};

use crate::db::profiles::{self, StrainRecord};
use crate::db::settings;

/// A seed dataset file
#[derive(Debug, Deserialize)]
struct SeedFile {
    /// Unit convention for every value in the file
    unit: UnitConvention,
    strains: Vec<SeedStrain>,
}

#[derive(Debug, Deserialize)]
struct SeedStrain {
    name: String,
    #[serde(default)]
    terpenes: BTreeMap<String, f64>,
    #[serde(default)]
    cannabinoids: BTreeMap<String, f64>,
    #[serde(default)]
    lab_name: Option<String>,
}

/// Import every not-yet-imported JSON dataset under `seed_dir`
///
/// A bad dataset is logged and skipped; startup continues with the
/// rest.
pub async fn load_seed_datasets(pool: &SqlitePool, seed_dir: &Path) -> Result<()> {
    if !seed_dir.is_dir() {
        info!(
            dir = %seed_dir.display(),
            "No seed dataset directory, skipping import"
        );
        return Ok(());
    }

    let mut paths: Vec<_> = std::fs::read_dir(seed_dir)
        .with_context(|| format!("Failed to read seed directory: {}", seed_dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    for path in paths {
        let stem = match path.file_stem().and_then(|s| s.to_str()) {
            Some(stem) => stem.to_string(),
            None => continue,
        };

        if settings::is_seed_completed(pool, &stem).await? {
            debug!(dataset = stem.as_str(), "Seed dataset already imported");
            continue;
        }

        match import_seed_file(pool, &path).await {
            Ok(count) => {
                info!(
                    dataset = stem.as_str(),
                    strains = count,
                    "Imported seed dataset"
                );
                settings::mark_seed_completed(pool, &stem).await?;
            }
            Err(e) => {
                warn!(dataset = stem.as_str(), error = %e, "Skipping seed dataset");
            }
        }
    }

    Ok(())
}

/// Import one dataset file, returning the number of rows written
async fn import_seed_file(pool: &SqlitePool, path: &Path) -> Result<usize> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed file: {}", path.display()))?;
    let file: SeedFile = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse seed file: {}", path.display()))?;

    let mut imported = 0;
    for strain in &file.strains {
        if let Some(record) = seed_record(strain, file.unit) {
            if profiles::insert_profile_if_absent(pool, &record).await? {
                imported += 1;
            }
        }
    }
    Ok(imported)
}

/// Build a cache record from one seed entry
///
/// Values are converted to fractions and filtered like any other
/// reading; entries with no usable name or no usable values are
/// dropped.
fn seed_record(strain: &SeedStrain, unit: UnitConvention) -> Option<StrainRecord> {
    let display_name = strain.name.trim().to_string();
    let normalized_name = normalize_strain_name(&display_name);
    if normalized_name.is_empty() {
        return None;
    }

    let terpenes = convert_readings(&strain.terpenes, unit);
    let cannabinoids = convert_readings(&strain.cannabinoids, unit);
    if terpenes.is_empty() && cannabinoids.is_empty() {
        return None;
    }

    // Classify up front so search results carry a category before the
    // strain is ever analyzed
    let category = categorize(&terpenes);

    Some(StrainRecord {
        normalized_name,
        display_name,
        category,
        terpenes,
        cannabinoids,
        lab_name: strain.lab_name.clone(),
        origin: "seed".to_string(),
        updated_at: Utc::now(),
    })
}

/// Convert raw seed values to fractions, dropping anything invalid
fn convert_readings(
    readings: &BTreeMap<String, f64>,
    unit: UnitConvention,
) -> BTreeMap<String, f64> {
    readings
        .iter()
        .filter_map(|(name, &value)| {
            if !value.is_finite() || value <= 0.0 {
                return None;
            }
            let fraction = match unit {
                UnitConvention::Percent => value / 100.0,
                UnitConvention::Fraction => value,
            };
            (fraction <= 1.0).then(|| (name.clone(), fraction))
        })
        .collect()
}

/// Classify a seeded terpene map through the shared vocabulary
fn categorize(terpenes: &BTreeMap<String, f64>) -> Option<String> {
    let profile = normalize_readings(
        SourceKind::Database,
        UnitConvention::Fraction,
        terpenes,
        SourceMeta::default(),
    );
    if profile.terpenes.is_empty() {
        return None;
    }
    Some(
        classify_terpene_profile(&profile.terpenes)
            .label()
            .to_string(),
    )
}
