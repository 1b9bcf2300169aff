//! Strain profile database operations
//!
//! Profiles are stored with raw compound names and fraction-scale
//! values; rows are re-normalized when they re-enter the merge
//! pipeline, so schema changes in the reading vocabulary apply to
//! cached data automatically.

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use std::collections::BTreeMap;

use crate::error::{ApiError, ApiResult};

/// A cached strain composition profile
#[derive(Debug, Clone, PartialEq)]
pub struct StrainRecord {
    /// Normalized lookup key (lowercase, suffixes stripped)
    pub normalized_name: String,
    /// Human-facing strain name
    pub display_name: String,
    /// SDP category label, when a classification has been stored
    pub category: Option<String>,
    /// Terpene readings as fractions of total mass, keyed by raw name
    pub terpenes: BTreeMap<String, f64>,
    /// Cannabinoid readings as fractions of total mass, keyed by raw name
    pub cannabinoids: BTreeMap<String, f64>,
    /// Testing lab, when known
    pub lab_name: Option<String>,
    /// Where the row came from (seed dataset, analysis run, upstream API)
    pub origin: String,
    /// Last write timestamp
    pub updated_at: DateTime<Utc>,
}

/// Lightweight row for search results
#[derive(Debug, Clone)]
pub struct ProfileSummary {
    pub normalized_name: String,
    pub name: String,
    pub category: Option<String>,
}

/// Save or update a strain profile
pub async fn save_profile(pool: &SqlitePool, record: &StrainRecord) -> ApiResult<()> {
    let terpenes = serde_json::to_string(&record.terpenes)
        .map_err(|e| ApiError::Internal(format!("Failed to serialize terpenes: {}", e)))?;
    let cannabinoids = serde_json::to_string(&record.cannabinoids)
        .map_err(|e| ApiError::Internal(format!("Failed to serialize cannabinoids: {}", e)))?;
    let updated_at = record.updated_at.to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO strain_profiles (
            normalized_name, display_name, category,
            terpenes, cannabinoids, lab_name, origin, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(normalized_name) DO UPDATE SET
            display_name = excluded.display_name,
            category = excluded.category,
            terpenes = excluded.terpenes,
            cannabinoids = excluded.cannabinoids,
            lab_name = excluded.lab_name,
            origin = excluded.origin,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&record.normalized_name)
    .bind(&record.display_name)
    .bind(&record.category)
    .bind(&terpenes)
    .bind(&cannabinoids)
    .bind(&record.lab_name)
    .bind(&record.origin)
    .bind(&updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Insert a strain profile only if the name is not already cached
///
/// Used by seeding, which must never clobber rows produced by real
/// analyses. Returns whether a row was written.
pub async fn insert_profile_if_absent(
    pool: &SqlitePool,
    record: &StrainRecord,
) -> ApiResult<bool> {
    let terpenes = serde_json::to_string(&record.terpenes)
        .map_err(|e| ApiError::Internal(format!("Failed to serialize terpenes: {}", e)))?;
    let cannabinoids = serde_json::to_string(&record.cannabinoids)
        .map_err(|e| ApiError::Internal(format!("Failed to serialize cannabinoids: {}", e)))?;
    let updated_at = record.updated_at.to_rfc3339();

    let result = sqlx::query(
        r#"
        INSERT INTO strain_profiles (
            normalized_name, display_name, category,
            terpenes, cannabinoids, lab_name, origin, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(normalized_name) DO NOTHING
        "#,
    )
    .bind(&record.normalized_name)
    .bind(&record.display_name)
    .bind(&record.category)
    .bind(&terpenes)
    .bind(&cannabinoids)
    .bind(&record.lab_name)
    .bind(&record.origin)
    .bind(&updated_at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Load a strain profile by its normalized name
pub async fn get_profile(
    pool: &SqlitePool,
    normalized_name: &str,
) -> ApiResult<Option<StrainRecord>> {
    let row = sqlx::query(
        r#"
        SELECT normalized_name, display_name, category,
               terpenes, cannabinoids, lab_name, origin, updated_at
        FROM strain_profiles
        WHERE normalized_name = ?
        "#,
    )
    .bind(normalized_name)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    Ok(Some(record_from_row(&row)?))
}

/// Prefix search over cached profiles for autocomplete
///
/// LIKE wildcards in the query are escaped so they match literally.
pub async fn search_profiles(
    pool: &SqlitePool,
    query: &str,
    limit: u32,
) -> ApiResult<Vec<ProfileSummary>> {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    let pattern = format!("{}%", escaped);

    let rows = sqlx::query(
        r#"
        SELECT normalized_name, display_name, category
        FROM strain_profiles
        WHERE normalized_name LIKE ? ESCAPE '\'
        ORDER BY normalized_name
        LIMIT ?
        "#,
    )
    .bind(&pattern)
    .bind(limit as i64)
    .fetch_all(pool)
    .await?;

    let mut results = Vec::with_capacity(rows.len());
    for row in rows {
        results.push(ProfileSummary {
            normalized_name: row.try_get("normalized_name")?,
            name: row.try_get("display_name")?,
            category: row.try_get("category")?,
        });
    }
    Ok(results)
}

/// List all cached strain names as (normalized, display) pairs
///
/// Used by the fuzzy matcher, which needs the full name universe.
pub async fn list_profile_names(pool: &SqlitePool) -> ApiResult<Vec<(String, String)>> {
    let rows = sqlx::query(
        "SELECT normalized_name, display_name FROM strain_profiles ORDER BY normalized_name",
    )
    .fetch_all(pool)
    .await?;

    let mut names = Vec::with_capacity(rows.len());
    for row in rows {
        names.push((row.try_get("normalized_name")?, row.try_get("display_name")?));
    }
    Ok(names)
}

/// Count cached profiles
pub async fn count_profiles(pool: &SqlitePool) -> ApiResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM strain_profiles")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

fn record_from_row(row: &sqlx::sqlite::SqliteRow) -> ApiResult<StrainRecord> {
    let terpenes_json: String = row.try_get("terpenes")?;
    let cannabinoids_json: String = row.try_get("cannabinoids")?;
    let updated_at_str: String = row.try_get("updated_at")?;

    let terpenes: BTreeMap<String, f64> = serde_json::from_str(&terpenes_json)
        .map_err(|e| ApiError::Internal(format!("Failed to parse terpenes: {}", e)))?;
    let cannabinoids: BTreeMap<String, f64> = serde_json::from_str(&cannabinoids_json)
        .map_err(|e| ApiError::Internal(format!("Failed to parse cannabinoids: {}", e)))?;
    let updated_at = DateTime::parse_from_rfc3339(&updated_at_str)
        .map_err(|e| ApiError::Internal(format!("Failed to parse updated_at: {}", e)))?
        .with_timezone(&Utc);

    Ok(StrainRecord {
        normalized_name: row.try_get("normalized_name")?,
        display_name: row.try_get("display_name")?,
        category: row.try_get("category")?,
        terpenes,
        cannabinoids,
        lab_name: row.try_get("lab_name")?,
        origin: row.try_get("origin")?,
        updated_at,
    })
}
