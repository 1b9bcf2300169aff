//! Database access for terp-sa
//!
//! SQLite-backed cache of strain composition profiles. Cached rows feed
//! the merge pipeline as the `database` source kind and back the search
//! and profile endpoints.

pub mod profiles;
pub mod settings;

use anyhow::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Use proper SQLite URI with mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;

    init_tables(&pool).await?;

    Ok(pool)
}

/// Initialize terp-sa specific tables
///
/// Creates strain_profiles and settings tables if they don't exist
async fn init_tables(pool: &SqlitePool) -> Result<()> {
    // Create settings table for seed-state persistence
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create strain_profiles table for the composition cache
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS strain_profiles (
            normalized_name TEXT PRIMARY KEY,
            display_name TEXT NOT NULL,
            category TEXT,
            terpenes TEXT NOT NULL DEFAULT '{}',
            cannabinoids TEXT NOT NULL DEFAULT '{}',
            lab_name TEXT,
            origin TEXT NOT NULL DEFAULT 'seed',
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (settings, strain_profiles)");

    Ok(())
}
