//! Settings table operations
//!
//! Key/value persistence, currently used to record which seed datasets
//! have already been imported.

use sqlx::SqlitePool;

use crate::error::ApiResult;

/// Read a setting value
pub async fn get_setting(pool: &SqlitePool, key: &str) -> ApiResult<Option<String>> {
    let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;
    Ok(value)
}

/// Write a setting value, replacing any existing one
pub async fn set_setting(pool: &SqlitePool, key: &str, value: &str) -> ApiResult<()> {
    sqlx::query(
        r#"
        INSERT INTO settings (key, value) VALUES (?, ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value
        "#,
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;
    Ok(())
}

/// Check whether a seed dataset has already been imported
pub async fn is_seed_completed(pool: &SqlitePool, dataset: &str) -> ApiResult<bool> {
    let key = format!("seed_completed:{}", dataset);
    Ok(get_setting(pool, &key).await?.as_deref() == Some("true"))
}

/// Mark a seed dataset as imported
pub async fn mark_seed_completed(pool: &SqlitePool, dataset: &str) -> ApiResult<()> {
    let key = format!("seed_completed:{}", dataset);
    set_setting(pool, &key, "true").await
}
