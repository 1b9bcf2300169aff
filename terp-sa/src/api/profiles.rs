//! Cached profile lookup and search endpoints

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use terp_core::normalize_strain_name;

use crate::db::profiles::{self, StrainRecord};
use crate::error::{ApiError, ApiResult};
use crate::matching::{fuzzy_match_candidates, fuzzy_match_strain};
use crate::AppState;

/// Queries shorter than this return no results instead of scanning
const SEARCH_MIN_QUERY_LEN: usize = 2;
const SEARCH_DEFAULT_LIMIT: usize = 10;
const SEARCH_MAX_LIMIT: usize = 50;

/// A cached strain profile as returned by the API
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub name: String,
    pub normalized_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub terpenes: BTreeMap<String, f64>,
    pub cannabinoids: BTreeMap<String, f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lab_name: Option<String>,
    pub origin: String,
    pub updated_at: DateTime<Utc>,
    /// Present when the lookup matched fuzzily rather than exactly
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_confidence: Option<f64>,
}

impl ProfileResponse {
    fn from_record(record: StrainRecord, match_confidence: Option<f64>) -> Self {
        ProfileResponse {
            name: record.display_name,
            normalized_name: record.normalized_name,
            category: record.category,
            terpenes: record.terpenes,
            cannabinoids: record.cannabinoids,
            lab_name: record.lab_name,
            origin: record.origin,
            updated_at: record.updated_at,
            match_confidence,
        }
    }
}

/// GET /api/profiles/:name
///
/// Exact lookup on the normalized name first, then fuzzy.
pub async fn get_strain_profile(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<ProfileResponse>> {
    let normalized = normalize_strain_name(&name);
    if normalized.is_empty() {
        return Err(ApiError::BadRequest(
            "strain name must not be empty".to_string(),
        ));
    }

    if let Some(record) = profiles::get_profile(&state.pool, &normalized).await? {
        return Ok(Json(ProfileResponse::from_record(record, None)));
    }

    let candidates = profiles::list_profile_names(&state.pool).await?;
    let matched = fuzzy_match_strain(&normalized, &candidates)
        .ok_or_else(|| ApiError::NotFound(format!("Strain '{}' not found", name)))?;

    let record = profiles::get_profile(&state.pool, &matched.normalized_name)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Strain '{}' not found", name)))?;

    Ok(Json(ProfileResponse::from_record(
        record,
        Some(matched.confidence),
    )))
}

/// Search query parameters
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    pub limit: Option<usize>,
}

/// One search hit
#[derive(Debug, Serialize)]
pub struct SearchResult {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// "prefix" or "fuzzy"
    pub match_type: &'static str,
    pub match_score: f64,
}

/// GET /api/search?q=...
///
/// Prefix matches come first with score 1.0; remaining slots fill with
/// fuzzy matches ranked by similarity.
pub async fn search_strains(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Vec<SearchResult>>> {
    let query = normalize_strain_name(&params.q);
    if query.chars().count() < SEARCH_MIN_QUERY_LEN {
        return Ok(Json(Vec::new()));
    }
    let limit = params
        .limit
        .unwrap_or(SEARCH_DEFAULT_LIMIT)
        .min(SEARCH_MAX_LIMIT);

    let mut results = Vec::new();
    let mut seen: BTreeSet<String> = BTreeSet::new();

    for summary in profiles::search_profiles(&state.pool, &query, limit as u32).await? {
        seen.insert(summary.normalized_name);
        results.push(SearchResult {
            name: summary.name,
            category: summary.category,
            match_type: "prefix",
            match_score: 1.0,
        });
    }

    if results.len() < limit {
        let candidates = profiles::list_profile_names(&state.pool).await?;
        for matched in fuzzy_match_candidates(&query, &candidates, limit) {
            if results.len() >= limit {
                break;
            }
            if !seen.insert(matched.normalized_name.clone()) {
                continue;
            }
            let category = profiles::get_profile(&state.pool, &matched.normalized_name)
                .await?
                .and_then(|record| record.category);
            results.push(SearchResult {
                name: matched.display_name,
                category,
                match_type: "fuzzy",
                match_score: matched.confidence,
            });
        }
    }

    Ok(Json(results))
}

/// Build profile routes
pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/api/profiles/:name", get(get_strain_profile))
        .route("/api/search", get(search_strains))
}
