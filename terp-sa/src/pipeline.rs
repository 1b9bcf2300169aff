//! Strain analysis pipeline
//!
//! Coordinates one analysis end to end:
//! 1. Caller-provided sources (certificate, page) arrive pre-normalized
//! 2. The profile cache is always consulted as a `database` source
//! 3. Upstream strain APIs fill in only when the merged data is
//!    incomplete (Cannlytics first, then Kushy, each retried with a
//!    cleaned-up name)
//! 4. Everything merges under fixed priority, gets classified, and the
//!    result is composed
//! 5. Results backed by a certificate or page are written back to the
//!    cache for future lookups
//!
//! Upstream failures degrade: analysis proceeds with whatever data
//! exists and only errors when no source yielded anything at all.

use chrono::Utc;
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use terp_core::{
    classify_terpene_profile, compose_result, merge_profiles, needs_supplemental_source,
    normalize_readings, normalize_strain_name, title_case_strain_name, AnalysisResult,
    MergedProfile, SourceKind, SourceMeta, SourceProfile, UnitConvention,
};

use crate::clients::{cannlytics::CannlyticsClient, kushy::KushyClient, UpstreamStrainData};
use crate::db::profiles::{self, StrainRecord};
use crate::error::{ApiError, ApiResult};
use crate::matching::fuzzy_match_strain;

/// Error message when every source came up empty
const NO_DATA_MESSAGE: &str = "Could not extract terpene or cannabinoid data from any source";

/// Analysis coordinator holding the cache pool and upstream clients
pub struct AnalysisPipeline {
    pool: SqlitePool,
    cannlytics: CannlyticsClient,
    kushy: KushyClient,
}

impl AnalysisPipeline {
    pub fn new(pool: SqlitePool, cannlytics: CannlyticsClient, kushy: KushyClient) -> Self {
        Self {
            pool,
            cannlytics,
            kushy,
        }
    }

    /// Analyze a strain from caller-provided sources
    ///
    /// `caller_profiles` must already be normalized and restricted to
    /// the certificate and page kinds; the pipeline contributes the
    /// database and api kinds itself.
    pub async fn analyze(
        &self,
        strain_name: &str,
        origin_url: Option<&str>,
        caller_profiles: Vec<SourceProfile>,
    ) -> ApiResult<AnalysisResult> {
        let mut display_name = strain_name.trim().to_string();
        let normalized = normalize_strain_name(&display_name);
        info!(strain = display_name.as_str(), "Starting analysis");

        let mut profiles = caller_profiles;

        // The cache is always consulted, even when caller data looks rich
        if let Some(cached) = self.lookup_cached_source(&normalized).await? {
            debug!(strain = normalized.as_str(), "Found cached profile");
            profiles.push(cached);
        }

        let preliminary = merge_profiles(&profiles);
        let mut upstream_error = None;

        if needs_supplemental_source(&preliminary) {
            debug!(
                terpene_count = preliminary.terpenes.len(),
                "Data incomplete, querying upstream strain APIs"
            );
            let (upstream, error) = self.fetch_supplemental(&display_name, &normalized).await;
            upstream_error = error;

            if let Some(data) = upstream {
                info!(
                    api = data.api_name,
                    strain = data.strain_name.as_str(),
                    "Upstream API supplied supplemental data"
                );
                let profile = data.to_source_profile();
                if !profile.is_empty() {
                    display_name = data.strain_name.clone();
                    profiles.push(profile);
                }
            }
        } else {
            debug!(
                terpene_count = preliminary.terpenes.len(),
                "Data complete, skipping upstream APIs"
            );
        }

        let merged = merge_profiles(&profiles);
        if merged.is_empty() {
            return Err(match upstream_error {
                Some(message) => ApiError::Upstream(message),
                None => ApiError::NotFound(NO_DATA_MESSAGE.to_string()),
            });
        }

        let category = classify_terpene_profile(&merged.terpene_values());
        debug!(category = category.label(), "Classified terpene profile");

        let result = compose_result(&display_name, &merged, category, &profiles, origin_url);

        self.persist_result(&display_name, &merged, &result).await;

        Ok(result)
    }

    /// Load the nearest cached profile as a database source
    async fn lookup_cached_source(&self, normalized: &str) -> ApiResult<Option<SourceProfile>> {
        let candidates = profiles::list_profile_names(&self.pool).await?;
        let Some(matched) = fuzzy_match_strain(normalized, &candidates) else {
            return Ok(None);
        };

        let Some(record) = profiles::get_profile(&self.pool, &matched.normalized_name).await?
        else {
            return Ok(None);
        };

        Ok(Some(cached_source_profile(&record, matched.confidence)))
    }

    /// Query upstream APIs in order, retrying each with a cleaned name
    ///
    /// Returns the first hit plus the last error encountered, so a
    /// total upstream outage can be reported when nothing else exists.
    async fn fetch_supplemental(
        &self,
        display_name: &str,
        normalized: &str,
    ) -> (Option<UpstreamStrainData>, Option<String>) {
        let retry_name = title_case_strain_name(normalized);
        let mut last_error = None;

        for query in lookup_queries(display_name, &retry_name) {
            if self.cannlytics.is_configured() {
                match self.cannlytics.fetch_strain(query).await {
                    Ok(Some(data)) => return (Some(data), last_error),
                    Ok(None) => {}
                    Err(e) => {
                        warn!(error = %e, "Cannlytics lookup failed");
                        last_error = Some(e.to_string());
                    }
                }
            }
        }

        for query in lookup_queries(display_name, &retry_name) {
            match self.kushy.fetch_strain(query).await {
                Ok(Some(data)) => return (Some(data), last_error),
                Ok(None) => {}
                Err(e) => {
                    warn!(error = %e, "Kushy lookup failed");
                    last_error = Some(e.to_string());
                }
            }
        }

        (None, last_error)
    }

    /// Write an analysis back to the cache when it is worth keeping
    ///
    /// Only results grounded in a certificate or page are cached; pure
    /// database/API results would just echo what is already stored
    /// upstream or locally. Cache write failures are logged, never
    /// surfaced, since the analysis itself succeeded.
    async fn persist_result(
        &self,
        display_name: &str,
        merged: &MergedProfile,
        result: &AnalysisResult,
    ) {
        let Some(origin) = primary_origin(merged) else {
            return;
        };
        if result.terpenes.is_empty() {
            return;
        }

        let record = StrainRecord {
            normalized_name: normalize_strain_name(display_name),
            display_name: display_name.to_string(),
            category: Some(result.category.label().to_string()),
            terpenes: result
                .terpenes
                .iter()
                .map(|(t, v)| (t.canonical_key().to_string(), *v))
                .collect(),
            cannabinoids: result
                .totals
                .iter()
                .map(|(c, v)| (c.canonical_key().to_string(), *v))
                .collect(),
            lab_name: result.evidence.lab_name.clone(),
            origin: origin.to_string(),
            updated_at: Utc::now(),
        };

        debug!(
            strain = record.normalized_name.as_str(),
            origin, "Caching analysis result"
        );
        if let Err(e) = profiles::save_profile(&self.pool, &record).await {
            warn!(error = %e, "Failed to cache analysis result");
        }
    }
}

/// The queries to try against one upstream API, deduplicated
fn lookup_queries<'a>(display_name: &'a str, retry_name: &'a str) -> Vec<&'a str> {
    if retry_name.is_empty() || retry_name == display_name {
        vec![display_name]
    } else {
        vec![display_name, retry_name]
    }
}

/// Convert a cached record into a `database` source profile
///
/// Stored readings are fraction-scale; running them back through the
/// normalizer folds any legacy raw names into the current vocabulary.
fn cached_source_profile(record: &StrainRecord, confidence: f64) -> SourceProfile {
    let mut readings: BTreeMap<String, f64> = BTreeMap::new();
    readings.extend(record.terpenes.iter().map(|(k, v)| (k.clone(), *v)));
    readings.extend(record.cannabinoids.iter().map(|(k, v)| (k.clone(), *v)));

    let meta = SourceMeta {
        cached_at: Some(record.updated_at),
        match_confidence: Some(confidence),
        ..SourceMeta::default()
    };

    normalize_readings(SourceKind::Database, UnitConvention::Fraction, &readings, meta)
}

/// The cacheworthy origin of a merged profile, if any
fn primary_origin(merged: &MergedProfile) -> Option<&'static str> {
    if merged.has_source(SourceKind::Certificate) {
        Some("certificate")
    } else if merged.has_source(SourceKind::Page) {
        Some("page")
    } else {
        None
    }
}
