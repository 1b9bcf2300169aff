//! Kushy strain API client
//!
//! Free fallback source with no API key. The API exposes table dumps
//! rather than name lookup, so matching happens client-side over the
//! returned rows. Terpene columns are qualitative (a comma-separated
//! presence list) and are ignored; only cannabinoid percentages are
//! usable.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

use terp_core::UnitConvention;

use super::UpstreamStrainData;

/// Name-match confidence for substring matches against the table dump
const KUSHY_MATCH_CONFIDENCE: f64 = 0.9;

#[derive(Debug, Deserialize)]
struct KushyStrainRow {
    name: Option<String>,
    terpenes: Option<String>,
    thc: Option<serde_json::Value>,
    cbd: Option<serde_json::Value>,
    cbg: Option<serde_json::Value>,
    cbn: Option<serde_json::Value>,
}

/// Kushy API client
pub struct KushyClient {
    base_url: String,
    client: reqwest::Client,
    rate_limiter: governor::RateLimiter<
        governor::state::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl KushyClient {
    pub fn new(base_url: String) -> Self {
        // Each lookup pulls a whole table, so stay slow
        // Safe: 1 is always non-zero
        let quota = governor::Quota::per_second(std::num::NonZeroU32::new(1).unwrap());
        let rate_limiter = governor::RateLimiter::direct(quota);

        Self {
            base_url,
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(15))
                .build()
                .expect("Failed to build HTTP client (system error)"),
            rate_limiter,
        }
    }

    /// Look up cannabinoid data for a strain by name
    ///
    /// Returns `Ok(None)` when no row matches or the matching row has
    /// no parseable cannabinoid values.
    pub async fn fetch_strain(&self, strain_name: &str) -> Result<Option<UpstreamStrainData>> {
        self.rate_limiter.until_ready().await;

        debug!(strain = strain_name, "Querying Kushy strain table");

        let response = self
            .client
            .get(format!("{}/strains/rows", self.base_url))
            .send()
            .await
            .context("Kushy API request failed")?;

        if !response.status().is_success() {
            anyhow::bail!("Kushy API returned error: {}", response.status());
        }

        let rows: Vec<KushyStrainRow> = response
            .json()
            .await
            .context("Failed to parse Kushy response")?;

        Ok(extract_strain(rows, strain_name))
    }
}

/// Find the first row whose name contains the query, case-insensitive
fn extract_strain(rows: Vec<KushyStrainRow>, query: &str) -> Option<UpstreamStrainData> {
    let query_lower = query.to_lowercase();

    let row = rows.into_iter().find(|row| {
        row.name
            .as_ref()
            .is_some_and(|name| name.to_lowercase().contains(&query_lower))
    })?;

    if let Some(terpenes) = row.terpenes.as_deref().filter(|t| !t.is_empty()) {
        // Presence list only, no percentages to merge
        debug!(terpenes, "Ignoring qualitative Kushy terpene list");
    }

    let mut readings = BTreeMap::new();
    for (key, value) in [
        ("thc", &row.thc),
        ("cbd", &row.cbd),
        ("cbg", &row.cbg),
        ("cbn", &row.cbn),
    ] {
        if let Some(fraction) = value.as_ref().and_then(coerce_fraction) {
            readings.insert(key.to_string(), fraction);
        }
    }

    if readings.is_empty() {
        debug!(strain = query, "Kushy row had no quantitative data");
        return None;
    }

    Some(UpstreamStrainData {
        strain_name: row.name.unwrap_or_else(|| query.to_string()),
        readings,
        unit: UnitConvention::Fraction,
        api_name: "kushy",
        match_confidence: KUSHY_MATCH_CONFIDENCE,
    })
}

/// Parse a number-or-string cell and scale percentages down
///
/// Kushy mixes 0-100 and 0-1 scales between rows; values above 1 are
/// treated as percentages.
fn coerce_fraction(value: &serde_json::Value) -> Option<f64> {
    let number = value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))?;
    if number > 1.0 {
        Some(number / 100.0)
    } else {
        Some(number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(value: serde_json::Value) -> Vec<KushyStrainRow> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn matches_by_case_insensitive_substring() {
        let rows = rows(json!([
            { "name": "Sour Diesel", "thc": "22" },
            { "name": "Blue Dream Haze", "thc": "18", "cbd": "0.5" }
        ]));

        let data = extract_strain(rows, "blue dream").unwrap();
        assert_eq!(data.strain_name, "Blue Dream Haze");
        assert_eq!(data.match_confidence, KUSHY_MATCH_CONFIDENCE);
        assert_eq!(data.api_name, "kushy");
    }

    #[test]
    fn percent_scale_values_are_converted() {
        let rows = rows(json!([{ "name": "OG Kush", "thc": "22", "cbd": 0.004 }]));

        let data = extract_strain(rows, "og kush").unwrap();
        assert_eq!(data.readings.get("thc"), Some(&0.22));
        assert_eq!(data.readings.get("cbd"), Some(&0.004));
    }

    #[test]
    fn qualitative_terpenes_are_not_readings() {
        let rows = rows(json!([{
            "name": "OG Kush",
            "terpenes": "Limonene, Myrcene, Caryophyllene",
            "thc": "20"
        }]));

        let data = extract_strain(rows, "og kush").unwrap();
        assert_eq!(data.readings.len(), 1);
        assert!(data.readings.contains_key("thc"));
    }

    #[test]
    fn row_without_numbers_yields_none() {
        let rows = rows(json!([{
            "name": "OG Kush",
            "terpenes": "Limonene",
            "thc": "unknown"
        }]));
        assert!(extract_strain(rows, "og kush").is_none());
    }

    #[test]
    fn no_matching_row_yields_none() {
        let rows = rows(json!([{ "name": "Sour Diesel", "thc": "22" }]));
        assert!(extract_strain(rows, "northern lights").is_none());
    }
}
