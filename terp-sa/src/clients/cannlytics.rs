//! Cannlytics strain API client
//!
//! Primary supplemental source. Requires an API key; without one the
//! client reports itself unconfigured and lookups are skipped.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

use terp_core::UnitConvention;

use super::UpstreamStrainData;

#[derive(Debug, Deserialize)]
struct StrainsResponse {
    strains: Option<Vec<StrainEntry>>,
}

#[derive(Debug, Deserialize)]
struct StrainEntry {
    name: Option<String>,
    terpenes: Option<BTreeMap<String, serde_json::Value>>,
}

/// Cannlytics API client
pub struct CannlyticsClient {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
    rate_limiter: governor::RateLimiter<
        governor::state::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl CannlyticsClient {
    pub fn new(base_url: String, api_key: Option<String>) -> Self {
        // Keep well under the public API's documented limits
        // Safe: 2 is always non-zero
        let quota = governor::Quota::per_second(std::num::NonZeroU32::new(2).unwrap());
        let rate_limiter = governor::RateLimiter::direct(quota);

        Self {
            base_url,
            api_key,
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(15))
                .build()
                .expect("Failed to build HTTP client (system error)"),
            rate_limiter,
        }
    }

    /// Check if an API key is configured
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Look up average composition data for a strain by name
    ///
    /// Returns `Ok(None)` when the client is unconfigured, the strain is
    /// unknown upstream, or the row carries no usable readings.
    pub async fn fetch_strain(&self, strain_name: &str) -> Result<Option<UpstreamStrainData>> {
        let Some(api_key) = &self.api_key else {
            debug!("Cannlytics lookup skipped: no API key configured");
            return Ok(None);
        };

        self.rate_limiter.until_ready().await;

        debug!(strain = strain_name, "Querying Cannlytics strain API");

        let response = self
            .client
            .get(format!("{}/strains", self.base_url))
            .bearer_auth(api_key)
            .query(&[("name", strain_name)])
            .send()
            .await
            .context("Cannlytics API request failed")?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            anyhow::bail!("Cannlytics API returned error: {}", response.status());
        }

        let api_response: StrainsResponse = response
            .json()
            .await
            .context("Failed to parse Cannlytics response")?;

        Ok(extract_strain(api_response, strain_name))
    }
}

/// Pull the first returned strain into upstream readings
fn extract_strain(response: StrainsResponse, query: &str) -> Option<UpstreamStrainData> {
    let strains = response.strains?;
    let entry = strains.into_iter().next()?;

    let mut readings = BTreeMap::new();
    for (name, value) in entry.terpenes.unwrap_or_default() {
        if let Some(value) = coerce_number(&value) {
            readings.insert(name, value);
        }
    }

    if readings.is_empty() {
        debug!(strain = query, "Cannlytics row had no numeric terpene data");
        return None;
    }

    Some(UpstreamStrainData {
        strain_name: entry.name.unwrap_or_else(|| query.to_string()),
        readings,
        unit: UnitConvention::Fraction,
        api_name: "cannlytics",
        // The strains endpoint matches by exact name
        match_confidence: 1.0,
    })
}

/// Accept numbers or numeric strings, which the API mixes freely
fn coerce_number(value: &serde_json::Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}
