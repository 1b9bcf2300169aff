//! Strain analysis endpoint
//!
//! Callers provide a strain name plus any certificate or page readings
//! they hold; the service contributes its cache and upstream APIs. The
//! `database` and `api` source kinds are reserved for the service and
//! rejected in requests.

use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use std::collections::BTreeMap;

use terp_core::{
    normalize_readings, AnalysisResult, SourceKind, SourceMeta, SourceProfile, UnitConvention,
};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Analysis request body
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    /// Strain name as the caller knows it
    pub strain_name: String,
    /// Where the readings were obtained, for evidence reporting
    #[serde(default)]
    pub url: Option<String>,
    /// Caller-held sources, certificate and page kinds only
    #[serde(default)]
    pub sources: Vec<CallerSource>,
}

/// One caller-held source of raw readings
#[derive(Debug, Deserialize)]
pub struct CallerSource {
    pub kind: SourceKind,
    pub unit: UnitConvention,
    #[serde(default)]
    pub readings: BTreeMap<String, f64>,
    #[serde(default)]
    pub lab_name: Option<String>,
    #[serde(default)]
    pub test_date: Option<String>,
    #[serde(default)]
    pub certificate_url: Option<String>,
}

impl CallerSource {
    /// Normalize the raw readings into a source profile
    fn to_profile(&self) -> SourceProfile {
        let meta = SourceMeta {
            lab_name: self.lab_name.clone(),
            test_date: self.test_date.clone(),
            certificate_url: self.certificate_url.clone(),
            ..SourceMeta::default()
        };
        normalize_readings(self.kind, self.unit, &self.readings, meta)
    }
}

/// POST /api/analyze
pub async fn analyze_strain(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> ApiResult<Json<AnalysisResult>> {
    let strain_name = request.strain_name.trim();
    if strain_name.is_empty() {
        return Err(ApiError::BadRequest(
            "strain_name must not be empty".to_string(),
        ));
    }

    let mut caller_profiles = Vec::with_capacity(request.sources.len());
    for source in &request.sources {
        if !matches!(source.kind, SourceKind::Certificate | SourceKind::Page) {
            return Err(ApiError::BadRequest(format!(
                "source kind '{}' is supplied by the service, not the caller",
                source.kind.as_str()
            )));
        }
        caller_profiles.push(source.to_profile());
    }

    match state
        .pipeline
        .analyze(strain_name, request.url.as_deref(), caller_profiles)
        .await
    {
        Ok(analysis) => Ok(Json(analysis)),
        Err(err) => {
            if let ApiError::Upstream(message) = &err {
                *state.last_error.write().await = Some(message.clone());
            }
            Err(err)
        }
    }
}

/// Build analysis routes
pub fn analyze_routes() -> Router<AppState> {
    Router::new().route("/api/analyze", post(analyze_strain))
}

#[cfg(test)]
mod tests {
    use super::*;
    use terp_core::Terpene;

    #[test]
    fn request_deserializes_with_defaults() {
        let request: AnalyzeRequest = serde_json::from_str(
            r#"{
                "strain_name": "Blue Dream",
                "sources": [{
                    "kind": "page",
                    "unit": "percent",
                    "readings": { "myrcene": 1.2 }
                }]
            }"#,
        )
        .unwrap();

        assert_eq!(request.strain_name, "Blue Dream");
        assert!(request.url.is_none());
        assert_eq!(request.sources.len(), 1);
        assert_eq!(request.sources[0].kind, SourceKind::Page);
        assert!(request.sources[0].lab_name.is_none());
    }

    #[test]
    fn caller_source_normalizes_into_profile() {
        let source = CallerSource {
            kind: SourceKind::Certificate,
            unit: UnitConvention::Percent,
            readings: [("β-myrcene".to_string(), 1.2)].into_iter().collect(),
            lab_name: Some("Green Labs".to_string()),
            test_date: Some("2024-03-01".to_string()),
            certificate_url: Some("https://labs.test/coa.pdf".to_string()),
        };

        let profile = source.to_profile();
        assert_eq!(profile.kind, SourceKind::Certificate);
        assert_eq!(profile.terpenes.get(&Terpene::Myrcene), Some(&0.012));
        assert_eq!(profile.meta.lab_name.as_deref(), Some("Green Labs"));
        assert_eq!(
            profile.meta.certificate_url.as_deref(),
            Some("https://labs.test/coa.pdf")
        );
    }
}
