//! Result composer
//!
//! Assembles the final `AnalysisResult` from a merged profile, its
//! category, and the consulted sources. This stage only formats and
//! copies; it performs no numeric analysis of its own and always
//! produces a well-formed record, however sparse the inputs.

use crate::classify::SdpCategory;
use crate::effects::{generate_effects_profile, EffectsProfile};
use crate::insights::cannabinoid_insights;
use crate::profile::{MergedProfile, SourceKind, SourceProfile};
use crate::vocab::{Cannabinoid, Terpene};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// How the winning data was obtained, named after the highest-priority
/// contributing source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    CertificateParse,
    PageScrape,
    DatabaseCache,
    ApiFallback,
}

impl DetectionMethod {
    fn from_source(kind: SourceKind) -> DetectionMethod {
        match kind {
            SourceKind::Certificate => DetectionMethod::CertificateParse,
            SourceKind::Page => DetectionMethod::PageScrape,
            SourceKind::Database => DetectionMethod::DatabaseCache,
            SourceKind::Api => DetectionMethod::ApiFallback,
        }
    }
}

/// Provenance metadata for the winning sources. Every field is optional
/// and only populated when the corresponding source kind contributed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Evidence {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection_method: Option<DetectionMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lab_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_at: Option<DateTime<Utc>>,
}

/// Counts of what the merge actually found.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DataAvailability {
    pub has_terpenes: bool,
    pub has_cannabinoids: bool,
    pub has_certificate: bool,
    pub terpene_count: usize,
    pub cannabinoid_count: usize,
}

/// Final analysis record returned to callers.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    /// Contributing source kinds, in priority order.
    pub sources: Vec<SourceKind>,
    pub terpenes: BTreeMap<Terpene, f64>,
    pub totals: BTreeMap<Cannabinoid, f64>,
    pub total_terpenes: f64,
    pub category: SdpCategory,
    pub traditional_label: String,
    pub summary: String,
    pub strain_guess: String,
    pub evidence: Evidence,
    pub data_available: DataAvailability,
    pub cannabinoid_insights: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effects: Option<EffectsProfile>,
}

/// Compose the final result.
///
/// `source_profiles` are the consulted sources; metadata is harvested
/// only from kinds that actually contributed a winning value.
pub fn compose_result(
    strain_guess: &str,
    merged: &MergedProfile,
    category: SdpCategory,
    source_profiles: &[SourceProfile],
    origin_url: Option<&str>,
) -> AnalysisResult {
    let terpenes = merged.terpene_values();
    let totals = merged.cannabinoid_values();

    let data_available = DataAvailability {
        has_terpenes: !terpenes.is_empty(),
        has_cannabinoids: !totals.is_empty(),
        has_certificate: merged.has_source(SourceKind::Certificate),
        terpene_count: terpenes.len(),
        cannabinoid_count: totals.len(),
    };

    let summary = if data_available.has_terpenes {
        generate_summary(strain_guess, category, &terpenes)
    } else if data_available.has_cannabinoids {
        format!("{strain_guess} - Cannabinoid data available")
    } else {
        format!("{strain_guess} - Limited data available")
    };

    let effects = if data_available.has_terpenes {
        generate_effects_profile(&terpenes, &totals)
    } else {
        None
    };

    AnalysisResult {
        sources: merged.sources.clone(),
        evidence: build_evidence(merged, source_profiles, origin_url),
        cannabinoid_insights: cannabinoid_insights(&totals),
        effects,
        terpenes,
        totals,
        total_terpenes: merged.total_terpenes,
        category,
        traditional_label: category.traditional_label().to_string(),
        summary,
        strain_guess: strain_guess.to_string(),
        data_available,
    }
}

/// One-sentence summary from the fixed per-category template.
pub fn generate_summary(
    strain_name: &str,
    category: SdpCategory,
    terpenes: &BTreeMap<Terpene, f64>,
) -> String {
    let mut ranked: Vec<(Terpene, f64)> = terpenes.iter().map(|(k, v)| (*k, *v)).collect();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });

    let terp_detail = if ranked.len() >= 2 {
        format!(
            " featuring {} and {}",
            ranked[0].0.display_name(),
            ranked[1].0.display_name()
        )
    } else {
        String::new()
    };

    format!(
        "{strain_name}'s composition puts it in the {category} category ({label} in traditional terms): expect {description}{terp_detail}.",
        category = category.label(),
        label = category.traditional_label(),
        description = category.description(),
    )
}

fn build_evidence(
    merged: &MergedProfile,
    source_profiles: &[SourceProfile],
    origin_url: Option<&str>,
) -> Evidence {
    let mut evidence = Evidence {
        detection_method: merged.sources.first().map(|k| DetectionMethod::from_source(*k)),
        origin_url: origin_url.map(str::to_string),
        ..Evidence::default()
    };

    for kind in &merged.sources {
        let Some(profile) = source_profiles.iter().find(|p| p.kind == *kind) else {
            continue;
        };
        match kind {
            SourceKind::Certificate => {
                evidence.lab_name = profile.meta.lab_name.clone();
                evidence.test_date = profile.meta.test_date.clone();
                evidence.certificate_url = profile.meta.certificate_url.clone();
            }
            SourceKind::Database => {
                evidence.cached_at = profile.meta.cached_at;
            }
            SourceKind::Api => {
                evidence.api_name = profile.meta.api_name.clone();
                // A perfect name match needs no caveat
                if let Some(confidence) = profile.meta.match_confidence {
                    if confidence < 1.0 {
                        evidence.match_confidence = Some(confidence);
                    }
                }
            }
            SourceKind::Page => {}
        }
    }

    evidence
}
