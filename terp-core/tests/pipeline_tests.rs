//! End-to-end tests over the pure analysis pipeline:
//! normalize → merge → classify → compose.

use std::collections::BTreeMap;
use terp_core::{
    classify_terpene_profile, compose_result, merge_profiles, needs_supplemental_source,
    normalize_readings, SdpCategory, SourceKind, SourceMeta, SourceProfile, Terpene,
    UnitConvention,
};

fn readings(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

#[test]
fn certificate_and_page_flow_to_classified_result() {
    // Certificate reports fractions; the page scrape reports percentages.
    let certificate = normalize_readings(
        SourceKind::Certificate,
        UnitConvention::Fraction,
        &readings(&[
            ("β-Myrcene", 0.012),
            ("D-Limonene", 0.004),
            ("beta_caryophyllene", 0.003),
            ("THCA", 0.242),
            ("CBD", 0.002),
        ]),
        SourceMeta {
            lab_name: Some("Steep Hill".to_string()),
            test_date: Some("2025-01-15".to_string()),
            ..SourceMeta::default()
        },
    );
    let page = normalize_readings(
        SourceKind::Page,
        UnitConvention::Percent,
        &readings(&[
            ("myrcene", 0.9),
            ("linalool", 0.2),
            ("humulene", 0.15),
            ("total_thc", 24.0),
        ]),
        SourceMeta::default(),
    );

    let profiles = vec![certificate, page];
    let merged = merge_profiles(&profiles);

    // Certificate wins myrcene; page contributes the rest
    assert_eq!(merged.terpenes[&Terpene::Myrcene].value, 0.012);
    assert_eq!(
        merged.terpenes[&Terpene::Myrcene].source,
        SourceKind::Certificate
    );
    assert_eq!(merged.terpenes[&Terpene::Linalool].value, 0.002);
    assert_eq!(
        merged.sources,
        vec![SourceKind::Certificate, SourceKind::Page]
    );

    let category = classify_terpene_profile(&merged.terpene_values());
    assert_eq!(category, SdpCategory::Blue);

    let result = compose_result("blue dream", &merged, category, &profiles, None);
    assert_eq!(result.category, SdpCategory::Blue);
    assert!(result.summary.contains("blue dream"));
    assert!(result.data_available.has_certificate);
    assert_eq!(result.evidence.lab_name.as_deref(), Some("Steep Hill"));
    assert!(result.total_terpenes > 0.0);
}

#[test]
fn sparse_profile_triggers_supplemental_lookup() {
    let page = normalize_readings(
        SourceKind::Page,
        UnitConvention::Percent,
        &readings(&[("myrcene", 0.8), ("limonene", 0.3)]),
        SourceMeta::default(),
    );
    let merged = merge_profiles(&[page]);
    assert!(needs_supplemental_source(&merged));
}

#[test]
fn supplemental_source_completes_profile() {
    let page = normalize_readings(
        SourceKind::Page,
        UnitConvention::Percent,
        &readings(&[
            ("myrcene", 0.8),
            ("limonene", 0.3),
            ("caryophyllene", 0.2),
            ("linalool", 0.1),
        ]),
        SourceMeta::default(),
    );
    let api = normalize_readings(
        SourceKind::Api,
        UnitConvention::Fraction,
        &readings(&[
            ("humulene", 0.001),
            ("thc", 0.20),
            ("cbd", 0.003),
            ("cbg", 0.008),
            ("cbn", 0.001),
        ]),
        SourceMeta {
            api_name: Some("cannlytics".to_string()),
            match_confidence: Some(0.92),
            ..SourceMeta::default()
        },
    );

    let sparse = merge_profiles(&[page.clone()]);
    assert!(needs_supplemental_source(&sparse));

    let complete = merge_profiles(&[page, api]);
    assert!(!needs_supplemental_source(&complete));
    assert_eq!(
        complete.sources,
        vec![SourceKind::Page, SourceKind::Api]
    );
}

#[test]
fn no_data_produces_fallback_not_error() {
    let empty: Vec<SourceProfile> = Vec::new();
    let merged = merge_profiles(&empty);
    let category = classify_terpene_profile(&merged.terpene_values());
    let result = compose_result("unknown strain", &merged, category, &empty, None);

    assert_eq!(result.category, terp_core::FALLBACK_CATEGORY);
    assert_eq!(result.summary, "unknown strain - Limited data available");
    assert!(result.sources.is_empty());
}

#[test]
fn merged_output_serializes_deterministically() {
    let build = |reversed: bool| {
        let a = normalize_readings(
            SourceKind::Certificate,
            UnitConvention::Fraction,
            &readings(&[("myrcene", 0.012), ("terpinolene", 0.002)]),
            SourceMeta::default(),
        );
        let b = normalize_readings(
            SourceKind::Database,
            UnitConvention::Fraction,
            &readings(&[("myrcene", 0.009), ("limonene", 0.004)]),
            SourceMeta::default(),
        );
        let profiles = if reversed { vec![b, a] } else { vec![a, b] };
        let merged = merge_profiles(&profiles);
        let category = classify_terpene_profile(&merged.terpene_values());
        serde_json::to_string(&compose_result("gelato", &merged, category, &profiles, None))
            .unwrap()
    };

    assert_eq!(build(false), build(true));
}
