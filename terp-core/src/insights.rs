//! Cannabinoid ratio and potency insights
//!
//! Short human-readable observations derived from the merged cannabinoid
//! map: THC:CBD ratio class, potency tier, and notable minor cannabinoids.
//! All values are mass fractions; acid forms are converted to effective
//! neutral-form content before any comparison.

use crate::vocab::Cannabinoid;
use std::collections::BTreeMap;

/// Fraction of an acid cannabinoid converted when decarboxylated
/// (THCA → THC, CBDA → CBD).
pub const DECARB_FACTOR: f64 = 0.877;

/// Effective THC fraction: THC plus decarboxylated THCA.
pub fn effective_thc(cannabinoids: &BTreeMap<Cannabinoid, f64>) -> f64 {
    value(cannabinoids, Cannabinoid::Thc) + value(cannabinoids, Cannabinoid::Thca) * DECARB_FACTOR
}

/// Effective CBD fraction: CBD plus decarboxylated CBDA.
pub fn effective_cbd(cannabinoids: &BTreeMap<Cannabinoid, f64>) -> f64 {
    value(cannabinoids, Cannabinoid::Cbd) + value(cannabinoids, Cannabinoid::Cbda) * DECARB_FACTOR
}

fn value(cannabinoids: &BTreeMap<Cannabinoid, f64>, compound: Cannabinoid) -> f64 {
    cannabinoids.get(&compound).copied().unwrap_or(0.0)
}

/// Generate insight strings from a merged cannabinoid map.
///
/// Returns an empty list when no cannabinoid data is present.
pub fn cannabinoid_insights(cannabinoids: &BTreeMap<Cannabinoid, f64>) -> Vec<String> {
    let mut insights = Vec::new();

    let thc_total = effective_thc(cannabinoids);
    let cbd_total = effective_cbd(cannabinoids);

    if thc_total > 0.0 && cbd_total > 0.0 {
        let ratio = thc_total / cbd_total;
        if ratio > 20.0 {
            insights.push(format!("THC-dominant ({ratio:.0}:1 ratio)"));
        } else if ratio > 5.0 {
            insights.push(format!("High THC ({ratio:.0}:1 ratio)"));
        } else if ratio > 2.0 {
            insights.push(format!("THC-leaning ({ratio:.1}:1 ratio)"));
        } else if ratio > 0.5 {
            insights.push(format!("Balanced THC:CBD ({ratio:.1}:1 ratio)"));
        } else {
            insights.push(format!("CBD-rich (1:{:.1} ratio)", 1.0 / ratio));
        }
    } else if thc_total > 0.0 {
        insights.push("THC-dominant, minimal CBD".to_string());
    } else if cbd_total > 0.0 {
        insights.push("CBD-dominant, minimal THC".to_string());
    }

    if thc_total > 0.25 {
        insights.push("Very high potency".to_string());
    } else if thc_total > 0.20 {
        insights.push("High potency".to_string());
    } else if thc_total > 0.15 {
        insights.push("Moderate-high potency".to_string());
    } else if thc_total > 0.10 {
        insights.push("Moderate potency".to_string());
    }

    if value(cannabinoids, Cannabinoid::Cbn) > 0.005 {
        insights.push("Elevated CBN may promote sleepiness".to_string());
    }
    if value(cannabinoids, Cannabinoid::Cbg) > 0.01 {
        insights.push("Notable CBG presence".to_string());
    }
    if value(cannabinoids, Cannabinoid::Thcv) > 0.005 {
        insights.push("Contains THCV".to_string());
    }
    if value(cannabinoids, Cannabinoid::Cbdv) > 0.005 {
        insights.push("Contains CBDV".to_string());
    }

    insights
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(Cannabinoid, f64)]) -> BTreeMap<Cannabinoid, f64> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_thc_dominant_ratio() {
        let insights = cannabinoid_insights(&map(&[
            (Cannabinoid::Thc, 0.25),
            (Cannabinoid::Cbd, 0.005),
        ]));
        assert!(insights.iter().any(|i| i.contains("THC-dominant")));
    }

    #[test]
    fn test_high_thc_ratio() {
        let insights = cannabinoid_insights(&map(&[
            (Cannabinoid::Thc, 0.20),
            (Cannabinoid::Cbd, 0.02),
        ]));
        assert!(insights.iter().any(|i| i.contains("High THC")));
    }

    #[test]
    fn test_balanced_ratio() {
        let insights = cannabinoid_insights(&map(&[
            (Cannabinoid::Thc, 0.10),
            (Cannabinoid::Cbd, 0.10),
        ]));
        assert!(insights.iter().any(|i| i.contains("Balanced")));
    }

    #[test]
    fn test_cbd_rich() {
        let insights = cannabinoid_insights(&map(&[
            (Cannabinoid::Thc, 0.01),
            (Cannabinoid::Cbd, 0.15),
        ]));
        assert!(insights.iter().any(|i| i.contains("CBD-rich")));
    }

    #[test]
    fn test_potency_tiers() {
        let very_high = cannabinoid_insights(&map(&[(Cannabinoid::Thc, 0.28)]));
        assert!(very_high.iter().any(|i| i == "Very high potency"));

        let high = cannabinoid_insights(&map(&[(Cannabinoid::Thc, 0.22)]));
        assert!(high.iter().any(|i| i == "High potency"));

        let moderate = cannabinoid_insights(&map(&[(Cannabinoid::Thc, 0.12)]));
        assert!(moderate.iter().any(|i| i == "Moderate potency"));
    }

    #[test]
    fn test_thca_contributes_through_decarb() {
        // 0.30 THCA is ~0.263 effective THC
        let insights = cannabinoid_insights(&map(&[(Cannabinoid::Thca, 0.30)]));
        assert!(insights.iter().any(|i| i.contains("potency")));
    }

    #[test]
    fn test_minor_cannabinoids() {
        let insights = cannabinoid_insights(&map(&[
            (Cannabinoid::Thc, 0.15),
            (Cannabinoid::Cbn, 0.01),
            (Cannabinoid::Cbg, 0.02),
        ]));
        assert!(insights.iter().any(|i| i.contains("CBN")));
        assert!(insights.iter().any(|i| i.contains("CBG")));
    }

    #[test]
    fn test_empty_map_no_insights() {
        assert!(cannabinoid_insights(&BTreeMap::new()).is_empty());
    }
}
