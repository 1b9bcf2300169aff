//! Effects engine
//!
//! Pure-function experience prediction from terpene shares and
//! cannabinoid fractions: body/mind balance, daytime suitability,
//! onset/peak/duration timeline, intensity tier, context suggestions,
//! and terpene interaction notes.

use crate::insights::{effective_cbd, effective_thc};
use crate::vocab::{Cannabinoid, Terpene};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Full effects prediction for one profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectsProfile {
    pub overall_character: String,
    pub onset: String,
    pub peak: String,
    pub duration: String,
    pub best_contexts: Vec<String>,
    pub potential_negatives: Vec<String>,
    pub terpene_interactions: Vec<String>,
    pub experience_summary: String,
    pub intensity_estimate: String,
    /// 0 = nighttime, 1 = daytime.
    pub daytime_score: f64,
    /// 0 = pure body, 1 = pure mind.
    pub body_mind_balance: f64,
}

/// Per-terpene effect characteristics. `body_weight` runs 0 (cerebral)
/// to 1 (body).
#[derive(Clone, Copy)]
struct TerpeneEffect {
    body_weight: f64,
    best_for: &'static [&'static str],
    negatives: &'static [&'static str],
    onset_modifier: f64,
    duration_modifier: f64,
}

fn effect_profile(terpene: Terpene) -> Option<TerpeneEffect> {
    Some(match terpene {
        Terpene::Myrcene => TerpeneEffect {
            body_weight: 0.85,
            best_for: &["Nighttime", "Sleep", "Pain relief", "Relaxation"],
            negatives: &["Drowsiness", "Couch-lock at high levels"],
            onset_modifier: 0.0,
            duration_modifier: 0.1,
        },
        Terpene::Limonene => TerpeneEffect {
            body_weight: 0.2,
            best_for: &["Daytime", "Social events", "Creative work", "Mood boost"],
            negatives: &["Heartburn in sensitive individuals"],
            onset_modifier: -0.05,
            duration_modifier: -0.05,
        },
        Terpene::Caryophyllene => TerpeneEffect {
            body_weight: 0.6,
            best_for: &["Pain management", "Stress relief", "Evening wind-down"],
            negatives: &["Dry mouth"],
            onset_modifier: 0.0,
            duration_modifier: 0.05,
        },
        Terpene::AlphaPinene => TerpeneEffect {
            body_weight: 0.15,
            best_for: &["Daytime", "Studying", "Hiking", "Creative focus"],
            negatives: &["May increase anxiety in sensitive users"],
            onset_modifier: -0.05,
            duration_modifier: -0.1,
        },
        Terpene::BetaPinene => TerpeneEffect {
            body_weight: 0.15,
            best_for: &["Daytime", "Studying", "Focus work"],
            negatives: &[],
            onset_modifier: -0.05,
            duration_modifier: -0.1,
        },
        Terpene::Terpinolene => TerpeneEffect {
            body_weight: 0.3,
            best_for: &["Daytime", "Creative work", "Social events", "Exercise"],
            negatives: &["Overstimulation if sensitive"],
            onset_modifier: -0.1,
            duration_modifier: -0.15,
        },
        Terpene::Humulene => TerpeneEffect {
            body_weight: 0.5,
            best_for: &["Weight management", "Pain relief", "Evening"],
            negatives: &[],
            onset_modifier: 0.0,
            duration_modifier: 0.0,
        },
        Terpene::Linalool => TerpeneEffect {
            body_weight: 0.75,
            best_for: &["Nighttime", "Anxiety relief", "Sleep", "Relaxation"],
            negatives: &["Drowsiness"],
            onset_modifier: 0.05,
            duration_modifier: 0.1,
        },
        Terpene::Ocimene => TerpeneEffect {
            body_weight: 0.25,
            best_for: &["Daytime", "Light activity"],
            negatives: &[],
            onset_modifier: 0.0,
            duration_modifier: -0.05,
        },
        _ => return None,
    })
}

fn share(shares: &BTreeMap<Terpene, f64>, terpene: Terpene) -> f64 {
    shares.get(&terpene).copied().unwrap_or(0.0)
}

/// Ratio-based terpene synergy notes, evaluated over normalized shares.
const INTERACTION_RULES: [(fn(&BTreeMap<Terpene, f64>) -> bool, &str); 7] = [
    (
        |t| share(t, Terpene::Limonene) > 0.15 && share(t, Terpene::Myrcene) > 0.20,
        "Limonene tempers myrcene's heavy sedation, creating a more balanced relaxation with uplifted mood",
    ),
    (
        |t| share(t, Terpene::Myrcene) > 0.25 && share(t, Terpene::Caryophyllene) > 0.15,
        "Myrcene and caryophyllene synergize for deep body relaxation and potent pain relief",
    ),
    (
        |t| {
            share(t, Terpene::AlphaPinene) + share(t, Terpene::BetaPinene) > 0.15
                && share(t, Terpene::Myrcene) > 0.20
        },
        "Pinene may counteract some of myrcene's memory-clouding effects while preserving relaxation",
    ),
    (
        |t| share(t, Terpene::Linalool) > 0.05 && share(t, Terpene::Myrcene) > 0.20,
        "Linalool and myrcene together amplify sedative effects, a strong candidate for sleep aid",
    ),
    (
        |t| share(t, Terpene::Limonene) > 0.15 && share(t, Terpene::Caryophyllene) > 0.15,
        "Limonene and caryophyllene together create a spicy-citrus stress relief combo",
    ),
    (
        |t| share(t, Terpene::Terpinolene) > 0.15 && share(t, Terpene::Ocimene) > 0.05,
        "Terpinolene and ocimene create a distinctly uplifting, energetic experience characteristic of classic sativas",
    ),
    (
        |t| share(t, Terpene::Caryophyllene) > 0.15 && share(t, Terpene::Humulene) > 0.05,
        "Caryophyllene and humulene (both found in hops) work together for enhanced anti-inflammatory effects",
    ),
];

/// Generate an effects profile from merged terpene values and
/// cannabinoid fractions.
///
/// Terpene values are normalized to shares internally, so either raw
/// merged values or pre-normalized shares are acceptable input. Returns
/// `None` when there is no positive terpene mass to reason about.
pub fn generate_effects_profile(
    terpenes: &BTreeMap<Terpene, f64>,
    cannabinoids: &BTreeMap<Cannabinoid, f64>,
) -> Option<EffectsProfile> {
    let total: f64 = terpenes.values().filter(|v| **v > 0.0).sum();
    if total <= 0.0 {
        return None;
    }
    let shares: BTreeMap<Terpene, f64> = terpenes
        .iter()
        .filter(|(_, v)| **v > 0.0)
        .map(|(k, v)| (*k, *v / total))
        .collect();

    let thc_total = effective_thc(cannabinoids);
    let cbd_total = effective_cbd(cannabinoids);

    let body_mind_balance = calc_body_mind_balance(&shares);
    let daytime_score = calc_daytime_score(&shares, body_mind_balance);
    let (onset, peak, duration) = calc_timeline(&shares, thc_total, cbd_total);

    Some(EffectsProfile {
        overall_character: describe_character(body_mind_balance, daytime_score),
        onset,
        peak,
        duration,
        best_contexts: collect_best_contexts(&shares),
        potential_negatives: collect_negatives(&shares, thc_total),
        terpene_interactions: INTERACTION_RULES
            .iter()
            .filter(|(condition, _)| condition(&shares))
            .map(|(_, description)| description.to_string())
            .collect(),
        experience_summary: experience_summary(&shares, thc_total, cbd_total, body_mind_balance),
        intensity_estimate: intensity_estimate(thc_total, cbd_total),
        daytime_score: round2(daytime_score),
        body_mind_balance: round2(body_mind_balance),
    })
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Share-weighted average of each terpene's mind weight (1 - body_weight).
fn calc_body_mind_balance(shares: &BTreeMap<Terpene, f64>) -> f64 {
    let mut total_weight = 0.0;
    let mut total_value = 0.0;
    for (&terpene, &fraction) in shares {
        if let Some(effect) = effect_profile(terpene) {
            total_value += (1.0 - effect.body_weight) * fraction;
            total_weight += fraction;
        }
    }
    if total_weight > 0.0 {
        total_value / total_weight
    } else {
        0.5
    }
}

fn calc_daytime_score(shares: &BTreeMap<Terpene, f64>, body_mind: f64) -> f64 {
    const DAYTIME: [Terpene; 5] = [
        Terpene::Terpinolene,
        Terpene::AlphaPinene,
        Terpene::BetaPinene,
        Terpene::Limonene,
        Terpene::Ocimene,
    ];
    const NIGHTTIME: [Terpene; 2] = [Terpene::Myrcene, Terpene::Linalool];

    let daytime_frac: f64 = DAYTIME.iter().map(|t| share(shares, *t)).sum();
    let nighttime_frac: f64 = NIGHTTIME.iter().map(|t| share(shares, *t)).sum();

    (body_mind * 0.6 + daytime_frac * 0.8 - nighttime_frac * 0.4).clamp(0.0, 1.0)
}

fn calc_timeline(
    shares: &BTreeMap<Terpene, f64>,
    thc_total: f64,
    cbd_total: f64,
) -> (String, String, String) {
    const BASE_ONSET: f64 = 10.0;
    const BASE_PEAK: f64 = 30.0;
    const BASE_DURATION: f64 = 120.0;

    let mut onset_mod = 0.0;
    let mut duration_mod = 0.0;
    for (&terpene, &fraction) in shares {
        if fraction > 0.05 {
            if let Some(effect) = effect_profile(terpene) {
                onset_mod += effect.onset_modifier * fraction * 10.0;
                duration_mod += effect.duration_modifier * fraction * 10.0;
            }
        }
    }

    // High THC extends duration; CBD slows onset slightly
    if thc_total > 0.25 {
        duration_mod += 30.0;
    } else if thc_total > 0.20 {
        duration_mod += 15.0;
    }
    if cbd_total > 0.05 {
        onset_mod += 5.0;
    }

    let onset = format!(
        "{}-{} min",
        ((BASE_ONSET + onset_mod) as i64).max(5),
        ((BASE_ONSET + onset_mod + 10.0) as i64).max(10)
    );
    let peak = format!(
        "{}-{} min",
        ((BASE_PEAK + onset_mod) as i64).max(15),
        ((BASE_PEAK + onset_mod + 20.0) as i64).max(30)
    );
    let duration = format!(
        "{}-{} min",
        ((BASE_DURATION + duration_mod) as i64).max(60),
        ((BASE_DURATION + duration_mod + 60.0) as i64).max(90)
    );

    (onset, peak, duration)
}

fn intensity_estimate(thc_total: f64, cbd_total: f64) -> String {
    let mut thc = thc_total;
    // CBD buffers perceived intensity
    if cbd_total > 0.05 && thc > 0.0 {
        thc *= 0.8;
    }

    let tier = if thc > 0.28 {
        "Very High"
    } else if thc > 0.22 {
        "High"
    } else if thc > 0.15 {
        "Moderate-High"
    } else if thc > 0.10 {
        "Moderate"
    } else if thc > 0.0 {
        "Low-Moderate"
    } else {
        "Unknown"
    };
    tier.to_string()
}

fn collect_best_contexts(shares: &BTreeMap<Terpene, f64>) -> Vec<String> {
    let mut contexts: BTreeMap<&'static str, f64> = BTreeMap::new();
    for (&terpene, &fraction) in shares {
        if fraction > 0.05 {
            if let Some(effect) = effect_profile(terpene) {
                for ctx in effect.best_for {
                    let weight = contexts.entry(ctx).or_insert(0.0);
                    if fraction > *weight {
                        *weight = fraction;
                    }
                }
            }
        }
    }

    let mut ranked: Vec<(&'static str, f64)> = contexts.into_iter().collect();
    // Weight descending, then name, so the order is stable
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal).then(a.0.cmp(b.0)));
    ranked.into_iter().take(6).map(|(ctx, _)| ctx.to_string()).collect()
}

fn collect_negatives(shares: &BTreeMap<Terpene, f64>, thc_total: f64) -> Vec<String> {
    let mut negatives: BTreeSet<&'static str> = BTreeSet::new();
    for (&terpene, &fraction) in shares {
        if fraction > 0.10 {
            if let Some(effect) = effect_profile(terpene) {
                negatives.extend(effect.negatives);
            }
        }
    }

    if thc_total > 0.25 {
        negatives.insert("High THC may cause anxiety or paranoia in sensitive users");
    }
    if thc_total > 0.30 {
        negatives.insert("Very high THC, start with a low dose");
    }

    negatives.into_iter().map(str::to_string).collect()
}

fn describe_character(body_mind: f64, daytime: f64) -> String {
    let character = if body_mind < 0.3 {
        "deeply body-focused"
    } else if body_mind < 0.45 {
        "body-leaning"
    } else if body_mind < 0.55 {
        "balanced body and mind"
    } else if body_mind < 0.7 {
        "mind-leaning"
    } else {
        "cerebral and heady"
    };

    let timing = if daytime > 0.7 {
        "best suited for daytime use"
    } else if daytime > 0.4 {
        "versatile for any time of day"
    } else {
        "best suited for evening or nighttime"
    };

    format!("A {character} experience, {timing}")
}

fn experience_summary(
    shares: &BTreeMap<Terpene, f64>,
    thc_total: f64,
    cbd_total: f64,
    body_mind: f64,
) -> String {
    let mut ranked: Vec<(Terpene, f64)> = shares.iter().map(|(k, v)| (*k, *v)).collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal).then(a.0.cmp(&b.0)));

    let mut parts: Vec<String> = Vec::new();

    match ranked.as_slice() {
        [] => parts.push("Dominated by unknown".to_string()),
        [(top, _)] => parts.push(format!(
            "Dominated by {}",
            top.canonical_key().replace('_', " ")
        )),
        [(top, _), (second, _), ..] => parts.push(format!(
            "Dominated by {} with supporting {}",
            top.canonical_key().replace('_', " "),
            second.canonical_key().replace('_', " ")
        )),
    }

    if body_mind < 0.35 {
        parts.push(
            "expect a heavy, body-centered sensation that builds into deep physical relaxation"
                .to_string(),
        );
    } else if body_mind < 0.5 {
        parts.push("expect a warm body buzz with gentle mental calm".to_string());
    } else if body_mind > 0.65 {
        parts.push("expect an uplifting, cerebral experience with creative energy".to_string());
    } else {
        parts.push("expect a well-rounded experience balancing mind and body".to_string());
    }

    if cbd_total > 0.05 && thc_total > 0.0 {
        parts.push("CBD presence may buffer intensity and reduce anxiety".to_string());
    } else if thc_total > 0.25 {
        parts.push("high THC suggests a potent experience, pace yourself".to_string());
    }

    parts.join(". ") + "."
}
