//! SDP (Strain Data Project) category classifier
//!
//! Classifies a merged terpene profile into one of six categories by
//! evaluating a fixed, ordered rule list over normalized shares. The rule
//! order is part of the contract: the first matching rule wins and later
//! rules are never consulted.

use crate::vocab::Terpene;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Terpinolene share at or above this is ORANGE.
pub const ORANGE_THRESHOLD: f64 = 0.35;
/// Combined pinene share at or above this is GREEN.
pub const GREEN_THRESHOLD: f64 = 0.35;
/// Myrcene share at or above this is BLUE.
pub const BLUE_THRESHOLD: f64 = 0.35;
/// Caryophyllene share floor for PURPLE.
pub const PURPLE_CARYOPHYLLENE_MIN: f64 = 0.30;
/// Pinene share ceiling for PURPLE.
pub const PURPLE_PINENE_MAX: f64 = 0.15;
/// Limonene share at or above this is YELLOW.
pub const YELLOW_THRESHOLD: f64 = 0.30;
/// Share floor for each of myrcene/limonene/caryophyllene in RED.
pub const RED_BALANCED_MIN: f64 = 0.20;
/// Largest allowed spread between the three balanced shares in RED.
pub const RED_BALANCE_TOLERANCE: f64 = 0.15;
/// Pinene share ceiling for RED.
pub const RED_PINENE_MAX: f64 = 0.15;
/// Humulene share ceiling for RED.
pub const RED_HUMULENE_MAX: f64 = 0.15;

/// Category assigned when no rule matches or there is no terpene mass.
pub const FALLBACK_CATEGORY: SdpCategory = SdpCategory::Blue;

/// The six SDP categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SdpCategory {
    Blue,
    Yellow,
    Purple,
    Green,
    Orange,
    Red,
}

impl SdpCategory {
    pub const ALL: [SdpCategory; 6] = [
        SdpCategory::Blue,
        SdpCategory::Yellow,
        SdpCategory::Purple,
        SdpCategory::Green,
        SdpCategory::Orange,
        SdpCategory::Red,
    ];

    /// Fixed uppercase label used on the wire and in storage.
    pub fn label(&self) -> &'static str {
        match self {
            SdpCategory::Blue => "BLUE",
            SdpCategory::Yellow => "YELLOW",
            SdpCategory::Purple => "PURPLE",
            SdpCategory::Green => "GREEN",
            SdpCategory::Orange => "ORANGE",
            SdpCategory::Red => "RED",
        }
    }

    /// Parse a stored label. Unknown labels yield `None`.
    pub fn from_label(label: &str) -> Option<SdpCategory> {
        SdpCategory::ALL.into_iter().find(|c| c.label() == label)
    }

    /// Which compound signature defines the category.
    pub fn dominant_label(&self) -> &'static str {
        match self {
            SdpCategory::Blue => "Myrcene-dominant",
            SdpCategory::Yellow => "Limonene-dominant",
            SdpCategory::Purple => "Caryophyllene-dominant",
            SdpCategory::Green => "Pinene-dominant",
            SdpCategory::Orange => "Terpinolene-dominant",
            SdpCategory::Red => "Balanced myrcene-limonene-caryophyllene",
        }
    }

    /// One-phrase profile description used in generated summaries.
    pub fn description(&self) -> &'static str {
        match self {
            SdpCategory::Blue => "myrcene-forward with an earthy, relaxing profile",
            SdpCategory::Yellow => {
                "limonene-forward with bright, citrus-leaning aroma and an upbeat profile"
            }
            SdpCategory::Purple => {
                "caryophyllene-forward with spicy, peppery notes and a balanced profile"
            }
            SdpCategory::Green => "pinene-forward with sharp, pine-like aroma and an alert profile",
            SdpCategory::Orange => "terpinolene-forward with complex, floral, and citrus notes",
            SdpCategory::Red => {
                "balanced myrcene-limonene-caryophyllene with a versatile, hybrid profile"
            }
        }
    }

    /// Closest label in traditional indica/sativa terms.
    pub fn traditional_label(&self) -> &'static str {
        match self {
            SdpCategory::Orange => "Sativa",
            SdpCategory::Yellow | SdpCategory::Purple => "Modern Indica",
            SdpCategory::Green | SdpCategory::Blue => "Classic Indica",
            SdpCategory::Red => "Hybrid",
        }
    }
}

impl fmt::Display for SdpCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify a merged terpene map into exactly one category.
///
/// Values are normalized to shares of total terpene mass before any rule
/// runs. A profile with no positive terpene mass short-circuits to
/// [`FALLBACK_CATEGORY`] without evaluating rules. All threshold
/// comparisons are boundary-inclusive. A compound (or the pinene pair)
/// also matches its rule when it holds the single largest share; exact
/// ties for the top share count for the earliest rule in the order.
pub fn classify_terpene_profile(terpenes: &BTreeMap<Terpene, f64>) -> SdpCategory {
    let shares = match Shares::from_values(terpenes) {
        Some(shares) => shares,
        None => return FALLBACK_CATEGORY,
    };

    for (category, rule) in RULES {
        if rule(&shares) {
            return category;
        }
    }

    nearest_by_top_terpene(&shares)
}

/// Ordered rule table. Evaluation stops at the first match, so the order
/// here is the tie-break for profiles satisfying several rules at once.
const RULES: [(SdpCategory, fn(&Shares) -> bool); 6] = [
    (SdpCategory::Orange, rule_orange),
    (SdpCategory::Green, rule_green),
    (SdpCategory::Blue, rule_blue),
    (SdpCategory::Purple, rule_purple),
    (SdpCategory::Yellow, rule_yellow),
    (SdpCategory::Red, rule_red),
];

fn rule_orange(s: &Shares) -> bool {
    s.share(Terpene::Terpinolene) >= ORANGE_THRESHOLD || s.is_largest(Terpene::Terpinolene)
}

fn rule_green(s: &Shares) -> bool {
    s.pinene() >= GREEN_THRESHOLD || s.pinene_pair_is_largest()
}

fn rule_blue(s: &Shares) -> bool {
    s.share(Terpene::Myrcene) >= BLUE_THRESHOLD || s.is_largest(Terpene::Myrcene)
}

fn rule_purple(s: &Shares) -> bool {
    s.share(Terpene::Caryophyllene) >= PURPLE_CARYOPHYLLENE_MIN && s.pinene() <= PURPLE_PINENE_MAX
}

fn rule_yellow(s: &Shares) -> bool {
    s.share(Terpene::Limonene) >= YELLOW_THRESHOLD
}

fn rule_red(s: &Shares) -> bool {
    let myrcene = s.share(Terpene::Myrcene);
    let limonene = s.share(Terpene::Limonene);
    let caryophyllene = s.share(Terpene::Caryophyllene);

    let spread = myrcene.max(limonene).max(caryophyllene) - myrcene.min(limonene).min(caryophyllene);

    myrcene >= RED_BALANCED_MIN
        && limonene >= RED_BALANCED_MIN
        && caryophyllene >= RED_BALANCED_MIN
        && spread <= RED_BALANCE_TOLERANCE
        && s.pinene() <= RED_PINENE_MAX
        && s.share(Terpene::Humulene) <= RED_HUMULENE_MAX
}

/// When no rule matches, assign the category nearest the top terpene.
fn nearest_by_top_terpene(shares: &Shares) -> SdpCategory {
    match shares.top_terpene() {
        Some(Terpene::Myrcene) => SdpCategory::Blue,
        Some(Terpene::Limonene) => SdpCategory::Yellow,
        Some(Terpene::Caryophyllene) => SdpCategory::Purple,
        Some(Terpene::AlphaPinene) | Some(Terpene::BetaPinene) => SdpCategory::Green,
        Some(Terpene::Terpinolene) => SdpCategory::Orange,
        _ => FALLBACK_CATEGORY,
    }
}

/// Normalized shares of total terpene mass.
struct Shares {
    map: BTreeMap<Terpene, f64>,
}

impl Shares {
    /// Normalize raw merged values. Returns `None` when no positive mass
    /// exists, which routes the caller to the fallback category.
    fn from_values(values: &BTreeMap<Terpene, f64>) -> Option<Shares> {
        let positive: BTreeMap<Terpene, f64> = values
            .iter()
            .filter(|(_, v)| v.is_finite() && **v > 0.0)
            .map(|(k, v)| (*k, *v))
            .collect();

        let total: f64 = positive.values().sum();
        if total <= 0.0 {
            return None;
        }

        Some(Shares {
            map: positive.into_iter().map(|(k, v)| (k, v / total)).collect(),
        })
    }

    fn share(&self, terpene: Terpene) -> f64 {
        self.map.get(&terpene).copied().unwrap_or(0.0)
    }

    fn pinene(&self) -> f64 {
        self.share(Terpene::AlphaPinene) + self.share(Terpene::BetaPinene)
    }

    /// Largest-share terpene; ties resolve to the earliest declared
    /// variant so the answer is stable across runs.
    fn top_terpene(&self) -> Option<Terpene> {
        let mut best: Option<(Terpene, f64)> = None;
        for (&terpene, &share) in &self.map {
            match best {
                Some((_, best_share)) if share <= best_share => {}
                _ => best = Some((terpene, share)),
            }
        }
        best.map(|(terpene, _)| terpene)
    }

    /// True when no other compound's share exceeds this one's. Exact ties
    /// count as largest for both compounds; rule order then decides.
    fn is_largest(&self, terpene: Terpene) -> bool {
        let own = self.share(terpene);
        own > 0.0
            && self
                .map
                .iter()
                .filter(|(&other, _)| other != terpene)
                .all(|(_, &share)| share <= own)
    }

    /// True when the combined pinene pair is at least as large as every
    /// non-pinene compound's share.
    fn pinene_pair_is_largest(&self) -> bool {
        let combined = self.pinene();
        combined > 0.0
            && self
                .map
                .iter()
                .filter(|(&other, _)| {
                    other != Terpene::AlphaPinene && other != Terpene::BetaPinene
                })
                .all(|(_, &share)| share <= combined)
    }
}
