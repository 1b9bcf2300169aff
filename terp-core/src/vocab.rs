//! Canonical compound vocabulary
//!
//! Fixed, closed sets of terpene and cannabinoid identifiers, plus the
//! synonym tables that map the field names used by labs, scraped pages,
//! and upstream APIs onto them. Names outside these tables are not
//! representable and get dropped during reading normalization.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Terpenes tracked by the analyzer.
///
/// Declared in the order used for stable map iteration and tie-breaking
/// when two compounds carry the same share.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terpene {
    Myrcene,
    Limonene,
    Caryophyllene,
    AlphaPinene,
    BetaPinene,
    Terpinolene,
    Humulene,
    Linalool,
    Ocimene,
    Bisabolol,
    Camphene,
    Geraniol,
    Nerolidol,
    AlphaTerpinene,
    GammaTerpinene,
    CaryophylleneOxide,
}

impl Terpene {
    pub const ALL: [Terpene; 16] = [
        Terpene::Myrcene,
        Terpene::Limonene,
        Terpene::Caryophyllene,
        Terpene::AlphaPinene,
        Terpene::BetaPinene,
        Terpene::Terpinolene,
        Terpene::Humulene,
        Terpene::Linalool,
        Terpene::Ocimene,
        Terpene::Bisabolol,
        Terpene::Camphene,
        Terpene::Geraniol,
        Terpene::Nerolidol,
        Terpene::AlphaTerpinene,
        Terpene::GammaTerpinene,
        Terpene::CaryophylleneOxide,
    ];

    /// Canonical snake_case identifier, matching the serialized form.
    pub fn canonical_key(&self) -> &'static str {
        match self {
            Terpene::Myrcene => "myrcene",
            Terpene::Limonene => "limonene",
            Terpene::Caryophyllene => "caryophyllene",
            Terpene::AlphaPinene => "alpha_pinene",
            Terpene::BetaPinene => "beta_pinene",
            Terpene::Terpinolene => "terpinolene",
            Terpene::Humulene => "humulene",
            Terpene::Linalool => "linalool",
            Terpene::Ocimene => "ocimene",
            Terpene::Bisabolol => "bisabolol",
            Terpene::Camphene => "camphene",
            Terpene::Geraniol => "geraniol",
            Terpene::Nerolidol => "nerolidol",
            Terpene::AlphaTerpinene => "alpha_terpinene",
            Terpene::GammaTerpinene => "gamma_terpinene",
            Terpene::CaryophylleneOxide => "caryophyllene_oxide",
        }
    }

    /// Hyphenated form for human-readable text ("alpha-pinene").
    pub fn display_name(&self) -> String {
        self.canonical_key().replace('_', "-")
    }

    /// Resolve a raw field name (any supported synonym or spelling) to a
    /// canonical terpene. Returns `None` for names outside the vocabulary.
    pub fn from_raw(raw: &str) -> Option<Terpene> {
        TERPENE_SYNONYMS.get(fold_key(raw).as_str()).copied()
    }
}

impl fmt::Display for Terpene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_key())
    }
}

/// Cannabinoids tracked by the analyzer.
///
/// Not used for classification; tracked for completeness decisions,
/// potency insights, and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cannabinoid {
    Thc,
    Thca,
    Thcv,
    Cbd,
    Cbda,
    Cbdv,
    Cbn,
    Cbg,
    Cbgm,
    Cbgv,
    Cbc,
    Cbcv,
    Cbv,
    Cbe,
    Cbt,
    Cbl,
}

impl Cannabinoid {
    pub const ALL: [Cannabinoid; 16] = [
        Cannabinoid::Thc,
        Cannabinoid::Thca,
        Cannabinoid::Thcv,
        Cannabinoid::Cbd,
        Cannabinoid::Cbda,
        Cannabinoid::Cbdv,
        Cannabinoid::Cbn,
        Cannabinoid::Cbg,
        Cannabinoid::Cbgm,
        Cannabinoid::Cbgv,
        Cannabinoid::Cbc,
        Cannabinoid::Cbcv,
        Cannabinoid::Cbv,
        Cannabinoid::Cbe,
        Cannabinoid::Cbt,
        Cannabinoid::Cbl,
    ];

    /// Canonical identifier, matching the serialized form.
    pub fn canonical_key(&self) -> &'static str {
        match self {
            Cannabinoid::Thc => "thc",
            Cannabinoid::Thca => "thca",
            Cannabinoid::Thcv => "thcv",
            Cannabinoid::Cbd => "cbd",
            Cannabinoid::Cbda => "cbda",
            Cannabinoid::Cbdv => "cbdv",
            Cannabinoid::Cbn => "cbn",
            Cannabinoid::Cbg => "cbg",
            Cannabinoid::Cbgm => "cbgm",
            Cannabinoid::Cbgv => "cbgv",
            Cannabinoid::Cbc => "cbc",
            Cannabinoid::Cbcv => "cbcv",
            Cannabinoid::Cbv => "cbv",
            Cannabinoid::Cbe => "cbe",
            Cannabinoid::Cbt => "cbt",
            Cannabinoid::Cbl => "cbl",
        }
    }

    /// Resolve a raw field name to a canonical cannabinoid.
    pub fn from_raw(raw: &str) -> Option<Cannabinoid> {
        CANNABINOID_SYNONYMS.get(fold_key(raw).as_str()).copied()
    }
}

impl fmt::Display for Cannabinoid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_key())
    }
}

/// A source's self-reported terpene total. Recognized so it is not logged
/// as an unknown compound, but never stored: the merged total is always
/// recomputed from individual terpene values.
pub fn is_self_reported_total(raw: &str) -> bool {
    matches!(fold_key(raw).as_str(), "total_terpenes" | "terpenes_total")
}

/// Fold a raw field name into lookup form: lowercase, Greek letters
/// spelled out, punctuation and whitespace collapsed to underscores.
///
/// "β-Myrcene" → "beta_myrcene", "D-Limonene" → "d_limonene",
/// "Caryophyllene Oxide" → "caryophyllene_oxide".
pub fn fold_key(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last_sep = true;
    for c in raw.to_lowercase().chars() {
        match c {
            'α' => {
                out.push_str("alpha");
                last_sep = false;
            }
            'β' => {
                out.push_str("beta");
                last_sep = false;
            }
            'γ' => {
                out.push_str("gamma");
                last_sep = false;
            }
            'δ' => {
                out.push_str("delta");
                last_sep = false;
            }
            c if c.is_ascii_alphanumeric() => {
                out.push(c);
                last_sep = false;
            }
            _ => {
                if !last_sep {
                    out.push('_');
                }
                last_sep = true;
            }
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

static TERPENE_SYNONYMS: Lazy<HashMap<&'static str, Terpene>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("myrcene", Terpene::Myrcene);
    m.insert("beta_myrcene", Terpene::Myrcene);
    m.insert("limonene", Terpene::Limonene);
    m.insert("d_limonene", Terpene::Limonene);
    m.insert("caryophyllene", Terpene::Caryophyllene);
    m.insert("beta_caryophyllene", Terpene::Caryophyllene);
    m.insert("alpha_pinene", Terpene::AlphaPinene);
    m.insert("beta_pinene", Terpene::BetaPinene);
    m.insert("terpinolene", Terpene::Terpinolene);
    m.insert("humulene", Terpene::Humulene);
    m.insert("alpha_humulene", Terpene::Humulene);
    m.insert("linalool", Terpene::Linalool);
    m.insert("ocimene", Terpene::Ocimene);
    m.insert("beta_ocimene", Terpene::Ocimene);
    m.insert("bisabolol", Terpene::Bisabolol);
    m.insert("alpha_bisabolol", Terpene::Bisabolol);
    m.insert("camphene", Terpene::Camphene);
    m.insert("geraniol", Terpene::Geraniol);
    m.insert("nerolidol", Terpene::Nerolidol);
    m.insert("alpha_terpinene", Terpene::AlphaTerpinene);
    m.insert("gamma_terpinene", Terpene::GammaTerpinene);
    m.insert("caryophyllene_oxide", Terpene::CaryophylleneOxide);
    m
});

static CANNABINOID_SYNONYMS: Lazy<HashMap<&'static str, Cannabinoid>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("thc", Cannabinoid::Thc);
    m.insert("delta_9_thc", Cannabinoid::Thc);
    m.insert("delta9_thc", Cannabinoid::Thc);
    m.insert("total_thc", Cannabinoid::Thc);
    m.insert("thca", Cannabinoid::Thca);
    m.insert("thcv", Cannabinoid::Thcv);
    m.insert("cbd", Cannabinoid::Cbd);
    m.insert("total_cbd", Cannabinoid::Cbd);
    m.insert("cbda", Cannabinoid::Cbda);
    m.insert("cbdv", Cannabinoid::Cbdv);
    m.insert("cbn", Cannabinoid::Cbn);
    m.insert("cbg", Cannabinoid::Cbg);
    m.insert("cbga", Cannabinoid::Cbg);
    m.insert("cbgm", Cannabinoid::Cbgm);
    m.insert("cbgv", Cannabinoid::Cbgv);
    m.insert("cbc", Cannabinoid::Cbc);
    m.insert("cbcv", Cannabinoid::Cbcv);
    m.insert("cbv", Cannabinoid::Cbv);
    m.insert("cbe", Cannabinoid::Cbe);
    m.insert("cbt", Cannabinoid::Cbt);
    m.insert("cbl", Cannabinoid::Cbl);
    m
});
