//! Source and merged profile types
//!
//! A `SourceProfile` is one consulted source's canonical view of a strain:
//! validated compound fractions plus whatever metadata that source carries.
//! A `MergedProfile` is the priority-resolved union of several of them.

use crate::vocab::{Cannabinoid, Terpene};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where a profile's data came from, in decreasing order of trust.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Lab certificate of analysis.
    Certificate,
    /// Product page readings.
    Page,
    /// Previously analyzed profile from the local database.
    Database,
    /// External strain API.
    Api,
}

/// Fixed conflict-resolution order. The merge routine consults this list
/// and nothing else, so the priority scheme lives in exactly one place.
pub const SOURCE_PRIORITY: [SourceKind; 4] = [
    SourceKind::Certificate,
    SourceKind::Page,
    SourceKind::Database,
    SourceKind::Api,
];

impl SourceKind {
    /// Position in [`SOURCE_PRIORITY`]; lower wins conflicts.
    pub fn rank(&self) -> usize {
        SOURCE_PRIORITY
            .iter()
            .position(|k| k == self)
            .unwrap_or(SOURCE_PRIORITY.len())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Certificate => "certificate",
            SourceKind::Page => "page",
            SourceKind::Database => "database",
            SourceKind::Api => "api",
        }
    }
}

/// Numeric convention a source declares for its raw readings.
///
/// Conversion is driven by this declaration alone; magnitudes are never
/// inspected to guess which convention a source meant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitConvention {
    /// Values are percentages on a 0-100 scale.
    Percent,
    /// Values are already mass fractions on a 0-1 scale.
    Fraction,
}

/// Optional metadata a source may carry. Every field is independently
/// optional and independently checked; `SourceKind` is the only
/// discriminator of what a profile is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceMeta {
    /// Issuing lab, for certificate sources.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lab_name: Option<String>,
    /// Test date as printed on the certificate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_date: Option<String>,
    /// URL of the certificate document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_url: Option<String>,
    /// Name-match confidence reported for API lookups, 0-1.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_confidence: Option<f64>,
    /// When a database profile was originally cached.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_at: Option<DateTime<Utc>>,
    /// Which external API answered, for api sources.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_name: Option<String>,
}

/// One source's validated readings for a strain.
///
/// All values are mass fractions in (0, 1]; anything else was dropped
/// during normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceProfile {
    pub kind: SourceKind,
    #[serde(default)]
    pub terpenes: BTreeMap<Terpene, f64>,
    #[serde(default)]
    pub cannabinoids: BTreeMap<Cannabinoid, f64>,
    #[serde(default)]
    pub meta: SourceMeta,
}

impl SourceProfile {
    /// A profile with no readings, useful as a metadata-only carrier.
    pub fn empty(kind: SourceKind) -> Self {
        SourceProfile {
            kind,
            terpenes: BTreeMap::new(),
            cannabinoids: BTreeMap::new(),
            meta: SourceMeta::default(),
        }
    }

    /// True when the profile carries no compound readings at all.
    pub fn is_empty(&self) -> bool {
        self.terpenes.is_empty() && self.cannabinoids.is_empty()
    }
}

/// A merged value and the source that supplied it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MergedValue {
    pub value: f64,
    pub source: SourceKind,
}

/// Priority-resolved union of all consulted sources.
///
/// A compound absent from every source is absent here too; absence and
/// zero are distinct states and zero never appears as a value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergedProfile {
    pub terpenes: BTreeMap<Terpene, MergedValue>,
    pub cannabinoids: BTreeMap<Cannabinoid, MergedValue>,
    /// Sum of merged terpene values. Always recomputed; never copied from
    /// a source's self-reported total.
    pub total_terpenes: f64,
    /// Source kinds that won at least one compound, in priority order.
    pub sources: Vec<SourceKind>,
}

impl MergedProfile {
    pub fn is_empty(&self) -> bool {
        self.terpenes.is_empty() && self.cannabinoids.is_empty()
    }

    /// Terpene map with provenance stripped.
    pub fn terpene_values(&self) -> BTreeMap<Terpene, f64> {
        self.terpenes.iter().map(|(k, v)| (*k, v.value)).collect()
    }

    /// Cannabinoid map with provenance stripped.
    pub fn cannabinoid_values(&self) -> BTreeMap<Cannabinoid, f64> {
        self.cannabinoids
            .iter()
            .map(|(k, v)| (*k, v.value))
            .collect()
    }

    pub fn has_source(&self, kind: SourceKind) -> bool {
        self.sources.contains(&kind)
    }
}
