//! Reading normalizer
//!
//! Turns one source's raw name→number readings into a canonical
//! `SourceProfile`. Field names are resolved through the synonym tables,
//! values are converted to mass fractions per the source's declared unit
//! convention, and everything that fails validation is dropped in place.
//! A malformed reading never fails the whole profile.

use crate::profile::{SourceKind, SourceMeta, SourceProfile, UnitConvention};
use crate::vocab::{self, Cannabinoid, Terpene};
use std::collections::BTreeMap;
use tracing::debug;

/// Normalize raw readings from one source into a `SourceProfile`.
///
/// Kept values are finite mass fractions in (0, 1]. Unknown compound
/// names, non-finite numbers, non-positive numbers, and values above 1
/// after unit conversion are dropped individually. When two raw names
/// resolve to the same compound (a name and its synonym in the same
/// payload), the larger value is kept so the outcome does not depend on
/// map iteration order.
pub fn normalize_readings(
    kind: SourceKind,
    unit: UnitConvention,
    readings: &BTreeMap<String, f64>,
    meta: SourceMeta,
) -> SourceProfile {
    let mut terpenes: BTreeMap<Terpene, f64> = BTreeMap::new();
    let mut cannabinoids: BTreeMap<Cannabinoid, f64> = BTreeMap::new();

    for (raw_name, &raw_value) in readings {
        let value = match convert_value(raw_value, unit) {
            Some(v) => v,
            None => {
                debug!(
                    source = kind.as_str(),
                    compound = raw_name.as_str(),
                    value = raw_value,
                    "dropped reading with invalid value"
                );
                continue;
            }
        };

        if let Some(terpene) = Terpene::from_raw(raw_name) {
            keep_larger(&mut terpenes, terpene, value);
        } else if let Some(cannabinoid) = Cannabinoid::from_raw(raw_name) {
            keep_larger(&mut cannabinoids, cannabinoid, value);
        } else if vocab::is_self_reported_total(raw_name) {
            // Self-reported totals are never trusted; the merged total is
            // recomputed from individual terpene values.
            debug!(
                source = kind.as_str(),
                value = raw_value,
                "ignored self-reported terpene total"
            );
        } else {
            debug!(
                source = kind.as_str(),
                compound = raw_name.as_str(),
                "dropped reading with unrecognized compound name"
            );
        }
    }

    SourceProfile {
        kind,
        terpenes,
        cannabinoids,
        meta,
    }
}

/// Convert a raw number to a mass fraction, or reject it.
fn convert_value(raw: f64, unit: UnitConvention) -> Option<f64> {
    if !raw.is_finite() {
        return None;
    }
    let fraction = match unit {
        UnitConvention::Percent => raw / 100.0,
        UnitConvention::Fraction => raw,
    };
    if fraction > 0.0 && fraction <= 1.0 {
        Some(fraction)
    } else {
        None
    }
}

fn keep_larger<K: Ord + Copy>(map: &mut BTreeMap<K, f64>, key: K, value: f64) {
    let entry = map.entry(key).or_insert(value);
    if value > *entry {
        *entry = value;
    }
}
