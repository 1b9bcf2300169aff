//! Merge engine
//!
//! Combines any number of `SourceProfile`s into one `MergedProfile` by
//! per-compound priority resolution. The result depends only on the set
//! of inputs, never on their arrival order.

use crate::profile::{MergedProfile, MergedValue, SourceKind, SourceProfile, SOURCE_PRIORITY};
use crate::vocab::{Cannabinoid, Terpene};
use std::collections::BTreeMap;
use tracing::debug;

/// Merge source profiles, resolving conflicts by source priority.
///
/// For every compound reported by at least one source, the highest-priority
/// source's value wins. Two profiles of the same kind collapse to the
/// larger value per compound, which keeps the outcome permutation-free.
/// Compounds reported by no source stay absent; the merged total is the
/// sum of winning terpene values.
pub fn merge_profiles(profiles: &[SourceProfile]) -> MergedProfile {
    let mut terpenes: BTreeMap<Terpene, MergedValue> = BTreeMap::new();
    let mut cannabinoids: BTreeMap<Cannabinoid, MergedValue> = BTreeMap::new();

    for profile in profiles {
        for (&compound, &value) in &profile.terpenes {
            resolve(&mut terpenes, compound, value, profile.kind);
        }
        for (&compound, &value) in &profile.cannabinoids {
            resolve(&mut cannabinoids, compound, value, profile.kind);
        }
    }

    let total_terpenes: f64 = terpenes.values().map(|v| v.value).sum();

    let sources = contributing_sources(&terpenes, &cannabinoids);

    debug!(
        terpene_count = terpenes.len(),
        cannabinoid_count = cannabinoids.len(),
        total_terpenes,
        source_count = sources.len(),
        "merged source profiles"
    );

    MergedProfile {
        terpenes,
        cannabinoids,
        total_terpenes,
        sources,
    }
}

/// Install `value` from `kind` unless a higher-priority source already
/// holds the compound. Equal priority keeps the larger value.
fn resolve<K: Ord + Copy>(
    map: &mut BTreeMap<K, MergedValue>,
    compound: K,
    value: f64,
    kind: SourceKind,
) {
    // Normalization guarantees (0, 1] values, but merged inputs can also be
    // built by hand; skip anything out of contract rather than poison totals.
    if !value.is_finite() || value <= 0.0 {
        return;
    }
    match map.get(&compound) {
        None => {
            map.insert(compound, MergedValue { value, source: kind });
        }
        Some(current) => {
            let replace = kind.rank() < current.source.rank()
                || (kind.rank() == current.source.rank() && value > current.value);
            if replace {
                map.insert(compound, MergedValue { value, source: kind });
            }
        }
    }
}

/// Source kinds that won at least one compound, in priority order.
fn contributing_sources(
    terpenes: &BTreeMap<Terpene, MergedValue>,
    cannabinoids: &BTreeMap<Cannabinoid, MergedValue>,
) -> Vec<SourceKind> {
    SOURCE_PRIORITY
        .iter()
        .copied()
        .filter(|kind| {
            terpenes.values().any(|v| v.source == *kind)
                || cannabinoids.values().any(|v| v.source == *kind)
        })
        .collect()
}
