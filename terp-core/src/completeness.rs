//! Completeness evaluator
//!
//! Decides whether a merged profile is rich enough to stand on its own or
//! whether supplemental sources (database cache, external APIs) should be
//! consulted before composing a result.

use crate::profile::MergedProfile;
use crate::vocab::Cannabinoid;

/// Minimum number of distinct terpenes for a profile to count as complete.
pub const MIN_COMPLETE_TERPENES: usize = 5;

/// Major cannabinoids a complete profile must report, grouped with the
/// acid forms that stand in for them on many certificates.
const MAJOR_CANNABINOID_FAMILIES: [&[Cannabinoid]; 4] = [
    &[Cannabinoid::Thc, Cannabinoid::Thca],
    &[Cannabinoid::Cbd, Cannabinoid::Cbda],
    &[Cannabinoid::Cbg],
    &[Cannabinoid::Cbn],
];

/// True when the merged profile is too sparse and supplemental sources
/// should be consulted: fewer than [`MIN_COMPLETE_TERPENES`] terpenes, or
/// any major cannabinoid family entirely absent.
pub fn needs_supplemental_source(merged: &MergedProfile) -> bool {
    if merged.terpenes.len() < MIN_COMPLETE_TERPENES {
        return true;
    }
    MAJOR_CANNABINOID_FAMILIES.iter().any(|family| {
        !family
            .iter()
            .any(|compound| merged.cannabinoids.contains_key(compound))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::merge_profiles;
    use crate::profile::{SourceKind, SourceMeta, SourceProfile};
    use crate::vocab::Terpene;

    fn merged_with(terps: &[(Terpene, f64)], cannas: &[(Cannabinoid, f64)]) -> MergedProfile {
        merge_profiles(&[SourceProfile {
            kind: SourceKind::Certificate,
            terpenes: terps.iter().copied().collect(),
            cannabinoids: cannas.iter().copied().collect(),
            meta: SourceMeta::default(),
        }])
    }

    const FIVE_TERPENES: [(Terpene, f64); 5] = [
        (Terpene::Myrcene, 0.012),
        (Terpene::Limonene, 0.008),
        (Terpene::Caryophyllene, 0.006),
        (Terpene::Linalool, 0.003),
        (Terpene::Humulene, 0.002),
    ];

    const ALL_MAJORS: [(Cannabinoid, f64); 4] = [
        (Cannabinoid::Thc, 0.21),
        (Cannabinoid::Cbd, 0.004),
        (Cannabinoid::Cbg, 0.009),
        (Cannabinoid::Cbn, 0.001),
    ];

    #[test]
    fn test_complete_profile_needs_nothing() {
        let merged = merged_with(&FIVE_TERPENES, &ALL_MAJORS);
        assert!(!needs_supplemental_source(&merged));
    }

    #[test]
    fn test_too_few_terpenes() {
        let merged = merged_with(&FIVE_TERPENES[..4], &ALL_MAJORS);
        assert!(needs_supplemental_source(&merged));
    }

    #[test]
    fn test_missing_major_cannabinoid() {
        // CBN absent, everything else present
        let merged = merged_with(&FIVE_TERPENES, &ALL_MAJORS[..3]);
        assert!(needs_supplemental_source(&merged));
    }

    #[test]
    fn test_acid_form_satisfies_family() {
        let majors = [
            (Cannabinoid::Thca, 0.24),
            (Cannabinoid::Cbda, 0.005),
            (Cannabinoid::Cbg, 0.009),
            (Cannabinoid::Cbn, 0.001),
        ];
        let merged = merged_with(&FIVE_TERPENES, &majors);
        assert!(!needs_supplemental_source(&merged));
    }

    #[test]
    fn test_empty_profile_needs_supplement() {
        let merged = merge_profiles(&[]);
        assert!(needs_supplemental_source(&merged));
    }
}
