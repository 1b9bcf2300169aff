//! Fuzzy strain name matching
//!
//! Lookups against the profile cache tolerate misspellings and minor
//! variations. Candidates are compared by normalized Levenshtein
//! similarity and a match below the threshold is treated as no match,
//! so a typo never silently pulls in an unrelated strain's chemistry.

use strsim::normalized_levenshtein;

/// Minimum similarity for a fuzzy match to count
pub const FUZZY_MATCH_THRESHOLD: f64 = 0.8;

/// A successful name match against the profile cache
#[derive(Debug, Clone, PartialEq)]
pub struct StrainMatch {
    /// Normalized lookup key of the matched profile
    pub normalized_name: String,
    /// Human-facing name of the matched profile
    pub display_name: String,
    /// Similarity score in [threshold, 1.0]
    pub confidence: f64,
}

/// Find the best cached strain for a normalized query name
///
/// `candidates` holds (normalized, display) pairs. An exact key match
/// scores 1.0; otherwise the highest-similarity candidate wins,
/// provided it clears [`FUZZY_MATCH_THRESHOLD`]. Ties keep the first
/// candidate encountered, so results are stable for sorted input.
pub fn fuzzy_match_strain(
    query_normalized: &str,
    candidates: &[(String, String)],
) -> Option<StrainMatch> {
    if query_normalized.is_empty() {
        return None;
    }

    let mut best: Option<StrainMatch> = None;
    for (normalized, display) in candidates {
        if normalized == query_normalized {
            return Some(StrainMatch {
                normalized_name: normalized.clone(),
                display_name: display.clone(),
                confidence: 1.0,
            });
        }

        let score = normalized_levenshtein(query_normalized, normalized);
        if score >= FUZZY_MATCH_THRESHOLD
            && best.as_ref().map_or(true, |b| score > b.confidence)
        {
            best = Some(StrainMatch {
                normalized_name: normalized.clone(),
                display_name: display.clone(),
                confidence: score,
            });
        }
    }
    best
}

/// Rank all candidates clearing the threshold, best first
///
/// Used by search, where several near misses are worth showing. Exact
/// matches rank as 1.0 like in [`fuzzy_match_strain`]; ties break by
/// candidate order.
pub fn fuzzy_match_candidates(
    query_normalized: &str,
    candidates: &[(String, String)],
    limit: usize,
) -> Vec<StrainMatch> {
    if query_normalized.is_empty() || limit == 0 {
        return Vec::new();
    }

    let mut matches: Vec<StrainMatch> = candidates
        .iter()
        .filter_map(|(normalized, display)| {
            let score = if normalized == query_normalized {
                1.0
            } else {
                normalized_levenshtein(query_normalized, normalized)
            };
            (score >= FUZZY_MATCH_THRESHOLD).then(|| StrainMatch {
                normalized_name: normalized.clone(),
                display_name: display.clone(),
                confidence: score,
            })
        })
        .collect();

    matches.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    matches.truncate(limit);
    matches
}
