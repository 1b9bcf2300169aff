//! Upstream strain API clients
//!
//! Supplemental composition data comes from external strain databases
//! when caller-provided sources leave a profile incomplete. Each client
//! returns raw readings plus lookup metadata; unit conversion and
//! vocabulary folding stay in the shared normalizer so upstream quirks
//! cannot leak past it.

pub mod cannlytics;
pub mod kushy;

use std::collections::BTreeMap;

use terp_core::{normalize_readings, SourceKind, SourceMeta, SourceProfile, UnitConvention};

/// Raw strain data returned by an upstream API lookup
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamStrainData {
    /// Strain name as the upstream database spells it
    pub strain_name: String,
    /// Compound readings keyed by the upstream's raw field names
    pub readings: BTreeMap<String, f64>,
    /// Unit convention the readings use after client-side coercion
    pub unit: UnitConvention,
    /// Which API answered
    pub api_name: &'static str,
    /// How confidently the upstream row matched the queried name, 0-1
    pub match_confidence: f64,
}

impl UpstreamStrainData {
    /// Run the readings through the normalizer as an `api` source
    pub fn to_source_profile(&self) -> SourceProfile {
        let meta = SourceMeta {
            api_name: Some(self.api_name.to_string()),
            match_confidence: Some(self.match_confidence),
            ..SourceMeta::default()
        };
        normalize_readings(SourceKind::Api, self.unit, &self.readings, meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use terp_core::Terpene;

    #[test]
    fn upstream_data_normalizes_as_api_source() {
        let mut readings = BTreeMap::new();
        readings.insert("beta-myrcene".to_string(), 0.011);
        readings.insert("not_a_compound".to_string(), 0.5);

        let data = UpstreamStrainData {
            strain_name: "Blue Dream".to_string(),
            readings,
            unit: UnitConvention::Fraction,
            api_name: "cannlytics",
            match_confidence: 1.0,
        };

        let profile = data.to_source_profile();
        assert_eq!(profile.kind, SourceKind::Api);
        assert_eq!(profile.terpenes.get(&Terpene::Myrcene), Some(&0.011));
        assert_eq!(profile.terpenes.len(), 1);
        assert_eq!(profile.meta.api_name.as_deref(), Some("cannlytics"));
        assert_eq!(profile.meta.match_confidence, Some(1.0));
    }
}
