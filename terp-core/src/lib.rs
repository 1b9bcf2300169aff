//! terp-core - strain composition analysis core
//!
//! Pure, synchronous building blocks for turning per-source chemical
//! readings into a classified strain profile: reading normalization,
//! priority-based merging, completeness evaluation, SDP classification,
//! and result composition. No I/O happens here; every function is a
//! deterministic transformation over immutable inputs and is safe to
//! call concurrently without coordination.

pub mod classify;
pub mod completeness;
pub mod compose;
pub mod effects;
pub mod insights;
pub mod merge;
pub mod normalize;
pub mod profile;
pub mod strain_name;
pub mod vocab;

pub use classify::{classify_terpene_profile, SdpCategory, FALLBACK_CATEGORY};
pub use completeness::{needs_supplemental_source, MIN_COMPLETE_TERPENES};
pub use compose::{compose_result, AnalysisResult, DataAvailability, DetectionMethod, Evidence};
pub use effects::{generate_effects_profile, EffectsProfile};
pub use insights::{cannabinoid_insights, DECARB_FACTOR};
pub use merge::merge_profiles;
pub use normalize::normalize_readings;
pub use profile::{
    MergedProfile, MergedValue, SourceKind, SourceMeta, SourceProfile, UnitConvention,
    SOURCE_PRIORITY,
};
pub use strain_name::{normalize_strain_name, title_case_strain_name};
pub use vocab::{Cannabinoid, Terpene};
