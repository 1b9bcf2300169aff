//! HTTP API handlers for terp-sa

pub mod analyze;
pub mod health;
pub mod profiles;
pub mod terpenes;

pub use analyze::analyze_routes;
pub use health::health_routes;
pub use profiles::profile_routes;
pub use terpenes::terpene_routes;
