//! Static terpene reference endpoints
//!
//! Educational content about the major cannabis terpenes. Keys here are
//! presentation keys; the pinene entry covers both isomers under one
//! key, unlike the analysis vocabulary which tracks them separately.

use axum::{
    extract::Path,
    routing::get,
    Json, Router,
};
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Reference information about one terpene
#[derive(Debug, Clone, Serialize)]
pub struct TerpeneInfo {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub effects: Vec<&'static str>,
    pub aroma: &'static str,
    pub also_found_in: Vec<&'static str>,
}

/// Static terpene information database
static TERPENE_INFO: Lazy<Vec<TerpeneInfo>> = Lazy::new(|| {
    vec![
        TerpeneInfo {
            key: "myrcene",
            name: "β-Myrcene",
            description: "The most common terpene in cannabis, known for its earthy, musky aroma with hints of cloves.",
            effects: vec!["Relaxing", "Sedating", "Muscle relaxant"],
            aroma: "Earthy, musky, herbal",
            also_found_in: vec!["Hops", "Lemongrass", "Thyme", "Mango"],
        },
        TerpeneInfo {
            key: "limonene",
            name: "D-Limonene",
            description: "Second most common terpene with a distinctive citrus aroma. Associated with mood elevation.",
            effects: vec!["Uplifting", "Stress relief", "Mood enhancement"],
            aroma: "Citrus, lemon, orange",
            also_found_in: vec!["Citrus peels", "Juniper", "Peppermint"],
        },
        TerpeneInfo {
            key: "caryophyllene",
            name: "β-Caryophyllene",
            description: "Unique terpene that also acts as a cannabinoid, binding to CB2 receptors. Spicy and peppery.",
            effects: vec!["Anti-inflammatory", "Pain relief", "Stress reduction"],
            aroma: "Spicy, peppery, woody",
            also_found_in: vec!["Black pepper", "Cloves", "Cinnamon", "Basil"],
        },
        TerpeneInfo {
            key: "pinene",
            name: "α-Pinene / β-Pinene",
            description: "Sharp, pine-like terpene associated with alertness and memory retention.",
            effects: vec!["Alertness", "Memory retention", "Bronchodilator"],
            aroma: "Pine, sharp, fresh",
            also_found_in: vec!["Pine needles", "Rosemary", "Basil", "Dill"],
        },
        TerpeneInfo {
            key: "terpinolene",
            name: "Terpinolene",
            description: "Complex, multi-dimensional terpene with floral, herbal, and citrus notes.",
            effects: vec!["Sedating", "Antioxidant", "Antibacterial"],
            aroma: "Floral, herbal, piney, citrus",
            also_found_in: vec!["Nutmeg", "Tea tree", "Cumin", "Lilacs"],
        },
        TerpeneInfo {
            key: "humulene",
            name: "α-Humulene",
            description: "Earthy, woody terpene found in hops. Appetite suppressant properties.",
            effects: vec!["Anti-inflammatory", "Appetite suppressant", "Pain relief"],
            aroma: "Earthy, woody, spicy",
            also_found_in: vec!["Hops", "Coriander", "Cloves", "Basil"],
        },
        TerpeneInfo {
            key: "linalool",
            name: "Linalool",
            description: "Floral, lavender-like terpene known for calming and sedative effects.",
            effects: vec!["Calming", "Sedative", "Anti-anxiety"],
            aroma: "Floral, lavender, sweet",
            also_found_in: vec!["Lavender", "Mint", "Cinnamon", "Coriander"],
        },
        TerpeneInfo {
            key: "ocimene",
            name: "β-Ocimene",
            description: "Sweet, herbaceous, and woody terpene with potential anti-inflammatory properties.",
            effects: vec!["Uplifting", "Anti-inflammatory", "Antifungal"],
            aroma: "Sweet, herbal, woody, citrus",
            also_found_in: vec!["Mint", "Orchids", "Basil", "Pepper"],
        },
    ]
});

/// GET /api/terpenes
pub async fn list_terpenes() -> Json<Vec<TerpeneInfo>> {
    Json(TERPENE_INFO.clone())
}

/// GET /api/terpenes/:key
pub async fn get_terpene_info(Path(key): Path<String>) -> ApiResult<Json<TerpeneInfo>> {
    let key_lower = key.to_lowercase();
    TERPENE_INFO
        .iter()
        .find(|info| info.key == key_lower)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Terpene '{}' not found", key)))
}

/// Build terpene reference routes
pub fn terpene_routes() -> Router<AppState> {
    Router::new()
        .route("/api/terpenes", get(list_terpenes))
        .route("/api/terpenes/:key", get(get_terpene_info))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_table_covers_the_major_terpenes() {
        let keys: Vec<&str> = TERPENE_INFO.iter().map(|info| info.key).collect();
        assert_eq!(
            keys,
            vec![
                "myrcene",
                "limonene",
                "caryophyllene",
                "pinene",
                "terpinolene",
                "humulene",
                "linalool",
                "ocimene"
            ]
        );
    }

    #[test]
    fn every_entry_is_fully_populated() {
        for info in TERPENE_INFO.iter() {
            assert!(!info.name.is_empty());
            assert!(!info.description.is_empty());
            assert!(!info.effects.is_empty());
            assert!(!info.aroma.is_empty());
            assert!(!info.also_found_in.is_empty());
        }
    }
}
