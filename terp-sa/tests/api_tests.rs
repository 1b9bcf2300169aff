//! Integration tests for terp-sa API endpoints
//!
//! Tests cover:
//! - Health and version endpoints
//! - Strain analysis from caller-provided readings
//! - Cached profile lookup and search
//! - Terpene reference data
//! - Per-client rate limiting
//!
//! Upstream API clients point at a closed local port, so any
//! supplemental lookup fails fast instead of touching the network.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::Utc;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tower::util::ServiceExt; // for `oneshot` method

use terp_sa::config::Settings;
use terp_sa::db::profiles::{save_profile, StrainRecord};
use terp_sa::{build_router, AppState};

/// Test helper: Fresh SQLite database in a temp directory
async fn setup_test_db() -> (SqlitePool, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("Should create temp dir");
    let pool = terp_sa::db::init_database_pool(&dir.path().join("terp-test.db"))
        .await
        .expect("Should initialize test database");
    (pool, dir)
}

/// Test helper: Settings with unreachable upstream APIs
fn test_settings(rate_limit_per_minute: u32) -> Settings {
    Settings {
        port: 0,
        database_path: PathBuf::from("unused"),
        seed_dir: PathBuf::from("unused"),
        rate_limit_per_minute,
        cannlytics_base_url: "http://127.0.0.1:9".to_string(),
        cannlytics_api_key: None,
        kushy_base_url: "http://127.0.0.1:9".to_string(),
    }
}

/// Test helper: Create app with test state
fn setup_app(pool: SqlitePool) -> axum::Router {
    build_router(AppState::new(pool, &test_settings(1000)))
}

/// Test helper: Create GET-style request with empty body
fn test_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Test helper: Create JSON request
fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

/// Test helper: Store a complete profile under the given names
async fn seed_profile(pool: &SqlitePool, normalized: &str, display: &str) {
    let terpenes: BTreeMap<String, f64> = [
        ("myrcene", 0.0085),
        ("alpha_pinene", 0.002),
        ("limonene", 0.0015),
        ("caryophyllene", 0.002),
        ("linalool", 0.001),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();
    let cannabinoids: BTreeMap<String, f64> =
        [("thc".to_string(), 0.22), ("cbd".to_string(), 0.001)]
            .into_iter()
            .collect();

    save_profile(
        pool,
        &StrainRecord {
            normalized_name: normalized.to_string(),
            display_name: display.to_string(),
            category: Some("BLUE".to_string()),
            terpenes,
            cannabinoids,
            lab_name: None,
            origin: "seed".to_string(),
            updated_at: Utc::now(),
        },
    )
    .await
    .expect("Should save profile");
}

// =============================================================================
// Health and Version Endpoints
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (pool, _dir) = setup_test_db().await;
    let app = setup_app(pool);

    let response = app.oneshot(test_request("GET", "/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "terp-sa");
    assert!(body["version"].is_string());
    assert_eq!(body["cached_profiles"], 0);
    assert!(body.get("last_error").is_none());
}

#[tokio::test]
async fn test_version_endpoint() {
    let (pool, _dir) = setup_test_db().await;
    let app = setup_app(pool);

    let response = app
        .oneshot(test_request("GET", "/api/version"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["api"], "TerpTracker");
    assert!(body["version"].is_string());
}

// =============================================================================
// Analysis Endpoint
// =============================================================================

fn complete_page_request() -> Value {
    json!({
        "strain_name": "Blue Dream",
        "url": "https://dispensary.test/blue-dream",
        "sources": [{
            "kind": "page",
            "unit": "percent",
            "readings": {
                "myrcene": 0.85,
                "limonene": 0.2,
                "beta_caryophyllene": 0.15,
                "linalool": 0.1,
                "alpha_pinene": 0.1,
                "thc": 21.0,
                "cbd": 0.4,
                "cbg": 0.09,
                "cbn": 0.02
            }
        }]
    })
}

#[tokio::test]
async fn test_analyze_with_complete_page_source() {
    let (pool, _dir) = setup_test_db().await;
    let app = setup_app(pool.clone());

    let response = app
        .oneshot(json_request("POST", "/api/analyze", complete_page_request()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Non-exempt endpoints report the remaining budget
    assert!(response.headers().contains_key("X-RateLimit-Limit"));
    assert!(response.headers().contains_key("X-RateLimit-Remaining"));

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["strain_guess"], "Blue Dream");
    assert_eq!(body["sources"], json!(["page"]));
    assert_eq!(body["category"], "BLUE");
    assert_eq!(body["traditional_label"], "Classic Indica");
    assert!(body["summary"].as_str().unwrap().contains("Blue Dream"));
    assert_eq!(body["terpenes"].as_object().unwrap().len(), 5);
    assert_eq!(body["totals"]["thc"], 0.21);
    assert_eq!(body["data_available"]["has_terpenes"], true);
    assert_eq!(body["data_available"]["has_certificate"], false);
    assert_eq!(body["evidence"]["detection_method"], "page_scrape");
    assert_eq!(
        body["evidence"]["origin_url"],
        "https://dispensary.test/blue-dream"
    );
    assert!(body["effects"].is_object());
    assert!(body["cannabinoid_insights"].is_array());

    // The analysis was cached as a page-origin profile
    let lookup = setup_app(pool)
        .oneshot(test_request("GET", "/api/profiles/blue%20dream"))
        .await
        .unwrap();
    assert_eq!(lookup.status(), StatusCode::OK);
    let cached = extract_json(lookup.into_body()).await;
    assert_eq!(cached["origin"], "page");
    assert_eq!(cached["category"], "BLUE");
}

#[tokio::test]
async fn test_analyze_certificate_beats_page() {
    let (pool, _dir) = setup_test_db().await;
    let app = setup_app(pool);

    let request = json!({
        "strain_name": "Gelato",
        "sources": [
            {
                "kind": "page",
                "unit": "percent",
                "readings": {
                    "caryophyllene": 0.5,
                    "limonene": 0.3,
                    "myrcene": 0.2,
                    "humulene": 0.1,
                    "linalool": 0.1,
                    "thc": 20.0
                }
            },
            {
                "kind": "certificate",
                "unit": "fraction",
                "readings": { "caryophyllene": 0.004 },
                "lab_name": "Steep Hill",
                "test_date": "2025-02-11",
                "certificate_url": "https://labs.test/gelato.pdf"
            }
        ]
    });

    let response = app
        .oneshot(json_request("POST", "/api/analyze", request))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    // Certificate wins the shared compound even though the page value is larger
    assert_eq!(body["terpenes"]["caryophyllene"], 0.004);
    assert_eq!(body["sources"], json!(["certificate", "page"]));
    assert_eq!(body["data_available"]["has_certificate"], true);
    assert_eq!(body["evidence"]["detection_method"], "certificate_parse");
    assert_eq!(body["evidence"]["lab_name"], "Steep Hill");
    assert_eq!(
        body["evidence"]["certificate_url"],
        "https://labs.test/gelato.pdf"
    );
}

#[tokio::test]
async fn test_analyze_rejects_reserved_source_kinds() {
    let (pool, _dir) = setup_test_db().await;
    let app = setup_app(pool);

    let request = json!({
        "strain_name": "Blue Dream",
        "sources": [{
            "kind": "database",
            "unit": "fraction",
            "readings": { "myrcene": 0.01 }
        }]
    });

    let response = app
        .oneshot(json_request("POST", "/api/analyze", request))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_analyze_rejects_blank_strain_name() {
    let (pool, _dir) = setup_test_db().await;
    let app = setup_app(pool);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/analyze",
            json!({ "strain_name": "   " }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_analyze_upstream_outage_with_no_data_reports_bad_gateway() {
    let (pool, _dir) = setup_test_db().await;
    let app = setup_app(pool);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/analyze",
            json!({ "strain_name": "Completely Unknown" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "UPSTREAM_ERROR");

    // The failure shows up in health diagnostics
    let health = app.oneshot(test_request("GET", "/health")).await.unwrap();
    let health_body = extract_json(health.into_body()).await;
    assert!(health_body["last_error"].is_string());
}

#[tokio::test]
async fn test_analyze_uses_cached_profile_for_sparse_input() {
    let (pool, _dir) = setup_test_db().await;
    seed_profile(&pool, "blue dream", "Blue Dream").await;
    let app = setup_app(pool);

    // Misspelled name, no caller sources: the cache answers via fuzzy match
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/analyze",
            json!({ "strain_name": "Blu Dream" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["sources"], json!(["database"]));
    assert_eq!(body["evidence"]["detection_method"], "database_cache");
    assert!(body["evidence"]["cached_at"].is_string());
    assert_eq!(body["terpenes"]["myrcene"], 0.0085);
}

// =============================================================================
// Profile Lookup and Search
// =============================================================================

#[tokio::test]
async fn test_profile_lookup_exact_and_fuzzy() {
    let (pool, _dir) = setup_test_db().await;
    seed_profile(&pool, "blue dream", "Blue Dream").await;
    let app = setup_app(pool);

    let exact = app
        .clone()
        .oneshot(test_request("GET", "/api/profiles/Blue%20Dream"))
        .await
        .unwrap();
    assert_eq!(exact.status(), StatusCode::OK);
    let body = extract_json(exact.into_body()).await;
    assert_eq!(body["name"], "Blue Dream");
    assert_eq!(body["normalized_name"], "blue dream");
    assert!(body.get("match_confidence").is_none());

    let fuzzy = app
        .oneshot(test_request("GET", "/api/profiles/blu%20dream"))
        .await
        .unwrap();
    assert_eq!(fuzzy.status(), StatusCode::OK);
    let body = extract_json(fuzzy.into_body()).await;
    assert_eq!(body["name"], "Blue Dream");
    let confidence = body["match_confidence"].as_f64().unwrap();
    assert!(confidence >= 0.8 && confidence < 1.0);
}

#[tokio::test]
async fn test_profile_lookup_unknown_strain_is_not_found() {
    let (pool, _dir) = setup_test_db().await;
    let app = setup_app(pool);

    let response = app
        .oneshot(test_request("GET", "/api/profiles/nonexistent"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_search_prefix_and_fuzzy_tiers() {
    let (pool, _dir) = setup_test_db().await;
    seed_profile(&pool, "blue dream", "Blue Dream").await;
    seed_profile(&pool, "blueberry", "Blueberry").await;
    seed_profile(&pool, "og kush", "OG Kush").await;
    let app = setup_app(pool);

    let response = app
        .clone()
        .oneshot(test_request("GET", "/api/search?q=blue"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    let results = body.as_array().unwrap();
    assert_eq!(results.len(), 2);
    for result in results {
        assert_eq!(result["match_type"], "prefix");
        assert_eq!(result["match_score"], 1.0);
        assert_eq!(result["category"], "BLUE");
    }

    // Misspelling falls through to the fuzzy tier
    let response = app
        .clone()
        .oneshot(test_request("GET", "/api/search?q=bleu%20dream"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    let results = body.as_array().unwrap();
    assert!(results
        .iter()
        .any(|r| r["name"] == "Blue Dream" && r["match_type"] == "fuzzy"));

    // Queries under two characters return nothing
    let response = app
        .oneshot(test_request("GET", "/api/search?q=b"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body.as_array().unwrap().len(), 0);
}

// =============================================================================
// Terpene Reference Data
// =============================================================================

#[tokio::test]
async fn test_terpene_list_and_lookup() {
    let (pool, _dir) = setup_test_db().await;
    let app = setup_app(pool);

    let response = app
        .clone()
        .oneshot(test_request("GET", "/api/terpenes"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body.as_array().unwrap().len(), 8);
    assert_eq!(body[0]["key"], "myrcene");

    // Lookup is case-insensitive
    let response = app
        .clone()
        .oneshot(test_request("GET", "/api/terpenes/Myrcene"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["name"], "β-Myrcene");
    assert!(body["effects"].as_array().unwrap().contains(&json!("Relaxing")));

    let response = app
        .oneshot(test_request("GET", "/api/terpenes/unobtainium"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Rate Limiting
// =============================================================================

#[tokio::test]
async fn test_rate_limit_blocks_after_budget_and_spares_probes() {
    let (pool, _dir) = setup_test_db().await;
    let app = build_router(AppState::new(pool, &test_settings(1)));

    let first = app
        .clone()
        .oneshot(test_request("GET", "/api/terpenes"))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(first.headers()["X-RateLimit-Limit"], "1");
    assert_eq!(first.headers()["X-RateLimit-Remaining"], "0");

    let second = app
        .clone()
        .oneshot(test_request("GET", "/api/terpenes"))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(second.headers()["X-RateLimit-Remaining"], "0");
    let body = extract_json(second.into_body()).await;
    assert_eq!(body["error"]["code"], "RATE_LIMITED");

    // Probes stay reachable after the budget is spent
    let health = app
        .clone()
        .oneshot(test_request("GET", "/health"))
        .await
        .unwrap();
    assert_eq!(health.status(), StatusCode::OK);
    let version = app
        .oneshot(test_request("GET", "/api/version"))
        .await
        .unwrap();
    assert_eq!(version.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_rate_limit_budgets_are_per_client() {
    let (pool, _dir) = setup_test_db().await;
    let app = build_router(AppState::new(pool, &test_settings(1)));

    let with_client = |ip: &str| {
        Request::builder()
            .method("GET")
            .uri("/api/terpenes")
            .header("x-forwarded-for", ip)
            .body(Body::empty())
            .unwrap()
    };

    let first = app
        .clone()
        .oneshot(with_client("203.0.113.7"))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let blocked = app
        .clone()
        .oneshot(with_client("203.0.113.7"))
        .await
        .unwrap();
    assert_eq!(blocked.status(), StatusCode::TOO_MANY_REQUESTS);

    let other_client = app.oneshot(with_client("203.0.113.8")).await.unwrap();
    assert_eq!(other_client.status(), StatusCode::OK);
}
