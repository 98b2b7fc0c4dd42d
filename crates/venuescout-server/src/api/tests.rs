use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;
use venuescout_aggregator::{Aggregator, Constraints, SearchArea};
use venuescout_core::{
    build_app_config, AppConfig, CategoryTable, ContinuationToken, RawResult, SearchPage,
    SearchRequest, SourceError, VenueDetails, VenueSource,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;

// -------------------------------------------------------------------------
// Fixtures
// -------------------------------------------------------------------------

enum Stub {
    /// One page holding these names, no continuation.
    Names(Vec<&'static str>),
    /// Two new venues per page, forever.
    Endless,
    Failing,
}

#[async_trait]
impl VenueSource for Stub {
    async fn search_page(
        &self,
        _request: &SearchRequest,
        token: Option<&ContinuationToken>,
    ) -> Result<SearchPage, SourceError> {
        match self {
            Stub::Names(names) => Ok(SearchPage {
                results: names.iter().map(|n| raw(&n.to_lowercase(), n)).collect(),
                next_page: None,
            }),
            Stub::Endless => {
                let n: u32 = token.map_or(0, |t| t.as_str().parse().unwrap());
                Ok(SearchPage {
                    results: vec![
                        raw(&format!("e{n}-a"), &format!("Venue {n}a")),
                        raw(&format!("e{n}-b"), &format!("Venue {n}b")),
                    ],
                    next_page: Some(ContinuationToken::new((n + 1).to_string())),
                })
            }
            Stub::Failing => Err(SourceError::Rejected {
                status: "OVER_QUERY_LIMIT".to_owned(),
                message: Some("quota exhausted".to_owned()),
            }),
        }
    }

    async fn details(&self, _id: &str) -> Result<VenueDetails, SourceError> {
        Ok(VenueDetails::default())
    }
}

fn raw(id: &str, name: &str) -> RawResult {
    RawResult {
        id: id.to_owned(),
        name: name.to_owned(),
        rating: Some(4.0),
        location: None,
        address: Some("2 Long St, Gardens, Cape Town".to_owned()),
        photos: Vec::new(),
    }
}

fn config(overrides: &[(&str, &str)]) -> AppConfig {
    let mut vars: HashMap<String, String> = HashMap::from([
        ("GOOGLE_MAPS_API_KEY".to_owned(), "test-key".to_owned()),
        ("VENUESCOUT_INTER_PAGE_DELAY_MS".to_owned(), "0".to_owned()),
    ]);
    for (k, v) in overrides {
        vars.insert((*k).to_owned(), (*v).to_owned());
    }
    build_app_config(|key| vars.get(key).cloned().ok_or(std::env::VarError::NotPresent))
        .expect("test config")
}

fn app_with(config: AppConfig, source: Option<Stub>) -> Router {
    let config = Arc::new(config);
    let aggregator = source.map(|stub| {
        let source: Arc<dyn VenueSource> = Arc::new(stub);
        Arc::new(Aggregator::new(
            source,
            Constraints::from_app_config(&config),
            SearchArea::from_app_config(&config),
        ))
    });
    build_app(AppState {
        config,
        categories: Arc::new(CategoryTable::builtin()),
        aggregator,
        session: Arc::new(RunSession::new()),
        scripts: Arc::new(ScriptLoader::new(reqwest::Client::new())),
        http: reqwest::Client::new(),
    })
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

fn send_json(method: &str, uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

async fn call(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Vec<u8>) {
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    (status, headers, body.to_vec())
}

async fn call_json(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let (status, _, body) = call(app, request).await;
    let json = serde_json::from_slice(&body).expect("json parse");
    (status, json)
}

/// Polls the current run until it leaves the loading phase.
async fn wait_for_run(app: &Router) -> serde_json::Value {
    for _ in 0..200 {
        let (status, json) = call_json(app, get("/api/v1/runs/current")).await;
        assert_eq!(status, StatusCode::OK);
        if json["data"]["phase"]["status"] != "loading" {
            return json;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("run did not finish");
}

fn names(json: &serde_json::Value) -> Vec<String> {
    json["data"]["venues"]
        .as_array()
        .expect("venues array")
        .iter()
        .map(|v| v["name"].as_str().unwrap_or_default().to_owned())
        .collect()
}

// -------------------------------------------------------------------------
// Envelope and middleware
// -------------------------------------------------------------------------

#[test]
fn api_error_codes_map_to_statuses() {
    let cases = [
        ("bad_request", StatusCode::BAD_REQUEST),
        ("not_found", StatusCode::NOT_FOUND),
        ("conflict", StatusCode::CONFLICT),
        ("configuration_missing", StatusCode::SERVICE_UNAVAILABLE),
        ("upstream_error", StatusCode::BAD_GATEWAY),
        ("internal_error", StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (code, expected) in cases {
        let response = ApiError::new("req-1", code, "msg").into_response();
        assert_eq!(response.status(), expected, "{code}");
    }
}

#[tokio::test]
async fn health_reports_key_and_sets_request_id() {
    let app = app_with(config(&[]), None);
    let (status, headers, body) = call(&app, get("/api/v1/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(headers.contains_key("x-request-id"));
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["data"]["status"], "ok");
    assert_eq!(json["data"]["places_api_key"], "configured");
    assert_eq!(
        json["meta"]["request_id"].as_str(),
        headers["x-request-id"].to_str().ok()
    );
}

#[tokio::test]
async fn incoming_request_id_is_echoed() {
    let app = app_with(config(&[]), None);
    let request = Request::builder()
        .uri("/api/v1/health")
        .header("x-request-id", "trace-me")
        .body(Body::empty())
        .unwrap();
    let (_, headers, _) = call(&app, request).await;
    assert_eq!(headers["x-request-id"], "trace-me");
}

#[tokio::test]
async fn categories_lists_builtin_table() {
    let app = app_with(config(&[]), None);
    let (status, json) = call_json(&app, get("/api/v1/categories")).await;

    assert_eq!(status, StatusCode::OK);
    let items = json["data"].as_array().unwrap();
    assert_eq!(items.len(), 14);
    assert!(items.iter().any(|c| c["label"] == "Padel"));
}

// -------------------------------------------------------------------------
// Terminal collection
// -------------------------------------------------------------------------

#[tokio::test]
async fn venues_returns_sorted_final_list() {
    let app = app_with(config(&[]), Some(Stub::Names(vec!["zeta", "Alpha", "beta"])));
    let (status, json) = call_json(&app, get("/api/v1/venues?category=padel")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&json), ["Alpha", "beta", "zeta"]);
    assert_eq!(json["data"]["termination"], "exhausted");
    assert_eq!(json["data"]["category"], "Padel");
    assert!(json["data"]["error"].is_null());
}

#[tokio::test]
async fn venues_unknown_category_is_bad_request() {
    let app = app_with(config(&[]), Some(Stub::Names(vec![])));
    let (status, json) = call_json(&app, get("/api/v1/venues?category=curling")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "bad_request");
}

#[tokio::test]
async fn venues_without_api_key_is_configuration_missing() {
    let app = app_with(config(&[("GOOGLE_MAPS_API_KEY", "")]), None);
    let (status, json) = call_json(&app, get("/api/v1/venues?category=Padel")).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["error"]["code"], "configuration_missing");
}

#[tokio::test]
async fn venues_source_failure_is_upstream_error() {
    let app = app_with(config(&[]), Some(Stub::Failing));
    let (status, json) = call_json(&app, get("/api/v1/venues?category=Padel")).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["error"]["code"], "upstream_error");
    assert!(json["error"]["message"]
        .as_str()
        .unwrap()
        .contains("OVER_QUERY_LIMIT"));
}

// -------------------------------------------------------------------------
// Progressive runs
// -------------------------------------------------------------------------

#[tokio::test]
async fn current_run_is_not_found_before_any_run() {
    let app = app_with(config(&[]), Some(Stub::Names(vec![])));
    let (status, json) = call_json(&app, get("/api/v1/runs/current")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "not_found");
}

#[tokio::test]
async fn started_run_publishes_sorted_snapshot_and_exports_csv() {
    let app = app_with(config(&[]), Some(Stub::Names(vec!["Yoga Loft", "alpine Yoga"])));
    let (status, json) = call_json(
        &app,
        send_json("POST", "/api/v1/runs", &serde_json::json!({"category": "Yoga"})),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert!(json["data"]["run_id"].as_u64().is_some());

    let done = wait_for_run(&app).await;
    assert_eq!(done["data"]["phase"]["status"], "done");
    assert_eq!(done["data"]["phase"]["reason"], "exhausted");
    assert_eq!(names(&done), ["alpine Yoga", "Yoga Loft"]);

    let (status, headers, body) = call(&app, get("/api/v1/runs/current/export.csv")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["content-type"], "text/csv; charset=utf-8");
    let disposition = headers["content-disposition"].to_str().unwrap();
    assert!(disposition.starts_with("attachment; filename=\"venues_export_"));
    let csv = String::from_utf8(body).unwrap();
    assert!(csv.starts_with("Venue Name,District,"));
    assert!(csv.contains("Yoga Loft,Gardens,"));

    let (_, _, filtered) = call(&app, get("/api/v1/runs/current/export.csv?category=Gym")).await;
    assert_eq!(String::from_utf8(filtered).unwrap().lines().count(), 1);
}

#[tokio::test]
async fn load_more_continues_a_run_paused_at_the_page_ceiling() {
    let app = app_with(config(&[("VENUESCOUT_MAX_PAGES", "1")]), Some(Stub::Endless));
    call_json(
        &app,
        send_json("POST", "/api/v1/runs", &serde_json::json!({"category": "Squash"})),
    )
    .await;
    let first = wait_for_run(&app).await;
    assert_eq!(first["data"]["phase"]["reason"], "page_ceiling");
    assert_eq!(names(&first).len(), 2);

    let (status, _) = call_json(
        &app,
        send_json("POST", "/api/v1/runs/current/more", &serde_json::json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let second = wait_for_run(&app).await;
    assert_eq!(names(&second).len(), 4);
    assert_eq!(second["data"]["category"], "Squash");
}

#[tokio::test]
async fn load_more_after_exhaustion_is_conflict() {
    let app = app_with(config(&[]), Some(Stub::Names(vec!["Only"])));
    call_json(
        &app,
        send_json("POST", "/api/v1/runs", &serde_json::json!({"category": "Golf"})),
    )
    .await;
    wait_for_run(&app).await;

    let (status, json) = call_json(
        &app,
        send_json("POST", "/api/v1/runs/current/more", &serde_json::json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"]["code"], "conflict");
}

#[tokio::test]
async fn cancelling_a_run_marks_it_cancelled() {
    let app = app_with(
        config(&[
            ("VENUESCOUT_INTER_PAGE_DELAY_MS", "300"),
            ("VENUESCOUT_MAX_PAGES", "0"),
            ("VENUESCOUT_MAX_RECORDS", "1000"),
        ]),
        Some(Stub::Endless),
    );
    call_json(
        &app,
        send_json("POST", "/api/v1/runs", &serde_json::json!({"category": "Tennis"})),
    )
    .await;

    let request = Request::builder()
        .method("DELETE")
        .uri("/api/v1/runs/current")
        .body(Body::empty())
        .unwrap();
    let (status, json) = call_json(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["cancelled"], true);

    let done = wait_for_run(&app).await;
    assert_eq!(done["data"]["phase"]["status"], "cancelled");
}

#[tokio::test]
async fn cancelling_a_finished_run_reports_nothing_cancelled() {
    let app = app_with(config(&[]), Some(Stub::Names(vec!["Only"])));
    call_json(
        &app,
        send_json("POST", "/api/v1/runs", &serde_json::json!({"category": "Golf"})),
    )
    .await;
    let done = wait_for_run(&app).await;
    assert_eq!(done["data"]["phase"]["reason"], "exhausted");

    let request = Request::builder()
        .method("DELETE")
        .uri("/api/v1/runs/current")
        .body(Body::empty())
        .unwrap();
    let (status, json) = call_json(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["cancelled"], false);

    let (_, after) = call_json(&app, get("/api/v1/runs/current")).await;
    assert_eq!(after["data"]["phase"]["status"], "done");
}

#[tokio::test]
async fn cancelling_with_no_run_reports_nothing_cancelled() {
    let app = app_with(config(&[]), Some(Stub::Names(vec!["Only"])));
    let request = Request::builder()
        .method("DELETE")
        .uri("/api/v1/runs/current")
        .body(Body::empty())
        .unwrap();
    let (status, json) = call_json(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["cancelled"], false);
}

// -------------------------------------------------------------------------
// Photo proxy and map script
// -------------------------------------------------------------------------

#[tokio::test]
async fn photo_proxy_rewrites_headers() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/photo"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/octet-stream")
                .set_body_bytes(vec![0xFF, 0xD8, 0xFF]),
        )
        .mount(&upstream)
        .await;

    let app = app_with(
        config(&[("VENUESCOUT_PLACES_BASE_URL", &upstream.uri())]),
        None,
    );
    let photo = format!("{}/photo?photo_reference=abc", upstream.uri());
    let encoded: String = url_encode(&photo);

    let (status, headers, body) = call(&app, get(&format!("/api/v1/photo?url={encoded}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["content-type"], "image/jpeg");
    assert!(!headers.contains_key("content-disposition"));
    assert_eq!(body, [0xFF, 0xD8, 0xFF]);

    let (_, headers, _) = call(
        &app,
        get(&format!("/api/v1/photo?url={encoded}&download=true")),
    )
    .await;
    assert_eq!(
        headers["content-disposition"],
        "attachment; filename=\"venue_photo.jpg\""
    );
}

#[tokio::test]
async fn photo_proxy_rejects_foreign_hosts() {
    let app = app_with(config(&[]), None);
    let encoded = url_encode("https://evil.example/x.jpg");
    let (status, json) = call_json(&app, get(&format!("/api/v1/photo?url={encoded}"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "bad_request");
}

#[tokio::test]
async fn map_script_is_cached_until_reset() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/maps/api/js"))
        .and(query_param("key", "test-key"))
        .and(query_param("libraries", "places"))
        .respond_with(ResponseTemplate::new(200).set_body_string("/* maps */"))
        .expect(2)
        .mount(&upstream)
        .await;

    let script_url = format!("{}/maps/api/js", upstream.uri());
    let app = app_with(config(&[("VENUESCOUT_MAPS_SCRIPT_URL", &script_url)]), None);

    for _ in 0..2 {
        let (status, headers, body) = call(&app, get("/api/v1/map/script")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers["content-type"], "application/javascript; charset=utf-8");
        assert_eq!(body, b"/* maps */");
    }

    let reset = Request::builder()
        .method("DELETE")
        .uri("/api/v1/map/script")
        .body(Body::empty())
        .unwrap();
    let (status, json) = call_json(&app, reset).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["reset"], true);

    let (status, _, _) = call(&app, get("/api/v1/map/script")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn map_script_reset_is_refused_in_production() {
    let app = app_with(config(&[("VENUESCOUT_ENV", "production")]), None);
    let reset = Request::builder()
        .method("DELETE")
        .uri("/api/v1/map/script")
        .body(Body::empty())
        .unwrap();
    let (status, json) = call_json(&app, reset).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "not_found");
}

#[tokio::test]
async fn map_script_without_key_is_configuration_missing() {
    let app = app_with(config(&[("GOOGLE_MAPS_API_KEY", "")]), None);
    let (status, json) = call_json(&app, get("/api/v1/map/script")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["error"]["code"], "configuration_missing");
}

fn url_encode(value: &str) -> String {
    reqwest::Url::parse_with_params("http://x/", &[("u", value)])
        .unwrap()
        .query()
        .unwrap()
        .trim_start_matches("u=")
        .to_owned()
}
