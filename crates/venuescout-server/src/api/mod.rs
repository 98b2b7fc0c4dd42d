mod categories;
mod map;
mod photo;
mod runs;
mod venues;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use venuescout_aggregator::AggregateError;
use venuescout_core::{AppConfig, CategoryTable, CoreError, Venue};

use crate::middleware::{request_id, RequestId};
use crate::script_loader::ScriptLoader;
use crate::session::{RunSession, VenueAggregator};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub categories: Arc<CategoryTable>,
    /// `None` when no places API key is configured; runs are then refused.
    pub aggregator: Option<Arc<VenueAggregator>>,
    pub session: Arc<RunSession>,
    pub scripts: Arc<ScriptLoader>,
    pub http: reqwest::Client,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    places_api_key: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn new(data: T, request_id: String) -> Self {
        Self {
            data,
            meta: ResponseMeta::new(request_id),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "configuration_missing" => StatusCode::SERVICE_UNAVAILABLE,
            "upstream_error" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_core_error(request_id: String, error: &CoreError) -> ApiError {
    match error {
        CoreError::UnknownCategory(_) => ApiError::new(request_id, "bad_request", error.to_string()),
        CoreError::ConfigurationMissing => {
            ApiError::new(request_id, "configuration_missing", error.to_string())
        }
    }
}

pub(super) fn map_aggregate_error(request_id: String, error: &AggregateError) -> ApiError {
    match error {
        AggregateError::Core(e) => map_core_error(request_id, e),
        AggregateError::Source(e) => {
            tracing::warn!(error = %e, "venue source failed");
            ApiError::new(request_id, "upstream_error", e.to_string())
        }
        AggregateError::NothingToResume | AggregateError::RunInProgress => {
            ApiError::new(request_id, "conflict", error.to_string())
        }
    }
}

/// The aggregator, or `configuration_missing` when no API key is set.
pub(super) fn require_aggregator(
    state: &AppState,
    request_id: &str,
) -> Result<Arc<VenueAggregator>, ApiError> {
    state
        .aggregator
        .clone()
        .ok_or_else(|| map_core_error(request_id.to_owned(), &CoreError::ConfigurationMissing))
}

/// Display order: name, case-insensitive.
pub(super) fn sort_by_name(venues: &mut [Venue]) {
    venues.sort_by_cached_key(|v| v.name.to_lowercase());
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-request-id")])
        .expose_headers([
            HeaderName::from_static("x-request-id"),
            header::CONTENT_DISPOSITION,
        ])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/categories", get(categories::list_categories))
        .route("/api/v1/venues", get(venues::collect_venues))
        .route("/api/v1/runs", post(runs::start_run))
        .route(
            "/api/v1/runs/current",
            get(runs::current_run).delete(runs::cancel_run),
        )
        .route("/api/v1/runs/current/more", post(runs::load_more))
        .route("/api/v1/runs/current/export.csv", get(runs::export_csv))
        .route("/api/v1/photo", get(photo::proxy_photo))
        .route(
            "/api/v1/map/script",
            get(map::map_script).delete(map::reset_map_script),
        )
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id))
                .layer(TraceLayer::new_for_http()),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let places_api_key = if state.config.require_api_key().is_ok() {
        "configured"
    } else {
        "missing"
    };
    Json(ApiResponse::new(
        HealthData {
            status: "ok",
            places_api_key,
        },
        req_id.0,
    ))
}

#[cfg(test)]
mod tests;
