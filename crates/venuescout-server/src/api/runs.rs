use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use venuescout_aggregator::RunSnapshot;
use venuescout_core::{export_filename, to_csv_string};

use crate::middleware::RequestId;

use super::{
    map_aggregate_error, map_core_error, require_aggregator, sort_by_name, ApiError, ApiResponse,
    AppState,
};

#[derive(Debug, Deserialize)]
pub(super) struct StartRunRequest {
    pub category: String,
}

#[derive(Debug, Serialize)]
pub(super) struct RunStarted {
    run_id: u64,
}

#[derive(Debug, Serialize)]
pub(super) struct RunCancelled {
    cancelled: bool,
}

#[derive(Debug, Deserialize)]
pub(super) struct ExportQuery {
    pub category: Option<String>,
}

/// Starts a progressive run, replacing whichever run was live.
pub(super) async fn start_run(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<StartRunRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RunStarted>>), ApiError> {
    let category = state
        .categories
        .resolve(&body.category)
        .map_err(|e| map_core_error(req_id.0.clone(), &e))?
        .clone();
    let aggregator = require_aggregator(&state, &req_id.0)?;

    let run_id = state.session.start(&aggregator, category).await;
    tracing::info!(run_id, category = %body.category, "run started");

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse::new(RunStarted { run_id }, req_id.0)),
    ))
}

/// Continues the last run past its page ceiling.
pub(super) async fn load_more(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<(StatusCode, Json<ApiResponse<RunStarted>>), ApiError> {
    let aggregator = require_aggregator(&state, &req_id.0)?;
    let run_id = state
        .session
        .resume(&aggregator, &state.categories)
        .await
        .map_err(|e| map_aggregate_error(req_id.0.clone(), &e))?;

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse::new(RunStarted { run_id }, req_id.0)),
    ))
}

pub(super) async fn cancel_run(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<RunCancelled>> {
    let cancelled = state.session.cancel().await;
    Json(ApiResponse::new(RunCancelled { cancelled }, req_id.0))
}

pub(super) async fn current_run(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<RunSnapshot>>, ApiError> {
    let mut snapshot = current_snapshot(&state, &req_id.0).await?;
    sort_by_name(&mut snapshot.venues);
    Ok(Json(ApiResponse::new(snapshot, req_id.0)))
}

/// CSV of the current snapshot, optionally limited to one category.
pub(super) async fn export_csv(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, ApiError> {
    let mut snapshot = current_snapshot(&state, &req_id.0).await?;
    sort_by_name(&mut snapshot.venues);

    let csv = to_csv_string(&snapshot.venues, query.category.as_deref()).map_err(|e| {
        tracing::error!(error = %e, "CSV export failed");
        ApiError::new(req_id.0.clone(), "internal_error", "CSV export failed")
    })?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        export_filename(Utc::now().date_naive())
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    )
        .into_response())
}

async fn current_snapshot(state: &AppState, request_id: &str) -> Result<RunSnapshot, ApiError> {
    state
        .session
        .current()
        .await
        .ok_or_else(|| ApiError::new(request_id, "not_found", "no run has been started"))
}
