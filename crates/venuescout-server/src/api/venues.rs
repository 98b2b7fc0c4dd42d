use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use venuescout_aggregator::{RunToken, Termination};
use venuescout_core::Venue;

use crate::middleware::RequestId;

use super::{
    map_aggregate_error, map_core_error, require_aggregator, sort_by_name, ApiError, ApiResponse,
    AppState,
};

#[derive(Debug, Deserialize)]
pub(super) struct VenueQuery {
    pub category: String,
}

#[derive(Debug, Serialize)]
pub(super) struct VenueList {
    category: String,
    termination: Termination,
    pages_fetched: u32,
    /// Set when the run ended on a source error after collecting some venues.
    error: Option<String>,
    venues: Vec<Venue>,
}

/// Runs a category search to completion and returns the final venue list.
pub(super) async fn collect_venues(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<VenueQuery>,
) -> Result<Json<ApiResponse<VenueList>>, ApiError> {
    let category = state
        .categories
        .resolve(&query.category)
        .map_err(|e| map_core_error(req_id.0.clone(), &e))?
        .clone();
    let aggregator = require_aggregator(&state, &req_id.0)?;

    let outcome = aggregator
        .run_to_completion(&category, &RunToken::detached(), None)
        .await;
    if let Some(failure) = outcome.failure() {
        return Err(map_aggregate_error(req_id.0, &failure));
    }

    let mut venues = outcome.venues;
    sort_by_name(&mut venues);

    Ok(Json(ApiResponse::new(
        VenueList {
            category: outcome.category,
            termination: outcome.termination,
            pages_fetched: outcome.pages_fetched,
            error: outcome.error.map(|e| e.to_string()),
            venues,
        },
        req_id.0,
    )))
}
