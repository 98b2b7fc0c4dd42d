use axum::{extract::State, Extension, Json};
use serde::Serialize;

use crate::middleware::RequestId;

use super::{ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct CategoryItem {
    label: String,
    query: String,
}

pub(super) async fn list_categories(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<Vec<CategoryItem>>> {
    let data = state
        .categories
        .iter()
        .map(|c| CategoryItem {
            label: c.label.clone(),
            query: c.query.clone(),
        })
        .collect();

    Json(ApiResponse::new(data, req_id.0))
}
