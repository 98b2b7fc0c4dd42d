use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Extension, Json,
};
use reqwest::Url;
use serde::Serialize;
use venuescout_core::Environment;

use crate::middleware::RequestId;

use super::{map_core_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct ScriptReset {
    reset: bool,
}

/// Serves the maps JavaScript bootstrap through the shared [`ScriptLoader`],
/// so the browser never needs the API key in a script URL of its own.
///
/// [`ScriptLoader`]: crate::script_loader::ScriptLoader
pub(super) async fn map_script(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Response, ApiError> {
    let key = state
        .config
        .require_api_key()
        .map_err(|e| map_core_error(req_id.0.clone(), &e))?;

    let mut url = Url::parse(&state.config.maps_script_url).map_err(|e| {
        tracing::error!(error = %e, "invalid maps script URL");
        ApiError::new(req_id.0.clone(), "internal_error", "invalid maps script URL")
    })?;
    url.query_pairs_mut()
        .append_pair("key", key)
        .append_pair("libraries", "places");

    let script = state.scripts.load(url.as_str()).await.map_err(|e| {
        tracing::warn!(error = %e, "maps script load failed");
        ApiError::new(req_id.0.clone(), "upstream_error", e.to_string())
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/javascript; charset=utf-8"),
            (header::CACHE_CONTROL, "private, max-age=3600"),
        ],
        script.to_string(),
    )
        .into_response())
}

/// Forgets the cached bootstrap, e.g. after rotating the API key. A
/// development aid; production deployments answer `not_found`.
pub(super) async fn reset_map_script(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<ScriptReset>>, ApiError> {
    if state.config.env == Environment::Production {
        tracing::warn!("maps script reset refused in production");
        return Err(ApiError::new(req_id.0, "not_found", "route not available"));
    }
    state.scripts.reset();
    tracing::info!("maps script cache cleared");
    Ok(Json(ApiResponse::new(ScriptReset { reset: true }, req_id.0)))
}
