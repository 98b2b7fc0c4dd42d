use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Extension,
};
use reqwest::Url;
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{ApiError, AppState};

const DOWNLOAD_DISPOSITION: &str = "attachment; filename=\"venue_photo.jpg\"";

#[derive(Debug, Deserialize)]
pub(super) struct PhotoQuery {
    pub url: String,
    #[serde(default)]
    pub download: bool,
}

/// Fetches a venue photo and re-serves it as JPEG, optionally as a download.
pub(super) async fn proxy_photo(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<PhotoQuery>,
) -> Result<Response, ApiError> {
    let url = Url::parse(&query.url)
        .map_err(|_| ApiError::new(req_id.0.clone(), "bad_request", "invalid photo URL"))?;
    if !is_allowed_photo_host(&url, &state.config.places_base_url) {
        return Err(ApiError::new(
            req_id.0,
            "bad_request",
            "photo host is not allowed",
        ));
    }

    let upstream_error = |message: String| ApiError::new(req_id.0.clone(), "upstream_error", message);

    let response = state.http.get(url).send().await.map_err(|e| {
        let e = e.without_url();
        tracing::warn!(error = %e, "photo fetch failed");
        upstream_error(format!("photo fetch failed: {e}"))
    })?;
    let status = response.status();
    if !status.is_success() {
        tracing::warn!(status = status.as_u16(), "photo host rejected request");
        return Err(upstream_error(format!(
            "photo host returned HTTP {}",
            status.as_u16()
        )));
    }
    let bytes = response.bytes().await.map_err(|e| {
        let e = e.without_url();
        tracing::warn!(error = %e, "photo body read failed");
        upstream_error(format!("photo fetch failed: {e}"))
    })?;

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("image/jpeg"));
    if query.download {
        headers.insert(
            header::CONTENT_DISPOSITION,
            HeaderValue::from_static(DOWNLOAD_DISPOSITION),
        );
    }
    Ok((headers, bytes).into_response())
}

/// Only the configured places host and Google's photo CDN are proxied.
fn is_allowed_photo_host(url: &Url, places_base_url: &str) -> bool {
    if !matches!(url.scheme(), "http" | "https") {
        return false;
    }
    let Some(host) = url.host_str() else {
        return false;
    };
    let places_host = Url::parse(places_base_url)
        .ok()
        .and_then(|base| base.host_str().map(str::to_owned));

    places_host.as_deref() == Some(host)
        || host == "googleusercontent.com"
        || host.ends_with(".googleusercontent.com")
}
