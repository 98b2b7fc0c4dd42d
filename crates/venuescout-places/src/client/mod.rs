//! HTTP client for the Google Places web service (text search, details, photos).

use std::time::Duration;

use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

use venuescout_core::{AppConfig, SearchRequest};

use crate::error::PlacesError;
use crate::retry::retry_with_backoff;
use crate::status::PlacesStatus;
use crate::types::{DetailsResponse, PlaceDetailsResult, TextSearchResponse};

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/place";

/// Fields requested from the details endpoint. Billing is per field group,
/// so this stays limited to what a venue needs.
pub(crate) const DETAIL_FIELDS: &str =
    "place_id,name,rating,url,website,formatted_address,geometry,photos,editorial_summary,opening_hours";

const DEFAULT_PHOTO_MAX_WIDTH: u32 = 400;

/// Client for the places API.
///
/// Use [`PlacesClient::new`] for production or [`PlacesClient::with_base_url`]
/// to point at a mock server in tests. Envelope statuses are checked on every
/// response; non-success statuses surface as [`PlacesError::Rejected`].
pub struct PlacesClient {
    client: Client,
    api_key: String,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
    photo_max_width: u32,
}

impl PlacesClient {
    /// Creates a client pointed at the production places API, with retries off.
    ///
    /// # Errors
    ///
    /// Returns [`PlacesError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, PlacesError> {
        Self::with_base_url(api_key, timeout_secs, user_agent, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`PlacesError::Http`] if the `reqwest::Client` cannot be built,
    /// [`PlacesError::InvalidBaseUrl`] if `base_url` does not parse as an
    /// absolute URL, or [`PlacesError::MissingApiKey`] for a blank key.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        user_agent: &str,
        base_url: &str,
    ) -> Result<Self, PlacesError> {
        if api_key.trim().is_empty() {
            return Err(PlacesError::MissingApiKey);
        }

        let parsed = Url::parse(base_url).map_err(|e| PlacesError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        if parsed.cannot_be_a_base() {
            return Err(PlacesError::InvalidBaseUrl {
                base_url: base_url.to_owned(),
                reason: "URL cannot carry path segments".to_owned(),
            });
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url: parsed,
            max_retries: 0,
            backoff_base_ms: 0,
            photo_max_width: DEFAULT_PHOTO_MAX_WIDTH,
        })
    }

    /// Builds a client from application config: base URL, timeout, user agent,
    /// retry policy and photo width.
    ///
    /// # Errors
    ///
    /// Returns [`PlacesError::MissingApiKey`] when no key is configured, or any
    /// error from [`PlacesClient::with_base_url`].
    pub fn from_app_config(config: &AppConfig) -> Result<Self, PlacesError> {
        let api_key = config
            .require_api_key()
            .map_err(|_| PlacesError::MissingApiKey)?;
        Ok(Self::with_base_url(
            api_key,
            config.request_timeout_secs,
            &config.user_agent,
            &config.places_base_url,
        )?
        .with_retry(config.max_retries, config.retry_backoff_base_ms)
        .with_photo_max_width(config.photo_max_width))
    }

    /// Enables retries: up to `max_retries` extra attempts on transient errors.
    #[must_use]
    pub fn with_retry(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    #[must_use]
    pub fn with_photo_max_width(mut self, photo_max_width: u32) -> Self {
        self.photo_max_width = photo_max_width.max(1);
        self
    }

    /// Runs one text-search request. `page_token = None` asks for page one.
    ///
    /// `ZERO_RESULTS` is returned as a normal (empty) response.
    ///
    /// # Errors
    ///
    /// - [`PlacesError::Rejected`] for any other non-`OK` status.
    /// - [`PlacesError::Http`] / [`PlacesError::UnexpectedStatus`] on transport failure.
    /// - [`PlacesError::Deserialize`] if the body is not the expected shape.
    pub async fn text_search(
        &self,
        request: &SearchRequest,
        page_token: Option<&str>,
    ) -> Result<TextSearchResponse, PlacesError> {
        let location = request.center.to_query_value();
        let radius = request.radius_m.to_string();
        let mut params = vec![
            ("query", request.query.as_str()),
            ("location", location.as_str()),
            ("radius", radius.as_str()),
        ];
        if let Some(token) = page_token {
            params.push(("pagetoken", token));
        }

        let url = self.build_url("textsearch/json", &params);
        let context = format!("textsearch(query={})", request.query);
        self.get_envelope::<TextSearchResponse, _>(url, &context, |r| {
            accept_status(&r.status, r.error_message.as_deref(), true)
        })
        .await
    }

    /// Fetches the configured detail fields for one place.
    ///
    /// # Errors
    ///
    /// - [`PlacesError::Rejected`] for any non-`OK` status (including `NOT_FOUND`).
    /// - [`PlacesError::Http`] / [`PlacesError::UnexpectedStatus`] on transport failure.
    /// - [`PlacesError::Deserialize`] if the body is malformed or lacks `result`.
    pub async fn place_details(&self, place_id: &str) -> Result<PlaceDetailsResult, PlacesError> {
        let url = self.build_url(
            "details/json",
            &[("place_id", place_id), ("fields", DETAIL_FIELDS)],
        );
        let context = format!("details(place_id={place_id})");
        let response = self
            .get_envelope::<DetailsResponse, _>(url, &context, |r| {
                accept_status(&r.status, r.error_message.as_deref(), false)
            })
            .await?;

        response.result.ok_or_else(|| PlacesError::Deserialize {
            context,
            source: <serde_json::Error as serde::de::Error>::missing_field("result"),
        })
    }

    /// Display URL for a photo reference, sized to the configured max width.
    #[must_use]
    pub fn photo_url(&self, photo_reference: &str) -> String {
        let width = self.photo_max_width.to_string();
        self.build_url(
            "photo",
            &[("maxwidth", &width), ("photo_reference", photo_reference)],
        )
        .to_string()
    }

    /// Builds an endpoint URL with the API key and percent-encoded parameters.
    fn build_url(&self, endpoint: &str, extra: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(endpoint.split('/'));
        }
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("key", &self.api_key);
            for (k, v) in extra {
                pairs.append_pair(k, v);
            }
        }
        url
    }

    /// GETs `url`, asserts a 2xx status, decodes the body as `T` and runs the
    /// envelope status check, retrying the whole sequence on transient errors.
    async fn get_envelope<T, C>(&self, url: Url, context: &str, check: C) -> Result<T, PlacesError>
    where
        T: DeserializeOwned,
        C: Fn(&T) -> Result<(), PlacesError>,
    {
        let endpoint = url.path().to_owned();
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.clone();
            let endpoint = endpoint.clone();
            let check = &check;
            async move {
                let response = self
                    .client
                    .get(url)
                    .header(reqwest::header::ACCEPT, "application/json")
                    .send()
                    .await
                    .map_err(|e| PlacesError::Http(e.without_url()))?;

                let status = response.status();
                if !status.is_success() {
                    return Err(PlacesError::UnexpectedStatus {
                        status: status.as_u16(),
                        endpoint,
                    });
                }

                let body = response
                    .text()
                    .await
                    .map_err(|e| PlacesError::Http(e.without_url()))?;
                let parsed =
                    serde_json::from_str::<T>(&body).map_err(|e| PlacesError::Deserialize {
                        context: context.to_owned(),
                        source: e,
                    })?;
                check(&parsed)?;
                Ok(parsed)
            }
        })
        .await
    }
}

/// `OK` always passes; `ZERO_RESULTS` passes only where an empty answer is
/// meaningful (search).
fn accept_status(
    status: &PlacesStatus,
    message: Option<&str>,
    allow_zero_results: bool,
) -> Result<(), PlacesError> {
    match status {
        PlacesStatus::Ok => Ok(()),
        PlacesStatus::ZeroResults if allow_zero_results => Ok(()),
        other => Err(PlacesError::Rejected {
            status: other.clone(),
            message: message.map(str::to_owned),
        }),
    }
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
