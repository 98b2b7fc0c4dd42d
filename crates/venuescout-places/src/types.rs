//! Places API (legacy web service) response types.
//!
//! ## Observed shape
//!
//! ### Envelope
//! Every response is `{ "status": "...", ... }` with HTTP 200, including
//! failures. `error_message` accompanies most non-`OK` statuses.
//!
//! ### Text search
//! Up to 20 `results` per page. `next_page_token` is present only when more
//! pages exist, and becomes valid a short time after it is issued; using it
//! immediately yields `INVALID_REQUEST`. At most three pages are served per
//! query.
//!
//! ### Results
//! `place_id` is always present in practice but modelled as optional so a
//! single bad record cannot fail a page. `rating` is absent for unrated
//! places. Text search returns `formatted_address`; nearby search returns
//! `vicinity` instead.
//!
//! ### Details
//! Only the requested `fields` are returned. `editorial_summary.overview`
//! and `opening_hours.weekday_text` are frequently missing.

use serde::Deserialize;

use crate::status::PlacesStatus;

#[derive(Debug, Deserialize)]
pub struct TextSearchResponse {
    pub status: PlacesStatus,
    #[serde(default)]
    pub results: Vec<PlaceResult>,
    #[serde(default)]
    pub next_page_token: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlaceResult {
    #[serde(default)]
    pub place_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub formatted_address: Option<String>,
    #[serde(default)]
    pub vicinity: Option<String>,
    #[serde(default)]
    pub photos: Vec<PlacePhoto>,
}

#[derive(Debug, Deserialize)]
pub struct Geometry {
    pub location: LatLng,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Deserialize)]
pub struct PlacePhoto {
    pub photo_reference: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct DetailsResponse {
    pub status: PlacesStatus,
    #[serde(default)]
    pub result: Option<PlaceDetailsResult>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PlaceDetailsResult {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    /// Google Maps link for the place.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub formatted_address: Option<String>,
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub photos: Vec<PlacePhoto>,
    #[serde(default)]
    pub editorial_summary: Option<EditorialSummary>,
    #[serde(default)]
    pub opening_hours: Option<OpeningHours>,
}

#[derive(Debug, Deserialize)]
pub struct EditorialSummary {
    #[serde(default)]
    pub overview: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OpeningHours {
    #[serde(default)]
    pub weekday_text: Vec<String>,
}
