//! The venue source seam: a paginated search endpoint plus a per-record
//! details endpoint. The Google Places client implements it for production;
//! tests script it in memory.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::district::extract_district;
use crate::hours::WeeklyHours;
use crate::venue::{non_blank, Coordinate, MergePolicy, PhotoRef, Venue};

/// Opaque handle for the next page of a search. Valid for one request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContinuationToken(String);

impl ContinuationToken {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: String,
    pub center: Coordinate,
    pub radius_m: u32,
}

/// One record of a search page. Discarded once folded into a [`Venue`].
#[derive(Debug, Clone, PartialEq)]
pub struct RawResult {
    pub id: String,
    pub name: String,
    pub rating: Option<f64>,
    pub location: Option<Coordinate>,
    pub address: Option<String>,
    pub photos: Vec<PhotoRef>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPage {
    pub results: Vec<RawResult>,
    /// Present only when the source has more pages.
    pub next_page: Option<ContinuationToken>,
}

/// Supplementary fields from the details endpoint. Every field is optional;
/// sources routinely omit some.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VenueDetails {
    pub name: Option<String>,
    pub rating: Option<f64>,
    pub location: Option<Coordinate>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub maps_url: Option<String>,
    pub photos: Vec<PhotoRef>,
    pub description: Option<String>,
    pub opening_hours: Option<WeeklyHours>,
}

#[derive(Debug, Clone, Error)]
pub enum SourceError {
    /// Transport-level failure: connection, timeout, non-2xx HTTP status.
    #[error("venue source unavailable: {0}")]
    Unavailable(String),

    /// The source answered with a non-success status (quota, denied, invalid).
    #[error("venue source rejected the request with status {status}{}", message_suffix(.message))]
    Rejected {
        status: String,
        message: Option<String>,
    },

    /// The response body could not be understood.
    #[error("malformed response for {context}: {reason}")]
    Malformed { context: String, reason: String },
}

fn message_suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {m}"))
        .unwrap_or_default()
}

#[async_trait]
pub trait VenueSource: Send + Sync {
    /// Fetches one page. `token = None` requests the first page.
    /// A zero-results answer is `Ok` with an empty page and no token.
    async fn search_page(
        &self,
        request: &SearchRequest,
        token: Option<&ContinuationToken>,
    ) -> Result<SearchPage, SourceError>;

    /// Fetches supplementary fields for one record.
    async fn details(&self, id: &str) -> Result<VenueDetails, SourceError>;
}

impl RawResult {
    /// Folds a later record for the same id (e.g. a repeat within one page).
    pub fn merge(&mut self, incoming: RawResult, policy: MergePolicy) {
        match policy {
            MergePolicy::Replace => *self = incoming,
            MergePolicy::Patch => {
                if !incoming.name.trim().is_empty() {
                    self.name = incoming.name;
                }
                if incoming.rating.is_some() {
                    self.rating = incoming.rating;
                }
                if incoming.location.is_some() {
                    self.location = incoming.location;
                }
                if let Some(address) = non_blank(incoming.address) {
                    self.address = Some(address);
                }
                if !incoming.photos.is_empty() {
                    self.photos = incoming.photos;
                }
            }
        }
    }

    /// Builds the venue for this record, preferring detail fields where the
    /// details lookup supplied them. `city` drives district derivation.
    #[must_use]
    pub fn into_venue(self, details: VenueDetails, category: &str, city: &str) -> Venue {
        let name = details
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(self.name);
        let address = non_blank(details.address).or_else(|| non_blank(self.address));
        let district = address.as_deref().map(|a| extract_district(a, city));
        let photos = if details.photos.is_empty() {
            self.photos
        } else {
            details.photos
        };

        Venue {
            id: self.id,
            name,
            rating: details.rating.or(self.rating),
            location: details.location.or(self.location),
            address,
            district,
            website: non_blank(details.website),
            maps_url: non_blank(details.maps_url),
            photos,
            description: non_blank(details.description),
            opening_hours: details.opening_hours,
            category: category.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> RawResult {
        RawResult {
            id: "place-1".to_owned(),
            name: "Virgin Active Claremont".to_owned(),
            rating: Some(4.1),
            location: Some(Coordinate::new(-33.98, 18.46)),
            address: Some("Main Rd, Claremont, Cape Town".to_owned()),
            photos: vec![PhotoRef {
                reference: "search-photo".to_owned(),
                url: "https://photos.example/search-photo".to_owned(),
            }],
        }
    }

    #[test]
    fn raw_patch_keeps_fields_the_repeat_lacks() {
        let mut held = raw();
        held.merge(
            RawResult {
                name: "Virgin Active Claremont Club".to_owned(),
                rating: None,
                address: Some(" ".to_owned()),
                photos: Vec::new(),
                ..raw()
            },
            MergePolicy::Patch,
        );
        assert_eq!(held.name, "Virgin Active Claremont Club");
        assert_eq!(held.rating, Some(4.1));
        assert_eq!(held.address.as_deref(), Some("Main Rd, Claremont, Cape Town"));
        assert_eq!(held.photos.len(), 1);
    }

    #[test]
    fn raw_replace_takes_the_repeat() {
        let mut held = raw();
        held.merge(
            RawResult {
                rating: None,
                ..raw()
            },
            MergePolicy::Replace,
        );
        assert_eq!(held.rating, None);
    }

    #[test]
    fn details_fields_take_precedence() {
        let details = VenueDetails {
            rating: Some(4.3),
            address: Some("1 Cavendish St, Claremont, Cape Town, 7708".to_owned()),
            website: Some("https://virginactive.example".to_owned()),
            description: Some("Large club".to_owned()),
            ..VenueDetails::default()
        };
        let venue = raw().into_venue(details, "Gym", "Cape Town");

        assert_eq!(venue.id, "place-1");
        assert_eq!(venue.name, "Virgin Active Claremont");
        assert_eq!(venue.rating, Some(4.3));
        assert_eq!(
            venue.address.as_deref(),
            Some("1 Cavendish St, Claremont, Cape Town, 7708")
        );
        assert_eq!(venue.district.as_deref(), Some("Claremont"));
        assert_eq!(venue.website.as_deref(), Some("https://virginactive.example"));
        assert_eq!(venue.category, "Gym");
        assert_eq!(venue.photos[0].reference, "search-photo");
    }

    #[test]
    fn blank_detail_strings_fall_back_to_search_fields() {
        let details = VenueDetails {
            name: Some("  ".to_owned()),
            address: Some(String::new()),
            website: Some(String::new()),
            ..VenueDetails::default()
        };
        let venue = raw().into_venue(details, "Gym", "Cape Town");

        assert_eq!(venue.name, "Virgin Active Claremont");
        assert_eq!(venue.address.as_deref(), Some("Main Rd, Claremont, Cape Town"));
        assert!(venue.website.is_none());
    }

    #[test]
    fn rejected_error_message_includes_provider_text() {
        let err = SourceError::Rejected {
            status: "OVER_QUERY_LIMIT".to_owned(),
            message: Some("You have exceeded your daily request quota".to_owned()),
        };
        assert_eq!(
            err.to_string(),
            "venue source rejected the request with status OVER_QUERY_LIMIT: You have exceeded your daily request quota"
        );
    }
}
