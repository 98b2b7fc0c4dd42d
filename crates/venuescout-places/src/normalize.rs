//! Normalization from places API wire types to the source-neutral records in
//! [`venuescout_core::source`].
//!
//! Photo references are turned into display URLs by a caller-supplied
//! function so this module stays free of client state.

use venuescout_core::{Coordinate, PhotoRef, RawResult, VenueDetails, WeeklyHours};

use crate::types::{Geometry, PlaceDetailsResult, PlacePhoto, PlaceResult};

/// Normalizes one search result. Returns `None` for records without a
/// `place_id`, which cannot be deduplicated or enriched.
pub fn normalize_result<F>(result: PlaceResult, photo_url: F) -> Option<RawResult>
where
    F: Fn(&str) -> String,
{
    let Some(id) = result.place_id.filter(|id| !id.trim().is_empty()) else {
        tracing::warn!(
            name = result.name.as_deref().unwrap_or("<unnamed>"),
            "search result has no place_id, skipping"
        );
        return None;
    };

    Some(RawResult {
        name: result
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| id.clone()),
        id,
        rating: valid_rating(result.rating),
        location: result.geometry.as_ref().map(to_coordinate),
        address: result.formatted_address.or(result.vicinity),
        photos: to_photos(result.photos, &photo_url),
    })
}

/// Normalizes a details payload.
pub fn normalize_details<F>(details: PlaceDetailsResult, photo_url: F) -> VenueDetails
where
    F: Fn(&str) -> String,
{
    VenueDetails {
        name: details.name,
        rating: valid_rating(details.rating),
        location: details.geometry.as_ref().map(to_coordinate),
        address: details.formatted_address,
        website: details.website,
        maps_url: details.url,
        photos: to_photos(details.photos, &photo_url),
        description: details.editorial_summary.and_then(|s| s.overview),
        opening_hours: details
            .opening_hours
            .filter(|h| !h.weekday_text.is_empty())
            .map(|h| WeeklyHours::from_weekday_text(&h.weekday_text)),
    }
}

fn to_coordinate(geometry: &Geometry) -> Coordinate {
    Coordinate::new(geometry.location.lat, geometry.location.lng)
}

/// Ratings are on a 0–5 scale; anything else is treated as unrated.
fn valid_rating(rating: Option<f64>) -> Option<f64> {
    rating.filter(|r| r.is_finite() && (0.0..=5.0).contains(r))
}

fn to_photos<F>(photos: Vec<PlacePhoto>, photo_url: &F) -> Vec<PhotoRef>
where
    F: Fn(&str) -> String,
{
    photos
        .into_iter()
        .filter(|p| !p.photo_reference.is_empty())
        .map(|p| PhotoRef {
            url: photo_url(&p.photo_reference),
            reference: p.photo_reference,
        })
        .collect()
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
