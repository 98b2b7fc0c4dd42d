//! Flat spreadsheet export of a venue list.

use std::io::Write;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::hours::Weekday;
use crate::venue::Venue;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error during export: {0}")]
    Io(#[from] std::io::Error),
}

/// One spreadsheet row. Column order is fixed by field order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    #[serde(rename = "Venue Name")]
    pub name: String,
    #[serde(rename = "District")]
    pub district: String,
    #[serde(rename = "Latitude")]
    pub latitude: Option<f64>,
    #[serde(rename = "Longitude")]
    pub longitude: Option<f64>,
    #[serde(rename = "Google Rating")]
    pub rating: Option<f64>,
    #[serde(rename = "Website Link")]
    pub website: String,
    #[serde(rename = "Google Maps Link")]
    pub maps_url: String,
    #[serde(rename = "Photos")]
    pub photos: String,
    #[serde(rename = "About")]
    pub description: String,
    #[serde(rename = "Monday")]
    pub monday: String,
    #[serde(rename = "Tuesday")]
    pub tuesday: String,
    #[serde(rename = "Wednesday")]
    pub wednesday: String,
    #[serde(rename = "Thursday")]
    pub thursday: String,
    #[serde(rename = "Friday")]
    pub friday: String,
    #[serde(rename = "Saturday")]
    pub saturday: String,
    #[serde(rename = "Sunday")]
    pub sunday: String,
}

impl From<&Venue> for ExportRow {
    fn from(venue: &Venue) -> Self {
        let day = |d: Weekday| {
            venue
                .opening_hours
                .as_ref()
                .map(|h| h.get(d).to_owned())
                .unwrap_or_default()
        };

        Self {
            name: venue.name.clone(),
            district: venue.district.clone().unwrap_or_default(),
            latitude: venue.location.map(|c| c.lat),
            longitude: venue.location.map(|c| c.lng),
            rating: venue.rating,
            website: venue.website.clone().unwrap_or_default(),
            maps_url: venue.maps_url.clone().unwrap_or_default(),
            photos: venue
                .photos
                .iter()
                .map(|p| p.url.as_str())
                .collect::<Vec<_>>()
                .join("; "),
            description: venue.description.clone().unwrap_or_default(),
            monday: day(Weekday::Monday),
            tuesday: day(Weekday::Tuesday),
            wednesday: day(Weekday::Wednesday),
            thursday: day(Weekday::Thursday),
            friday: day(Weekday::Friday),
            saturday: day(Weekday::Saturday),
            sunday: day(Weekday::Sunday),
        }
    }
}

/// Writes `venues` as CSV (header row included), keeping only venues tagged
/// with `category` when one is given.
///
/// # Errors
///
/// Returns [`ExportError`] if serialization or the underlying writer fails.
pub fn write_csv<W: Write>(
    venues: &[Venue],
    category: Option<&str>,
    writer: W,
) -> Result<usize, ExportError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(writer);

    let mut written = 0usize;
    for venue in venues
        .iter()
        .filter(|v| category.is_none_or(|c| v.category.eq_ignore_ascii_case(c)))
    {
        csv_writer.serialize(ExportRow::from(venue))?;
        written += 1;
    }

    // An empty export still gets its header row.
    if written == 0 {
        csv_writer.write_record(HEADERS)?;
    }

    csv_writer.flush()?;
    Ok(written)
}

/// Renders the CSV export into a string.
///
/// # Errors
///
/// Returns [`ExportError`] if serialization fails.
pub fn to_csv_string(venues: &[Venue], category: Option<&str>) -> Result<String, ExportError> {
    let mut buf = Vec::new();
    write_csv(venues, category, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// `venues_export_YYYY-MM-DD.csv`
#[must_use]
pub fn export_filename(date: NaiveDate) -> String {
    format!("venues_export_{}.csv", date.format("%Y-%m-%d"))
}

const HEADERS: [&str; 16] = [
    "Venue Name",
    "District",
    "Latitude",
    "Longitude",
    "Google Rating",
    "Website Link",
    "Google Maps Link",
    "Photos",
    "About",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];
