//! The merged, detail-enriched venue entity and its merge rules.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::hours::WeeklyHours;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    #[must_use]
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// `lat,lng` as the places API expects it in a `location` parameter.
    #[must_use]
    pub fn to_query_value(&self) -> String {
        format!("{},{}", self.lat, self.lng)
    }
}

impl FromStr for Coordinate {
    type Err = String;

    /// Parses `"lat,lng"`, tolerating whitespace around either part.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lng) = s
            .split_once(',')
            .ok_or_else(|| format!("expected \"lat,lng\", got \"{s}\""))?;
        let lat = lat
            .trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid latitude \"{}\": {e}", lat.trim()))?;
        let lng = lng
            .trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid longitude \"{}\": {e}", lng.trim()))?;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(format!("coordinate out of range: {lat},{lng}"));
        }
        Ok(Self { lat, lng })
    }
}

/// A photo handle from the source plus the URL a browser can display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoRef {
    pub reference: String,
    pub url: String,
}

/// How an arriving venue is folded into an entry that already holds its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergePolicy {
    /// The later arrival replaces the stored entry wholesale.
    #[default]
    Replace,
    /// Populated incoming fields overwrite; blank ones never erase.
    Patch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    pub id: String,
    pub name: String,
    pub rating: Option<f64>,
    pub location: Option<Coordinate>,
    pub address: Option<String>,
    pub district: Option<String>,
    pub website: Option<String>,
    pub maps_url: Option<String>,
    #[serde(default)]
    pub photos: Vec<PhotoRef>,
    pub description: Option<String>,
    pub opening_hours: Option<WeeklyHours>,
    /// The category label whose search produced this venue.
    pub category: String,
}

impl Venue {
    /// Folds `incoming` into `self` under `policy`. Ids are assumed equal;
    /// the caller keys entries by id.
    pub fn merge(&mut self, incoming: Venue, policy: MergePolicy) {
        match policy {
            MergePolicy::Replace => *self = incoming,
            MergePolicy::Patch => self.patch(incoming),
        }
    }

    /// Folds a later search-only record for this id into the venue. Detail
    /// fields (website, maps link, description, hours) are never touched
    /// since a search record does not carry them. Under `Replace` the
    /// record's search fields win as-is; under `Patch` its blanks are ignored.
    pub fn merge_search(&mut self, incoming: Venue, policy: MergePolicy) {
        match policy {
            MergePolicy::Replace => {
                let Venue {
                    name,
                    rating,
                    location,
                    address,
                    district,
                    photos,
                    category,
                    ..
                } = incoming;
                self.name = name;
                self.rating = rating;
                self.location = location;
                self.address = address;
                self.district = district;
                self.photos = photos;
                self.category = category;
            }
            MergePolicy::Patch => self.patch(Venue {
                website: None,
                maps_url: None,
                description: None,
                opening_hours: None,
                ..incoming
            }),
        }
    }

    fn patch(&mut self, incoming: Venue) {
        fn keep_or_take<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        if !incoming.name.trim().is_empty() {
            self.name = incoming.name;
        }
        if !incoming.category.is_empty() {
            self.category = incoming.category;
        }
        if !incoming.photos.is_empty() {
            self.photos = incoming.photos;
        }
        keep_or_take(&mut self.rating, incoming.rating);
        keep_or_take(&mut self.location, incoming.location);
        keep_or_take(&mut self.address, non_blank(incoming.address));
        keep_or_take(&mut self.district, non_blank(incoming.district));
        keep_or_take(&mut self.website, non_blank(incoming.website));
        keep_or_take(&mut self.maps_url, non_blank(incoming.maps_url));
        keep_or_take(&mut self.description, non_blank(incoming.description));
        keep_or_take(&mut self.opening_hours, incoming.opening_hours);
    }
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
