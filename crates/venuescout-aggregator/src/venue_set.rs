//! The accumulated, id-keyed venue set of a run.

use std::collections::HashMap;

use venuescout_core::{MergePolicy, RawResult, Venue, VenueDetails};

/// Venues keyed by id. Iteration follows first-insertion order; a merge into
/// an existing key keeps that key's position.
#[derive(Debug, Clone, Default)]
pub struct VenueSet {
    venues: HashMap<String, Venue>,
    order: Vec<String>,
}

impl VenueSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a set from a previously disclosed venue list.
    #[must_use]
    pub fn from_venues(venues: Vec<Venue>, policy: MergePolicy) -> Self {
        let mut set = Self::new();
        for venue in venues {
            set.merge(venue, policy);
        }
        set
    }

    /// Inserts `venue`, or folds it into the entry already holding its id.
    pub fn merge(&mut self, venue: Venue, policy: MergePolicy) {
        match self.venues.get_mut(&venue.id) {
            Some(existing) => existing.merge(venue, policy),
            None => {
                self.order.push(venue.id.clone());
                self.venues.insert(venue.id.clone(), venue);
            }
        }
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.venues.contains_key(id)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Venue> {
        self.venues.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.venues.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.venues.is_empty()
    }

    /// Folds a page into the set. Records for held ids are merged into their
    /// entries under `policy` and need no enrichment. The rest are returned
    /// for enrichment: one record per new id (a repeat within the page is
    /// folded into the earlier one, last seen winning), capped at `capacity`.
    pub fn absorb(
        &mut self,
        results: Vec<RawResult>,
        capacity: usize,
        policy: MergePolicy,
        category: &str,
        city: &str,
    ) -> Vec<RawResult> {
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut refreshed = 0usize;
        let mut fresh: Vec<RawResult> = Vec::new();
        for result in results {
            if let Some(held) = self.venues.get_mut(&result.id) {
                let incoming = result.into_venue(VenueDetails::default(), category, city);
                held.merge_search(incoming, policy);
                refreshed += 1;
            } else if let Some(&pos) = positions.get(&result.id) {
                fresh[pos].merge(result, policy);
                refreshed += 1;
            } else {
                positions.insert(result.id.clone(), fresh.len());
                fresh.push(result);
            }
        }

        let over_capacity = fresh.len().saturating_sub(capacity);
        fresh.truncate(capacity);
        if refreshed > 0 || over_capacity > 0 {
            tracing::debug!(
                refreshed,
                over_capacity,
                fresh = fresh.len(),
                "page deduplicated"
            );
        }
        fresh
    }

    /// Venues in insertion order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Venue> {
        self.order
            .iter()
            .filter_map(|id| self.venues.get(id))
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn into_venues(mut self) -> Vec<Venue> {
        self.order
            .iter()
            .filter_map(|id| self.venues.remove(id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn venue(id: &str, name: &str) -> Venue {
        Venue {
            id: id.to_owned(),
            name: name.to_owned(),
            rating: None,
            location: None,
            address: None,
            district: None,
            website: None,
            maps_url: None,
            photos: Vec::new(),
            description: None,
            opening_hours: None,
            category: "Gym".to_owned(),
        }
    }

    fn raw(id: &str) -> RawResult {
        RawResult {
            id: id.to_owned(),
            name: format!("Venue {id}"),
            rating: None,
            location: None,
            address: None,
            photos: Vec::new(),
        }
    }

    #[test]
    fn merge_never_duplicates_an_id() {
        let mut set = VenueSet::new();
        set.merge(venue("a", "First"), MergePolicy::Replace);
        set.merge(venue("b", "Other"), MergePolicy::Replace);
        set.merge(venue("a", "Second"), MergePolicy::Replace);

        assert_eq!(set.len(), 2);
        assert_eq!(set.get("a").unwrap().name, "Second");
        let ids: Vec<_> = set.snapshot().into_iter().map(|v| v.id).collect();
        assert_eq!(ids, ["a", "b"], "merged key keeps its position");
    }

    #[test]
    fn patch_merge_keeps_populated_fields() {
        let mut set = VenueSet::new();
        let mut enriched = venue("a", "Club");
        enriched.website = Some("https://club.example".to_owned());
        set.merge(enriched, MergePolicy::Patch);
        set.merge(venue("a", "Club Renamed"), MergePolicy::Patch);

        let stored = set.get("a").unwrap();
        assert_eq!(stored.name, "Club Renamed");
        assert_eq!(stored.website.as_deref(), Some("https://club.example"));
    }

    #[test]
    fn replace_merge_overwrites_everything() {
        let mut set = VenueSet::new();
        let mut enriched = venue("a", "Club");
        enriched.website = Some("https://club.example".to_owned());
        set.merge(enriched, MergePolicy::Replace);
        set.merge(venue("a", "Club"), MergePolicy::Replace);

        assert_eq!(set.get("a").unwrap().website, None);
    }

    #[test]
    fn absorb_returns_only_new_ids() {
        let mut set = VenueSet::new();
        set.merge(venue("a", "Held"), MergePolicy::Replace);

        let fresh = set.absorb(
            vec![raw("a"), raw("b"), raw("c"), raw("b")],
            usize::MAX,
            MergePolicy::Replace,
            "Gym",
            "Cape Town",
        );
        let ids: Vec<_> = fresh.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["b", "c"]);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn absorb_folds_repeats_of_held_ids() {
        let mut set = VenueSet::new();
        let mut held = venue("a", "Old Name");
        held.website = Some("https://a.example".to_owned());
        held.rating = Some(4.0);
        set.merge(held, MergePolicy::Replace);

        let repeat = RawResult {
            name: "New Name".to_owned(),
            ..raw("a")
        };
        let fresh = set.absorb(vec![repeat], 10, MergePolicy::Replace, "Gym", "Cape Town");

        assert!(fresh.is_empty());
        let stored = set.get("a").unwrap();
        assert_eq!(stored.name, "New Name");
        assert_eq!(stored.rating, None, "replace takes the repeat's rating as-is");
        assert_eq!(stored.website.as_deref(), Some("https://a.example"));
    }

    #[test]
    fn absorb_patch_keeps_populated_fields() {
        let mut set = VenueSet::new();
        let mut held = venue("a", "Old Name");
        held.rating = Some(4.0);
        set.merge(held, MergePolicy::Patch);

        let repeat = RawResult {
            name: "New Name".to_owned(),
            ..raw("a")
        };
        set.absorb(vec![repeat], 10, MergePolicy::Patch, "Gym", "Cape Town");

        let stored = set.get("a").unwrap();
        assert_eq!(stored.name, "New Name");
        assert_eq!(stored.rating, Some(4.0));
    }

    #[test]
    fn absorb_keeps_the_last_in_page_repeat() {
        let mut set = VenueSet::new();
        let later = RawResult {
            name: "Later".to_owned(),
            ..raw("b")
        };
        let fresh = set.absorb(
            vec![raw("b"), raw("c"), later],
            usize::MAX,
            MergePolicy::Replace,
            "Gym",
            "Cape Town",
        );
        let names: Vec<_> = fresh.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Later", "Venue c"]);
    }

    #[test]
    fn absorb_respects_capacity() {
        let mut set = VenueSet::new();
        let fresh = set.absorb(
            vec![raw("a"), raw("b"), raw("c")],
            2,
            MergePolicy::Replace,
            "Gym",
            "Cape Town",
        );
        assert_eq!(fresh.len(), 2);
        assert!(set
            .absorb(vec![raw("z")], 0, MergePolicy::Replace, "Gym", "Cape Town")
            .is_empty());
    }

    #[test]
    fn round_trips_through_venue_list() {
        let mut set = VenueSet::new();
        set.merge(venue("x", "X"), MergePolicy::Replace);
        set.merge(venue("y", "Y"), MergePolicy::Replace);
        let rebuilt = VenueSet::from_venues(set.clone().into_venues(), MergePolicy::Replace);
        assert_eq!(rebuilt.len(), 2);
        assert!(rebuilt.contains("x") && rebuilt.contains("y"));
    }
}
