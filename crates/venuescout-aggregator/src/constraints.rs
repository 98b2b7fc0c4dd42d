//! Run limits and pacing.

use std::time::Duration;

use venuescout_core::{AppConfig, Coordinate, Disclosure, MergePolicy};

/// Limits applied to a single aggregation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraints {
    /// Pause between consecutive page fetches. Continuation tokens are not
    /// honoured by the provider until some time after they are issued.
    pub inter_page_delay: Duration,
    /// `None` keeps paging until the source runs dry or the record ceiling hits.
    pub max_pages: Option<u32>,
    pub max_records: usize,
    pub batch_size: usize,
    pub merge_policy: MergePolicy,
    pub disclosure: Disclosure,
}

impl Default for Constraints {
    fn default() -> Self {
        Self {
            inter_page_delay: Duration::from_millis(2000),
            max_pages: Some(3),
            max_records: 60,
            batch_size: 5,
            merge_policy: MergePolicy::Replace,
            disclosure: Disclosure::Progressive,
        }
    }
}

impl Constraints {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            inter_page_delay: Duration::from_millis(config.inter_page_delay_ms),
            max_pages: config.max_pages,
            max_records: config.max_records.max(1),
            batch_size: config.detail_batch_size.max(1),
            merge_policy: config.merge_policy,
            disclosure: config.disclosure,
        }
    }

    /// Drops the page ceiling ("load everything" mode).
    #[must_use]
    pub fn load_everything(mut self) -> Self {
        self.max_pages = None;
        self
    }

    #[must_use]
    pub fn with_disclosure(mut self, disclosure: Disclosure) -> Self {
        self.disclosure = disclosure;
        self
    }
}

/// Where searches are centred and how venues are assigned a district.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchArea {
    pub center: Coordinate,
    pub radius_m: u32,
    pub city: String,
}

impl SearchArea {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            center: config.center,
            radius_m: config.search_radius_m,
            city: config.city.clone(),
        }
    }
}
