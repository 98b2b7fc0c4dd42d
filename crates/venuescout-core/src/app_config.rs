use std::net::SocketAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::venue::{Coordinate, MergePolicy};
use crate::CoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// When an aggregation run hands its venue set to the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disclosure {
    /// A snapshot after every merged page, then a final one.
    #[default]
    Progressive,
    /// Only the final set, once the run terminates.
    Terminal,
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub places_api_key: Option<String>,
    pub places_base_url: String,
    pub maps_script_url: String,
    pub center: Coordinate,
    pub city: String,
    pub search_radius_m: u32,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub inter_page_delay_ms: u64,
    /// `None` means "load everything": only the record ceiling bounds a run.
    pub max_pages: Option<u32>,
    pub max_records: usize,
    pub detail_batch_size: usize,
    pub merge_policy: MergePolicy,
    pub disclosure: Disclosure,
    pub photo_max_width: u32,
    pub categories_path: Option<PathBuf>,
}

impl AppConfig {
    /// Returns the places API key, or [`CoreError::ConfigurationMissing`]
    /// when none is configured. Callers check this before starting a run.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigurationMissing`] if the key is unset or blank.
    pub fn require_api_key(&self) -> Result<&str, CoreError> {
        self.places_api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(CoreError::ConfigurationMissing)
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field(
                "places_api_key",
                &self.places_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("places_base_url", &self.places_base_url)
            .field("maps_script_url", &self.maps_script_url)
            .field("center", &self.center)
            .field("city", &self.city)
            .field("search_radius_m", &self.search_radius_m)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("inter_page_delay_ms", &self.inter_page_delay_ms)
            .field("max_pages", &self.max_pages)
            .field("max_records", &self.max_records)
            .field("detail_batch_size", &self.detail_batch_size)
            .field("merge_policy", &self.merge_policy)
            .field("disclosure", &self.disclosure)
            .field("photo_max_width", &self.photo_max_width)
            .field("categories_path", &self.categories_path)
            .finish()
    }
}
