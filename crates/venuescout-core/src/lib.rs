pub mod app_config;
pub mod categories;
pub mod config;
pub mod district;
pub mod export;
pub mod hours;
pub mod source;
pub mod venue;

use thiserror::Error;

pub use app_config::{AppConfig, Disclosure, Environment};
pub use categories::{load_categories, Category, CategoryTable};
pub use config::{build_app_config, load_app_config, load_app_config_from_env};
pub use district::extract_district;
pub use export::{export_filename, to_csv_string, write_csv, ExportError, ExportRow};
pub use hours::{Weekday, WeeklyHours};
pub use source::{
    ContinuationToken, RawResult, SearchPage, SearchRequest, SourceError, VenueDetails,
    VenueSource,
};
pub use venue::{Coordinate, MergePolicy, PhotoRef, Venue};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read categories file {path}: {source}")]
    CategoriesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse categories file: {0}")]
    CategoriesFileParse(#[from] serde_yaml::Error),

    #[error("configuration validation failed: {0}")]
    Validation(String),
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown category: {0}")]
    UnknownCategory(String),

    #[error("no places API key configured (set GOOGLE_MAPS_API_KEY)")]
    ConfigurationMissing,
}
