//! The `status` field every places API envelope carries.

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum PlacesStatus {
    Ok,
    ZeroResults,
    OverQueryLimit,
    RequestDenied,
    InvalidRequest,
    NotFound,
    UnknownError,
    Other(String),
}

impl PlacesStatus {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            PlacesStatus::Ok => "OK",
            PlacesStatus::ZeroResults => "ZERO_RESULTS",
            PlacesStatus::OverQueryLimit => "OVER_QUERY_LIMIT",
            PlacesStatus::RequestDenied => "REQUEST_DENIED",
            PlacesStatus::InvalidRequest => "INVALID_REQUEST",
            PlacesStatus::NotFound => "NOT_FOUND",
            PlacesStatus::UnknownError => "UNKNOWN_ERROR",
            PlacesStatus::Other(raw) => raw,
        }
    }

    /// `UNKNOWN_ERROR` is documented as a server-side hiccup that may succeed
    /// on a second attempt. Every other failure status is permanent.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, PlacesStatus::UnknownError)
    }
}

impl From<String> for PlacesStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "OK" => PlacesStatus::Ok,
            "ZERO_RESULTS" => PlacesStatus::ZeroResults,
            "OVER_QUERY_LIMIT" => PlacesStatus::OverQueryLimit,
            "REQUEST_DENIED" => PlacesStatus::RequestDenied,
            "INVALID_REQUEST" => PlacesStatus::InvalidRequest,
            "NOT_FOUND" => PlacesStatus::NotFound,
            "UNKNOWN_ERROR" => PlacesStatus::UnknownError,
            _ => PlacesStatus::Other(raw),
        }
    }
}

impl std::fmt::Display for PlacesStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
