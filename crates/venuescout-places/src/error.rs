use thiserror::Error;

use crate::status::PlacesStatus;

#[derive(Debug, Error)]
pub enum PlacesError {
    /// Network or TLS failure. The request URL is stripped before wrapping
    /// so the API key never reaches logs.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {endpoint}")]
    UnexpectedStatus { status: u16, endpoint: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The places API answered 200 with a non-success `status` field.
    #[error("places API returned {status}{}", message_suffix(.message))]
    Rejected {
        status: PlacesStatus,
        message: Option<String>,
    },

    #[error("invalid places base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },

    #[error("no places API key configured")]
    MissingApiKey,
}

fn message_suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(" ({m})"))
        .unwrap_or_default()
}
