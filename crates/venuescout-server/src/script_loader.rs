//! Fetches third-party JavaScript once per URL and shares it.
//!
//! Concurrent loads of the same URL coalesce onto a single request. A failed
//! load leaves nothing cached, so the next caller tries again. [`reset`]
//! forgets everything.
//!
//! [`reset`]: ScriptLoader::reset

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use reqwest::Client;
use thiserror::Error;
use tokio::sync::OnceCell;

#[derive(Debug, Clone, Error)]
pub enum ScriptLoadError {
    #[error("failed to fetch script: {0}")]
    Fetch(String),

    #[error("script host returned HTTP {0}")]
    Status(u16),
}

pub struct ScriptLoader {
    client: Client,
    cache: Mutex<HashMap<String, Arc<OnceCell<Arc<str>>>>>,
}

impl ScriptLoader {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the script body for `url`, fetching it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptLoadError`] if the fetch fails or the host answers
    /// with a non-success status.
    pub async fn load(&self, url: &str) -> Result<Arc<str>, ScriptLoadError> {
        let cell = {
            let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(cache.entry(url.to_owned()).or_default())
        };

        cell.get_or_try_init(|| self.fetch(url))
            .await
            .map(Arc::clone)
    }

    /// Drops every cached script.
    pub fn reset(&self) {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    #[cfg(test)]
    #[must_use]
    pub fn is_cached(&self, url: &str) -> bool {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .is_some_and(|cell| cell.initialized())
    }

    async fn fetch(&self, url: &str) -> Result<Arc<str>, ScriptLoadError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ScriptLoadError::Fetch(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "script fetch rejected");
            return Err(ScriptLoadError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ScriptLoadError::Fetch(e.without_url().to_string()))?;
        tracing::debug!(bytes = body.len(), "script loaded");
        Ok(Arc::from(body))
    }
}
