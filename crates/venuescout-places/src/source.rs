//! [`VenueSource`] implementation backed by the places API.

use async_trait::async_trait;
use venuescout_core::{
    ContinuationToken, SearchPage, SearchRequest, SourceError, VenueDetails, VenueSource,
};

use crate::client::PlacesClient;
use crate::error::PlacesError;
use crate::normalize::{normalize_details, normalize_result};
use crate::status::PlacesStatus;

impl From<PlacesError> for SourceError {
    fn from(err: PlacesError) -> Self {
        match err {
            PlacesError::Http(_) | PlacesError::UnexpectedStatus { .. } => {
                SourceError::Unavailable(err.to_string())
            }
            PlacesError::Rejected { status, message } => SourceError::Rejected {
                status: status.as_str().to_owned(),
                message,
            },
            PlacesError::Deserialize { context, source } => SourceError::Malformed {
                context,
                reason: source.to_string(),
            },
            PlacesError::InvalidBaseUrl { .. } | PlacesError::MissingApiKey => {
                SourceError::Unavailable(err.to_string())
            }
        }
    }
}

#[async_trait]
impl VenueSource for PlacesClient {
    async fn search_page(
        &self,
        request: &SearchRequest,
        token: Option<&ContinuationToken>,
    ) -> Result<SearchPage, SourceError> {
        let response = self
            .text_search(request, token.map(ContinuationToken::as_str))
            .await?;

        if response.status == PlacesStatus::ZeroResults {
            tracing::debug!(query = %request.query, "text search returned zero results");
            return Ok(SearchPage::default());
        }

        let total = response.results.len();
        let results: Vec<_> = response
            .results
            .into_iter()
            .filter_map(|r| normalize_result(r, |reference| self.photo_url(reference)))
            .collect();
        tracing::debug!(
            query = %request.query,
            total,
            kept = results.len(),
            has_next = response.next_page_token.is_some(),
            "text search page received"
        );

        Ok(SearchPage {
            results,
            next_page: response
                .next_page_token
                .filter(|t| !t.is_empty())
                .map(ContinuationToken::new),
        })
    }

    async fn details(&self, id: &str) -> Result<VenueDetails, SourceError> {
        let details = self.place_details(id).await?;
        Ok(normalize_details(details, |reference| {
            self.photo_url(reference)
        }))
    }
}
