//! What a run discloses to its consumer.

use serde::Serialize;
use venuescout_core::{ContinuationToken, MergePolicy, SourceError, Venue};

use crate::error::AggregateError;
use crate::state::Termination;
use crate::venue_set::VenueSet;

/// Lifecycle as seen by a consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunPhase {
    Loading,
    Done { reason: Termination },
    Failed { message: String },
    Cancelled,
}

impl RunPhase {
    #[must_use]
    pub fn is_finished(&self) -> bool {
        !matches!(self, RunPhase::Loading)
    }
}

/// The venue set at one point of a run. The engine imposes no ordering on
/// `venues`; consumers sort for display.
#[derive(Debug, Clone, Serialize)]
pub struct RunSnapshot {
    pub run_id: u64,
    pub category: String,
    pub phase: RunPhase,
    pub pages_fetched: u32,
    pub venues: Vec<Venue>,
}

impl RunSnapshot {
    #[must_use]
    pub fn loading(run_id: u64, category: &str, venues: Vec<Venue>) -> Self {
        Self {
            run_id,
            category: category.to_owned(),
            phase: RunPhase::Loading,
            pages_fetched: 0,
            venues,
        }
    }
}

/// Final result of a run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub run_id: u64,
    pub category: String,
    pub termination: Termination,
    pub pages_fetched: u32,
    pub venues: Vec<Venue>,
    /// Set when `termination` is [`Termination::SourceError`].
    pub error: Option<SourceError>,
    /// Token for the page after the last one fetched, if the source has more.
    pub next_page: Option<ContinuationToken>,
}

impl RunOutcome {
    #[must_use]
    pub fn phase(&self) -> RunPhase {
        match (self.termination, &self.error) {
            (Termination::Cancelled, _) => RunPhase::Cancelled,
            (Termination::SourceError, Some(err)) => RunPhase::Failed {
                message: err.to_string(),
            },
            (Termination::SourceError, None) => RunPhase::Failed {
                message: "venue source failed".to_owned(),
            },
            (reason, _) => RunPhase::Done { reason },
        }
    }

    #[must_use]
    pub fn to_snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            run_id: self.run_id,
            category: self.category.clone(),
            phase: self.phase(),
            pages_fetched: self.pages_fetched,
            venues: self.venues.clone(),
        }
    }

    /// The source error of a run that failed before collecting any venue.
    /// Partial results with an error are not a failure.
    #[must_use]
    pub fn failure(&self) -> Option<AggregateError> {
        match (&self.error, self.venues.is_empty()) {
            (Some(err), true) => Some(AggregateError::Source(err.clone())),
            _ => None,
        }
    }

    /// A run paused at its page ceiling can be continued ("load more").
    #[must_use]
    pub fn resume_point(&self) -> Option<ResumePoint> {
        if self.termination != Termination::PageCeiling {
            return None;
        }
        let token = self.next_page.clone()?;
        Some(ResumePoint {
            category: self.category.clone(),
            venues: self.venues.clone(),
            token,
        })
    }
}

/// Everything needed to continue a paused run from its next page.
#[derive(Debug, Clone)]
pub struct ResumePoint {
    pub category: String,
    pub venues: Vec<Venue>,
    pub token: ContinuationToken,
}

impl ResumePoint {
    pub(crate) fn into_parts(self, policy: MergePolicy) -> (VenueSet, ContinuationToken) {
        (VenueSet::from_venues(self.venues, policy), self.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(termination: Termination, next: Option<&str>) -> RunOutcome {
        RunOutcome {
            run_id: 1,
            category: "Padel".to_owned(),
            termination,
            pages_fetched: 3,
            venues: Vec::new(),
            error: None,
            next_page: next.map(ContinuationToken::new),
        }
    }

    #[test]
    fn only_page_ceiling_with_token_is_resumable() {
        assert!(outcome(Termination::PageCeiling, Some("t")).resume_point().is_some());
        assert!(outcome(Termination::PageCeiling, None).resume_point().is_none());
        assert!(outcome(Termination::Exhausted, Some("t")).resume_point().is_none());
        assert!(outcome(Termination::Cancelled, Some("t")).resume_point().is_none());
    }

    #[test]
    fn phase_reflects_termination() {
        assert_eq!(
            outcome(Termination::Exhausted, None).phase(),
            RunPhase::Done {
                reason: Termination::Exhausted
            }
        );
        assert_eq!(outcome(Termination::Cancelled, None).phase(), RunPhase::Cancelled);

        let mut failed = outcome(Termination::SourceError, None);
        failed.error = Some(SourceError::Unavailable("timeout".to_owned()));
        assert_eq!(
            failed.phase(),
            RunPhase::Failed {
                message: "venue source unavailable: timeout".to_owned()
            }
        );
    }

    #[test]
    fn failure_only_when_nothing_was_collected() {
        let mut failed = outcome(Termination::SourceError, None);
        failed.error = Some(SourceError::Unavailable("timeout".to_owned()));
        assert!(matches!(failed.failure(), Some(AggregateError::Source(_))));

        failed.venues.push(venuescout_core::Venue {
            id: "a".to_owned(),
            name: "A".to_owned(),
            rating: None,
            location: None,
            address: None,
            district: None,
            website: None,
            maps_url: None,
            photos: Vec::new(),
            description: None,
            opening_hours: None,
            category: "Padel".to_owned(),
        });
        assert!(failed.failure().is_none());
    }

    #[test]
    fn loading_phase_is_not_finished() {
        assert!(!RunPhase::Loading.is_finished());
        assert!(RunPhase::Cancelled.is_finished());
    }
}
