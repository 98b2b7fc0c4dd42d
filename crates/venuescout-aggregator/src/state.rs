//! Engine states and termination reasons.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The source had no further pages (or returned zero results).
    Exhausted,
    RecordCeiling,
    PageCeiling,
    Cancelled,
    /// A search page failed; venues merged before it are kept.
    SourceError,
}

impl Termination {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Termination::Exhausted => "exhausted",
            Termination::RecordCeiling => "record_ceiling",
            Termination::PageCeiling => "page_ceiling",
            Termination::Cancelled => "cancelled",
            Termination::SourceError => "source_error",
        }
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    FetchingPage,
    Deduplicating,
    /// Zero-based batch index within the current page.
    EnrichingBatch(usize),
    AwaitingCooldown,
    Terminated(Termination),
}

impl RunState {
    /// Whether the engine may move from `self` to `next`. Any live state may
    /// be cancelled; `Terminated` is final.
    #[must_use]
    pub fn can_transition_to(self, next: RunState) -> bool {
        use RunState::{
            AwaitingCooldown, Deduplicating, EnrichingBatch, FetchingPage, Idle, Terminated,
        };

        match (self, next) {
            (Terminated(_), _) => false,
            (EnrichingBatch(k), EnrichingBatch(j)) => j == k + 1,
            (_, Terminated(Termination::Cancelled))
            | (Idle | AwaitingCooldown, FetchingPage)
            | (FetchingPage, Deduplicating | Terminated(Termination::SourceError))
            | (Deduplicating, EnrichingBatch(0))
            | (Deduplicating | EnrichingBatch(_), FetchingPage | AwaitingCooldown | Terminated(_)) => {
                true
            }
            _ => false,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Idle => f.write_str("idle"),
            RunState::FetchingPage => f.write_str("fetching_page"),
            RunState::Deduplicating => f.write_str("deduplicating"),
            RunState::EnrichingBatch(k) => write!(f, "enriching_batch({k})"),
            RunState::AwaitingCooldown => f.write_str("awaiting_cooldown"),
            RunState::Terminated(reason) => write!(f, "terminated({reason})"),
        }
    }
}
