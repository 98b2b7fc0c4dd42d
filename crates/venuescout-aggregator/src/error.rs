use thiserror::Error;
use venuescout_core::{CoreError, SourceError};

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A run ended on a source failure before anything was collected.
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("no paused run to resume")]
    NothingToResume,

    #[error("the current run is still in progress")]
    RunInProgress,
}
