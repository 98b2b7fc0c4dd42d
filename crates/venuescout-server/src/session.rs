//! The single browsing session the server hosts: at most one live run,
//! its latest snapshot, and "load more" continuation of a paused run.

use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use venuescout_aggregator::{
    AggregateError, Aggregator, RunHandle, RunOutcome, RunRegistry, RunSnapshot,
};
use venuescout_core::{Category, CategoryTable, VenueSource};

pub type VenueAggregator = Aggregator<dyn VenueSource>;

#[derive(Default)]
pub struct RunSession {
    registry: RunRegistry,
    active: Mutex<Option<ActiveRun>>,
}

struct ActiveRun {
    snapshots: watch::Receiver<RunSnapshot>,
    task: RunTask,
}

enum RunTask {
    Running(RunHandle),
    Finished(RunOutcome),
    /// The run task panicked; nothing can be resumed.
    Lost,
}

impl ActiveRun {
    fn new(handle: RunHandle) -> Self {
        Self {
            snapshots: handle.subscribe(),
            task: RunTask::Running(handle),
        }
    }

    /// Whether the run is still loading. A run counts as done once it has
    /// published its final phase, slightly before its task returns.
    fn is_loading(&self) -> bool {
        match &self.task {
            RunTask::Running(handle) => {
                !handle.is_finished() && !self.snapshots.borrow().phase.is_finished()
            }
            RunTask::Finished(_) | RunTask::Lost => false,
        }
    }

    /// Collects the outcome of a run that is no longer loading.
    async fn settle(&mut self) -> Option<&RunOutcome> {
        if !self.is_loading() {
            if let RunTask::Running(handle) = std::mem::replace(&mut self.task, RunTask::Lost) {
                match handle.finish().await {
                    Ok(outcome) => self.task = RunTask::Finished(outcome),
                    Err(e) => tracing::error!(error = %e, "aggregation task failed"),
                }
            }
        }
        match &self.task {
            RunTask::Finished(outcome) => Some(outcome),
            RunTask::Running(_) | RunTask::Lost => None,
        }
    }
}

impl RunSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a run for `category`, cancelling the previous one.
    pub async fn start(&self, aggregator: &Arc<VenueAggregator>, category: Category) -> u64 {
        let mut active = self.active.lock().await;
        let handle = aggregator.spawn(category, self.registry.begin(), None);
        let run_id = handle.run_id();
        *active = Some(ActiveRun::new(handle));
        run_id
    }

    /// Continues the last run from where its page ceiling stopped it.
    ///
    /// # Errors
    ///
    /// - [`AggregateError::RunInProgress`] if the current run has not finished.
    /// - [`AggregateError::NothingToResume`] if there is no run, or it did not
    ///   stop at the page ceiling with more pages available.
    /// - [`AggregateError::Core`] if the run's category is no longer known.
    pub async fn resume(
        &self,
        aggregator: &Arc<VenueAggregator>,
        categories: &CategoryTable,
    ) -> Result<u64, AggregateError> {
        let mut active = self.active.lock().await;
        let current = active.as_mut().ok_or(AggregateError::NothingToResume)?;
        if current.is_loading() {
            return Err(AggregateError::RunInProgress);
        }
        let point = current
            .settle()
            .await
            .and_then(RunOutcome::resume_point)
            .ok_or(AggregateError::NothingToResume)?;
        let category = categories.resolve(&point.category)?.clone();

        let handle = aggregator.spawn(category, self.registry.begin(), Some(point));
        let run_id = handle.run_id();
        *active = Some(ActiveRun::new(handle));
        Ok(run_id)
    }

    /// Cancels the live run. Returns whether a run was cancelled; a run
    /// that already finished is left alone.
    pub async fn cancel(&self) -> bool {
        let active = self.active.lock().await;
        if !active.as_ref().is_some_and(ActiveRun::is_loading) {
            return false;
        }
        self.registry.cancel_current()
    }

    /// Latest snapshot of the current (or last) run.
    pub async fn current(&self) -> Option<RunSnapshot> {
        let active = self.active.lock().await;
        active.as_ref().map(|run| run.snapshots.borrow().clone())
    }
}
