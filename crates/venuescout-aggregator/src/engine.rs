//! The aggregation loop.
//!
//! One run is a single task that owns its [`VenueSet`]. Pages are fetched
//! one after another; the new records of a page are enriched in sequential
//! batches whose detail lookups run concurrently and fully join before the
//! batch is merged. Liveness is checked before every network call, before
//! each merge and before each cooldown.

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use venuescout_core::{Category, Disclosure, RawResult, SearchRequest, SourceError, VenueSource};

use crate::constraints::{Constraints, SearchArea};
use crate::registry::RunToken;
use crate::snapshot::{ResumePoint, RunOutcome, RunSnapshot};
use crate::state::{RunState, Termination};
use crate::venue_set::VenueSet;

pub struct Aggregator<S: ?Sized> {
    source: Arc<S>,
    constraints: Constraints,
    area: SearchArea,
}

/// A run executing on its own task.
pub struct RunHandle {
    run: RunToken,
    snapshots: watch::Receiver<RunSnapshot>,
    task: JoinHandle<RunOutcome>,
}

impl RunHandle {
    #[must_use]
    pub fn run_id(&self) -> u64 {
        self.run.id()
    }

    /// A receiver that always holds the latest published snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<RunSnapshot> {
        self.snapshots.clone()
    }

    pub fn cancel(&self) {
        self.run.cancel();
    }

    /// Whether the run task has ended (its outcome is ready).
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the run task to finish.
    ///
    /// # Errors
    ///
    /// Returns the [`JoinError`] if the task panicked or was aborted.
    pub async fn finish(self) -> Result<RunOutcome, JoinError> {
        self.task.await
    }
}

impl<S> Aggregator<S>
where
    S: VenueSource + ?Sized + 'static,
{
    pub fn new(source: Arc<S>, constraints: Constraints, area: SearchArea) -> Self {
        Self {
            source,
            constraints,
            area,
        }
    }

    #[must_use]
    pub fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    /// Runs to termination and returns only the final outcome.
    pub async fn run_to_completion(
        &self,
        category: &Category,
        run: &RunToken,
        resume: Option<ResumePoint>,
    ) -> RunOutcome {
        self.drive(category, run, resume, |_| {}).await
    }

    /// Starts a run on its own task. Intermediate snapshots are published
    /// after every page under [`Disclosure::Progressive`]; the final snapshot
    /// is published either way unless a newer run has taken over.
    pub fn spawn(
        self: &Arc<Self>,
        category: Category,
        run: RunToken,
        resume: Option<ResumePoint>,
    ) -> RunHandle {
        let held = resume
            .as_ref()
            .map(|point| point.venues.clone())
            .unwrap_or_default();
        let (tx, rx) = watch::channel(RunSnapshot::loading(run.id(), &category.label, held));

        let engine = Arc::clone(self);
        let task_run = run.clone();
        let task = tokio::spawn(async move {
            let outcome = engine
                .drive(&category, &task_run, resume, |snapshot| {
                    tx.send_replace(snapshot);
                })
                .await;
            if task_run.is_current() {
                tx.send_replace(outcome.to_snapshot());
            }
            outcome
        });

        RunHandle {
            run,
            snapshots: rx,
            task,
        }
    }

    async fn drive<P>(
        &self,
        category: &Category,
        run: &RunToken,
        resume: Option<ResumePoint>,
        mut publish: P,
    ) -> RunOutcome
    where
        P: FnMut(RunSnapshot) + Send,
    {
        let policy = self.constraints.merge_policy;
        let (mut set, mut token) = match resume {
            Some(point) => {
                let (set, token) = point.into_parts(policy);
                (set, Some(token))
            }
            None => (VenueSet::new(), None),
        };
        // A resumed run gets a fresh record budget on top of what it holds.
        let record_limit = set.len().saturating_add(self.constraints.max_records);
        let request = SearchRequest {
            query: category.query.clone(),
            center: self.area.center,
            radius_m: self.area.radius_m,
        };
        let progressive = self.constraints.disclosure == Disclosure::Progressive;
        let mut state = StateTracker::new(run.id());
        let mut pages = 0u32;

        tracing::info!(
            run_id = run.id(),
            category = %category.label,
            resumed = token.is_some(),
            held = set.len(),
            "aggregation run started"
        );

        let (termination, error) = loop {
            if !run.is_live() {
                break (Termination::Cancelled, None);
            }
            state.enter(RunState::FetchingPage);
            let page = match self.source.search_page(&request, token.as_ref()).await {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!(
                        run_id = run.id(),
                        category = %category.label,
                        page = pages + 1,
                        error = %e,
                        "search page failed, ending run"
                    );
                    break (Termination::SourceError, Some(e));
                }
            };
            pages += 1;
            if !run.is_live() {
                break (Termination::Cancelled, None);
            }

            state.enter(RunState::Deduplicating);
            let capacity = record_limit.saturating_sub(set.len());
            let fresh = set.absorb(
                page.results,
                capacity,
                policy,
                &category.label,
                &self.area.city,
            );
            if !self.enrich(&mut set, fresh, category, run, &mut state).await {
                break (Termination::Cancelled, None);
            }
            token = page.next_page;

            if progressive && run.is_live() {
                publish(RunSnapshot {
                    pages_fetched: pages,
                    ..RunSnapshot::loading(run.id(), &category.label, set.snapshot())
                });
            }

            if token.is_none() {
                break (Termination::Exhausted, None);
            }
            if set.len() >= record_limit {
                break (Termination::RecordCeiling, None);
            }
            if self.constraints.max_pages.is_some_and(|max| pages >= max) {
                break (Termination::PageCeiling, None);
            }

            if !self.constraints.inter_page_delay.is_zero() {
                if !run.is_live() {
                    break (Termination::Cancelled, None);
                }
                state.enter(RunState::AwaitingCooldown);
                tokio::time::sleep(self.constraints.inter_page_delay).await;
            }
        };

        state.enter(RunState::Terminated(termination));
        tracing::info!(
            run_id = run.id(),
            category = %category.label,
            termination = %termination,
            pages,
            venues = set.len(),
            "aggregation run finished"
        );

        RunOutcome {
            run_id: run.id(),
            category: category.label.clone(),
            termination,
            pages_fetched: pages,
            venues: set.into_venues(),
            error,
            next_page: token,
        }
    }

    /// Enriches `pending` batch by batch and merges what succeeded. Returns
    /// `false` if the run stopped being live, leaving the set untouched by
    /// the interrupted batch.
    async fn enrich(
        &self,
        set: &mut VenueSet,
        mut pending: Vec<RawResult>,
        category: &Category,
        run: &RunToken,
        state: &mut StateTracker,
    ) -> bool {
        let batch_size = self.constraints.batch_size.max(1);
        let mut index = 0usize;

        while !pending.is_empty() {
            let rest = pending.split_off(batch_size.min(pending.len()));
            let batch = std::mem::replace(&mut pending, rest);
            state.enter(RunState::EnrichingBatch(index));

            if !run.is_live() {
                return false;
            }
            let details = join_all(batch.iter().map(|raw| self.source.details(&raw.id))).await;
            if !run.is_live() {
                return false;
            }

            for (raw, result) in batch.into_iter().zip(details) {
                match result {
                    Ok(details) => set.merge(
                        raw.into_venue(details, &category.label, &self.area.city),
                        self.constraints.merge_policy,
                    ),
                    Err(e) => log_detail_failure(run.id(), &raw.id, &e),
                }
            }
            index += 1;
        }
        true
    }
}

fn log_detail_failure(run_id: u64, place_id: &str, error: &SourceError) {
    tracing::warn!(
        run_id,
        place_id,
        error = %error,
        "detail fetch failed, dropping record"
    );
}

/// Tracks the current [`RunState`] and logs each transition.
struct StateTracker {
    run_id: u64,
    current: RunState,
}

impl StateTracker {
    fn new(run_id: u64) -> Self {
        Self {
            run_id,
            current: RunState::Idle,
        }
    }

    fn enter(&mut self, next: RunState) {
        debug_assert!(
            self.current.can_transition_to(next),
            "illegal run state transition {} -> {next}",
            self.current
        );
        tracing::debug!(run_id = self.run_id, from = %self.current, to = %next, "run state");
        self.current = next;
    }
}
