//! Run identity and liveness.
//!
//! Each started run receives a [`RunToken`] carrying its generation number
//! and its own cancellation token. A run is live only while it is both the
//! newest generation and not cancelled, so a superseded run can never
//! publish over its successor even if it misses a cancellation checkpoint.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio_util::sync::CancellationToken;

#[derive(Debug, Default)]
pub struct RunRegistry {
    generation: Arc<AtomicU64>,
    current: Mutex<Option<CancellationToken>>,
}

impl RunRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new run generation, cancelling whichever run was live.
    pub fn begin(&self) -> RunToken {
        let mut current = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = current.take() {
            previous.cancel();
        }
        let cancel = CancellationToken::new();
        *current = Some(cancel.clone());
        let id = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(run_id = id, "run generation started");

        RunToken {
            id,
            generation: Arc::clone(&self.generation),
            cancel,
        }
    }

    /// Cancels the live run, if any. Returns whether one was cancelled.
    pub fn cancel_current(&self) -> bool {
        let current = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match current.as_ref() {
            Some(token) if !token.is_cancelled() => {
                token.cancel();
                true
            }
            _ => false,
        }
    }

    /// Generation number of the most recently started run (0 before any).
    #[must_use]
    pub fn current_id(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

/// Handle a run consults at every checkpoint.
#[derive(Debug, Clone)]
pub struct RunToken {
    id: u64,
    generation: Arc<AtomicU64>,
    cancel: CancellationToken,
}

impl RunToken {
    /// A token outside any registry, for one-off terminal runs.
    #[must_use]
    pub fn detached() -> Self {
        Self {
            id: 1,
            generation: Arc::new(AtomicU64::new(1)),
            cancel: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn is_live(&self) -> bool {
        !self.cancel.is_cancelled() && self.generation.load(Ordering::SeqCst) == self.id
    }

    /// Whether no newer run has been started, cancelled or not.
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.generation.load(Ordering::SeqCst) == self.id
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}
