//! Resource fallback loader
//!
//! Tries an ordered list of candidate sources one at a time until one
//! produces the resource, then hands control to exactly one of two
//! continuations:
//! - `on_success` with the loaded resource, or
//! - `on_exhausted` when every candidate failed (or there were none).
//!
//! Each attempt is delegated to an [`Acquire`] implementation, which runs
//! asynchronously and reports back over a channel. Attempts are strictly
//! sequential: the next candidate is only tried after the previous one has
//! reported success or failure.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::error::AcquisitionError;
use crate::request::{RequestState, ResourceRequest, SourceId};

/// Bytes received so far for an in-flight acquisition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub loaded: u64,
    pub total: Option<u64>,
}

/// Notification sent by an acquisition back to the loader
#[derive(Debug)]
pub enum AcquireEvent<R> {
    /// Informational only, ignored by the state machine
    Progress(Progress),
    Loaded(R),
    Failed(AcquisitionError),
}

/// Capability that fetches and parses a resource from one source.
///
/// Implementations start the work and return immediately; outcomes arrive on
/// the returned channel. A channel that closes without `Loaded` or `Failed`
/// counts as a failure.
pub trait Acquire: Send + Sync {
    type Resource: Send + 'static;

    fn acquire(&self, source: &SourceId) -> mpsc::UnboundedReceiver<AcquireEvent<Self::Resource>>;
}

/// Hooks fired as a load progresses. None of them affect the outcome.
pub trait LoadObserver: Send + Sync {
    fn on_start(&self, _index: usize, _source: &SourceId) {}
    fn on_progress(&self, _source: &SourceId, _progress: Progress) {}
    fn on_error(&self, _index: usize, _source: &SourceId, _error: &AcquisitionError) {}
    fn on_load(&self, _index: usize, _source: &SourceId) {}
    fn on_exhausted(&self, _attempts: usize) {}
}

/// Observer that reports every hook through `tracing`
#[derive(Debug, Clone)]
pub struct TracingObserver {
    label: String,
}

impl TracingObserver {
    /// `label` names the resource kind in log lines (e.g. "Font")
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into() }
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new("Resource")
    }
}

impl LoadObserver for TracingObserver {
    fn on_start(&self, index: usize, source: &SourceId) {
        debug!(index = index + 1, source = %source, "{} loading started", self.label);
    }

    fn on_progress(&self, source: &SourceId, progress: Progress) {
        trace!(
            source = %source,
            loaded = progress.loaded,
            total = ?progress.total,
            "{} loading progressing",
            self.label
        );
    }

    fn on_error(&self, index: usize, source: &SourceId, error: &AcquisitionError) {
        warn!(source = %source, error = %error, "{} source {} failed", self.label, index + 1);
    }

    fn on_load(&self, index: usize, source: &SourceId) {
        info!(index = index + 1, source = %source, "{} loaded successfully", self.label);
    }

    fn on_exhausted(&self, attempts: usize) {
        warn!(
            attempts = attempts,
            "All {} sources failed, using fallback",
            self.label.to_lowercase()
        );
    }
}

/// Result of one attempt against one candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Loaded,
    Failed(AcquisitionError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptRecord {
    pub source: SourceId,
    pub outcome: AttemptOutcome,
}

/// What happened during a call to [`FallbackLoader::load`]
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub attempts: Vec<AttemptRecord>,
    pub state: RequestState,
}

impl LoadReport {
    /// Sources in the order they were tried
    pub fn attempted_sources(&self) -> Vec<&SourceId> {
        self.attempts.iter().map(|a| &a.source).collect()
    }

    pub fn succeeded(&self) -> bool {
        self.state == RequestState::Succeeded
    }
}

/// Drives a [`ResourceRequest`] to a terminal state
pub struct FallbackLoader<A, O = TracingObserver> {
    acquirer: A,
    observer: O,
}

impl<A: Acquire> FallbackLoader<A> {
    pub fn new(acquirer: A) -> Self {
        Self {
            acquirer,
            observer: TracingObserver::default(),
        }
    }
}

impl<A: Acquire, O: LoadObserver> FallbackLoader<A, O> {
    pub fn with_observer(acquirer: A, observer: O) -> Self {
        Self { acquirer, observer }
    }

    pub fn acquirer(&self) -> &A {
        &self.acquirer
    }

    /// Load one resource from `candidates`, in order.
    ///
    /// Exactly one of `on_success` / `on_exhausted` runs, exactly once. An
    /// empty candidate list goes straight to `on_exhausted` without any
    /// attempt.
    pub async fn load<S, E>(&self, candidates: Vec<SourceId>, on_success: S, on_exhausted: E) -> LoadReport
    where
        S: FnOnce(A::Resource),
        E: FnOnce(),
    {
        let mut request = ResourceRequest::new(candidates);
        let mut attempts = Vec::with_capacity(request.remaining());

        if request.exhaust_if_empty() {
            debug!("No candidate sources, using fallback");
            self.observer.on_exhausted(0);
            on_exhausted();
            return LoadReport {
                attempts,
                state: request.state(),
            };
        }

        while let Some(source) = request.current().cloned() {
            let index = request.cursor();
            self.observer.on_start(index, &source);

            match self.attempt(&source).await {
                Ok(resource) => {
                    // current() only yields while pending
                    let recorded = request.record_success();
                    debug_assert!(recorded.is_ok(), "success recorded on a terminal request");
                    self.observer.on_load(index, &source);
                    attempts.push(AttemptRecord {
                        source,
                        outcome: AttemptOutcome::Loaded,
                    });
                    on_success(resource);
                    return LoadReport {
                        attempts,
                        state: request.state(),
                    };
                }
                Err(error) => {
                    self.observer.on_error(index, &source, &error);
                    // current() only yields while pending
                    let recorded = request.record_failure();
                    debug_assert!(recorded.is_ok(), "failure recorded on a terminal request");
                    attempts.push(AttemptRecord {
                        source,
                        outcome: AttemptOutcome::Failed(error),
                    });
                }
            }
        }

        self.observer.on_exhausted(attempts.len());
        on_exhausted();
        LoadReport {
            attempts,
            state: request.state(),
        }
    }

    /// Run [`load`](Self::load) on the tokio runtime without blocking the caller
    pub fn spawn_load<S, E>(
        self: &Arc<Self>,
        candidates: Vec<SourceId>,
        on_success: S,
        on_exhausted: E,
    ) -> JoinHandle<LoadReport>
    where
        A: 'static,
        O: 'static,
        S: FnOnce(A::Resource) + Send + 'static,
        E: FnOnce() + Send + 'static,
    {
        let loader = Arc::clone(self);
        tokio::spawn(async move { loader.load(candidates, on_success, on_exhausted).await })
    }

    /// Wait for a single acquisition to report a terminal outcome
    async fn attempt(&self, source: &SourceId) -> Result<A::Resource, AcquisitionError> {
        let mut events = self.acquirer.acquire(source);
        while let Some(event) = events.recv().await {
            match event {
                AcquireEvent::Progress(progress) => self.observer.on_progress(source, progress),
                AcquireEvent::Loaded(resource) => return Ok(resource),
                AcquireEvent::Failed(error) => return Err(error),
            }
        }
        Err(AcquisitionError::Abandoned)
    }
}
