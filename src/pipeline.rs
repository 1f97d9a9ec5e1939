//! Debounced commit pipeline.
//!
//! Connects one upstream [`Signal`] of raw user input to one durable
//! [`SettingStore`]:
//!
//! ```text
//!   Signal<R> --seed discarded--> Idle <--------------------------+
//!                                  |  emission                     |
//!                                  v                               |
//!                               Pending --emission--> Pending      |
//!                                  |   (replace value, reset timer) |
//!                                  | quiet window elapsed          |
//!                                  v                               |
//!                     validate -> compare -> write (or no-op) -----+
//! ```
//!
//! - When the signal replays a current value on subscribe, that seed is
//!   never committed. Signals without one (`Signal::empty` before its first
//!   `set`, `Signal::trigger`) have no seed: every emission is an edit.
//! - There is a single timer. A newer edit replaces the pending one and
//!   restarts it, so only the last edit of a burst settles.
//! - Invalid values are dropped silently.
//! - A settled value equal to the stored value is not written.
//! - The pipeline runs on its own tokio task and the store write happens on
//!   the blocking pool, so producers never wait on persistence.
//! - Disposing the [`PipelineHandle`] (or dropping it) abandons any pending
//!   edit. Nothing is written after disposal.
//! - A failed write ends the pipeline; the error is returned from
//!   [`PipelineHandle::join`]. There is no retry.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{CoordinatorError, Result};
use crate::settings::SettingStore;
use crate::signal::{Signal, Subscription};

/// Default debounce quiet window.
pub const DEFAULT_QUIET_WINDOW: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Time without new edits after which the last edit settles
    pub quiet_window: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            quiet_window: DEFAULT_QUIET_WINDOW,
        }
    }
}

/// An edit waiting for the quiet window to elapse.
#[derive(Debug, Clone)]
pub struct PendingEdit<R> {
    pub value: R,
    /// Sequence number of the emission that produced this edit
    pub sequence: u64,
    pub arrived_at: Instant,
}

/// What happened to a settled edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitOutcome {
    /// Written to the store
    Committed,
    /// Equal to the stored value, nothing written
    Unchanged,
    /// Failed validation, nothing written
    Rejected,
}

/// Counters for one pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineCounters {
    /// Emissions after the seed
    pub edits: u64,
    /// Edits replaced before settling
    pub superseded: u64,
    pub committed: u64,
    pub unchanged: u64,
    pub rejected: u64,
}

#[derive(Debug, Default)]
struct PipelineStats {
    edits: AtomicU64,
    superseded: AtomicU64,
    committed: AtomicU64,
    unchanged: AtomicU64,
    rejected: AtomicU64,
}

impl PipelineStats {
    fn record(&self, outcome: CommitOutcome) {
        let counter = match outcome {
            CommitOutcome::Committed => &self.committed,
            CommitOutcome::Unchanged => &self.unchanged,
            CommitOutcome::Rejected => &self.rejected,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> PipelineCounters {
        PipelineCounters {
            edits: self.edits.load(Ordering::Relaxed),
            superseded: self.superseded.load(Ordering::Relaxed),
            committed: self.committed.load(Ordering::Relaxed),
            unchanged: self.unchanged.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }
}

type Validator<R, V> = Arc<dyn Fn(&R) -> Option<V> + Send + Sync>;

/// Builder for a debounced commit pipeline from raw `R` to stored `V`.
pub struct CommitPipeline<R, V> {
    name: String,
    store: Arc<dyn SettingStore<V>>,
    validate: Validator<R, V>,
    config: PipelineConfig,
}

impl<R, V> CommitPipeline<R, V>
where
    R: Clone + Send + Sync + std::fmt::Debug + 'static,
    V: PartialEq + Send + std::fmt::Debug + 'static,
{
    pub fn new(
        name: impl Into<String>,
        store: Arc<dyn SettingStore<V>>,
        validate: impl Fn(&R) -> Option<V> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            store,
            validate: Arc::new(validate),
            config: PipelineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_quiet_window(mut self, quiet_window: Duration) -> Self {
        self.config.quiet_window = quiet_window;
        self
    }

    /// Subscribe to `signal` and start the pipeline task.
    ///
    /// The subscription is taken before returning, so the signal's current
    /// value at this moment, if it replays one, is the seed. Must be called
    /// within a tokio runtime.
    pub fn observe(self, signal: &Signal<R>) -> PipelineHandle {
        let subscription = signal.subscribe();
        let cancel = CancellationToken::new();
        let stats = Arc::new(PipelineStats::default());
        let outcomes = Signal::trigger();
        let name = self.name.clone();

        let task = {
            let cancel = cancel.clone();
            let stats = stats.clone();
            let outcomes = outcomes.clone();
            tokio::spawn(async move { self.run(subscription, cancel, stats, outcomes).await })
        };

        PipelineHandle {
            name,
            cancel,
            task: Some(task),
            stats,
            outcomes,
        }
    }

    async fn run(
        self,
        mut subscription: Subscription<R>,
        cancel: CancellationToken,
        stats: Arc<PipelineStats>,
        outcomes: Signal<CommitOutcome>,
    ) -> Result<PipelineCounters> {
        tracing::debug!(pipeline = %self.name, "Commit pipeline started");

        let mut seeded = !subscription.replayed();
        let mut upstream_open = true;
        let mut pending: Option<PendingEdit<R>> = None;
        let timer = tokio::time::sleep(self.config.quiet_window);
        tokio::pin!(timer);

        loop {
            if !upstream_open && pending.is_none() {
                break;
            }

            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    if let Some(edit) = pending.take() {
                        tracing::debug!(
                            pipeline = %self.name,
                            sequence = edit.sequence,
                            "Disposed with a pending edit, discarding it"
                        );
                    }
                    break;
                }

                emission = subscription.next(), if upstream_open => match emission {
                    Some(emission) if !seeded => {
                        seeded = true;
                        tracing::trace!(
                            pipeline = %self.name,
                            seed = ?emission.value,
                            "Seed value skipped"
                        );
                    }
                    Some(emission) => {
                        stats.edits.fetch_add(1, Ordering::Relaxed);
                        let now = Instant::now();
                        let edit = PendingEdit {
                            value: emission.value,
                            sequence: emission.sequence,
                            arrived_at: now,
                        };
                        if pending.replace(edit).is_some() {
                            stats.superseded.fetch_add(1, Ordering::Relaxed);
                        }
                        timer.as_mut().reset(now + self.config.quiet_window);
                    }
                    None => {
                        // Upstream gone; let a pending edit settle normally.
                        upstream_open = false;
                    }
                },

                () = &mut timer, if pending.is_some() => {
                    if let Some(edit) = pending.take() {
                        let outcome = match self.settle(edit).await {
                            Ok(outcome) => outcome,
                            Err(e) => {
                                tracing::error!(pipeline = %self.name, "Commit failed: {}", e);
                                return Err(e);
                            }
                        };
                        stats.record(outcome);
                        outcomes.fire(outcome);
                    }
                }
            }
        }

        tracing::debug!(pipeline = %self.name, "Commit pipeline stopped");
        Ok(stats.snapshot())
    }

    async fn settle(&self, edit: PendingEdit<R>) -> Result<CommitOutcome> {
        let Some(value) = (self.validate)(&edit.value) else {
            tracing::debug!(
                pipeline = %self.name,
                value = ?edit.value,
                "Settled value failed validation, dropping it"
            );
            return Ok(CommitOutcome::Rejected);
        };

        let store = Arc::clone(&self.store);
        let name = self.name.clone();
        tokio::task::spawn_blocking(move || {
            if store.read() == value {
                tracing::debug!(pipeline = %name, "Settled value unchanged, skipping write");
                return Ok(CommitOutcome::Unchanged);
            }
            tracing::info!(pipeline = %name, value = ?value, "Committing setting");
            store.write(value)?;
            Ok(CommitOutcome::Committed)
        })
        .await
        .map_err(|e| CoordinatorError::Internal(format!("commit task failed: {}", e)))?
    }
}

/// Owner of a running pipeline. Dropping it disposes the pipeline.
pub struct PipelineHandle {
    name: String,
    cancel: CancellationToken,
    task: Option<JoinHandle<Result<PipelineCounters>>>,
    stats: Arc<PipelineStats>,
    outcomes: Signal<CommitOutcome>,
}

impl PipelineHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn counters(&self) -> PipelineCounters {
        self.stats.snapshot()
    }

    /// Outcomes of edits settled from now on.
    pub fn outcomes(&self) -> Subscription<CommitOutcome> {
        self.outcomes.subscribe()
    }

    /// Stop the pipeline. A pending edit is discarded.
    pub fn dispose(&self) {
        if !self.cancel.is_cancelled() {
            tracing::debug!(pipeline = %self.name, "Disposing commit pipeline");
            self.cancel.cancel();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Wait for the pipeline task to finish.
    ///
    /// Returns once the pipeline was disposed or its upstream signal was
    /// dropped, with the final counters, or the persistence error that
    /// stopped it.
    pub async fn join(mut self) -> Result<PipelineCounters> {
        match self.task.take() {
            Some(task) => task
                .await
                .map_err(|e| CoordinatorError::Internal(format!("pipeline task failed: {}", e)))?,
            None => Ok(self.stats.snapshot()),
        }
    }
}

impl Drop for PipelineHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for PipelineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineHandle")
            .field("name", &self.name)
            .field("is_disposed", &self.cancel.is_cancelled())
            .field("counters", &self.stats.snapshot())
            .finish_non_exhaustive()
    }
}
