//! # Fetch Orchestrator
//!
//! Loads every tracked resource for a session, concurrently, each with its
//! own retry budget.
//!
//! ## One Orchestration Run
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  session.credential_at(now) ── None ──► every kind: CredentialMissing   │
//! │            │                                                            │
//! │            ▼ Some(credential)                                           │
//! │  tokio::join! ─┬─ customers ─► attempt ✗ 1s ─► attempt ✗ 2s ─► ...      │
//! │                ├─ products  ─► attempt ─✓─► cache.apply(generation)     │
//! │                └─ quotes    ─► attempt ─✓─► cache.apply(generation)     │
//! │                                                                         │
//! │  each change ──► watch::Sender<AggregateState> ──► LoadHandle / UI      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Retry Policy
//! - Only [`FetchError::Transient`] is retried
//! - Up to `max_retries` extra attempts (default 2, so 3 requests total)
//! - Delays from [`backoff::ExponentialBackoff`]: 1s, 2s, 4s ... capped at
//!   30s, no jitter
//! - Attempts for one resource are strictly sequential
//!
//! ## Teardown
//! [`LoadHandle::teardown`] races every in-flight request and backoff sleep;
//! a torn-down resource never writes to its cache.
//!
//! ## Stale Sessions
//! Cache generations are read when a run starts (before the task is
//! spawned for [`FetchOrchestrator::spawn_load`]), so a logout at any later
//! point discards the run's results. With a [`SessionGate`] installed, a
//! session that is no longer the active one gets no requests and writes
//! nothing.

use std::future;
use std::sync::Arc;
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use paneview_core::{
    decode_envelope, AggregateState, Customer, FailureOutcome, FetchAttempt, FetchError, Product,
    Quote, ResourceKind, Session, DEFAULT_MAX_RETRIES,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::api::ResourceApi;
use crate::caches::{CacheRegistry, Cached, Generations};
use crate::clock::Clock;

// =============================================================================
// Retry Policy
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first failure.
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Requests allowed per resource per run, the first one included.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            current_interval: self.initial_backoff,
            initial_interval: self.initial_backoff,
            randomization_factor: 0.0,
            multiplier: 2.0,
            max_interval: self.max_backoff,
            max_elapsed_time: None,
            ..Default::default()
        }
    }

    /// The delays a resource waits through before giving up.
    #[cfg(test)]
    fn delays(&self) -> Vec<Duration> {
        let mut backoff = self.backoff();
        (0..self.max_retries)
            .map(|_| backoff.next_backoff().unwrap_or(self.max_backoff))
            .collect()
    }
}

// =============================================================================
// Session Gate
// =============================================================================

/// Answers whether a session handed to the orchestrator is still the one
/// in force.
pub trait SessionGate: Send + Sync {
    fn is_current(&self, session: &Session) -> bool;
}

// =============================================================================
// Orchestrator
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadMode {
    /// Fetch every resource.
    Full,
    /// Skip resources whose cache is still fresh.
    StaleOnly,
}

pub struct FetchOrchestrator {
    api: Arc<dyn ResourceApi>,
    caches: Arc<CacheRegistry>,
    clock: Arc<dyn Clock>,
    retry: RetryPolicy,
    gate: Option<Arc<dyn SessionGate>>,
}

impl FetchOrchestrator {
    pub fn new(
        api: Arc<dyn ResourceApi>,
        caches: Arc<CacheRegistry>,
        clock: Arc<dyn Clock>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            api,
            caches,
            clock,
            retry,
            gate: None,
        }
    }

    /// Refuses to load for, or apply results of, sessions `gate` no longer
    /// considers current.
    pub fn with_session_gate(mut self, gate: Arc<dyn SessionGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn caches(&self) -> &Arc<CacheRegistry> {
        &self.caches
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Fetches every resource and waits for all of them to settle.
    pub async fn load_all(&self, session: &Session) -> AggregateState {
        let generations = self.caches.generations();
        let (progress, _) = watch::channel(AggregateState::default());
        self.run(session, LoadMode::Full, generations, never_cancelled(), &progress)
            .await
    }

    /// Like [`load_all`](Self::load_all), but resources with a fresh cache
    /// settle as loaded without a request.
    pub async fn refresh_stale(&self, session: &Session) -> AggregateState {
        let generations = self.caches.generations();
        let (progress, _) = watch::channel(AggregateState::default());
        self.run(session, LoadMode::StaleOnly, generations, never_cancelled(), &progress)
            .await
    }

    /// Runs [`load_all`](Self::load_all) on a background task.
    pub fn spawn_load(self: &Arc<Self>, session: Session) -> LoadHandle {
        self.spawn(session, LoadMode::Full)
    }

    /// Runs [`refresh_stale`](Self::refresh_stale) on a background task.
    pub fn spawn_refresh(self: &Arc<Self>, session: Session) -> LoadHandle {
        self.spawn(session, LoadMode::StaleOnly)
    }

    fn spawn(self: &Arc<Self>, session: Session, mode: LoadMode) -> LoadHandle {
        let initial = AggregateState::pending(ResourceKind::ALL, self.retry.max_attempts());
        let (progress_tx, progress_rx) = watch::channel(initial);
        let (cancel_tx, cancel_rx) = watch::channel(false);

        // Read here, not in the task: a logout before its first poll must
        // still invalidate the run.
        let generations = self.caches.generations();

        let orchestrator = Arc::clone(self);
        let task = tokio::spawn(async move {
            orchestrator
                .run(&session, mode, generations, cancel_rx, &progress_tx)
                .await
        });

        LoadHandle {
            state: progress_rx,
            cancel: cancel_tx,
            task,
        }
    }

    async fn run(
        &self,
        session: &Session,
        mode: LoadMode,
        generations: Generations,
        cancel: watch::Receiver<bool>,
        progress: &watch::Sender<AggregateState>,
    ) -> AggregateState {
        let run_id = Uuid::new_v4();
        let span = info_span!("orchestration_run", %run_id, ?mode);

        async {
            let credential = if self.is_current(session) {
                session.credential_at(self.clock.now())
            } else {
                warn!("Session is no longer active, refusing to load");
                None
            };
            progress.send_replace(AggregateState::pending(
                ResourceKind::ALL,
                self.retry.max_attempts(),
            ));
            info!(authenticated = credential.is_some(), "Loading dashboard resources");

            let load = |generation| ResourceLoad {
                session,
                credential,
                generation,
                mode,
            };
            let (customers, products, quotes) = tokio::join!(
                self.load_resource::<Customer>(
                    load(generations.of(ResourceKind::Customers)),
                    cancel.clone(),
                    progress
                ),
                self.load_resource::<Product>(
                    load(generations.of(ResourceKind::Products)),
                    cancel.clone(),
                    progress
                ),
                self.load_resource::<Quote>(
                    load(generations.of(ResourceKind::Quotes)),
                    cancel.clone(),
                    progress
                ),
            );

            let state = AggregateState::from_attempts([customers, products, quotes]);
            if state.is_error() {
                warn!(failed = state.errors().len(), "Dashboard load finished with errors");
            } else {
                info!(loading = state.is_loading(), "Dashboard load finished");
            }
            state
        }
        .instrument(span)
        .await
    }

    fn is_current(&self, session: &Session) -> bool {
        self.gate.as_ref().map_or(true, |gate| gate.is_current(session))
    }

    async fn load_resource<T: Cached>(
        &self,
        load: ResourceLoad<'_>,
        mut cancel: watch::Receiver<bool>,
        progress: &watch::Sender<AggregateState>,
    ) -> FetchAttempt {
        let ResourceLoad {
            session,
            credential,
            generation,
            mode,
        } = load;
        let kind = T::KIND;
        let mut attempt = FetchAttempt::new(kind, self.retry.max_attempts());

        let Some(credential) = credential else {
            warn!(%kind, "No usable credential, skipping fetch");
            attempt.fail_immediately(FetchError::CredentialMissing);
            publish(progress, &attempt);
            return attempt;
        };

        let now = self.clock.now();
        self.caches.evict_expired::<T>(now);
        if mode == LoadMode::StaleOnly && !self.caches.freshness::<T>(now).needs_fetch() {
            debug!(%kind, "Cache still fresh, skipping fetch");
            attempt.record_cached();
            publish(progress, &attempt);
            return attempt;
        }

        let mut backoff = self.retry.backoff();

        while attempt.begin() {
            debug!(%kind, attempt = attempt.attempt_count(), "Fetching resource");

            let result = tokio::select! {
                biased;
                _ = cancelled(&mut cancel) => {
                    info!(%kind, "Load torn down, abandoning in-flight fetch");
                    return attempt;
                }
                result = self.fetch_once::<T>(credential) => result,
            };

            let err = match result {
                Ok(records) => {
                    let count = records.len();
                    if !self.is_current(session) {
                        info!(%kind, "Session ended while fetching, discarding result");
                    } else if self.caches.apply(generation, records, self.clock.now()) {
                        info!(%kind, count, attempts = attempt.attempt_count(), "Resource loaded");
                    } else {
                        info!(%kind, "Cache cleared while fetching, discarding result");
                    }
                    attempt.record_success();
                    publish(progress, &attempt);
                    return attempt;
                }
                Err(err) => err,
            };

            match attempt.record_failure(err) {
                FailureOutcome::Retry => {
                    let delay = backoff.next_backoff().unwrap_or(self.retry.max_backoff);
                    warn!(
                        %kind,
                        attempt = attempt.attempt_count(),
                        delay_ms = delay.as_millis() as u64,
                        error = ?attempt.last_error(),
                        "Fetch failed, retrying"
                    );
                    publish(progress, &attempt);

                    tokio::select! {
                        biased;
                        _ = cancelled(&mut cancel) => {
                            info!(%kind, "Load torn down during backoff");
                            return attempt;
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                FailureOutcome::Terminal => {
                    error!(
                        %kind,
                        attempts = attempt.attempt_count(),
                        error = ?attempt.terminal_error(),
                        "Fetch failed permanently"
                    );
                    publish(progress, &attempt);
                    return attempt;
                }
            }
        }

        attempt
    }

    async fn fetch_once<T: Cached>(&self, credential: &str) -> Result<Vec<T>, FetchError> {
        let body = self.api.fetch(T::KIND, credential).await?;
        let envelope = decode_envelope::<T>(&body)?;

        debug!(
            kind = %T::KIND,
            list_present = envelope.list_present,
            request_status = ?envelope.meta.request_status,
            transaction = ?envelope.meta.transaction,
            "Decoded envelope"
        );
        for rejected in &envelope.rejected {
            warn!(kind = %T::KIND, error = %rejected, "Dropping invalid record");
        }
        Ok(envelope.records)
    }
}

/// Inputs one resource's load shares with the rest of the run.
#[derive(Clone, Copy)]
struct ResourceLoad<'a> {
    session: &'a Session,
    credential: Option<&'a str>,
    /// Cache generation read when the run started.
    generation: u64,
    mode: LoadMode,
}

fn publish(progress: &watch::Sender<AggregateState>, attempt: &FetchAttempt) {
    progress.send_modify(|state| state.update(attempt.clone()));
}

/// A receiver whose sender is already gone: never fires.
fn never_cancelled() -> watch::Receiver<bool> {
    watch::channel(false).1
}

/// Resolves once teardown was requested.
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow_and_update() {
            return;
        }
        if cancel.changed().await.is_err() {
            future::pending::<()>().await;
        }
    }
}

// =============================================================================
// Load Handle
// =============================================================================

/// A load running on a background task.
pub struct LoadHandle {
    state: watch::Receiver<AggregateState>,
    cancel: watch::Sender<bool>,
    task: JoinHandle<AggregateState>,
}

impl LoadHandle {
    /// Latest aggregate state.
    pub fn state(&self) -> AggregateState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<AggregateState> {
        self.state.clone()
    }

    /// Stops every pending fetch and retry. Nothing is written to the
    /// caches afterwards.
    pub fn teardown(&self) {
        self.cancel.send_replace(true);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the run to end and returns its final state.
    pub async fn wait(self) -> AggregateState {
        let LoadHandle { state, task, .. } = self;
        match task.await {
            Ok(final_state) => final_state,
            Err(e) => {
                error!(error = %e, "Load task failed");
                let last = state.borrow().clone();
                last
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
