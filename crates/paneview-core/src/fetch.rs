//! # Fetch State
//!
//! Per-resource attempt tracking and the aggregate the dashboard renders.
//!
//! ## State Machine
//! ```text
//!              begin()                 record_failure(retryable, budget left)
//!   Pending ────────────► (in flight) ──────────────────────► FailedRetrying
//!      │                     │   │                                 │
//!      │ fail_immediately()  │   │ record_success()        begin() │
//!      ▼                     │   └──────────► Success ◄────────────┘
//!   FailedTerminal ◄─────────┘
//!          record_failure(non-retryable or budget spent)
//! ```
//!
//! `FailedTerminal` and `Success` are settled: nothing moves them again
//! within the same run.

use std::collections::BTreeMap;

use serde::Serialize;
use ts_rs::TS;

use crate::error::FetchError;
use crate::types::ResourceKind;

// =============================================================================
// Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum FetchStatus {
    Pending,
    Success,
    FailedRetrying,
    FailedTerminal,
}

impl FetchStatus {
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Success | Self::FailedTerminal)
    }
}

/// What the caller should do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    Retry,
    Terminal,
}

// =============================================================================
// Attempt
// =============================================================================

/// Attempts made for one resource during one orchestration run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchAttempt {
    kind: ResourceKind,
    attempt_count: u32,
    max_attempts: u32,
    last_error: Option<FetchError>,
    status: FetchStatus,
}

impl FetchAttempt {
    /// `max_attempts` counts the first request; it is raised to at least 1.
    pub fn new(kind: ResourceKind, max_attempts: u32) -> Self {
        Self {
            kind,
            attempt_count: 0,
            max_attempts: max_attempts.max(1),
            last_error: None,
            status: FetchStatus::Pending,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn status(&self) -> FetchStatus {
        self.status
    }

    pub fn last_error(&self) -> Option<&FetchError> {
        self.last_error.as_ref()
    }

    pub fn is_settled(&self) -> bool {
        self.status.is_settled()
    }

    /// Registers a new request. Returns false when the attempt is settled or
    /// the budget is spent, in which case no request may be sent.
    pub fn begin(&mut self) -> bool {
        if self.is_settled() || self.attempt_count >= self.max_attempts {
            return false;
        }
        self.attempt_count += 1;
        true
    }

    /// Marks the resource loaded. Ignored once settled.
    pub fn record_success(&mut self) -> bool {
        if self.is_settled() {
            return false;
        }
        self.status = FetchStatus::Success;
        true
    }

    /// Settles as success without a request (cache still fresh).
    pub fn record_cached(&mut self) -> bool {
        self.record_success()
    }

    /// Records a failed request and decides whether another is allowed.
    pub fn record_failure(&mut self, error: FetchError) -> FailureOutcome {
        if self.is_settled() {
            return FailureOutcome::Terminal;
        }

        if error.is_retryable() && self.attempt_count < self.max_attempts {
            self.last_error = Some(error);
            self.status = FetchStatus::FailedRetrying;
            return FailureOutcome::Retry;
        }

        let final_error = if error.is_retryable() {
            FetchError::Terminal {
                attempts: self.attempt_count,
                last_error: Box::new(error),
            }
        } else {
            error
        };
        self.last_error = Some(final_error);
        self.status = FetchStatus::FailedTerminal;
        FailureOutcome::Terminal
    }

    /// Settles as failed without sending anything.
    pub fn fail_immediately(&mut self, error: FetchError) {
        if self.is_settled() {
            return;
        }
        self.last_error = Some(error);
        self.status = FetchStatus::FailedTerminal;
    }

    /// The error to show for a terminally failed resource.
    pub fn terminal_error(&self) -> Option<&FetchError> {
        match self.status {
            FetchStatus::FailedTerminal => self.last_error.as_ref(),
            _ => None,
        }
    }
}

// =============================================================================
// Aggregate
// =============================================================================

/// One failed resource in the aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceFailure {
    pub kind: ResourceKind,
    pub error: FetchError,
}

/// Latest attempt per resource, reduced into loading/error flags.
///
/// Order of updates never matters: the flags are recomputed from the
/// current state of every tracked resource.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateState {
    attempts: BTreeMap<ResourceKind, FetchAttempt>,
}

impl AggregateState {
    /// Every kind pending with the given budget.
    pub fn pending(kinds: impl IntoIterator<Item = ResourceKind>, max_attempts: u32) -> Self {
        Self::from_attempts(kinds.into_iter().map(|k| FetchAttempt::new(k, max_attempts)))
    }

    pub fn from_attempts(attempts: impl IntoIterator<Item = FetchAttempt>) -> Self {
        Self {
            attempts: attempts.into_iter().map(|a| (a.kind, a)).collect(),
        }
    }

    /// Replaces the tracked state of one resource.
    pub fn update(&mut self, attempt: FetchAttempt) {
        self.attempts.insert(attempt.kind, attempt);
    }

    pub fn attempt(&self, kind: ResourceKind) -> Option<&FetchAttempt> {
        self.attempts.get(&kind)
    }

    pub fn attempts(&self) -> impl Iterator<Item = &FetchAttempt> {
        self.attempts.values()
    }

    /// Any resource still in flight or waiting to retry.
    pub fn is_loading(&self) -> bool {
        self.attempts.values().any(|a| !a.is_settled())
    }

    /// Any resource failed terminally.
    pub fn is_error(&self) -> bool {
        self.attempts
            .values()
            .any(|a| a.status == FetchStatus::FailedTerminal)
    }

    /// Every resource loaded.
    pub fn is_ready(&self) -> bool {
        !self.attempts.is_empty()
            && self
                .attempts
                .values()
                .all(|a| a.status == FetchStatus::Success)
    }

    /// One entry per terminally failed resource.
    pub fn errors(&self) -> Vec<ResourceFailure> {
        self.attempts
            .values()
            .filter_map(|a| {
                a.terminal_error().map(|error| ResourceFailure {
                    kind: a.kind,
                    error: error.clone(),
                })
            })
            .collect()
    }

    pub fn summary(&self) -> LoadSummary {
        LoadSummary {
            is_loading: self.is_loading(),
            is_error: self.is_error(),
            errors: self.errors(),
        }
    }
}

/// Serializable snapshot for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadSummary {
    pub is_loading: bool,
    pub is_error: bool,
    pub errors: Vec<ResourceFailure>,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fail_fail_succeed() {
        let mut attempt = FetchAttempt::new(ResourceKind::Customers, 3);

        assert!(attempt.begin());
        assert_eq!(attempt.record_failure(FetchError::http_status(500)), FailureOutcome::Retry);
        assert_eq!(attempt.status(), FetchStatus::FailedRetrying);

        assert!(attempt.begin());
        assert_eq!(attempt.record_failure(FetchError::network("reset")), FailureOutcome::Retry);

        assert!(attempt.begin());
        assert!(attempt.record_success());

        assert_eq!(attempt.status(), FetchStatus::Success);
        assert_eq!(attempt.attempt_count(), 3);
        assert_eq!(attempt.terminal_error(), None);
    }

    #[test]
    fn test_budget_exhaustion_is_terminal() {
        let mut attempt = FetchAttempt::new(ResourceKind::Products, 3);

        for _ in 0..2 {
            assert!(attempt.begin());
            assert_eq!(attempt.record_failure(FetchError::http_status(503)), FailureOutcome::Retry);
        }
        assert!(attempt.begin());
        assert_eq!(attempt.record_failure(FetchError::http_status(503)), FailureOutcome::Terminal);

        assert_eq!(attempt.status(), FetchStatus::FailedTerminal);
        assert!(!attempt.begin());
        assert_eq!(attempt.attempt_count(), 3);
        assert!(matches!(
            attempt.terminal_error(),
            Some(FetchError::Terminal { attempts: 3, .. })
        ));
    }

    #[test]
    fn test_terminal_is_irreversible() {
        let mut attempt = FetchAttempt::new(ResourceKind::Quotes, 1);
        attempt.begin();
        attempt.record_failure(FetchError::network("down"));

        assert!(!attempt.record_success());
        assert_eq!(attempt.status(), FetchStatus::FailedTerminal);
    }

    #[test]
    fn test_non_retryable_error_settles_immediately() {
        let mut attempt = FetchAttempt::new(ResourceKind::Quotes, 3);
        attempt.begin();
        let outcome = attempt.record_failure(FetchError::InvalidEnvelope(
            crate::error::EnvelopeError::NotAnObject,
        ));

        assert_eq!(outcome, FailureOutcome::Terminal);
        assert_eq!(attempt.attempt_count(), 1);
        assert!(matches!(attempt.terminal_error(), Some(FetchError::InvalidEnvelope(_))));
    }

    #[test]
    fn test_credential_missing_never_counts_an_attempt() {
        let mut attempt = FetchAttempt::new(ResourceKind::Customers, 3);
        attempt.fail_immediately(FetchError::CredentialMissing);

        assert_eq!(attempt.attempt_count(), 0);
        assert_eq!(attempt.terminal_error(), Some(&FetchError::CredentialMissing));
        assert!(!attempt.begin());
    }

    #[test]
    fn test_aggregate_flags() {
        let mut state = AggregateState::pending(ResourceKind::ALL, 3);
        assert!(state.is_loading());
        assert!(!state.is_error());

        let mut customers = FetchAttempt::new(ResourceKind::Customers, 3);
        customers.begin();
        customers.record_success();
        state.update(customers);

        let mut products = FetchAttempt::new(ResourceKind::Products, 1);
        products.begin();
        products.record_failure(FetchError::http_status(500));
        state.update(products);

        assert!(state.is_loading(), "quotes still pending");
        assert!(state.is_error());

        let mut quotes = FetchAttempt::new(ResourceKind::Quotes, 3);
        quotes.begin();
        quotes.record_success();
        state.update(quotes);

        assert!(!state.is_loading());
        assert!(!state.is_ready());
        let errors = state.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ResourceKind::Products);
    }

    #[test]
    fn test_aggregate_is_order_independent() {
        let mut ok = FetchAttempt::new(ResourceKind::Customers, 3);
        ok.begin();
        ok.record_success();
        let mut failed = FetchAttempt::new(ResourceKind::Quotes, 1);
        failed.fail_immediately(FetchError::CredentialMissing);

        let a = AggregateState::from_attempts([ok.clone(), failed.clone()]);
        let b = AggregateState::from_attempts([failed, ok]);

        assert_eq!(a, b);
        assert_eq!(a.summary(), b.summary());
    }

    #[test]
    fn test_summary_serializes_camel_case() {
        let mut failed = FetchAttempt::new(ResourceKind::Quotes, 1);
        failed.fail_immediately(FetchError::CredentialMissing);
        let summary = AggregateState::from_attempts([failed]).summary();

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["isLoading"], false);
        assert_eq!(json["isError"], true);
        assert_eq!(json["errors"][0]["kind"], "quotes");
    }
}
