//! # Resource Cache
//!
//! Freshness bookkeeping for the most recent collection of one resource.
//!
//! ## Timeline
//! ```text
//!  fetched_at          + stale_after            + evict_after
//!      │─────── Fresh ──────│──────── Stale ────────│──── Expired ────►
//!      │  served, no refetch │ served, refetch due  │ records dropped
//! ```
//!
//! The cache never reads a clock; callers pass `now`.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};

// =============================================================================
// Policy
// =============================================================================

/// Freshness and eviction windows for one cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    stale_after: Duration,
    evict_after: Duration,
}

impl CachePolicy {
    /// Five minutes fresh, ten minutes retained.
    pub const DEFAULT: CachePolicy = CachePolicy {
        stale_after: Duration::from_secs(5 * 60),
        evict_after: Duration::from_secs(10 * 60),
    };

    pub fn new(stale_after: Duration, evict_after: Duration) -> CoreResult<Self> {
        if stale_after.is_zero() {
            return Err(CoreError::InvalidPolicy(
                "stale_after must be greater than zero".into(),
            ));
        }
        if evict_after < stale_after {
            return Err(CoreError::InvalidPolicy(format!(
                "evict_after ({}s) must not be shorter than stale_after ({}s)",
                evict_after.as_secs(),
                stale_after.as_secs()
            )));
        }
        Ok(Self {
            stale_after,
            evict_after,
        })
    }

    pub fn stale_after(&self) -> Duration {
        self.stale_after
    }

    pub fn evict_after(&self) -> Duration {
        self.evict_after
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// =============================================================================
// Freshness
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Freshness {
    /// Never populated, or cleared.
    Empty,
    Fresh,
    /// Usable, but a refetch is due.
    Stale,
    /// Past the eviction window; records must not be served.
    Expired,
}

impl Freshness {
    /// Records may be shown.
    pub fn is_usable(self) -> bool {
        matches!(self, Self::Fresh | Self::Stale)
    }

    /// A load should fetch this resource.
    pub fn needs_fetch(self) -> bool {
        !matches!(self, Self::Fresh)
    }
}

// =============================================================================
// Cache
// =============================================================================

/// Latest collection of one resource kind.
#[derive(Debug, Clone)]
pub struct ResourceCache<T> {
    records: Option<Arc<Vec<T>>>,
    fetched_at: Option<DateTime<Utc>>,
    policy: CachePolicy,
}

impl<T> ResourceCache<T> {
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            records: None,
            fetched_at: None,
            policy,
        }
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    pub fn freshness(&self, now: DateTime<Utc>) -> Freshness {
        let (Some(_), Some(fetched_at)) = (&self.records, self.fetched_at) else {
            return Freshness::Empty;
        };
        // A clock that stepped backwards counts as no time elapsed.
        let elapsed = (now - fetched_at).to_std().unwrap_or(Duration::ZERO);

        if elapsed < self.policy.stale_after {
            Freshness::Fresh
        } else if elapsed < self.policy.evict_after {
            Freshness::Stale
        } else {
            Freshness::Expired
        }
    }

    /// Replaces the collection and restarts both windows.
    pub fn populate(&mut self, records: Vec<T>, now: DateTime<Utc>) {
        self.records = Some(Arc::new(records));
        self.fetched_at = Some(now);
    }

    pub fn clear(&mut self) {
        self.records = None;
        self.fetched_at = None;
    }

    /// Drops the records once past the eviction window. Returns true if
    /// anything was dropped.
    pub fn evict_expired(&mut self, now: DateTime<Utc>) -> bool {
        if self.freshness(now) == Freshness::Expired {
            self.clear();
            true
        } else {
            false
        }
    }

    /// Snapshot of the records while fresh or stale.
    pub fn records_at(&self, now: DateTime<Utc>) -> Option<Arc<Vec<T>>> {
        if self.freshness(now).is_usable() {
            self.records.clone()
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.records.as_ref().map_or(0, |r| r.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for ResourceCache<T> {
    fn default() -> Self {
        Self::new(CachePolicy::DEFAULT)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
    }

    fn minutes(m: i64) -> chrono::Duration {
        chrono::Duration::minutes(m)
    }

    #[test]
    fn test_policy_rejects_evict_before_stale() {
        let err = CachePolicy::new(Duration::from_secs(600), Duration::from_secs(300));
        assert!(matches!(err, Err(CoreError::InvalidPolicy(_))));

        assert!(CachePolicy::new(Duration::ZERO, Duration::from_secs(1)).is_err());
        assert!(CachePolicy::new(Duration::from_secs(60), Duration::from_secs(60)).is_ok());
    }

    #[test]
    fn test_freshness_windows() {
        let t0 = start();
        let mut cache = ResourceCache::default();
        assert_eq!(cache.freshness(t0), Freshness::Empty);

        cache.populate(vec![1, 2, 3], t0);

        assert_eq!(cache.freshness(t0 + minutes(4)), Freshness::Fresh);
        assert_eq!(cache.freshness(t0 + minutes(5)), Freshness::Stale);
        assert_eq!(cache.freshness(t0 + minutes(9)), Freshness::Stale);
        assert_eq!(cache.freshness(t0 + minutes(10)), Freshness::Expired);
    }

    #[test]
    fn test_stale_records_are_still_served() {
        let t0 = start();
        let mut cache = ResourceCache::default();
        cache.populate(vec!["a"], t0);

        assert_eq!(cache.records_at(t0 + minutes(7)).unwrap().as_slice(), &["a"]);
        assert!(cache.records_at(t0 + minutes(11)).is_none());
    }

    #[test]
    fn test_refresh_restarts_windows() {
        let t0 = start();
        let mut cache = ResourceCache::default();
        cache.populate(vec![1], t0);
        cache.populate(vec![1, 2], t0 + minutes(8));

        assert_eq!(cache.freshness(t0 + minutes(12)), Freshness::Fresh);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_evict_expired_drops_records() {
        let t0 = start();
        let mut cache = ResourceCache::default();
        cache.populate(vec![1], t0);

        assert!(!cache.evict_expired(t0 + minutes(6)));
        assert!(cache.evict_expired(t0 + minutes(10)));
        assert!(cache.is_empty());
        assert_eq!(cache.freshness(t0 + minutes(10)), Freshness::Empty);
    }

    #[test]
    fn test_backwards_clock_counts_as_fresh() {
        let t0 = start();
        let mut cache = ResourceCache::default();
        cache.populate(vec![1], t0);
        assert_eq!(cache.freshness(t0 - minutes(30)), Freshness::Fresh);
    }

    #[test]
    fn test_empty_collection_is_still_populated() {
        let t0 = start();
        let mut cache: ResourceCache<u8> = ResourceCache::default();
        cache.populate(Vec::new(), t0);

        assert_eq!(cache.freshness(t0), Freshness::Fresh);
        assert!(cache.records_at(t0).unwrap().is_empty());
    }
}
