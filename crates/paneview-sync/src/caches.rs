//! # Cache Registry
//!
//! Exactly one [`ResourceCache`] per tracked resource kind, shared by the
//! whole process.
//!
//! ## Writers and Readers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   FetchOrchestrator ── apply(generation, records) ──┐                   │
//! │                     ── evict_expired()  ────────────┤                   │
//! │                                                     ▼                   │
//! │                              ┌────────────────────────────────────┐     │
//! │                              │ CacheSlot<Customer> { cache, gen } │     │
//! │                              │ CacheSlot<Product>  { cache, gen } │     │
//! │                              │ CacheSlot<Quote>    { cache, gen } │     │
//! │                              └────────────────────────────────────┘     │
//! │                                                     ▲                   │
//! │   SessionManager   ── clear_all() / invalidate() ───┘                   │
//! │                                                                         │
//! │   Views            ── records() / freshness()   (read only)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Clearing bumps the slot's generation. A fetch captures the generation
//! when it starts and its result is discarded if the generation moved, so
//! a logout during an in-flight request never repopulates the cache.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use paneview_core::{
    CachePolicy, Customer, Freshness, Product, Quote, Resource, ResourceCache, ResourceKind,
};
use tracing::debug;

#[derive(Debug)]
#[doc(hidden)]
pub struct CacheSlot<T> {
    cache: ResourceCache<T>,
    generation: u64,
}

impl<T> CacheSlot<T> {
    fn new(policy: CachePolicy) -> Self {
        Self {
            cache: ResourceCache::new(policy),
            generation: 0,
        }
    }

    fn clear(&mut self) {
        self.cache.clear();
        self.generation += 1;
    }
}

/// Every slot's generation, read at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Generations {
    customers: u64,
    products: u64,
    quotes: u64,
}

impl Generations {
    pub(crate) fn of(&self, kind: ResourceKind) -> u64 {
        match kind {
            ResourceKind::Customers => self.customers,
            ResourceKind::Products => self.products,
            ResourceKind::Quotes => self.quotes,
        }
    }
}

/// Resource types with a slot in the registry.
pub trait Cached: Resource {
    #[doc(hidden)]
    fn slot(registry: &CacheRegistry) -> &RwLock<CacheSlot<Self>>;
}

#[derive(Debug)]
pub struct CacheRegistry {
    customers: RwLock<CacheSlot<Customer>>,
    products: RwLock<CacheSlot<Product>>,
    quotes: RwLock<CacheSlot<Quote>>,
}

impl Cached for Customer {
    fn slot(registry: &CacheRegistry) -> &RwLock<CacheSlot<Self>> {
        &registry.customers
    }
}

impl Cached for Product {
    fn slot(registry: &CacheRegistry) -> &RwLock<CacheSlot<Self>> {
        &registry.products
    }
}

impl Cached for Quote {
    fn slot(registry: &CacheRegistry) -> &RwLock<CacheSlot<Self>> {
        &registry.quotes
    }
}

impl Default for CacheRegistry {
    fn default() -> Self {
        Self::with_policies(|_| CachePolicy::DEFAULT)
    }
}

impl CacheRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policies(policy: impl Fn(ResourceKind) -> CachePolicy) -> Self {
        Self {
            customers: RwLock::new(CacheSlot::new(policy(ResourceKind::Customers))),
            products: RwLock::new(CacheSlot::new(policy(ResourceKind::Products))),
            quotes: RwLock::new(CacheSlot::new(policy(ResourceKind::Quotes))),
        }
    }

    // =========================================================================
    // Readers
    // =========================================================================

    /// Records while fresh or stale; `None` when empty or expired.
    pub fn records<T: Cached>(&self, now: DateTime<Utc>) -> Option<Arc<Vec<T>>> {
        let slot = T::slot(self).read().unwrap_or_else(PoisonError::into_inner);
        slot.cache.records_at(now)
    }

    pub fn freshness<T: Cached>(&self, now: DateTime<Utc>) -> Freshness {
        let slot = T::slot(self).read().unwrap_or_else(PoisonError::into_inner);
        slot.cache.freshness(now)
    }

    pub fn freshness_of(&self, kind: ResourceKind, now: DateTime<Utc>) -> Freshness {
        match kind {
            ResourceKind::Customers => self.freshness::<Customer>(now),
            ResourceKind::Products => self.freshness::<Product>(now),
            ResourceKind::Quotes => self.freshness::<Quote>(now),
        }
    }

    pub fn fetched_at<T: Cached>(&self) -> Option<DateTime<Utc>> {
        let slot = T::slot(self).read().unwrap_or_else(PoisonError::into_inner);
        slot.cache.fetched_at()
    }

    // =========================================================================
    // Writers
    // =========================================================================

    pub(crate) fn generation<T: Cached>(&self) -> u64 {
        let slot = T::slot(self).read().unwrap_or_else(PoisonError::into_inner);
        slot.generation
    }

    pub(crate) fn generations(&self) -> Generations {
        Generations {
            customers: self.generation::<Customer>(),
            products: self.generation::<Product>(),
            quotes: self.generation::<Quote>(),
        }
    }

    /// Populates the cache unless it was cleared since `generation` was
    /// read. Returns whether the records were applied.
    pub(crate) fn apply<T: Cached>(&self, generation: u64, records: Vec<T>, now: DateTime<Utc>) -> bool {
        let mut slot = T::slot(self).write().unwrap_or_else(PoisonError::into_inner);
        if slot.generation != generation {
            return false;
        }
        slot.cache.populate(records, now);
        true
    }

    pub(crate) fn evict_expired<T: Cached>(&self, now: DateTime<Utc>) -> bool {
        let mut slot = T::slot(self).write().unwrap_or_else(PoisonError::into_inner);
        let evicted = slot.cache.evict_expired(now);
        if evicted {
            debug!(kind = %T::KIND, "Evicted expired cache");
        }
        evicted
    }

    pub(crate) fn clear<T: Cached>(&self) {
        T::slot(self)
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub(crate) fn clear_kind(&self, kind: ResourceKind) {
        match kind {
            ResourceKind::Customers => self.clear::<Customer>(),
            ResourceKind::Products => self.clear::<Product>(),
            ResourceKind::Quotes => self.clear::<Quote>(),
        }
    }

    pub(crate) fn clear_all(&self) {
        for kind in ResourceKind::ALL {
            self.clear_kind(kind);
        }
    }
}
