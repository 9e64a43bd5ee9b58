//! # paneview-core: Pure Domain Logic for the PaneView Dashboard
//!
//! Everything the dashboard decides without touching the outside world:
//! what a record looks like, whether a session is still usable, whether a
//! cache is fresh, how a fetch moves between states, and how a list view
//! turns a collection into one page of rows.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      PaneView Dashboard Core                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  paneview-sync (async I/O)                       │   │
//! │  │   SessionManager ──► FetchOrchestrator ──► CacheRegistry         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ paneview-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────┐ │   │
//! │  │   │  types   │ │ session  │ │  cache   │ │  fetch   │ │ view │ │   │
//! │  │   │ envelope │ │ Session  │ │ Resource │ │ Attempt  │ │filter│ │   │
//! │  │   │ Customer │ │StoredAuth│ │  Cache   │ │Aggregate │ │ sort │ │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘ │ page │ │   │
//! │  │                                                        └──────┘ │   │
//! │  │   NO I/O • NO CLOCK • NO NETWORK • PURE FUNCTIONS               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Customer, Product, Quote, order records and [`ResourceKind`]
//! - [`envelope`] - Decoding the workflow API's list envelopes
//! - [`session`] - The [`Session`] model and its persisted shape
//! - [`cache`] - Freshness bookkeeping for one resource collection
//! - [`fetch`] - Per-resource fetch state machine and the aggregate view
//! - [`view`] - Filter, sort and paginate pipeline
//! - [`insights`] - Dashboard statistics and lookups
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use paneview_core::view::{paginate, FilterSet, SortState};
//! use paneview_core::view::columns::CustomerColumn;
//! use paneview_core::types::Customer;
//! use paneview_core::view::{filter_records, sort_by};
//!
//! let customers: Vec<Customer> = Vec::new();
//! let filters = FilterSet::new().with("branch", "North");
//! let filtered = filter_records(&customers, &filters);
//! let (sorted, state) = sort_by(&filtered, &SortState::unsorted(), CustomerColumn::BillingName);
//! let window = paginate(&sorted, 1, 10);
//!
//! assert!(state.is_active());
//! assert_eq!(window.page, 1);
//! assert!(window.items.is_empty());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cache;
pub mod envelope;
pub mod error;
pub mod fetch;
pub mod insights;
pub mod session;
pub mod types;
pub mod view;

// =============================================================================
// Re-exports
// =============================================================================

pub use cache::{CachePolicy, Freshness, ResourceCache};
pub use envelope::{decode_envelope, EnvelopeMeta, Resource, ResourceEnvelope};
pub use error::{CoreError, EnvelopeError, FetchError};
pub use fetch::{AggregateState, FailureOutcome, FetchAttempt, FetchStatus, LoadSummary, ResourceFailure};
pub use session::{Session, StoredAuth};
pub use types::{Customer, Product, Quote, ResourceKind};

// =============================================================================
// Constants
// =============================================================================

/// Rows per page in every list view.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Additional attempts after the first failed fetch of a resource.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// How many records the dashboard's "top customers" list shows.
pub const TOP_CUSTOMER_LIMIT: usize = 10;
