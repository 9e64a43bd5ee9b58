//! # paneview-sync: Session and Data Layer for the PaneView Dashboard
//!
//! Everything with I/O: the shared-secret login, the durable session
//! record, signed resource fetches with retry, process-wide caches and the
//! order lookup. Pure logic lives in `paneview-core`.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          DashboardRuntime                               │
//! │                                                                         │
//! │  ┌──────────────────────┐          ┌──────────────────────────────┐     │
//! │  │   SessionManager     │          │     FetchOrchestrator        │     │
//! │  │                      │ Session  │                              │     │
//! │  │ AuthGateway (HTTP)   │ ───────► │ ResourceApi (HTTP, signed)   │     │
//! │  │ SessionStore (file)  │          │ RetryPolicy (backoff crate)  │     │
//! │  │ expiry watch task    │          │ watch::Sender<AggregateState>│     │
//! │  └──────────┬───────────┘          └──────────────┬───────────────┘     │
//! │             │ clear_all / invalidate              │ apply / evict       │
//! │             ▼                                     ▼                     │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │            CacheRegistry (one slot per resource kind)           │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! │                               ▲                                         │
//! │                               │ records() ── TableState::render()       │
//! │                           host UI                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`runtime`] - `DashboardRuntime` wiring and view-data accessor
//! - [`session`] - `SessionManager`, logout and expiry handling
//! - [`orchestrator`] - Concurrent resource loads with retry
//! - [`caches`] - Process-wide cache registry
//! - [`api`] / [`auth`] / [`orders`] - HTTP gateways
//! - [`storage`] - Durable session record
//! - [`config`] - TOML configuration with env overrides
//! - [`clock`] - Wall-clock abstraction
//! - [`error`] - Error types
//! - [`logging`] - Tracing subscriber setup
//!
//! ## Usage
//!
//! ```rust,ignore
//! use paneview_sync::{DashboardConfig, DashboardRuntime};
//!
//! let config = DashboardConfig::load_or_default(None);
//! let runtime = DashboardRuntime::from_config(&config)?;
//!
//! let load = runtime.login("shared-secret").await?;
//! let state = load.wait().await;
//! println!("Errors: {:?}", state.errors());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod api;
pub mod auth;
pub mod caches;
pub mod clock;
pub mod config;
pub mod error;
mod http;
pub mod logging;
pub mod orchestrator;
pub mod orders;
pub mod runtime;
pub mod session;
pub mod storage;

// =============================================================================
// Re-exports
// =============================================================================

pub use api::{HttpResourceApi, ResourceApi};
pub use auth::{AuthGateway, AuthGrant, HttpAuthGateway};
pub use caches::{CacheRegistry, Cached};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::DashboardConfig;
pub use error::{AuthError, ConfigError, SessionError, StorageError};
pub use logging::init_tracing;
pub use orchestrator::{FetchOrchestrator, LoadHandle, RetryPolicy};
pub use orders::OrderClient;
pub use runtime::DashboardRuntime;
pub use session::{
    ExpiryWatchHandle, LogoutReason, NoOpEmitter, SessionEventEmitter, SessionManager,
};
pub use storage::{FileSessionStore, MemorySessionStore, SessionStore};
