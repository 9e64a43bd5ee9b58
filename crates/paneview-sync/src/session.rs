//! # Session Manager
//!
//! Single owner of the active [`Session`]. Everything else receives a clone.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  new() ── store.load() ──► valid record?   ── yes ──► Authenticated     │
//! │                               │ no / corrupt                            │
//! │                               ▼                                         │
//! │                        Unauthenticated ◄──────────────────────┐         │
//! │                               │                               │         │
//! │            authenticate(secret) ── gateway.exchange() ── ✓    │         │
//! │                               │                               │         │
//! │                               ▼                               │         │
//! │  store.save() ◄────────── Authenticated ── logout() ──────────┤         │
//! │                               │                               │         │
//! │                               └── expiry seen on access ──────┘         │
//! │                                   or by the expiry watch                │
//! │                                                                         │
//! │  Leaving Authenticated: store.remove(), caches.clear_all(),             │
//! │                         emitter.emit_logged_out(reason)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use paneview_core::{ResourceKind, Session, StoredAuth};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::auth::AuthGateway;
use crate::caches::CacheRegistry;
use crate::clock::Clock;
use crate::error::{AuthError, AuthResult, SessionError, SessionResult};
use crate::orchestrator::SessionGate;
use crate::storage::SessionStore;

// =============================================================================
// Events
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogoutReason {
    UserRequested,
    Expired,
}

/// Navigation hooks for the host application.
pub trait SessionEventEmitter: Send + Sync {
    /// A login succeeded; the host should show the dashboard.
    fn emit_authenticated(&self, session: &Session);

    /// The session ended; the host should return to the login view.
    fn emit_logged_out(&self, reason: LogoutReason);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEmitter;

impl SessionEventEmitter for NoOpEmitter {
    fn emit_authenticated(&self, _session: &Session) {}

    fn emit_logged_out(&self, _reason: LogoutReason) {}
}

// =============================================================================
// Manager
// =============================================================================

pub struct SessionManager {
    gateway: Arc<dyn AuthGateway>,
    store: Arc<dyn SessionStore>,
    caches: Arc<CacheRegistry>,
    clock: Arc<dyn Clock>,
    emitter: Arc<dyn SessionEventEmitter>,
    session: RwLock<Session>,
}

impl SessionManager {
    /// Builds the manager and rehydrates a still-valid stored session.
    pub fn new(
        gateway: Arc<dyn AuthGateway>,
        store: Arc<dyn SessionStore>,
        caches: Arc<CacheRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let session = rehydrate(store.as_ref(), clock.now());
        Self {
            gateway,
            store,
            caches,
            clock,
            emitter: Arc::new(NoOpEmitter),
            session: RwLock::new(session),
        }
    }

    pub fn with_emitter(mut self, emitter: Arc<dyn SessionEventEmitter>) -> Self {
        self.emitter = emitter;
        self
    }

    pub fn caches(&self) -> &Arc<CacheRegistry> {
        &self.caches
    }

    /// Exchanges `secret` for a session and makes it active.
    ///
    /// Never retried. On failure the current session is left untouched.
    pub async fn authenticate(&self, secret: &str) -> AuthResult<Session> {
        if secret.trim().is_empty() {
            return Err(AuthError::EmptySecret);
        }

        let grant = match self.gateway.exchange(secret).await {
            Ok(grant) => grant,
            Err(e) => {
                warn!(error = %e, "Authentication failed");
                return Err(e);
            }
        };

        let now = self.clock.now();
        if grant.expires_at <= now {
            warn!(expires_at = %grant.expires_at, "Granted session is already expired");
            return Err(AuthError::RemoteRejected(
                "granted session is already expired".to_string(),
            ));
        }

        let session = Session::authenticated(
            grant.credential_token,
            grant.bearer_token,
            grant.expires_at,
        );

        if let Err(e) = self.store.save(&StoredAuth::from(&session)) {
            warn!(error = %e, "Failed to persist session, continuing in memory");
        }
        *self.write() = session.clone();

        info!(expires_at = %grant.expires_at, "Authenticated");
        self.emitter.emit_authenticated(&session);
        Ok(session)
    }

    /// The active session, or the unauthenticated value once it expired.
    pub fn current_session(&self) -> Session {
        let now = self.clock.now();
        let session = self.read().clone();
        if session.is_expired_at(now) {
            self.expire_if_due(now);
            return Session::unauthenticated();
        }
        session
    }

    /// Like [`current_session`](Self::current_session) but fails when there
    /// is no valid session.
    pub fn authenticated_session(&self) -> SessionResult<Session> {
        let now = self.clock.now();
        let session = self.read().clone();
        if !session.is_authenticated {
            return Err(SessionError::NotAuthenticated);
        }
        if session.is_expired_at(now) {
            self.expire_if_due(now);
            return Err(SessionError::Expired);
        }
        Ok(session)
    }

    /// Whether `session` is the active login and has not expired. A clone
    /// taken before a logout is not, and neither is one replaced by a
    /// different login.
    pub fn is_active(&self, session: &Session) -> bool {
        session.is_valid_at(self.clock.now()) && *self.read() == *session
    }

    /// Ends the session. Calling it while logged out only re-emits the
    /// navigation event.
    pub fn logout(&self) {
        let previous = std::mem::replace(&mut *self.write(), Session::unauthenticated());
        if previous.is_authenticated {
            self.purge();
            info!("Logged out");
        } else {
            debug!("Logout requested while logged out");
        }
        self.emitter.emit_logged_out(LogoutReason::UserRequested);
    }

    /// Drops one resource's cached records.
    pub fn invalidate(&self, kind: ResourceKind) {
        debug!(%kind, "Invalidating cache");
        self.caches.clear_kind(kind);
    }

    /// Periodically checks the session for expiry until the handle is shut
    /// down or dropped.
    pub fn spawn_expiry_watch(self: &Arc<Self>, period: Duration) -> ExpiryWatchHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let manager = Arc::clone(self);
        let period = period.max(Duration::from_millis(1));

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if manager.expire_if_due(manager.clock.now()) {
                            info!("Expiry watch ended the session");
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        debug!("Expiry watch shutting down");
                        break;
                    }
                }
            }
        });

        ExpiryWatchHandle { shutdown_tx, task }
    }

    /// Runs the logout path with reason `Expired` if the session has
    /// expired. Returns whether it did.
    fn expire_if_due(&self, now: DateTime<Utc>) -> bool {
        {
            let mut session = self.write();
            if !session.is_expired_at(now) {
                return false;
            }
            *session = Session::unauthenticated();
        }
        self.purge();
        info!("Session expired");
        self.emitter.emit_logged_out(LogoutReason::Expired);
        true
    }

    fn purge(&self) {
        if let Err(e) = self.store.remove() {
            warn!(error = %e, "Failed to remove stored session");
        }
        self.caches.clear_all();
    }

    fn read(&self) -> RwLockReadGuard<'_, Session> {
        self.session.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Session> {
        self.session.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionGate for SessionManager {
    fn is_current(&self, session: &Session) -> bool {
        self.is_active(session)
    }
}

fn rehydrate(store: &dyn SessionStore, now: DateTime<Utc>) -> Session {
    match store.load() {
        Ok(Some(record)) => match record.restore_at(now) {
            Some(session) => {
                info!("Restored stored session");
                session
            }
            None => {
                info!("Stored session no longer valid, discarding");
                if let Err(e) = store.remove() {
                    warn!(error = %e, "Failed to remove stored session");
                }
                Session::unauthenticated()
            }
        },
        Ok(None) => Session::unauthenticated(),
        Err(e) => {
            warn!(error = %e, "Ignoring unreadable stored session");
            Session::unauthenticated()
        }
    }
}

/// Stops the expiry watch when shut down or dropped.
pub struct ExpiryWatchHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl ExpiryWatchHandle {
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        let _ = self.task.await;
    }
}

// =============================================================================
// Tests
// =============================================================================
