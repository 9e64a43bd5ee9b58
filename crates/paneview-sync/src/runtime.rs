//! # Dashboard Runtime
//!
//! Wires the session manager, orchestrator and order client from a
//! [`DashboardConfig`] and exposes the handful of calls a host UI needs.
//!
//! ```text
//! DashboardConfig ──► DashboardRuntime
//!                      ├── SessionManager   (HttpAuthGateway, FileSessionStore)
//!                      ├── FetchOrchestrator (HttpResourceApi, RetryPolicy)
//!                      ├── OrderClient
//!                      └── Arc<CacheRegistry> shared by all of the above
//! ```

use std::sync::Arc;
use std::time::Duration;

use paneview_core::types::OrderResponse;
use paneview_core::view::{TableState, TableView, Tabular};
use paneview_core::{FetchError, ResourceKind, Session};
use tracing::{info, warn};

use crate::api::{HttpResourceApi, ResourceApi};
use crate::auth::{AuthGateway, HttpAuthGateway};
use crate::caches::{CacheRegistry, Cached};
use crate::clock::{Clock, SystemClock};
use crate::config::DashboardConfig;
use crate::error::{AuthResult, ConfigResult};
use crate::orchestrator::{FetchOrchestrator, LoadHandle};
use crate::orders::OrderClient;
use crate::session::{ExpiryWatchHandle, NoOpEmitter, SessionEventEmitter, SessionManager};
use crate::storage::{FileSessionStore, MemorySessionStore, SessionStore};

pub struct DashboardRuntime {
    clock: Arc<dyn Clock>,
    sessions: Arc<SessionManager>,
    orchestrator: Arc<FetchOrchestrator>,
    orders: OrderClient,
    expiry_check_interval: Duration,
}

impl DashboardRuntime {
    pub fn from_config(config: &DashboardConfig) -> ConfigResult<Self> {
        Self::from_config_with_emitter(config, Arc::new(NoOpEmitter))
    }

    /// Like [`from_config`](Self::from_config), routing navigation events
    /// to `emitter`.
    pub fn from_config_with_emitter(
        config: &DashboardConfig,
        emitter: Arc<dyn SessionEventEmitter>,
    ) -> ConfigResult<Self> {
        config.validate()?;

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let store: Arc<dyn SessionStore> = match config.storage_dir() {
            Some(dir) => {
                info!(dir = %dir.display(), "Using file session storage");
                Arc::new(FileSessionStore::new(dir))
            }
            None => {
                warn!("No storage directory available, sessions will not survive restarts");
                Arc::new(MemorySessionStore::new())
            }
        };

        let customers = config.cache_policy(ResourceKind::Customers)?;
        let products = config.cache_policy(ResourceKind::Products)?;
        let quotes = config.cache_policy(ResourceKind::Quotes)?;
        let caches = Arc::new(CacheRegistry::with_policies(|kind| match kind {
            ResourceKind::Customers => customers,
            ResourceKind::Products => products,
            ResourceKind::Quotes => quotes,
        }));

        let gateway: Arc<dyn AuthGateway> =
            Arc::new(HttpAuthGateway::new(config.auth_url()?, clock.clone())?);
        let api: Arc<dyn ResourceApi> = Arc::new(HttpResourceApi::new(
            config.resource_base_url()?,
            config.resources.clone(),
        )?);
        let orders = OrderClient::new(config.orders_url()?, clock.clone())?;

        let sessions = Arc::new(
            SessionManager::new(gateway, store, caches.clone(), clock.clone())
                .with_emitter(emitter),
        );
        let orchestrator = Arc::new(
            FetchOrchestrator::new(api, caches, clock.clone(), config.retry_policy())
                .with_session_gate(sessions.clone()),
        );

        Ok(Self {
            clock,
            sessions,
            orchestrator,
            orders,
            expiry_check_interval: config.expiry_check_interval(),
        })
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    pub fn orchestrator(&self) -> &Arc<FetchOrchestrator> {
        &self.orchestrator
    }

    pub fn orders(&self) -> &OrderClient {
        &self.orders
    }

    pub fn session(&self) -> Session {
        self.sessions.current_session()
    }

    /// Authenticates, then starts loading every resource in the background.
    pub async fn login(&self, secret: &str) -> AuthResult<LoadHandle> {
        let session = self.sessions.authenticate(secret).await?;
        Ok(self.orchestrator.spawn_load(session))
    }

    /// Reloads resources whose cache went stale.
    pub fn refresh(&self) -> LoadHandle {
        self.orchestrator.spawn_refresh(self.sessions.current_session())
    }

    pub fn logout(&self) {
        self.sessions.logout();
    }

    /// Starts the background expiry check at the configured interval.
    pub fn spawn_expiry_watch(&self) -> ExpiryWatchHandle {
        self.sessions.spawn_expiry_watch(self.expiry_check_interval)
    }

    /// Filtered, sorted rows for one list view. `None` when `session` is not
    /// the active, unexpired login or nothing usable is cached.
    pub fn rows<T>(&self, session: &Session, table: &TableState<T::Column>) -> Option<TableView<T>>
    where
        T: Cached + Tabular,
    {
        if !self.sessions.is_active(session) {
            return None;
        }
        let now = self.clock.now();
        let records = self.sessions.caches().records::<T>(now)?;
        Some(table.render(&records))
    }

    pub async fn customer_orders(
        &self,
        customer_codes: &[String],
    ) -> Result<OrderResponse, FetchError> {
        let session = self.sessions.current_session();
        self.orders.customer_orders(&session, customer_codes).await
    }
}
