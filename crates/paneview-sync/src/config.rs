//! # Dashboard Configuration
//!
//! Endpoint locations, retry budget, cache windows and session storage.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     PANEVIEW_AUTH_URL=https://auth.example.com/                        │
//! │     PANEVIEW_MAX_RETRIES=2                                             │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/dashboard/dashboard.toml (Linux)                         │
//! │     ~/Library/Application Support/com.paneview.dashboard/ (macOS)      │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     2 retries, 1s → 30s backoff, 5 min fresh / 10 min retained         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # dashboard.toml
//! [auth]
//! url = "https://auth.example.com/"
//!
//! [resources]
//! base_url = "https://workflows.example.com/workflows/abc/triggers/manual/paths/invoke"
//! api_version = "2016-10-01"
//!
//! [retry]
//! max_retries = 2
//! initial_backoff_ms = 1000
//! max_backoff_secs = 30
//!
//! [cache.products]
//! stale_after_secs = 300
//! evict_after_secs = 600
//! ```

use std::path::PathBuf;
use std::time::Duration;

use paneview_core::{CachePolicy, ResourceKind, DEFAULT_MAX_RETRIES};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ConfigError, ConfigResult};
use crate::orchestrator::RetryPolicy;

// =============================================================================
// Endpoint Settings
// =============================================================================

/// Where the shared secret is exchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSettings {
    #[serde(default = "default_auth_url")]
    pub url: String,
}

fn default_auth_url() -> String {
    "http://localhost:8787/".to_string()
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            url: default_auth_url(),
        }
    }
}

/// Order history lookup endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSettings {
    #[serde(default = "default_orders_url")]
    pub url: String,
}

fn default_orders_url() -> String {
    "http://localhost:8787/orders".to_string()
}

impl Default for OrderSettings {
    fn default() -> Self {
        Self {
            url: default_orders_url(),
        }
    }
}

/// The workflow trigger endpoints serving customers, products and quotes.
///
/// Each request goes to `<base_url>/<path>` with `api-version`, `sp`, `sv`
/// and the session credential as `sig` in the query string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSettings {
    #[serde(default = "default_resource_base_url")]
    pub base_url: String,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Sent as `sp`.
    #[serde(default = "default_trigger_path")]
    pub trigger_path: String,

    /// Sent as `sv`.
    #[serde(default = "default_signature_version")]
    pub signature_version: String,

    #[serde(default = "default_customers_path")]
    pub customers_path: String,

    #[serde(default = "default_products_path")]
    pub products_path: String,

    #[serde(default = "default_quotes_path")]
    pub quotes_path: String,
}

fn default_resource_base_url() -> String {
    "http://localhost:7071/workflows/invoke".to_string()
}
fn default_api_version() -> String {
    "2016-10-01".to_string()
}
fn default_trigger_path() -> String {
    "/triggers/manual/run".to_string()
}
fn default_signature_version() -> String {
    "1.0".to_string()
}
fn default_customers_path() -> String {
    ResourceKind::Customers.default_path().to_string()
}
fn default_products_path() -> String {
    ResourceKind::Products.default_path().to_string()
}
fn default_quotes_path() -> String {
    ResourceKind::Quotes.default_path().to_string()
}

impl Default for ResourceSettings {
    fn default() -> Self {
        Self {
            base_url: default_resource_base_url(),
            api_version: default_api_version(),
            trigger_path: default_trigger_path(),
            signature_version: default_signature_version(),
            customers_path: default_customers_path(),
            products_path: default_products_path(),
            quotes_path: default_quotes_path(),
        }
    }
}

impl ResourceSettings {
    pub fn path(&self, kind: ResourceKind) -> &str {
        match kind {
            ResourceKind::Customers => &self.customers_path,
            ResourceKind::Products => &self.products_path,
            ResourceKind::Quotes => &self.quotes_path,
        }
    }
}

// =============================================================================
// Retry Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Additional attempts after the first failure.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff")]
    pub max_backoff_secs: u64,
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}
fn default_initial_backoff() -> u64 {
    1000
}
fn default_max_backoff() -> u64 {
    30
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_secs: default_max_backoff(),
        }
    }
}

// =============================================================================
// Cache Settings
// =============================================================================

/// Freshness and eviction windows for one resource.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CacheWindow {
    #[serde(default = "default_stale_after")]
    pub stale_after_secs: u64,

    #[serde(default = "default_evict_after")]
    pub evict_after_secs: u64,
}

fn default_stale_after() -> u64 {
    5 * 60
}
fn default_evict_after() -> u64 {
    10 * 60
}

impl Default for CacheWindow {
    fn default() -> Self {
        Self {
            stale_after_secs: default_stale_after(),
            evict_after_secs: default_evict_after(),
        }
    }
}

impl CacheWindow {
    pub fn policy(&self) -> ConfigResult<CachePolicy> {
        Ok(CachePolicy::new(
            Duration::from_secs(self.stale_after_secs),
            Duration::from_secs(self.evict_after_secs),
        )?)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default)]
    pub customers: CacheWindow,
    #[serde(default)]
    pub products: CacheWindow,
    #[serde(default)]
    pub quotes: CacheWindow,
}

impl CacheSettings {
    pub fn window(&self, kind: ResourceKind) -> CacheWindow {
        match kind {
            ResourceKind::Customers => self.customers,
            ResourceKind::Products => self.products,
            ResourceKind::Quotes => self.quotes,
        }
    }
}

// =============================================================================
// Session Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSettings {
    /// How often the background watcher checks for expiry.
    #[serde(default = "default_expiry_check_interval")]
    pub expiry_check_interval_secs: u64,

    /// Directory holding `auth.json`. Defaults to the platform data dir.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_dir: Option<PathBuf>,
}

fn default_expiry_check_interval() -> u64 {
    30
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            expiry_check_interval_secs: default_expiry_check_interval(),
            storage_dir: None,
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete dashboard configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub auth: AuthSettings,

    #[serde(default)]
    pub orders: OrderSettings,

    #[serde(default)]
    pub resources: ResourceSettings,

    #[serde(default)]
    pub retry: RetrySettings,

    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub session: SessionSettings,
}

impl DashboardConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (dashboard.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading dashboard config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load dashboard config: {}. Using defaults.", e);
            Self::default()
        })
    }

    pub fn save(&self, config_path: Option<PathBuf>) -> ConfigResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ConfigError::SaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::SaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| ConfigError::SaveFailed(e.to_string()))?;

        info!(?path, "Dashboard config saved");
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        parse_http_url("auth.url", &self.auth.url)?;
        parse_http_url("orders.url", &self.orders.url)?;
        parse_http_url("resources.base_url", &self.resources.base_url)?;

        for kind in ResourceKind::ALL {
            if self.resources.path(kind).trim().is_empty() {
                return Err(ConfigError::Invalid(format!("resource path for {kind} is empty")));
            }
            self.cache.window(kind).policy()?;
        }

        if self.retry.initial_backoff_ms == 0 {
            return Err(ConfigError::Invalid(
                "initial_backoff_ms must be greater than 0".into(),
            ));
        }
        if Duration::from_secs(self.retry.max_backoff_secs)
            < Duration::from_millis(self.retry.initial_backoff_ms)
        {
            return Err(ConfigError::Invalid(
                "max_backoff_secs must not be shorter than initial_backoff_ms".into(),
            ));
        }

        if self.session.expiry_check_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "expiry_check_interval_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from any key-value source.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("PANEVIEW_AUTH_URL") {
            debug!(url = %url, "Overriding auth URL from environment");
            self.auth.url = url;
        }

        if let Some(url) = lookup("PANEVIEW_ORDERS_URL") {
            debug!(url = %url, "Overriding orders URL from environment");
            self.orders.url = url;
        }

        if let Some(url) = lookup("PANEVIEW_RESOURCE_BASE_URL") {
            debug!(url = %url, "Overriding resource base URL from environment");
            self.resources.base_url = url;
        }

        if let Some(retries) = lookup("PANEVIEW_MAX_RETRIES") {
            match retries.parse::<u32>() {
                Ok(n) => self.retry.max_retries = n,
                Err(_) => warn!(value = %retries, "Ignoring non-numeric PANEVIEW_MAX_RETRIES"),
            }
        }

        if let Some(dir) = lookup("PANEVIEW_STORAGE_DIR") {
            self.session.storage_dir = Some(PathBuf::from(dir));
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("dashboard.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn auth_url(&self) -> ConfigResult<Url> {
        parse_http_url("auth.url", &self.auth.url)
    }

    pub fn orders_url(&self) -> ConfigResult<Url> {
        parse_http_url("orders.url", &self.orders.url)
    }

    pub fn resource_base_url(&self) -> ConfigResult<Url> {
        parse_http_url("resources.base_url", &self.resources.base_url)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.retry.max_retries,
            initial_backoff: Duration::from_millis(self.retry.initial_backoff_ms),
            max_backoff: Duration::from_secs(self.retry.max_backoff_secs),
        }
    }

    pub fn cache_policy(&self, kind: ResourceKind) -> ConfigResult<CachePolicy> {
        self.cache.window(kind).policy()
    }

    pub fn expiry_check_interval(&self) -> Duration {
        Duration::from_secs(self.session.expiry_check_interval_secs)
    }

    /// Configured storage directory, else the platform data directory.
    pub fn storage_dir(&self) -> Option<PathBuf> {
        self.session
            .storage_dir
            .clone()
            .or_else(|| project_dirs().map(|dirs| dirs.data_dir().to_path_buf()))
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "paneview", "dashboard")
}

fn parse_http_url(field: &'static str, raw: &str) -> ConfigResult<Url> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
        field,
        reason: format!("{e}: {raw}"),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidUrl {
            field,
            reason: format!("scheme must be http or https, got: {other}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = DashboardConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.retry.max_retries, 2);
        assert_eq!(config.resources.path(ResourceKind::Quotes), "CustomerQuotes");

        let policy = config.retry_policy();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.initial_backoff, Duration::from_secs(1));
        assert_eq!(policy.max_backoff, Duration::from_secs(30));

        assert_eq!(
            config.cache_policy(ResourceKind::Products).unwrap(),
            CachePolicy::DEFAULT
        );
    }

    #[test]
    fn test_config_validation() {
        let mut config = DashboardConfig::default();

        config.auth.url = "ftp://auth.example.com".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidUrl { field: "auth.url", .. })
        ));

        config.auth.url = "not a url".into();
        assert!(config.validate().is_err());

        config.auth.url = default_auth_url();
        config.cache.quotes.evict_after_secs = 60;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.cache.quotes = CacheWindow::default();
        config.retry.max_backoff_secs = 0;
        assert!(config.validate().is_err());

        config.retry = RetrySettings::default();
        config.session.expiry_check_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("PANEVIEW_AUTH_URL", "https://auth.example.com/login"),
            ("PANEVIEW_MAX_RETRIES", "5"),
            ("PANEVIEW_STORAGE_DIR", "/tmp/paneview"),
        ]);

        let mut config = DashboardConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.auth.url, "https://auth.example.com/login");
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.storage_dir(), Some(PathBuf::from("/tmp/paneview")));
    }

    #[test]
    fn test_bad_numeric_override_is_ignored() {
        let mut config = DashboardConfig::default();
        config.apply_overrides(|key| (key == "PANEVIEW_MAX_RETRIES").then(|| "lots".to_string()));
        assert_eq!(config.retry.max_retries, 2);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.toml");
        std::fs::write(
            &path,
            r#"
[resources]
base_url = "https://workflows.example.com/invoke"

[cache.customers]
stale_after_secs = 60
"#,
        )
        .unwrap();

        let config: DashboardConfig =
            toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();

        assert_eq!(config.resources.base_url, "https://workflows.example.com/invoke");
        assert_eq!(config.resources.api_version, "2016-10-01");
        assert_eq!(config.cache.customers.stale_after_secs, 60);
        assert_eq!(config.cache.customers.evict_after_secs, 600);
        assert_eq!(config.cache.products, CacheWindow::default());
    }

    #[test]
    fn test_invalid_file_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.toml");
        std::fs::write(&path, "[retry]\nmax_retries = \"two\"\n").unwrap();

        assert!(matches!(
            DashboardConfig::load(Some(path)),
            Err(ConfigError::LoadFailed(_))
        ));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("dashboard.toml");

        let mut config = DashboardConfig::default();
        config.retry.max_retries = 4;
        config.save(Some(path.clone())).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let reloaded: DashboardConfig = toml::from_str(&contents).unwrap();
        assert_eq!(reloaded, config);
    }
}
