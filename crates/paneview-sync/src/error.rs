//! # Sync Error Types
//!
//! Error types for session, storage and configuration operations. Resource
//! fetch failures are [`paneview_core::FetchError`] values carried inside the
//! aggregate load state rather than errors returned from here.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Authentication │  │    Session      │  │     Storage             │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  RemoteRejected │  │  Expired        │  │  Io                     │ │
//! │  │  EmptySecret    │  │  NotAuthentic.  │  │  Corrupt                │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  Configuration: Invalid, InvalidUrl, LoadFailed, SaveFailed,     │   │
//! │  │                 Http (client could not be built)                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;
pub type SessionResult<T> = Result<T, SessionError>;
pub type StorageResult<T> = Result<T, StorageError>;
pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Authentication
// =============================================================================

/// The shared-secret exchange did not produce a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Network failure, non-success status or malformed response.
    #[error("Authentication failed: {0}")]
    RemoteRejected(String),

    /// Nothing to send.
    #[error("Password is required")]
    EmptySecret,
}

// =============================================================================
// Session
// =============================================================================

/// No usable session for an operation that requires one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Session expired, please log in again")]
    Expired,

    #[error("Not authenticated")]
    NotAuthenticated,
}

// =============================================================================
// Storage
// =============================================================================

/// The durable session record could not be read or written.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Session storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored record exists but does not parse.
    #[error("Stored session record is corrupt: {0}")]
    Corrupt(String),

    #[error("Failed to serialize session record: {0}")]
    Serialization(String),
}

// =============================================================================
// Configuration
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Invalid URL for {field}: {reason}")]
    InvalidUrl { field: &'static str, reason: String },

    #[error("Failed to load config: {0}")]
    LoadFailed(String),

    #[error("Failed to save config: {0}")]
    SaveFailed(String),

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Http(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        Self::LoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        Self::LoadFailed(format!("TOML parse error: {err}"))
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(err: toml::ser::Error) -> Self {
        Self::SaveFailed(format!("TOML serialize error: {err}"))
    }
}

impl From<paneview_core::CoreError> for ConfigError {
    fn from(err: paneview_core::CoreError) -> Self {
        Self::Invalid(err.to_string())
    }
}

impl From<reqwest::Error> for ConfigError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}
