//! # Error Types
//!
//! Domain-specific error types for paneview-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  paneview-core errors (this file)                                      │
//! │  ├── FetchError     - Why a resource could not be loaded (data)        │
//! │  ├── EnvelopeError  - Response body did not match the envelope shape   │
//! │  └── CoreError      - Invalid domain configuration                     │
//! │                                                                         │
//! │  paneview-sync errors (separate crate)                                 │
//! │  ├── AuthError      - Secret exchange failed                           │
//! │  ├── SessionError   - No usable session                                │
//! │  ├── StorageError   - Durable session record unreadable/unwritable     │
//! │  └── ConfigError    - Configuration invalid                            │
//! │                                                                         │
//! │  Flow: EnvelopeError → FetchError → AggregateState → Frontend          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `FetchError` is `Clone + Serialize` because it travels inside
//! [`AggregateState`](crate::fetch::AggregateState) to the presentation layer
//! instead of propagating as a Rust error.

use serde::Serialize;
use thiserror::Error;

// =============================================================================
// Fetch Error
// =============================================================================

/// Why a single resource fetch did not produce a collection.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "code", content = "detail", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FetchError {
    /// The session has no usable credential. No request was sent.
    #[error("No API key available")]
    CredentialMissing,

    /// Network failure or non-success HTTP status. Retryable.
    #[error("Transient fetch failure{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Transient { status: Option<u16>, message: String },

    /// The response body was not a valid envelope for the resource.
    #[error("Invalid response envelope: {0}")]
    InvalidEnvelope(EnvelopeError),

    /// Retry budget exhausted; carries the error of the final attempt.
    #[error("Gave up after {attempts} attempts: {last_error}")]
    Terminal {
        attempts: u32,
        last_error: Box<FetchError>,
    },
}

impl FetchError {
    /// Shorthand for a transport-level failure without an HTTP status.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Transient {
            status: None,
            message: message.into(),
        }
    }

    /// Shorthand for a non-success HTTP status.
    pub fn http_status(status: u16) -> Self {
        Self::Transient {
            status: Some(status),
            message: format!("HTTP error! status: {status}"),
        }
    }

    /// Only transient failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// Error code for logs and frontend display.
    pub fn code(&self) -> &'static str {
        match self {
            Self::CredentialMissing => "CREDENTIAL_MISSING",
            Self::Transient { .. } => "TRANSIENT",
            Self::InvalidEnvelope(_) => "INVALID_ENVELOPE",
            Self::Terminal { .. } => "TERMINAL",
        }
    }
}

impl From<EnvelopeError> for FetchError {
    fn from(err: EnvelopeError) -> Self {
        Self::InvalidEnvelope(err)
    }
}

// =============================================================================
// Envelope Error
// =============================================================================

/// A resource response that could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum EnvelopeError {
    #[error("body is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("body is not a JSON object")]
    NotAnObject,

    #[error("field '{field}' is not a list")]
    ListNotArray { field: &'static str },

    #[error("record {index} in '{field}' is invalid: {reason}")]
    InvalidRecord {
        field: &'static str,
        index: usize,
        reason: String,
    },
}

// =============================================================================
// Core Error
// =============================================================================

/// Domain configuration that violates an invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("Invalid cache policy: {0}")]
    InvalidPolicy(String),
}

/// Result type alias for core operations
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transient_is_retryable() {
        assert!(FetchError::network("connection reset").is_retryable());
        assert!(FetchError::http_status(503).is_retryable());
        assert!(!FetchError::CredentialMissing.is_retryable());
        assert!(!FetchError::InvalidEnvelope(EnvelopeError::NotAnObject).is_retryable());

        let terminal = FetchError::Terminal {
            attempts: 3,
            last_error: Box::new(FetchError::http_status(500)),
        };
        assert!(!terminal.is_retryable());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            FetchError::http_status(502).to_string(),
            "Transient fetch failure (HTTP 502): HTTP error! status: 502"
        );
        assert_eq!(
            FetchError::network("timed out").to_string(),
            "Transient fetch failure: timed out"
        );

        let terminal = FetchError::Terminal {
            attempts: 3,
            last_error: Box::new(FetchError::network("down")),
        };
        assert_eq!(
            terminal.to_string(),
            "Gave up after 3 attempts: Transient fetch failure: down"
        );
    }

    #[test]
    fn test_serializes_with_code_tag() {
        let json = serde_json::to_value(FetchError::CredentialMissing).unwrap();
        assert_eq!(json["code"], "CREDENTIAL_MISSING");

        let json = serde_json::to_value(FetchError::http_status(404)).unwrap();
        assert_eq!(json["code"], "TRANSIENT");
        assert_eq!(json["detail"]["status"], 404);
    }
}
