//! # Session Model
//!
//! The in-memory result of a successful login and its persisted shape.
//!
//! ## Validity
//! ```text
//!   is_authenticated ──┐
//!                      ├──► valid at `now`  ──► credential/bearer usable
//!   expires_at > now ──┘
//!
//!   expires_at <= now  ──► treated exactly like Session::unauthenticated()
//! ```
//!
//! Expiry dominates the stored flag: a session that still says
//! `is_authenticated = true` after its expiry hands out no tokens.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

// =============================================================================
// Session
// =============================================================================

/// The active (or absent) login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Session {
    /// Opaque token sent as the resource endpoints' signature.
    pub credential_token: Option<String>,
    /// Token used by the order lookup endpoint.
    pub bearer_token: Option<String>,
    #[ts(as = "Option<String>")]
    pub expires_at: Option<DateTime<Utc>>,
    pub is_authenticated: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::unauthenticated()
    }
}

impl Session {
    /// The canonical logged-out value.
    pub const fn unauthenticated() -> Self {
        Self {
            credential_token: None,
            bearer_token: None,
            expires_at: None,
            is_authenticated: false,
        }
    }

    pub fn authenticated(
        credential_token: impl Into<String>,
        bearer_token: Option<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            credential_token: Some(credential_token.into()),
            bearer_token,
            expires_at: Some(expires_at),
            is_authenticated: true,
        }
    }

    /// Authenticated and not yet expired.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.is_authenticated && self.expires_at.is_some_and(|at| at > now)
    }

    /// Claims to be authenticated but the expiry has passed (or is missing).
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.is_authenticated && !self.is_valid_at(now)
    }

    /// The resource credential, only while the session is valid.
    pub fn credential_at(&self, now: DateTime<Utc>) -> Option<&str> {
        usable(self.is_valid_at(now), self.credential_token.as_deref())
    }

    /// The order lookup token, only while the session is valid.
    pub fn bearer_at(&self, now: DateTime<Utc>) -> Option<&str> {
        usable(self.is_valid_at(now), self.bearer_token.as_deref())
    }

    /// Time left before expiry; `None` once invalid.
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Option<Duration> {
        if !self.is_valid_at(now) {
            return None;
        }
        self.expires_at.map(|at| at - now)
    }

    /// Collapses an invalid session to the unauthenticated value.
    pub fn normalized_at(self, now: DateTime<Utc>) -> Self {
        if self.is_valid_at(now) {
            self
        } else {
            Self::unauthenticated()
        }
    }
}

fn usable(valid: bool, token: Option<&str>) -> Option<&str> {
    token.filter(|t| valid && !t.is_empty())
}

// =============================================================================
// Persisted Record
// =============================================================================

/// The JSON record kept in durable storage under the key `"auth"`.
///
/// ```text
/// { "isAuthenticated": true, "apiKey": "...", "expiresAt": 1717243200000,
///   "access_token": "..." }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAuth {
    #[serde(default)]
    pub is_authenticated: bool,
    #[serde(default, alias = "credentialToken", skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Epoch milliseconds.
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(rename = "access_token", default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

impl From<&Session> for StoredAuth {
    fn from(session: &Session) -> Self {
        Self {
            is_authenticated: session.is_authenticated,
            api_key: session.credential_token.clone(),
            expires_at: session.expires_at,
            access_token: session.bearer_token.clone(),
        }
    }
}

impl StoredAuth {
    /// Rehydrates the record, or `None` when it is no longer valid at `now`.
    pub fn restore_at(self, now: DateTime<Utc>) -> Option<Session> {
        let session = Session {
            credential_token: self.api_key,
            bearer_token: self.access_token,
            expires_at: self.expires_at,
            is_authenticated: self.is_authenticated,
        };
        session.is_valid_at(now).then_some(session)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_valid_session_hands_out_tokens() {
        let now = noon();
        let session = Session::authenticated("sig", Some("bearer".into()), now + Duration::hours(1));

        assert!(session.is_valid_at(now));
        assert_eq!(session.credential_at(now), Some("sig"));
        assert_eq!(session.bearer_at(now), Some("bearer"));
        assert_eq!(session.remaining_at(now), Some(Duration::hours(1)));
    }

    #[test]
    fn test_expiry_dominates_stored_flag() {
        let now = noon();
        let session = Session::authenticated("sig", Some("bearer".into()), now - Duration::seconds(1));

        assert!(session.is_authenticated);
        assert!(!session.is_valid_at(now));
        assert!(session.is_expired_at(now));
        assert_eq!(session.credential_at(now), None);
        assert_eq!(session.bearer_at(now), None);
        assert_eq!(session.remaining_at(now), None);
        assert_eq!(session.normalized_at(now), Session::unauthenticated());
    }

    #[test]
    fn test_expiry_instant_is_already_expired() {
        let now = noon();
        let session = Session::authenticated("sig", None, now);
        assert!(!session.is_valid_at(now));
    }

    #[test]
    fn test_flag_without_expiry_is_invalid() {
        let session = Session {
            credential_token: Some("sig".into()),
            bearer_token: None,
            expires_at: None,
            is_authenticated: true,
        };
        assert!(!session.is_valid_at(noon()));
    }

    #[test]
    fn test_empty_token_is_not_usable() {
        let now = noon();
        let session = Session::authenticated("", None, now + Duration::hours(1));
        assert_eq!(session.credential_at(now), None);
    }

    #[test]
    fn test_stored_record_shape() {
        let expires = Utc.timestamp_millis_opt(1_717_243_200_000).unwrap();
        let session = Session::authenticated("sig", Some("bearer".into()), expires);

        let json = serde_json::to_value(StoredAuth::from(&session)).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "isAuthenticated": true,
                "apiKey": "sig",
                "expiresAt": 1_717_243_200_000_i64,
                "access_token": "bearer"
            })
        );
    }

    #[test]
    fn test_restore_only_future_records() {
        let now = noon();
        let record: StoredAuth = serde_json::from_value(serde_json::json!({
            "isAuthenticated": true,
            "credentialToken": "sig",
            "expiresAt": (now + Duration::minutes(5)).timestamp_millis()
        }))
        .unwrap();

        let restored = record.clone().restore_at(now).unwrap();
        assert_eq!(restored.credential_token.as_deref(), Some("sig"));
        assert_eq!(restored.bearer_token, None);

        assert_eq!(record.restore_at(now + Duration::minutes(5)), None);
    }
}
