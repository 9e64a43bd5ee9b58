//! # Authentication Gateway
//!
//! Exchanges the shared secret for a credential with a server-assigned
//! expiry.
//!
//! ## Exchange
//! ```text
//!   POST <auth.url>  { "password": "<secret>" }
//!        │
//!        ├── 2xx  { "apiKey": "...", "expiresAt": 1717243200000,
//!        │          "access_token": "..." }              ──► AuthGrant
//!        │
//!        └── non-2xx / network error / malformed body    ──► RemoteRejected
//! ```
//!
//! `expiresAt` is epoch milliseconds. When a server sends a relative
//! `expires_in` (seconds) instead, it is resolved against the request time.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::clock::Clock;
use crate::error::{AuthError, AuthResult, ConfigResult};
use crate::http::build_client;

/// A successful secret exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthGrant {
    pub credential_token: String,
    pub bearer_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

#[async_trait]
pub trait AuthGateway: Send + Sync {
    async fn exchange(&self, secret: &str) -> AuthResult<AuthGrant>;
}

// =============================================================================
// HTTP Gateway
// =============================================================================

#[derive(Serialize)]
struct AuthRequest<'a> {
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    #[serde(rename = "apiKey", alias = "credentialToken", alias = "token", default)]
    api_key: Option<String>,
    #[serde(rename = "expiresAt", alias = "expires_at", default)]
    expires_at: Option<i64>,
    #[serde(default)]
    expires_in: Option<serde_json::Value>,
    #[serde(default)]
    access_token: Option<String>,
}

impl AuthResponse {
    fn into_grant(self, requested_at: DateTime<Utc>) -> AuthResult<AuthGrant> {
        let credential_token = self
            .api_key
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::RemoteRejected("response carried no credential".into()))?;

        let expires_at = match (self.expires_at, self.expires_in) {
            (Some(ms), _) => Utc
                .timestamp_millis_opt(ms)
                .single()
                .ok_or_else(|| AuthError::RemoteRejected(format!("invalid expiresAt: {ms}")))?,
            (None, Some(relative)) => requested_at + Duration::seconds(parse_seconds(&relative)?),
            (None, None) => {
                return Err(AuthError::RemoteRejected("response carried no expiry".into()))
            }
        };

        Ok(AuthGrant {
            credential_token,
            bearer_token: self.access_token.filter(|t| !t.is_empty()),
            expires_at,
        })
    }
}

fn parse_seconds(value: &serde_json::Value) -> AuthResult<i64> {
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed
        .filter(|secs| *secs > 0)
        .ok_or_else(|| AuthError::RemoteRejected(format!("invalid expires_in: {value}")))
}

/// [`AuthGateway`] over HTTP.
pub struct HttpAuthGateway {
    client: reqwest::Client,
    url: Url,
    clock: Arc<dyn Clock>,
}

impl HttpAuthGateway {
    pub fn new(url: Url, clock: Arc<dyn Clock>) -> ConfigResult<Self> {
        Ok(Self::with_client(build_client()?, url, clock))
    }

    pub fn with_client(client: reqwest::Client, url: Url, clock: Arc<dyn Clock>) -> Self {
        Self { client, url, clock }
    }
}

#[async_trait]
impl AuthGateway for HttpAuthGateway {
    async fn exchange(&self, secret: &str) -> AuthResult<AuthGrant> {
        let requested_at = self.clock.now();
        debug!(url = %self.url, "Exchanging secret for credential");

        let response = self
            .client
            .post(self.url.clone())
            .json(&AuthRequest { password: secret })
            .send()
            .await
            .map_err(|e| AuthError::RemoteRejected(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Authentication endpoint rejected the secret");
            return Err(AuthError::RemoteRejected(format!("HTTP {}", status.as_u16())));
        }

        let body: AuthResponse = response
            .json()
            .await
            .map_err(|e| AuthError::RemoteRejected(format!("malformed response: {e}")))?;

        body.into_grant(requested_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()))
    }

    async fn gateway(server: &MockServer) -> HttpAuthGateway {
        let url = Url::parse(&format!("{}/login", server.uri())).unwrap();
        HttpAuthGateway::new(url, clock()).unwrap()
    }

    #[tokio::test]
    async fn test_successful_exchange() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .and(body_json(serde_json::json!({ "password": "hunter2" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "apiKey": "sig-123",
                "expiresAt": 1_717_250_400_000_i64,
                "access_token": "bearer-456"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let grant = gateway(&server).await.exchange("hunter2").await.unwrap();

        assert_eq!(grant.credential_token, "sig-123");
        assert_eq!(grant.bearer_token.as_deref(), Some("bearer-456"));
        assert_eq!(grant.expires_at.timestamp_millis(), 1_717_250_400_000);
    }

    #[tokio::test]
    async fn test_relative_expiry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token": "sig",
                "expires_in": "3600"
            })))
            .mount(&server)
            .await;

        let grant = gateway(&server).await.exchange("pw").await.unwrap();

        assert_eq!(
            grant.expires_at,
            Utc.with_ymd_and_hms(2024, 6, 1, 13, 0, 0).unwrap()
        );
        assert_eq!(grant.bearer_token, None);
    }

    #[tokio::test]
    async fn test_non_success_status_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = gateway(&server).await.exchange("wrong").await.unwrap_err();
        assert_eq!(err, AuthError::RemoteRejected("HTTP 401".into()));
    }

    #[tokio::test]
    async fn test_malformed_response_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&server)
            .await;

        let err = gateway(&server).await.exchange("pw").await.unwrap_err();
        assert!(matches!(err, AuthError::RemoteRejected(_)));
    }

    #[tokio::test]
    async fn test_missing_expiry_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "apiKey": "sig" })),
            )
            .mount(&server)
            .await;

        let err = gateway(&server).await.exchange("pw").await.unwrap_err();
        assert_eq!(err, AuthError::RemoteRejected("response carried no expiry".into()));
    }
}
