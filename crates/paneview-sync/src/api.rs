//! # Resource Endpoints
//!
//! One GET per resource kind, signed with the session credential.
//!
//! ```text
//!   GET <base_url>/<path>?api-version=2016-10-01
//!                        &sp=%2Ftriggers%2Fmanual%2Frun
//!                        &sv=1.0
//!                        &sig=<credential>
//! ```
//!
//! Every failure here is [`FetchError::Transient`]; decoding the body into
//! records happens in the orchestrator.

use async_trait::async_trait;
use paneview_core::{FetchError, ResourceKind};
use tracing::debug;
use url::Url;

use crate::config::ResourceSettings;
use crate::error::{ConfigError, ConfigResult};
use crate::http::build_client;

#[async_trait]
pub trait ResourceApi: Send + Sync {
    /// Raw response body for `kind`.
    async fn fetch(&self, kind: ResourceKind, credential: &str) -> Result<Vec<u8>, FetchError>;
}

/// [`ResourceApi`] over HTTP.
pub struct HttpResourceApi {
    client: reqwest::Client,
    base_url: Url,
    settings: ResourceSettings,
}

impl HttpResourceApi {
    pub fn new(base_url: Url, settings: ResourceSettings) -> ConfigResult<Self> {
        Self::with_client(build_client()?, base_url, settings)
    }

    pub fn with_client(
        client: reqwest::Client,
        base_url: Url,
        settings: ResourceSettings,
    ) -> ConfigResult<Self> {
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidUrl {
                field: "resources.base_url",
                reason: format!("cannot be a base: {base_url}"),
            });
        }
        Ok(Self {
            client,
            base_url,
            settings,
        })
    }

    /// Full request URL for `kind`, including the signature.
    pub fn endpoint(&self, kind: ResourceKind, credential: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(self.settings.path(kind).split('/').filter(|s| !s.is_empty()));
        }
        url.query_pairs_mut()
            .append_pair("api-version", &self.settings.api_version)
            .append_pair("sp", &self.settings.trigger_path)
            .append_pair("sv", &self.settings.signature_version)
            .append_pair("sig", credential);
        url
    }
}

#[async_trait]
impl ResourceApi for HttpResourceApi {
    async fn fetch(&self, kind: ResourceKind, credential: &str) -> Result<Vec<u8>, FetchError> {
        let url = self.endpoint(kind, credential);
        debug!(%kind, path = url.path(), "Requesting resource");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::http_status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::network(e.to_string()))?;
        Ok(body.to_vec())
    }
}
