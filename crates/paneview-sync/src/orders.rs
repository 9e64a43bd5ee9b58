//! Order history lookup, gated on the session's bearer token.
//!
//! ```text
//!   POST <orders.url>  { "token": "<bearer>", "customerCodes": ["C-1", ...] }
//!        └── 2xx ──► OrderResponse { Records: [ { CustomerCode, Shipper: [...] } ] }
//! ```
//!
//! Unlike resource loads this is an on-demand call: a single attempt, no
//! caching.

use std::sync::Arc;

use paneview_core::types::OrderResponse;
use paneview_core::{FetchError, Session};
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::clock::Clock;
use crate::error::ConfigResult;
use crate::http::build_client;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderRequest<'a> {
    token: &'a str,
    customer_codes: &'a [String],
}

pub struct OrderClient {
    client: reqwest::Client,
    url: Url,
    clock: Arc<dyn Clock>,
}

impl OrderClient {
    pub fn new(url: Url, clock: Arc<dyn Clock>) -> ConfigResult<Self> {
        Ok(Self {
            client: build_client()?,
            url,
            clock,
        })
    }

    /// Orders for `customer_codes`. An expired session or one without a
    /// bearer token fails with [`FetchError::CredentialMissing`] before any
    /// request is sent.
    pub async fn customer_orders(
        &self,
        session: &Session,
        customer_codes: &[String],
    ) -> Result<OrderResponse, FetchError> {
        let Some(token) = session.bearer_at(self.clock.now()) else {
            warn!("Order lookup skipped: no bearer token");
            return Err(FetchError::CredentialMissing);
        };

        debug!(codes = customer_codes.len(), "Looking up customer orders");
        let response = self
            .client
            .post(self.url.clone())
            .json(&OrderRequest {
                token,
                customer_codes,
            })
            .send()
            .await
            .map_err(|e| FetchError::network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::http_status(status.as_u16()));
        }

        response
            .json::<OrderResponse>()
            .await
            .map_err(|e| FetchError::network(format!("malformed order response: {e}")))
    }
}
