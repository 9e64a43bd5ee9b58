//! Shared HTTP client construction.

use crate::error::ConfigResult;

const USER_AGENT: &str = concat!("paneview/", env!("CARGO_PKG_VERSION"));

/// A client with the dashboard's user agent. No request timeout is set;
/// the transport's own limits apply.
pub fn build_client() -> ConfigResult<reqwest::Client> {
    Ok(reqwest::Client::builder().user_agent(USER_AGENT).build()?)
}
