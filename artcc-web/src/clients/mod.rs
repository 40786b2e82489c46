//! HTTP clients for the external APIs this application consumes
//!
//! All fetches are read-only JSON with no retries: a failed fetch
//! aborts the operation that needed it, and the next scheduled run (or
//! the next login) provides the recovery.

pub mod connect;
pub mod datafeed;
pub mod roster_api;

use std::time::Duration;

const USER_AGENT: &str = concat!("artcc-web/", env!("CARGO_PKG_VERSION"));

/// Shared reqwest client: 30 s timeout, identified user agent
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap_or_default()
}
