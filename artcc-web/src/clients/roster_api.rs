//! Facility-roster API client

use artcc_common::db::models::RosterMember;
use artcc_common::{Error, Result};
use serde::Deserialize;
use tracing::{error, info};

#[derive(Debug, Deserialize)]
struct RosterResponse {
    data: Vec<RosterMember>,
}

#[derive(Clone)]
pub struct RosterApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl RosterApiClient {
    pub fn new(http: reqwest::Client, base_url: String) -> Self {
        Self { http, base_url }
    }

    /// Fetch the authoritative roster for a facility.
    ///
    /// `membership` filters to `home`, `visit`, or `both`. Any network
    /// or non-2xx failure aborts the caller's sync cycle; nothing is
    /// committed from a failed fetch.
    pub async fn fetch_roster(
        &self,
        facility_id: &str,
        membership: &str,
    ) -> Result<Vec<RosterMember>> {
        let url = format!(
            "{}/facility/{}/roster/{}",
            self.base_url, facility_id, membership
        );

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::ExternalFetch(format!("roster fetch: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            error!(%status, %url, "roster fetch returned error status");
            return Err(Error::ExternalFetch(format!(
                "roster fetch returned {}",
                status
            )));
        }

        let body: RosterResponse = response
            .json()
            .await
            .map_err(|e| Error::ExternalFetch(format!("roster response parse: {}", e)))?;

        info!(members = body.data.len(), facility_id, "fetched roster");
        Ok(body.data)
    }
}
