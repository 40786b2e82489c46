//! Read-only data feed clients (weather, division events)

use artcc_common::config::DatafeedConfig;
use artcc_common::{Error, Result};
use serde::{Deserialize, Serialize};

/// One station's METAR
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metar {
    pub id: String,
    pub metar: String,
}

#[derive(Clone)]
pub struct DatafeedClient {
    http: reqwest::Client,
    config: DatafeedConfig,
}

impl DatafeedClient {
    pub fn new(http: reqwest::Client, config: DatafeedConfig) -> Self {
        Self { http, config }
    }

    /// METARs for a list of airports
    pub async fn fetch_metars(&self, airports: &[String]) -> Result<Vec<Metar>> {
        let stations = airports.join(",").to_uppercase();
        let url = format!("{}/{}?format=json", self.config.metar_base_url, stations);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::ExternalFetch(format!("metar fetch: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::ExternalFetch(format!("metar fetch returned {}", status)));
        }

        let metars: Vec<Metar> = response
            .json()
            .await
            .map_err(|e| Error::ExternalFetch(format!("metar response parse: {}", e)))?;
        Ok(metars)
    }

    /// Division event feed, passed through as raw JSON
    pub async fn fetch_division_events(&self) -> Result<serde_json::Value> {
        let response = self
            .http
            .get(&self.config.division_events_url)
            .send()
            .await
            .map_err(|e| Error::ExternalFetch(format!("events fetch: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::ExternalFetch(format!(
                "events fetch returned {}",
                status
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::ExternalFetch(format!("events response parse: {}", e)))?;
        Ok(body)
    }
}
