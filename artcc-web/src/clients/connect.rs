//! OAuth identity provider client
//!
//! Handles the authorize-redirect URL, the code-for-token exchange, and
//! the identity fetch that follows a successful exchange.

use artcc_common::config::OauthConfig;
use artcc_common::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Identity claims as returned by the provider's user endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityUser {
    pub cid: String,
    pub personal: IdentityPersonal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityPersonal {
    pub name_first: String,
    pub name_last: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
struct IdentityResponse {
    data: IdentityUser,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Clone)]
pub struct ConnectClient {
    http: reqwest::Client,
    config: OauthConfig,
}

impl ConnectClient {
    pub fn new(http: reqwest::Client, config: OauthConfig) -> Self {
        Self { http, config }
    }

    /// Provider authorize URL carrying our state value
    pub fn authorize_url(&self, state: &str) -> String {
        format!(
            "{}/oauth/authorize?client_id={}&redirect_uri={}&response_type=code&scope=full_name+email&state={}",
            self.config.base_url, self.config.client_id, self.config.callback_url, state
        )
    }

    /// Exchange an authorization code for an access token
    pub async fn exchange_code(&self, code: &str) -> Result<String> {
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.callback_url.as_str()),
            ("code", code),
        ];

        let response = self
            .http
            .post(format!("{}/oauth/token", self.config.base_url))
            .form(&params)
            .send()
            .await
            .map_err(|e| Error::ExternalFetch(format!("token exchange: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::ExternalFetch(format!(
                "token exchange returned {}",
                status
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::ExternalFetch(format!("token response parse: {}", e)))?;

        Ok(body.access_token)
    }

    /// Fetch the authenticated user's identity claims
    pub async fn fetch_user(&self, access_token: &str) -> Result<IdentityUser> {
        debug!("fetching user identity from provider");

        let response = self
            .http
            .get(format!("{}/api/user", self.config.base_url))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| Error::ExternalFetch(format!("identity fetch: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::ExternalFetch(format!(
                "identity fetch returned {}",
                status
            )));
        }

        let body: IdentityResponse = response
            .json()
            .await
            .map_err(|e| Error::ExternalFetch(format!("identity response parse: {}", e)))?;

        Ok(body.data)
    }
}
