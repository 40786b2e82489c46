//! Application configuration
//!
//! Loaded from a TOML file with environment-variable overrides for the
//! values that differ per deployment (secrets, URLs, database path).
//! Every field has a default so an empty config file is valid; tests
//! construct configs directly and override what they need (notably the
//! banned-initials list and facility identifier).

use crate::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub facility: FacilityConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub oauth: OauthConfig,
    pub roster_api: RosterApiConfig,
    pub datafeed: DatafeedConfig,
    pub discord: DiscordConfig,
}

/// Facility identity and membership-derived settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FacilityConfig {
    /// Facility identifier used to scope external staff-role assignments
    pub id: String,
    /// Human-readable facility name (notification embeds, page titles)
    pub name: String,
    /// Two-letter combinations never assigned as operating initials
    pub banned_initials: Vec<String>,
    /// Airports included in the METAR endpoint
    pub metar_airports: Vec<String>,
}

impl Default for FacilityConfig {
    fn default() -> Self {
        Self {
            id: "ZID".to_string(),
            name: "Indy Center".to_string(),
            banned_initials: vec!["SS".to_string(), "FU".to_string()],
            metar_airports: vec![
                "KCMH".to_string(),
                "KCVG".to_string(),
                "KDAY".to_string(),
                "KIND".to_string(),
                "KLEX".to_string(),
                "KSDF".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5780,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "artcc.db".to_string(),
        }
    }
}

/// OAuth identity provider settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OauthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub callback_url: String,
    /// Provider base URL; `/oauth/authorize`, `/oauth/token` and
    /// `/api/user` are appended to it.
    pub base_url: String,
}

impl Default for OauthConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            callback_url: "http://localhost:5780/login/connect/callback".to_string(),
            base_url: "https://auth.vatsim.net".to_string(),
        }
    }
}

/// External facility-roster API settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RosterApiConfig {
    pub base_url: String,
    /// Roster membership filter: `home`, `visit`, or `both`
    pub membership: String,
}

impl Default for RosterApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.vatusa.net".to_string(),
            membership: "both".to_string(),
        }
    }
}

/// Read-only data feed endpoints (weather, division events)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatafeedConfig {
    pub metar_base_url: String,
    pub division_events_url: String,
}

impl Default for DatafeedConfig {
    fn default() -> Self {
        Self {
            metar_base_url: "https://metar.vatsim.net".to_string(),
            division_events_url: "https://my.vatsim.net/api/v2/events/view/division/USA"
                .to_string(),
        }
    }
}

/// Notification sink settings; no webhook URL disables notifications
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct DiscordConfig {
    pub webhook_url: Option<String>,
}

impl AppConfig {
    /// Load configuration from a TOML file, then apply environment
    /// overrides. A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) if p.exists() => {
                let contents = std::fs::read_to_string(p)?;
                toml::from_str(&contents)
                    .map_err(|e| Error::Config(format!("{}: {}", p.display(), e)))?
            }
            _ => AppConfig::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Environment variables win over file values (deploy-time secrets)
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("ARTCC_DATABASE_PATH") {
            self.database.path = v;
        }
        if let Ok(v) = std::env::var("CONNECT_CLIENT_ID") {
            self.oauth.client_id = v;
        }
        if let Ok(v) = std::env::var("CONNECT_CLIENT_SECRET") {
            self.oauth.client_secret = v;
        }
        if let Ok(v) = std::env::var("CONNECT_CALLBACK_URL") {
            self.oauth.callback_url = v;
        }
        if let Ok(v) = std::env::var("CONNECT_BASE_URL") {
            self.oauth.base_url = v;
        }
        if let Ok(v) = std::env::var("ROSTER_API_BASE_URL") {
            self.roster_api.base_url = v;
        }
        if let Ok(v) = std::env::var("DISCORD_WEBHOOK_URL") {
            self.discord.webhook_url = Some(v);
        }
    }
}
