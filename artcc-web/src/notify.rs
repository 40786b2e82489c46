//! Discord webhook notification sink
//!
//! Best-effort, fire-and-forget: delivery failures are logged and never
//! propagate into the reconciliation that triggered them. No configured
//! webhook URL disables the sink entirely.

use artcc_common::db::models::User;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

const WEBHOOK_USERNAME: &str = "Membership Bot";
const COLOR_PROMOTION: u32 = 0x57f287;
const COLOR_DEMOTION: u32 = 0xed4245;

#[derive(Debug, Clone, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

/// A Discord message embed
#[derive(Debug, Clone, Serialize)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub color: u32,
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    username: &'a str,
    embeds: Vec<&'a Embed>,
}

#[derive(Clone)]
pub struct Notifier {
    http: reqwest::Client,
    webhook_url: Option<String>,
}

impl Notifier {
    pub fn new(webhook_url: Option<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self { http, webhook_url }
    }

    /// Disabled sink for tests and webhook-less deployments
    pub fn disabled() -> Self {
        Self::new(None)
    }

    /// Post one embed to the webhook. Never fails the caller.
    pub async fn send_embed(&self, embed: &Embed) {
        let Some(url) = &self.webhook_url else {
            debug!(title = %embed.title, "notification sink disabled; dropping embed");
            return;
        };

        let payload = WebhookPayload {
            username: WEBHOOK_USERNAME,
            embeds: vec![embed],
        };

        match self.http.post(url).json(&payload).send().await {
            Ok(response) if !response.status().is_success() => {
                warn!(status = %response.status(), "notification delivery rejected");
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "notification delivery failed");
            }
        }
    }
}

/// Embed announcing a promotion, carrying the granted items
pub fn promotion_embed(
    user: &User,
    certifications: &[&str],
    endorsements: &[&str],
    initials: Option<&str>,
) -> Embed {
    let list = |items: &[&str]| {
        if items.is_empty() {
            "None".to_string()
        } else {
            items.join(", ")
        }
    };

    Embed {
        title: "New Controller".to_string(),
        description: format!("{} ({}) has joined the roster.", user.display_name(), user.cid),
        color: COLOR_PROMOTION,
        fields: vec![
            EmbedField {
                name: "Certifications".to_string(),
                value: list(certifications),
                inline: true,
            },
            EmbedField {
                name: "Endorsements".to_string(),
                value: list(endorsements),
                inline: true,
            },
            EmbedField {
                name: "Operating Initials".to_string(),
                value: initials.unwrap_or("Unassigned").to_string(),
                inline: true,
            },
        ],
        footer: Some(EmbedFooter {
            text: format!("CID {}", user.cid),
        }),
        timestamp: Some(artcc_common::time::now().to_rfc3339()),
    }
}

/// Embed announcing a demotion off the roster
pub fn demotion_embed(user: &User) -> Embed {
    Embed {
        title: "Controller Removed".to_string(),
        description: format!(
            "{} ({}) is no longer on the roster.",
            user.display_name(),
            user.cid
        ),
        color: COLOR_DEMOTION,
        fields: Vec::new(),
        footer: Some(EmbedFooter {
            text: format!("CID {}", user.cid),
        }),
        timestamp: Some(artcc_common::time::now().to_rfc3339()),
    }
}
