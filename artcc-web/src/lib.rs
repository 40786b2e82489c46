//! artcc-web library - membership and event management web service
//!
//! Authenticates members against the external identity provider,
//! mirrors the facility roster, reconciles membership tiers, and serves
//! the event and roster APIs.

use crate::clients::connect::ConnectClient;
use crate::clients::datafeed::DatafeedClient;
use crate::clients::roster_api::RosterApiClient;
use crate::membership::MembershipService;
use crate::notify::Notifier;
use artcc_common::config::AppConfig;
use axum::routing::{delete, get, post, put};
use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod clients;
pub mod events;
pub mod membership;
pub mod notify;
pub mod permissions;
pub mod roster;
pub mod sessions;
pub mod users;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub roster_api: RosterApiClient,
    pub connect: ConnectClient,
    pub datafeed: DatafeedClient,
    pub notifier: Notifier,
}

impl AppState {
    pub fn new(db: SqlitePool, config: AppConfig) -> Self {
        let http = clients::http_client();
        let notifier = Notifier::new(config.discord.webhook_url.clone());
        Self {
            roster_api: RosterApiClient::new(http.clone(), config.roster_api.base_url.clone()),
            connect: ConnectClient::new(http.clone(), config.oauth.clone()),
            datafeed: DatafeedClient::new(http, config.datafeed.clone()),
            notifier,
            config: Arc::new(config),
            db,
        }
    }

    /// The membership reconciler bound to this state
    pub fn membership(&self) -> MembershipService {
        MembershipService::new(self.db.clone(), &self.config, self.notifier.clone())
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(api::health::health_check))
        .route("/login/connect", get(api::login::login))
        .route("/login/connect/callback", get(api::login::callback))
        .route("/logout", post(api::login::logout))
        .route("/triggers/process-roster", get(api::roster::process_roster))
        .route("/api/controllers", get(api::roster::list_controllers))
        .route("/api/session", get(api::session::current_session))
        .route("/api/profile", put(api::session::update_profile))
        .route("/api/weather", get(api::weather::metars))
        .route("/api/division-events", get(api::weather::division_events))
        .route(
            "/api/events",
            get(api::events::list_events).post(api::events::create_event),
        )
        .route(
            "/api/events/:id",
            get(api::events::get_event).put(api::events::update_event),
        )
        .route(
            "/api/events/:id/requests",
            get(api::events::list_requests).post(api::events::request_position),
        )
        .route(
            "/api/events/:id/positions",
            post(api::events::create_position),
        )
        .route(
            "/api/events/:id/positions/:position/assignment",
            put(api::events::assign_position).delete(api::events::unassign_position),
        )
        .route(
            "/api/users/:id/certifications/:code",
            delete(api::admin::revoke_certification),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
