//! artcc-web - facility membership and event web service
//!
//! Serves the OAuth login flow, the roster and event APIs, and the
//! roster-sync trigger that reconciles membership tiers.

use anyhow::Result;
use artcc_common::config::AppConfig;
use artcc_common::db::init_database;
use artcc_web::{build_router, AppState};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting artcc-web");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config_path = std::env::var("ARTCC_CONFIG").ok().map(PathBuf::from);
    let config = AppConfig::load(config_path.as_deref())?;
    info!("Facility: {} ({})", config.facility.name, config.facility.id);

    let db_path = PathBuf::from(&config.database.path);
    info!("Database: {}", db_path.display());
    let db = init_database(&db_path).await?;

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(db, config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Listening on http://{}", bind_addr);
    info!("Health check: http://{}/health", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
