//! Roster endpoints and the sync trigger

use crate::api::error::ApiResult;
use crate::membership::certifications;
use crate::{roster, AppState};
use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use std::time::Instant;
use tracing::info;

/// GET /api/controllers
pub async fn list_controllers(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<roster::RosterItem>>> {
    let items = roster::list_roster(&state.db).await?;
    Ok(Json(items))
}

#[derive(Debug, Serialize)]
pub struct ProcessRosterResponse {
    pub message: String,
    pub roster_members_updated: u64,
    pub users_synced: usize,
    pub promoted_users: usize,
    pub demoted_users: usize,
    pub total_time_ms: u64,
    pub processed_at: String,
}

/// GET /triggers/process-roster
///
/// Fetch the authoritative roster, replace the mirror, reconcile every
/// user, and push certification expiries forward. A failed fetch aborts
/// before any local write.
pub async fn process_roster(
    State(state): State<AppState>,
) -> ApiResult<Json<ProcessRosterResponse>> {
    let started = Instant::now();

    let members = state
        .roster_api
        .fetch_roster(&state.config.facility.id, &state.config.roster_api.membership)
        .await?;
    let roster_members_updated = roster::replace_roster(&state.db, &members).await?;

    let summary = state.membership().sync_memberships().await?;
    certifications::refresh_certifications(&state.db).await?;

    let total_time_ms = started.elapsed().as_millis() as u64;
    info!(
        roster_members_updated,
        promoted = summary.promoted,
        demoted = summary.demoted,
        total_time_ms,
        "roster processing complete"
    );

    Ok(Json(ProcessRosterResponse {
        message: "roster processed".to_string(),
        roster_members_updated,
        users_synced: summary.synced,
        promoted_users: summary.promoted,
        demoted_users: summary.demoted,
        total_time_ms,
        processed_at: Utc::now().to_rfc3339(),
    }))
}
