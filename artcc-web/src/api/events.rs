//! Event endpoints

use crate::api::error::{ApiError, ApiResult};
use crate::api::extract::{CurrentUser, MaybeUser};
use crate::permissions;
use crate::{events, AppState};
use artcc_common::db::models::{Event, EventPosition, PositionRequest};
use artcc_common::Error;
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

fn require_event_manager(roles: &[String]) -> Result<(), ApiError> {
    if permissions::can_manage_events(roles) {
        Ok(())
    } else {
        Err(ApiError::App(Error::Forbidden(
            "event management role required".to_string(),
        )))
    }
}

/// GET /api/events
///
/// Anonymous callers see published events only; event managers see
/// drafts as well.
pub async fn list_events(
    State(state): State<AppState>,
    MaybeUser(auth): MaybeUser,
) -> ApiResult<Json<Vec<Event>>> {
    let include_unpublished = auth
        .map(|a| permissions::can_manage_events(&a.roles))
        .unwrap_or(false);
    let events = events::list_events(&state.db, include_unpublished).await?;
    Ok(Json(events))
}

/// POST /api/events
pub async fn create_event(
    State(state): State<AppState>,
    CurrentUser(auth): CurrentUser,
    Json(params): Json<events::CreateEventParams>,
) -> ApiResult<Json<Event>> {
    require_event_manager(&auth.roles)?;
    let event = events::create_event(&state.db, &params).await?;
    Ok(Json(event))
}

async fn visible_event(
    state: &AppState,
    auth: Option<&crate::sessions::AuthSession>,
    id: &str,
) -> Result<Event, ApiError> {
    let event = events::find_event(&state.db, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("event {}", id)))?;

    // Drafts are indistinguishable from missing events for non-managers
    let manages = auth
        .map(|a| permissions::can_manage_events(&a.roles))
        .unwrap_or(false);
    if !event.is_published && !manages {
        return Err(ApiError::App(Error::NotFound(format!("event {}", id))));
    }
    Ok(event)
}

/// GET /api/events/:id
pub async fn get_event(
    State(state): State<AppState>,
    MaybeUser(auth): MaybeUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Event>> {
    let event = visible_event(&state, auth.as_ref(), &id).await?;
    Ok(Json(event))
}

/// PUT /api/events/:id
pub async fn update_event(
    State(state): State<AppState>,
    CurrentUser(auth): CurrentUser,
    Path(id): Path<String>,
    Json(params): Json<events::CreateEventParams>,
) -> ApiResult<Json<Event>> {
    require_event_manager(&auth.roles)?;
    let event = events::update_event(&state.db, &id, &params).await?;
    Ok(Json(event))
}

#[derive(Debug, Serialize)]
pub struct EventRoster {
    pub positions: Vec<EventPosition>,
    pub requests: Vec<PositionRequest>,
}

/// GET /api/events/:id/requests
pub async fn list_requests(
    State(state): State<AppState>,
    CurrentUser(auth): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<EventRoster>> {
    let event = visible_event(&state, Some(&auth), &id).await?;
    let positions = events::list_positions(&state.db, &event.id).await?;
    let requests = events::list_position_requests(&state.db, &event.id).await?;
    Ok(Json(EventRoster { positions, requests }))
}

/// POST /api/events/:id/positions
pub async fn create_position(
    State(state): State<AppState>,
    CurrentUser(auth): CurrentUser,
    Path(id): Path<String>,
    Json(params): Json<events::CreatePositionParams>,
) -> ApiResult<Json<EventPosition>> {
    require_event_manager(&auth.roles)?;
    let event = visible_event(&state, Some(&auth), &id).await?;
    let position = events::create_position(&state.db, &event.id, &params).await?;
    Ok(Json(position))
}

/// PUT /api/events/:id/positions/:position/assignment
///
/// Sign the current user up for an open position.
pub async fn assign_position(
    State(state): State<AppState>,
    CurrentUser(auth): CurrentUser,
    Path((id, position)): Path<(String, String)>,
) -> ApiResult<Json<EventPosition>> {
    let event = visible_event(&state, Some(&auth), &id).await?;
    let position = events::assign_position(&state.db, &event, &position, &auth.user.id).await?;
    Ok(Json(position))
}

/// DELETE /api/events/:id/positions/:position/assignment
///
/// Release a position. Allowed for the assignee and for event managers.
pub async fn unassign_position(
    State(state): State<AppState>,
    CurrentUser(auth): CurrentUser,
    Path((id, position)): Path<(String, String)>,
) -> ApiResult<Json<EventPosition>> {
    let event = visible_event(&state, Some(&auth), &id).await?;

    let existing = events::find_position(&state.db, &event.id, &position)
        .await?
        .ok_or_else(|| Error::NotFound(format!("position {} on event {}", position, id)))?;
    let own = existing.user_id.as_deref() == Some(auth.user.id.as_str());
    if !own && !permissions::can_manage_events(&auth.roles) {
        return Err(ApiError::App(Error::Forbidden(
            "position is assigned to another user".to_string(),
        )));
    }

    let position = events::unassign_position(&state.db, &event, &position).await?;
    Ok(Json(position))
}

#[derive(Debug, Deserialize)]
pub struct RequestPositionBody {
    pub position: String,
}

/// POST /api/events/:id/requests
pub async fn request_position(
    State(state): State<AppState>,
    CurrentUser(auth): CurrentUser,
    Path(id): Path<String>,
    Json(body): Json<RequestPositionBody>,
) -> ApiResult<Json<PositionRequest>> {
    let event = visible_event(&state, Some(&auth), &id).await?;
    let request =
        events::create_position_request(&state.db, &event, &auth.user.id, &body.position).await?;
    Ok(Json(request))
}
