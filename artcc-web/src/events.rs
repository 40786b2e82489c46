//! Event scheduling and position sign-up

use artcc_common::db::models::{Event, EventPosition, PositionRequest};
use artcc_common::{time, Error, Result};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

pub const ROSTER_TYPE_NONE: &str = "none";
pub const ROSTER_TYPE_OPEN: &str = "open";
pub const ROSTER_TYPE_ASSIGNED: &str = "assigned";

const ROSTER_TYPES: &[&str] = &[ROSTER_TYPE_NONE, ROSTER_TYPE_OPEN, ROSTER_TYPE_ASSIGNED];

#[derive(Debug, Clone, Deserialize)]
pub struct CreateEventParams {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default = "default_roster_type")]
    pub roster_type: String,
    #[serde(default)]
    pub banner_url: String,
    #[serde(default)]
    pub description: String,
    pub start_time: i64,
    pub end_time: i64,
    #[serde(default)]
    pub is_published: bool,
}

fn default_roster_type() -> String {
    ROSTER_TYPE_NONE.to_string()
}

fn validate_params(params: &CreateEventParams) -> Result<()> {
    if params.name.trim().is_empty() {
        return Err(Error::InvalidInput("event name is required".to_string()));
    }
    if !ROSTER_TYPES.contains(&params.roster_type.as_str()) {
        return Err(Error::InvalidInput(format!(
            "unknown roster type: {}",
            params.roster_type
        )));
    }
    if params.end_time <= params.start_time {
        return Err(Error::InvalidInput(
            "event must end after it starts".to_string(),
        ));
    }
    Ok(())
}

/// Published events, or everything for event managers
pub async fn list_events(db: &SqlitePool, include_unpublished: bool) -> Result<Vec<Event>> {
    let sql = if include_unpublished {
        "SELECT * FROM events ORDER BY start_time"
    } else {
        "SELECT * FROM events WHERE is_published = 1 ORDER BY start_time"
    };
    let events = sqlx::query_as::<_, Event>(sql).fetch_all(db).await?;
    Ok(events)
}

pub async fn find_event(db: &SqlitePool, id: &str) -> Result<Option<Event>> {
    let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(event)
}

pub async fn create_event(db: &SqlitePool, params: &CreateEventParams) -> Result<Event> {
    validate_params(params)?;

    let id = Uuid::new_v4().to_string();
    let now = time::unix_now();
    sqlx::query(
        "INSERT INTO events
         (id, name, type, roster_type, banner_url, description,
          start_time, end_time, is_published, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&params.name)
    .bind(&params.kind)
    .bind(&params.roster_type)
    .bind(&params.banner_url)
    .bind(&params.description)
    .bind(params.start_time)
    .bind(params.end_time)
    .bind(params.is_published)
    .bind(now)
    .bind(now)
    .execute(db)
    .await?;

    info!(event_id = %id, name = %params.name, "created event");

    find_event(db, &id)
        .await?
        .ok_or_else(|| Error::Internal("event vanished after insert".to_string()))
}

pub async fn update_event(db: &SqlitePool, id: &str, params: &CreateEventParams) -> Result<Event> {
    validate_params(params)?;

    let result = sqlx::query(
        "UPDATE events SET name = ?, type = ?, roster_type = ?, banner_url = ?,
         description = ?, start_time = ?, end_time = ?, is_published = ?, updated_at = ?
         WHERE id = ?",
    )
    .bind(&params.name)
    .bind(&params.kind)
    .bind(&params.roster_type)
    .bind(&params.banner_url)
    .bind(&params.description)
    .bind(params.start_time)
    .bind(params.end_time)
    .bind(params.is_published)
    .bind(time::unix_now())
    .bind(id)
    .execute(db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("event {}", id)));
    }

    find_event(db, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("event {}", id)))
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePositionParams {
    pub position: String,
    #[serde(default)]
    pub required_certifications: Vec<String>,
    #[serde(default)]
    pub required_endorsements: Vec<String>,
    pub opens_at: i64,
    pub closes_at: i64,
}

/// Add a controllable position to an event's roster
pub async fn create_position(
    db: &SqlitePool,
    event_id: &str,
    params: &CreatePositionParams,
) -> Result<EventPosition> {
    if params.position.trim().is_empty() {
        return Err(Error::InvalidInput("position is required".to_string()));
    }

    let now = time::unix_now();
    let result = sqlx::query(
        "INSERT OR IGNORE INTO event_positions
         (event_id, position, required_certifications, required_endorsements,
          opens_at, closes_at, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(event_id)
    .bind(&params.position)
    .bind(serde_json::to_string(&params.required_certifications)?)
    .bind(serde_json::to_string(&params.required_endorsements)?)
    .bind(params.opens_at)
    .bind(params.closes_at)
    .bind(now)
    .bind(now)
    .execute(db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::Conflict(format!(
            "position {} already exists for this event",
            params.position
        )));
    }

    info!(event_id, position = %params.position, "created event position");
    find_position(db, event_id, &params.position)
        .await?
        .ok_or_else(|| Error::Internal("position vanished after insert".to_string()))
}

pub async fn find_position(
    db: &SqlitePool,
    event_id: &str,
    position: &str,
) -> Result<Option<EventPosition>> {
    let row = sqlx::query_as::<_, EventPosition>(
        "SELECT * FROM event_positions WHERE event_id = ? AND position = ?",
    )
    .bind(event_id)
    .bind(position)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Sign-up window: only a published, open-roster event accepts direct
/// position assignment, and only until 24 hours before start.
pub fn sign_up_closed(event: &Event) -> bool {
    let close_time = event.start_time - 24 * 3600;
    !event.is_published || event.roster_type != ROSTER_TYPE_OPEN || time::unix_now() >= close_time
}

/// Assign the signing-up user to an open position on the event roster
pub async fn assign_position(
    db: &SqlitePool,
    event: &Event,
    position: &str,
    user_id: &str,
) -> Result<EventPosition> {
    if sign_up_closed(event) {
        return Err(Error::InvalidInput(
            "event roster is not available for sign-up".to_string(),
        ));
    }

    let existing = find_position(db, &event.id, position)
        .await?
        .ok_or_else(|| Error::NotFound(format!("position {} on event {}", position, event.id)))?;
    if existing.user_id.is_some() {
        return Err(Error::Conflict(format!("position {} is taken", position)));
    }

    sqlx::query(
        "UPDATE event_positions SET user_id = ?, updated_at = ?
         WHERE event_id = ? AND position = ?",
    )
    .bind(user_id)
    .bind(time::unix_now())
    .bind(&event.id)
    .bind(position)
    .execute(db)
    .await?;

    info!(event_id = %event.id, position, user_id, "assigned event position");
    find_position(db, &event.id, position)
        .await?
        .ok_or_else(|| Error::NotFound(format!("position {}", position)))
}

/// Clear a position assignment
pub async fn unassign_position(
    db: &SqlitePool,
    event: &Event,
    position: &str,
) -> Result<EventPosition> {
    let result = sqlx::query(
        "UPDATE event_positions SET user_id = NULL, updated_at = ?
         WHERE event_id = ? AND position = ?",
    )
    .bind(time::unix_now())
    .bind(&event.id)
    .bind(position)
    .execute(db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!(
            "position {} on event {}",
            position, event.id
        )));
    }

    info!(event_id = %event.id, position, "cleared event position assignment");
    find_position(db, &event.id, position)
        .await?
        .ok_or_else(|| Error::NotFound(format!("position {}", position)))
}

pub async fn list_positions(db: &SqlitePool, event_id: &str) -> Result<Vec<EventPosition>> {
    let positions = sqlx::query_as::<_, EventPosition>(
        "SELECT * FROM event_positions WHERE event_id = ? ORDER BY position",
    )
    .bind(event_id)
    .fetch_all(db)
    .await?;
    Ok(positions)
}

pub async fn list_position_requests(
    db: &SqlitePool,
    event_id: &str,
) -> Result<Vec<PositionRequest>> {
    let requests = sqlx::query_as::<_, PositionRequest>(
        "SELECT * FROM event_position_requests WHERE event_id = ? ORDER BY created_at",
    )
    .bind(event_id)
    .fetch_all(db)
    .await?;
    Ok(requests)
}

/// Sign up for a position. Only allowed while the event is published
/// with an open roster; one request per (event, user).
pub async fn create_position_request(
    db: &SqlitePool,
    event: &Event,
    user_id: &str,
    position: &str,
) -> Result<PositionRequest> {
    if !event.is_published || event.roster_type != ROSTER_TYPE_OPEN {
        return Err(Error::InvalidInput(
            "event roster is not open for sign-up".to_string(),
        ));
    }
    if position.trim().is_empty() {
        return Err(Error::InvalidInput("position is required".to_string()));
    }

    let result = sqlx::query(
        "INSERT OR IGNORE INTO event_position_requests
         (event_id, user_id, position, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&event.id)
    .bind(user_id)
    .bind(position)
    .bind(time::unix_now())
    .execute(db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::Conflict(
            "user already requested a position for this event".to_string(),
        ));
    }

    let request = sqlx::query_as::<_, PositionRequest>(
        "SELECT * FROM event_position_requests WHERE event_id = ? AND user_id = ?",
    )
    .bind(&event.id)
    .bind(user_id)
    .fetch_one(db)
    .await?;

    info!(event_id = %event.id, user_id, position, "created position request");
    Ok(request)
}
