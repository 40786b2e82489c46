//! Database row models and external payload types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Membership tier of a local user
///
/// Tier transitions happen only through the membership reconciler;
/// direct writes bypass the derived-state side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Membership {
    Basic,
    Community,
    Controller,
}

impl Membership {
    pub fn as_str(&self) -> &'static str {
        match self {
            Membership::Basic => "basic",
            Membership::Community => "community",
            Membership::Controller => "controller",
        }
    }
}

/// A community member, created on first successful login
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    pub cid: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub preferred_name: Option<String>,
    pub pronouns: Option<String>,
    pub membership: Membership,
    /// Unique two-letter identifier; None when the allocator was
    /// exhausted or the user is not a controller
    pub operating_initials: Option<String>,
    /// Raw identity-provider payload as fetched at last login
    pub data: String,
}

impl User {
    /// Preferred name if set, otherwise "First Last"
    pub fn display_name(&self) -> String {
        match &self.preferred_name {
            Some(name) => format!("{} {}", name, self.last_name),
            None => format!("{} {}", self.first_name, self.last_name),
        }
    }
}

/// A login session; `id` is hex(SHA-256(cookie token))
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub expires_at: i64,
}

/// One mirrored roster entry, replaced wholesale on every sync
#[derive(Debug, Clone, FromRow)]
pub struct RosterRecord {
    pub cid: String,
    /// Serialized [`RosterMember`] payload
    pub data: String,
}

impl RosterRecord {
    pub fn member(&self) -> serde_json::Result<RosterMember> {
        serde_json::from_str(&self.data)
    }
}

/// Roster entry as returned by the external facility-roster API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterMember {
    pub cid: i64,
    #[serde(default)]
    pub fname: String,
    #[serde(default)]
    pub lname: String,
    #[serde(default)]
    pub facility: String,
    #[serde(default)]
    pub rating: i64,
    #[serde(default)]
    pub rating_short: String,
    #[serde(default)]
    pub roles: Vec<RosterStaffRole>,
    #[serde(default)]
    pub membership: String,
}

/// A staff-role assignment scoped to a facility
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterStaffRole {
    #[serde(default)]
    pub cid: i64,
    pub facility: String,
    pub role: String,
}

/// One qualification grant, unique per (user, certification)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Certification {
    pub user_id: String,
    pub certification: String,
    pub created_at: i64,
    pub expires_at: Option<i64>,
}

/// Supplementary qualification, same shape as a certification
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Endorsement {
    pub user_id: String,
    pub endorsement: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub expires_at: Option<i64>,
}

/// One (user, role-code) grant
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RoleGrant {
    pub user_id: String,
    pub role: String,
}

/// Community event
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: String,
    pub name: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: String,
    pub roster_type: String,
    pub banner_url: String,
    pub description: String,
    pub start_time: i64,
    pub end_time: i64,
    pub is_published: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A controllable position attached to an event
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EventPosition {
    pub event_id: String,
    pub position: String,
    /// User the position is assigned to, if any
    pub user_id: Option<String>,
    /// JSON arrays of qualification codes
    pub required_certifications: String,
    pub required_endorsements: String,
    pub opens_at: i64,
    pub closes_at: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A sign-up request, unique per (event, user)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PositionRequest {
    pub event_id: String,
    pub user_id: String,
    pub position: String,
    pub created_at: i64,
}
