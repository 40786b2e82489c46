//! User store operations

use artcc_common::db::models::{Certification, Endorsement, Membership, User};
use artcc_common::{Error, Result};
use serde::Deserialize;
use sqlx::SqlitePool;
use uuid::Uuid;

/// Fields taken from the identity provider at login
#[derive(Debug, Clone)]
pub struct CreateUserParams {
    pub cid: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Raw identity payload JSON
    pub data: String,
}

pub async fn find_user(db: &SqlitePool, id: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(user)
}

pub async fn find_user_by_cid(db: &SqlitePool, cid: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE cid = ?")
        .bind(cid)
        .fetch_optional(db)
        .await?;
    Ok(user)
}

/// Create a user at the `basic` tier, or return the existing row for
/// this CID. Membership is never set here; only the reconciler moves it.
pub async fn create_user(db: &SqlitePool, params: &CreateUserParams) -> Result<User> {
    if let Some(existing) = find_user_by_cid(db, &params.cid).await? {
        return Ok(existing);
    }

    let id = Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO users (id, cid, first_name, last_name, email, membership, data)
         VALUES (?, ?, ?, ?, ?, 'basic', ?)",
    )
    .bind(&id)
    .bind(&params.cid)
    .bind(&params.first_name)
    .bind(&params.last_name)
    .bind(&params.email)
    .bind(&params.data)
    .execute(db)
    .await?;

    let user = find_user(db, &id)
        .await?
        .ok_or_else(|| artcc_common::Error::Internal("user vanished after insert".to_string()))?;
    Ok(user)
}

/// Refresh identity-derived fields on an existing user (login path)
pub async fn update_user_identity(
    db: &SqlitePool,
    cid: &str,
    params: &CreateUserParams,
) -> Result<Option<User>> {
    sqlx::query(
        "UPDATE users SET first_name = ?, last_name = ?, email = ?, data = ? WHERE cid = ?",
    )
    .bind(&params.first_name)
    .bind(&params.last_name)
    .bind(&params.email)
    .bind(&params.data)
    .bind(cid)
    .execute(db)
    .await?;

    find_user_by_cid(db, cid).await
}

/// Self-service profile fields
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProfileParams {
    pub preferred_name: String,
    #[serde(default)]
    pub pronouns: Option<String>,
}

/// Update the user-editable profile fields. Empty pronouns clear the
/// column rather than storing an empty string.
pub async fn update_profile(
    db: &SqlitePool,
    user_id: &str,
    params: &UpdateProfileParams,
) -> Result<User> {
    if params.preferred_name.trim().is_empty() {
        return Err(Error::InvalidInput("preferred name is required".to_string()));
    }
    let pronouns = params
        .pronouns
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty());

    sqlx::query("UPDATE users SET preferred_name = ?, pronouns = ? WHERE id = ?")
        .bind(params.preferred_name.trim())
        .bind(pronouns)
        .bind(user_id)
        .execute(db)
        .await?;

    find_user(db, user_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("user {}", user_id)))
}

pub async fn set_membership(db: &SqlitePool, user_id: &str, membership: Membership) -> Result<()> {
    sqlx::query("UPDATE users SET membership = ? WHERE id = ?")
        .bind(membership)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(())
}

/// Demotion tier change: back to community with initials cleared
pub async fn demote_to_community(db: &SqlitePool, user_id: &str) -> Result<()> {
    sqlx::query(
        "UPDATE users SET membership = 'community', operating_initials = NULL WHERE id = ?",
    )
    .bind(user_id)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn roles_for_user(db: &SqlitePool, user_id: &str) -> Result<Vec<String>> {
    let roles = sqlx::query_scalar::<_, String>("SELECT role FROM user_roles WHERE user_id = ?")
        .bind(user_id)
        .fetch_all(db)
        .await?;
    Ok(roles)
}

pub async fn certifications_for_user(db: &SqlitePool, user_id: &str) -> Result<Vec<Certification>> {
    let certs = sqlx::query_as::<_, Certification>(
        "SELECT * FROM user_certifications WHERE user_id = ? ORDER BY certification",
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(certs)
}

pub async fn endorsements_for_user(db: &SqlitePool, user_id: &str) -> Result<Vec<Endorsement>> {
    let endorsements = sqlx::query_as::<_, Endorsement>(
        "SELECT * FROM user_endorsements WHERE user_id = ? ORDER BY endorsement",
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(endorsements)
}
