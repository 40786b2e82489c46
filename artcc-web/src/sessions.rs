//! Login sessions
//!
//! The cookie carries an opaque random token; only its SHA-256 hash is
//! stored, so a leaked database cannot be replayed into live sessions.
//! Sessions last 30 days and slide forward when validated with less
//! than 15 days remaining.

use crate::users;
use artcc_common::db::models::{Session, User};
use artcc_common::{time, Result};
use axum::http::HeaderMap;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use tracing::{debug, warn};

pub const SESSION_COOKIE: &str = "session";
const SESSION_TTL_SECS: i64 = 30 * 24 * 3600;
const RENEW_THRESHOLD_SECS: i64 = 15 * 24 * 3600;

/// A validated session: the row, its user, and the user's roles
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub session: Session,
    pub user: User,
    pub roles: Vec<String>,
}

/// Generate a fresh opaque session token (cookie value)
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; 20];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Derive the stored session id from a cookie token
pub fn session_id_for_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    format!("{:x}", digest)
}

pub async fn create_session(db: &SqlitePool, token: &str, user_id: &str) -> Result<Session> {
    let session = Session {
        id: session_id_for_token(token),
        user_id: user_id.to_string(),
        expires_at: time::unix_now() + SESSION_TTL_SECS,
    };

    sqlx::query("INSERT INTO user_sessions (id, user_id, expires_at) VALUES (?, ?, ?)")
        .bind(&session.id)
        .bind(&session.user_id)
        .bind(session.expires_at)
        .execute(db)
        .await?;

    Ok(session)
}

/// Validate a cookie token. Expired and orphaned sessions are deleted
/// on detection and treated as "no session".
pub async fn validate_session_token(db: &SqlitePool, token: &str) -> Result<Option<AuthSession>> {
    let session_id = session_id_for_token(token);

    let Some(mut session) =
        sqlx::query_as::<_, Session>("SELECT * FROM user_sessions WHERE id = ?")
            .bind(&session_id)
            .fetch_optional(db)
            .await?
    else {
        return Ok(None);
    };

    let Some(user) = users::find_user(db, &session.user_id).await? else {
        // Session row references a deleted user: self-heal
        warn!(session_id = %session_id, "deleting orphaned session");
        invalidate_session(db, &session_id).await?;
        return Ok(None);
    };

    let now = time::unix_now();
    if now >= session.expires_at {
        debug!(session_id = %session_id, "session expired");
        invalidate_session(db, &session_id).await?;
        return Ok(None);
    }

    // Sliding renewal once under the threshold
    if now >= session.expires_at - RENEW_THRESHOLD_SECS {
        session.expires_at += SESSION_TTL_SECS;
        sqlx::query("UPDATE user_sessions SET expires_at = ? WHERE id = ?")
            .bind(session.expires_at)
            .bind(&session_id)
            .execute(db)
            .await?;
    }

    let roles = users::roles_for_user(db, &user.id).await?;

    Ok(Some(AuthSession {
        session,
        user,
        roles,
    }))
}

pub async fn invalidate_session(db: &SqlitePool, session_id: &str) -> Result<()> {
    sqlx::query("DELETE FROM user_sessions WHERE id = ?")
        .bind(session_id)
        .execute(db)
        .await?;
    Ok(())
}

/// Set-Cookie value establishing the session cookie
pub fn session_cookie(token: &str, expires_at: i64) -> String {
    let max_age = (expires_at - time::unix_now()).max(0);
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE, token, max_age
    )
}

/// Set-Cookie value clearing the session cookie
pub fn clear_session_cookie() -> String {
    format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", SESSION_COOKIE)
}

/// Extract a named cookie from request headers
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let header = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;
    for pair in header.split(';') {
        let mut parts = pair.trim().splitn(2, '=');
        if parts.next() == Some(name) {
            return parts.next().map(str::to_string);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::COOKIE;

    #[test]
    fn test_tokens_are_unique_and_url_safe() {
        let a = generate_session_token();
        let b = generate_session_token();
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_session_id_is_stable_sha256_hex() {
        let id = session_id_for_token("token");
        assert_eq!(id.len(), 64);
        assert_eq!(id, session_id_for_token("token"));
        assert_ne!(id, session_id_for_token("other"));
    }

    #[test]
    fn test_cookie_value_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, "a=1; session=abc123; b=2".parse().unwrap());
        assert_eq!(cookie_value(&headers, "session"), Some("abc123".to_string()));
        assert_eq!(cookie_value(&headers, "b"), Some("2".to_string()));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn test_session_cookie_format() {
        let cookie = session_cookie("tok", time::unix_now() + 100);
        assert!(cookie.starts_with("session=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));

        let cleared = clear_session_cookie();
        assert!(cleared.contains("Max-Age=0"));
    }

    async fn memory_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        artcc_common::db::create_schema(&pool).await.unwrap();
        pool
    }

    async fn seed_user(pool: &SqlitePool, id: &str) {
        sqlx::query(
            "INSERT INTO users (id, cid, first_name, last_name, email, membership)
             VALUES (?, ?, 'A', 'B', 'a@b.c', 'basic')",
        )
        .bind(id)
        .bind(id)
        .execute(pool)
        .await
        .unwrap();
    }

    async fn session_count(pool: &SqlitePool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM user_sessions")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_expired_session_is_deleted_on_validation() {
        let pool = memory_pool().await;
        seed_user(&pool, "u1").await;

        let token = generate_session_token();
        create_session(&pool, &token, "u1").await.unwrap();
        sqlx::query("UPDATE user_sessions SET expires_at = ?")
            .bind(time::unix_now() - 1)
            .execute(&pool)
            .await
            .unwrap();

        let result = validate_session_token(&pool, &token).await.unwrap();
        assert!(result.is_none());
        assert_eq!(session_count(&pool).await, 0);
    }

    #[tokio::test]
    async fn test_orphaned_session_is_deleted_on_validation() {
        let pool = memory_pool().await;

        let token = generate_session_token();
        // Session pointing at a user that does not exist
        sqlx::query("INSERT INTO user_sessions (id, user_id, expires_at) VALUES (?, 'ghost', ?)")
            .bind(session_id_for_token(&token))
            .bind(time::unix_now() + 1000)
            .execute(&pool)
            .await
            .unwrap();

        let result = validate_session_token(&pool, &token).await.unwrap();
        assert!(result.is_none());
        assert_eq!(session_count(&pool).await, 0);
    }

    #[tokio::test]
    async fn test_validation_slides_expiry_forward() {
        let pool = memory_pool().await;
        seed_user(&pool, "u1").await;

        let token = generate_session_token();
        create_session(&pool, &token, "u1").await.unwrap();
        // Under the renewal threshold
        let soon = time::unix_now() + 24 * 3600;
        sqlx::query("UPDATE user_sessions SET expires_at = ?")
            .bind(soon)
            .execute(&pool)
            .await
            .unwrap();

        let auth = validate_session_token(&pool, &token)
            .await
            .unwrap()
            .expect("session still valid");
        assert!(auth.session.expires_at > soon);
    }
}
