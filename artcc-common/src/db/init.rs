//! Database initialization
//!
//! Creates the SQLite database on first run and brings the schema up
//! idempotently (`CREATE TABLE IF NOT EXISTS`), so startup never needs a
//! separate migration step.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection pool and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL mode allows concurrent readers with one writer
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create all tables (idempotent - safe to call multiple times)
///
/// Public so integration tests can build the schema on an in-memory pool.
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_users_table(pool).await?;
    create_user_sessions_table(pool).await?;
    create_roster_controllers_table(pool).await?;
    create_user_certifications_table(pool).await?;
    create_user_endorsements_table(pool).await?;
    create_user_roles_table(pool).await?;
    create_events_table(pool).await?;
    create_event_positions_table(pool).await?;
    create_event_position_requests_table(pool).await?;
    Ok(())
}

async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            cid TEXT NOT NULL UNIQUE,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            email TEXT NOT NULL,
            preferred_name TEXT,
            pronouns TEXT,
            membership TEXT NOT NULL CHECK (membership IN ('basic', 'community', 'controller')),
            operating_initials TEXT,
            data TEXT NOT NULL DEFAULT '{}'
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Uniqueness only applies to assigned initials; NULLs may repeat
    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_users_operating_initials
         ON users (operating_initials) WHERE operating_initials IS NOT NULL",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_user_sessions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_sessions (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            expires_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_roster_controllers_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS roster_controllers (
            cid TEXT PRIMARY KEY,
            data TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_user_certifications_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_certifications (
            user_id TEXT NOT NULL,
            certification TEXT NOT NULL,
            created_at INTEGER NOT NULL DEFAULT (unixepoch()),
            expires_at INTEGER,
            UNIQUE (user_id, certification)
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_user_endorsements_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_endorsements (
            user_id TEXT NOT NULL,
            endorsement TEXT NOT NULL,
            created_at INTEGER NOT NULL DEFAULT (unixepoch()),
            updated_at INTEGER NOT NULL DEFAULT (unixepoch()),
            expires_at INTEGER,
            UNIQUE (user_id, endorsement)
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_user_roles_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_roles (
            user_id TEXT NOT NULL,
            role TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_events_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS events (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            type TEXT NOT NULL,
            roster_type TEXT NOT NULL DEFAULT 'none'
                CHECK (roster_type IN ('none', 'open', 'assigned')),
            banner_url TEXT NOT NULL DEFAULT '',
            description TEXT NOT NULL DEFAULT '',
            start_time INTEGER NOT NULL,
            end_time INTEGER NOT NULL,
            is_published INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL DEFAULT (unixepoch()),
            updated_at INTEGER NOT NULL DEFAULT (unixepoch())
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_event_positions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS event_positions (
            event_id TEXT NOT NULL,
            position TEXT NOT NULL,
            user_id TEXT,
            required_certifications TEXT NOT NULL DEFAULT '[]',
            required_endorsements TEXT NOT NULL DEFAULT '[]',
            opens_at INTEGER NOT NULL,
            closes_at INTEGER NOT NULL,
            created_at INTEGER NOT NULL DEFAULT (unixepoch()),
            updated_at INTEGER NOT NULL DEFAULT (unixepoch()),
            UNIQUE (event_id, position)
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_event_position_requests_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS event_position_requests (
            event_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            position TEXT NOT NULL,
            created_at INTEGER NOT NULL DEFAULT (unixepoch()),
            UNIQUE (event_id, user_id)
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}
