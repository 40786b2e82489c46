//! Controller mirror store
//!
//! Local snapshot of the external facility roster, keyed by CID. The
//! whole table is replaced on every sync run; "is this user on the
//! roster" is then a plain key lookup.

use artcc_common::db::models::{Certification, RosterMember, RosterRecord, User};
use artcc_common::Result;
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::HashMap;
use tracing::info;

/// Replace the mirror with a freshly fetched roster.
///
/// Delete + insert run inside one transaction so readers never observe
/// the empty-table window. Returns the number of mirrored records.
pub async fn replace_roster(db: &SqlitePool, members: &[RosterMember]) -> Result<u64> {
    let mut tx = db.begin().await?;

    sqlx::query("DELETE FROM roster_controllers")
        .execute(&mut *tx)
        .await?;

    for member in members {
        sqlx::query("INSERT OR REPLACE INTO roster_controllers (cid, data) VALUES (?, ?)")
            .bind(member.cid.to_string())
            .bind(serde_json::to_string(member)?)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    info!(members = members.len(), "replaced controller mirror");
    Ok(members.len() as u64)
}

pub async fn find_roster_record(db: &SqlitePool, cid: &str) -> Result<Option<RosterRecord>> {
    let record =
        sqlx::query_as::<_, RosterRecord>("SELECT * FROM roster_controllers WHERE cid = ?")
            .bind(cid)
            .fetch_optional(db)
            .await?;
    Ok(record)
}

/// One roster listing entry: the mirrored controller plus the local
/// user (if they have logged in) and their certifications
#[derive(Debug, Serialize)]
pub struct RosterItem {
    pub controller: RosterMember,
    pub user: Option<User>,
    pub certifications: Vec<Certification>,
}

/// Roster listing: mirror joined with local users and certifications,
/// one entry per CID
pub async fn list_roster(db: &SqlitePool) -> Result<Vec<RosterItem>> {
    let records = sqlx::query_as::<_, RosterRecord>(
        "SELECT * FROM roster_controllers ORDER BY cid",
    )
    .fetch_all(db)
    .await?;

    let users = sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE cid IN (SELECT cid FROM roster_controllers)",
    )
    .fetch_all(db)
    .await?;
    let users_by_cid: HashMap<String, User> =
        users.into_iter().map(|u| (u.cid.clone(), u)).collect();

    let certifications = sqlx::query_as::<_, Certification>(
        "SELECT c.* FROM user_certifications c
         JOIN users u ON u.id = c.user_id
         WHERE u.cid IN (SELECT cid FROM roster_controllers)",
    )
    .fetch_all(db)
    .await?;
    let mut certs_by_user: HashMap<String, Vec<Certification>> = HashMap::new();
    for cert in certifications {
        certs_by_user.entry(cert.user_id.clone()).or_default().push(cert);
    }

    let mut items = Vec::with_capacity(records.len());
    for record in records {
        let controller = record.member()?;
        let user = users_by_cid.get(&record.cid).cloned();
        let certifications = user
            .as_ref()
            .and_then(|u| certs_by_user.remove(&u.id))
            .unwrap_or_default();
        items.push(RosterItem {
            controller,
            user,
            certifications,
        });
    }

    Ok(items)
}
