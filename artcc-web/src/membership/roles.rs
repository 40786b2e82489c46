//! Role derivation from facility staff assignments
//!
//! External staff titles map to internal permission roles. The mapping
//! is many-to-one capable in both directions: one title can grant
//! several roles and several titles can grant the same role. Only the
//! roles in the managed set are ever written or deleted here; roles
//! granted out-of-band (a manual `admin`, say) are left alone.

use crate::permissions::{ROLE_ADMIN, ROLE_MANAGE_EVENTS};
use artcc_common::db::models::RosterMember;
use artcc_common::Result;
use sqlx::SqlitePool;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// External staff title -> internal permission roles.
///
/// An explicit ordered slice rather than a map: the managed set below is
/// derived from it and must be stable.
pub const EXTERNAL_ROLE_MAP: &[(&str, &[&str])] = &[
    ("EC", &[ROLE_MANAGE_EVENTS]),
    ("WM", &[ROLE_ADMIN]),
    ("ATM", &[ROLE_ADMIN]),
    ("DATM", &[ROLE_ADMIN]),
    ("TA", &[ROLE_ADMIN]),
];

/// Every internal role that roster sync owns (and may delete)
pub fn managed_roles() -> Vec<&'static str> {
    let set: BTreeSet<&'static str> = EXTERNAL_ROLE_MAP
        .iter()
        .flat_map(|(_, roles)| roles.iter().copied())
        .collect();
    set.into_iter().collect()
}

/// Map a roster record's facility-scoped staff titles to the internal
/// role set (deduplicated, deterministic order)
pub fn derive_roles(member: &RosterMember, facility_id: &str) -> Vec<String> {
    let set: BTreeSet<&'static str> = member
        .roles
        .iter()
        .filter(|r| r.facility == facility_id)
        .flat_map(|r| {
            EXTERNAL_ROLE_MAP
                .iter()
                .find(|(title, _)| *title == r.role)
                .map(|(_, roles)| roles.iter().copied())
                .into_iter()
                .flatten()
        })
        .collect();
    set.into_iter().map(str::to_string).collect()
}

/// Re-apply externally managed roles for one user.
///
/// Delete-then-insert keeps the grant idempotent and self-correcting: a
/// title dropped on the roster side disappears here on the next run with
/// no separate revoke path. With no roster record the deletion is the
/// entire effect.
pub async fn grant_roles(
    db: &SqlitePool,
    user_id: &str,
    member: Option<&RosterMember>,
    facility_id: &str,
) -> Result<Vec<String>> {
    let managed = managed_roles();
    let placeholders = vec!["?"; managed.len()].join(", ");
    let sql = format!(
        "DELETE FROM user_roles WHERE user_id = ? AND role IN ({})",
        placeholders
    );
    let mut query = sqlx::query(&sql).bind(user_id);
    for role in &managed {
        query = query.bind(role);
    }
    query.execute(db).await?;

    let Some(member) = member else {
        debug!(user_id, "no roster record; managed roles cleared");
        return Ok(Vec::new());
    };

    let roles = derive_roles(member, facility_id);
    if roles.is_empty() {
        return Ok(roles);
    }

    for role in &roles {
        sqlx::query("INSERT INTO user_roles (user_id, role) VALUES (?, ?)")
            .bind(user_id)
            .bind(role)
            .execute(db)
            .await?;
    }
    info!(user_id, roles = ?roles, "applied externally managed roles");

    Ok(roles)
}
