//! Membership reconciliation
//!
//! Brings each user's membership tier, certifications, endorsements,
//! and externally managed roles into agreement with the controller
//! mirror. Safe to re-run: qualification grants are insert-or-ignore,
//! role grants are delete-then-insert of the derived set, and tier
//! writes are plain overwrites.
//!
//! Users are processed strictly one at a time. The initials allocator
//! reads the global set of assigned initials, so concurrent per-user
//! processing could hand two users the same pair.

pub mod certifications;
pub mod initials;
pub mod roles;

use crate::notify::{demotion_embed, promotion_embed, Notifier};
use crate::{roster, users};
use artcc_common::config::AppConfig;
use artcc_common::db::models::{Membership, RosterMember, User};
use artcc_common::Result;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;

/// Outcome of one bulk sync pass
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SyncSummary {
    pub promoted: usize,
    pub demoted: usize,
    /// Users whose tier changed this run
    pub synced: usize,
}

/// The membership reconciler. Holds the injected facility scope and
/// banned-initials list so tests can swap them out.
#[derive(Clone)]
pub struct MembershipService {
    db: SqlitePool,
    facility_id: String,
    banned_initials: Vec<String>,
    notifier: Notifier,
}

impl MembershipService {
    pub fn new(db: SqlitePool, config: &AppConfig, notifier: Notifier) -> Self {
        Self {
            db,
            facility_id: config.facility.id.clone(),
            banned_initials: config.facility.banned_initials.clone(),
            notifier,
        }
    }

    /// Bulk reconciliation against the current mirror.
    ///
    /// The mirror must already reflect the latest fetch; the demotion
    /// set is computed in one query before any writes so a user
    /// promoted later in the run cannot affect it.
    pub async fn sync_memberships(&self) -> Result<SyncSummary> {
        info!("starting bulk membership sync");

        // Demotion pass: controllers whose CID left the mirror
        let to_demote = sqlx::query_as::<_, User>(
            "SELECT * FROM users
             WHERE membership = 'controller'
               AND cid NOT IN (SELECT cid FROM roster_controllers)",
        )
        .fetch_all(&self.db)
        .await?;

        for user in &to_demote {
            info!(user_id = %user.id, cid = %user.cid, "demoting user off the roster");
            users::demote_to_community(&self.db, &user.id).await?;
            self.process_leaving_controller(user).await?;
        }

        // Promotion pass: mirrored CIDs not yet at controller tier
        let to_promote = sqlx::query_as::<_, User>(
            "SELECT u.* FROM users u
             JOIN roster_controllers rc ON rc.cid = u.cid
             WHERE u.membership != 'controller'",
        )
        .fetch_all(&self.db)
        .await?;

        for user in &to_promote {
            info!(user_id = %user.id, cid = %user.cid, "promoting user to controller");
            let Some(record) = roster::find_roster_record(&self.db, &user.cid).await? else {
                // Mirror changed underneath us; the next run repairs this
                continue;
            };
            self.promote(user, &record.member()?).await?;
        }

        // Steady-state pass: every controller still on the roster gets a
        // role refresh via the per-user sync. The already-controller
        // branch deliberately skips re-deriving certifications and
        // initials; those are one-time grants.
        let controllers =
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE membership = 'controller'")
                .fetch_all(&self.db)
                .await?;
        for user in &controllers {
            self.sync_user_membership(user).await?;
        }

        let summary = SyncSummary {
            promoted: to_promote.len(),
            demoted: to_demote.len(),
            synced: to_promote.len() + to_demote.len(),
        };
        info!(
            promoted = summary.promoted,
            demoted = summary.demoted,
            "bulk membership sync complete"
        );
        Ok(summary)
    }

    /// Reconcile a single user against the mirror. Used by the bulk
    /// pass and by the post-login hook, and idempotent under repeated
    /// invocation with unchanged external state.
    pub async fn sync_user_membership(&self, user: &User) -> Result<()> {
        let record = roster::find_roster_record(&self.db, &user.cid).await?;

        match record {
            Some(record) if user.membership != Membership::Controller => {
                info!(user_id = %user.id, "user is now a controller");
                self.promote(user, &record.member()?).await?;
            }
            None if user.membership == Membership::Controller => {
                info!(user_id = %user.id, "user is no longer a controller");
                users::demote_to_community(&self.db, &user.id).await?;
                self.process_leaving_controller(user).await?;
            }
            Some(record) => {
                // Already a controller and still rostered: refresh the
                // derived roles only
                let member = record.member()?;
                roles::grant_roles(&self.db, &user.id, Some(&member), &self.facility_id).await?;
            }
            None => {
                // Not rostered, not a controller: nothing to reconcile
            }
        }

        Ok(())
    }

    /// Tier change plus the "new controller" sub-flow. The caller
    /// supplies the roster record it already holds.
    async fn promote(&self, user: &User, member: &RosterMember) -> Result<()> {
        users::set_membership(&self.db, &user.id, Membership::Controller).await?;
        self.process_new_controller(user, member).await
    }

    /// Grant qualifications, initials, and roles, then notify
    async fn process_new_controller(&self, user: &User, member: &RosterMember) -> Result<()> {
        let grants = certifications::grant_initial_certifications_and_endorsements(
            &self.db,
            &user.id,
            &member.rating_short,
        )
        .await?;

        let initials =
            initials::grant_operating_initials(&self.db, user, &self.banned_initials).await?;

        roles::grant_roles(&self.db, &user.id, Some(member), &self.facility_id).await?;

        self.notifier
            .send_embed(&promotion_embed(
                user,
                &grants.certifications,
                &grants.endorsements,
                initials.as_deref(),
            ))
            .await;

        Ok(())
    }

    /// Revoke managed roles and notify. Certifications and endorsements
    /// are intentionally left in place on demotion.
    async fn process_leaving_controller(&self, user: &User) -> Result<()> {
        roles::grant_roles(&self.db, &user.id, None, &self.facility_id).await?;
        self.notifier.send_embed(&demotion_embed(user)).await;
        Ok(())
    }
}
