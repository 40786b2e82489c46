//! Integration tests for the membership reconciler
//!
//! Each test runs against an in-memory database with the real schema,
//! driving the reconciler through roster changes and asserting the
//! resulting tiers, qualifications, initials, and roles.

use artcc_common::config::AppConfig;
use artcc_common::db::create_schema;
use artcc_common::db::models::{Membership, RosterMember, RosterStaffRole, User};
use artcc_web::membership::MembershipService;
use artcc_web::notify::Notifier;
use artcc_web::users::{self, CreateUserParams};
use artcc_web::roster;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

async fn test_pool() -> SqlitePool {
    // One connection: every pooled connection to :memory: would
    // otherwise open its own empty database
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory database");
    create_schema(&pool).await.expect("schema");
    pool
}

fn service(pool: &SqlitePool) -> MembershipService {
    MembershipService::new(pool.clone(), &AppConfig::default(), Notifier::disabled())
}

async fn seed_user(pool: &SqlitePool, cid: &str, first: &str, last: &str) -> User {
    users::create_user(
        pool,
        &CreateUserParams {
            cid: cid.to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: format!("{}@example.com", cid),
            data: "{}".to_string(),
        },
    )
    .await
    .expect("create user")
}

fn member(cid: i64, first: &str, last: &str, rating_short: &str) -> RosterMember {
    RosterMember {
        cid,
        fname: first.to_string(),
        lname: last.to_string(),
        facility: "ZID".to_string(),
        rating: 0,
        rating_short: rating_short.to_string(),
        roles: vec![],
        membership: "home".to_string(),
    }
}

fn member_with_role(
    cid: i64,
    first: &str,
    last: &str,
    rating_short: &str,
    facility: &str,
    role: &str,
) -> RosterMember {
    let mut m = member(cid, first, last, rating_short);
    m.roles = vec![RosterStaffRole {
        cid,
        facility: facility.to_string(),
        role: role.to_string(),
    }];
    m
}

async fn fetch_user(pool: &SqlitePool, id: &str) -> User {
    users::find_user(pool, id).await.expect("query").expect("user exists")
}

async fn cert_codes(pool: &SqlitePool, user_id: &str) -> Vec<String> {
    users::certifications_for_user(pool, user_id)
        .await
        .expect("certs")
        .into_iter()
        .map(|c| c.certification)
        .collect()
}

async fn endorsement_codes(pool: &SqlitePool, user_id: &str) -> Vec<String> {
    users::endorsements_for_user(pool, user_id)
        .await
        .expect("endorsements")
        .into_iter()
        .map(|e| e.endorsement)
        .collect()
}

#[tokio::test]
async fn test_s1_promotion_grants_everything() {
    let pool = test_pool().await;
    let user = seed_user(&pool, "123456", "Anne", "Smith").await;

    roster::replace_roster(&pool, &[member(123456, "Anne", "Smith", "S1")])
        .await
        .expect("mirror");

    let summary = service(&pool).sync_memberships().await.expect("sync");
    assert_eq!(summary.promoted, 1);
    assert_eq!(summary.demoted, 0);
    assert_eq!(summary.synced, 1);

    let user = fetch_user(&pool, &user.id).await;
    assert_eq!(user.membership, Membership::Controller);
    assert_eq!(user.operating_initials.as_deref(), Some("SH"));
    assert_eq!(cert_codes(&pool, &user.id).await, vec!["GND"]);
    assert_eq!(endorsement_codes(&pool, &user.id).await, vec!["S-GND"]);
    assert!(users::roles_for_user(&pool, &user.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_c1_promotion_gets_center_and_companion_endorsement() {
    let pool = test_pool().await;
    let user = seed_user(&pool, "777777", "Rita", "Jones").await;

    roster::replace_roster(&pool, &[member(777777, "Rita", "Jones", "C1")])
        .await
        .expect("mirror");
    service(&pool).sync_memberships().await.expect("sync");

    assert_eq!(cert_codes(&pool, &user.id).await, vec!["CTR"]);
    assert_eq!(endorsement_codes(&pool, &user.id).await, vec!["T2-CTR"]);
}

#[tokio::test]
async fn test_sync_is_idempotent() {
    let pool = test_pool().await;
    let user = seed_user(&pool, "123456", "Anne", "Smith").await;

    roster::replace_roster(&pool, &[member(123456, "Anne", "Smith", "S2")])
        .await
        .expect("mirror");

    let svc = service(&pool);
    svc.sync_memberships().await.expect("first sync");
    let after_first = fetch_user(&pool, &user.id).await;
    let certs_first = cert_codes(&pool, &user.id).await;

    let summary = svc.sync_memberships().await.expect("second sync");
    assert_eq!(summary.promoted, 0);
    assert_eq!(summary.demoted, 0);

    let after_second = fetch_user(&pool, &user.id).await;
    assert_eq!(after_second.membership, after_first.membership);
    assert_eq!(after_second.operating_initials, after_first.operating_initials);
    assert_eq!(cert_codes(&pool, &user.id).await, certs_first);
}

#[tokio::test]
async fn test_demotion_clears_initials_and_managed_roles_only() {
    let pool = test_pool().await;
    let user = seed_user(&pool, "123456", "Anne", "Smith").await;

    roster::replace_roster(
        &pool,
        &[member_with_role(123456, "Anne", "Smith", "S1", "ZID", "EC")],
    )
    .await
    .expect("mirror");

    let svc = service(&pool);
    svc.sync_memberships().await.expect("promote");
    assert_eq!(
        users::roles_for_user(&pool, &user.id).await.unwrap(),
        vec!["events:manage"]
    );

    // A manually granted role outside the managed set must survive
    sqlx::query("INSERT INTO user_roles (user_id, role) VALUES (?, 'moderator')")
        .bind(&user.id)
        .execute(&pool)
        .await
        .expect("manual role");

    roster::replace_roster(&pool, &[]).await.expect("empty mirror");
    let summary = svc.sync_memberships().await.expect("demote");
    assert_eq!(summary.demoted, 1);

    let user_row = fetch_user(&pool, &user.id).await;
    assert_eq!(user_row.membership, Membership::Community);
    assert_eq!(user_row.operating_initials, None);

    let roles = users::roles_for_user(&pool, &user.id).await.unwrap();
    assert_eq!(roles, vec!["moderator"]);

    // Qualifications are retained through demotion
    assert_eq!(cert_codes(&pool, &user.id).await, vec!["GND"]);
    assert_eq!(endorsement_codes(&pool, &user.id).await, vec!["S-GND"]);
}

#[tokio::test]
async fn test_initials_are_unique_across_users() {
    let pool = test_pool().await;
    let anne = seed_user(&pool, "100001", "Anne", "Smith").await;
    let bob = seed_user(&pool, "100002", "Bob", "Smith").await;

    roster::replace_roster(
        &pool,
        &[
            member(100001, "Anne", "Smith", "S1"),
            member(100002, "Bob", "Smith", "S1"),
        ],
    )
    .await
    .expect("mirror");
    service(&pool).sync_memberships().await.expect("sync");

    let anne_oi = fetch_user(&pool, &anne.id).await.operating_initials;
    let bob_oi = fetch_user(&pool, &bob.id).await.operating_initials;
    assert!(anne_oi.is_some());
    assert!(bob_oi.is_some());
    assert_ne!(anne_oi, bob_oi);
}

#[tokio::test]
async fn test_roles_converge_with_roster_changes() {
    let pool = test_pool().await;
    let user = seed_user(&pool, "200001", "Cory", "Lane").await;
    let svc = service(&pool);

    // Staff role at another facility is ignored
    roster::replace_roster(
        &pool,
        &[member_with_role(200001, "Cory", "Lane", "S3", "ZAU", "EC")],
    )
    .await
    .expect("mirror");
    svc.sync_memberships().await.expect("sync");
    assert!(users::roles_for_user(&pool, &user.id).await.unwrap().is_empty());

    // Gaining WM at our facility grants admin on the next pass
    roster::replace_roster(
        &pool,
        &[member_with_role(200001, "Cory", "Lane", "S3", "ZID", "WM")],
    )
    .await
    .expect("mirror");
    svc.sync_memberships().await.expect("sync");
    assert_eq!(
        users::roles_for_user(&pool, &user.id).await.unwrap(),
        vec!["admin"]
    );

    // Losing the staff role revokes it while membership stays controller
    roster::replace_roster(&pool, &[member(200001, "Cory", "Lane", "S3")])
        .await
        .expect("mirror");
    svc.sync_memberships().await.expect("sync");
    assert!(users::roles_for_user(&pool, &user.id).await.unwrap().is_empty());
    assert_eq!(
        fetch_user(&pool, &user.id).await.membership,
        Membership::Controller
    );
}

#[tokio::test]
async fn test_per_user_sync_promotes_on_login() {
    let pool = test_pool().await;
    let user = seed_user(&pool, "300001", "Dana", "Reed").await;

    roster::replace_roster(&pool, &[member(300001, "Dana", "Reed", "S1")])
        .await
        .expect("mirror");

    service(&pool)
        .sync_user_membership(&user)
        .await
        .expect("per-user sync");

    let user = fetch_user(&pool, &user.id).await;
    assert_eq!(user.membership, Membership::Controller);
    assert!(user.operating_initials.is_some());
}

#[tokio::test]
async fn test_unknown_rating_promotes_without_grants() {
    let pool = test_pool().await;
    let user = seed_user(&pool, "400001", "Evan", "Moss").await;

    roster::replace_roster(&pool, &[member(400001, "Evan", "Moss", "OBS")])
        .await
        .expect("mirror");
    service(&pool).sync_memberships().await.expect("sync");

    let user = fetch_user(&pool, &user.id).await;
    assert_eq!(user.membership, Membership::Controller);
    assert!(cert_codes(&pool, &user.id).await.is_empty());
    assert!(endorsement_codes(&pool, &user.id).await.is_empty());
}

#[tokio::test]
async fn test_revoking_center_removes_companion_endorsement() {
    use artcc_web::membership::certifications;

    let pool = test_pool().await;
    let user = seed_user(&pool, "888888", "Faye", "Ortiz").await;

    roster::replace_roster(&pool, &[member(888888, "Faye", "Ortiz", "C1")])
        .await
        .expect("mirror");
    service(&pool).sync_memberships().await.expect("sync");
    assert_eq!(endorsement_codes(&pool, &user.id).await, vec!["T2-CTR"]);

    let removed = certifications::revoke_certification(&pool, &user.id, "CTR")
        .await
        .expect("revoke");
    assert!(removed);
    assert!(cert_codes(&pool, &user.id).await.is_empty());
    assert!(endorsement_codes(&pool, &user.id).await.is_empty());

    // Revoking again reports nothing to remove
    let again = certifications::revoke_certification(&pool, &user.id, "CTR")
        .await
        .expect("revoke again");
    assert!(!again);
}

#[tokio::test]
async fn test_refresh_pushes_controller_expiry_only() {
    use artcc_web::membership::certifications;

    let pool = test_pool().await;
    let controller = seed_user(&pool, "500001", "Gail", "Park").await;
    let former = seed_user(&pool, "500002", "Hugo", "Reyes").await;

    roster::replace_roster(&pool, &[member(500001, "Gail", "Park", "S1")])
        .await
        .expect("mirror");
    service(&pool).sync_memberships().await.expect("sync");

    // A community-tier user keeps an old certification from a past stint
    sqlx::query(
        "UPDATE users SET membership = 'community' WHERE id = ?",
    )
    .bind(&former.id)
    .execute(&pool)
    .await
    .expect("tier");
    sqlx::query(
        "INSERT INTO user_certifications (user_id, certification, created_at, expires_at)
         VALUES (?, 'TWR', 0, 1000)",
    )
    .bind(&former.id)
    .execute(&pool)
    .await
    .expect("stale cert");

    // Age the controller's expiry so the refresh is observable
    sqlx::query("UPDATE user_certifications SET expires_at = 1000 WHERE user_id = ?")
        .bind(&controller.id)
        .execute(&pool)
        .await
        .expect("age cert");

    let refreshed = certifications::refresh_certifications(&pool)
        .await
        .expect("refresh");
    assert_eq!(refreshed, 1);

    let controller_expiry: i64 = sqlx::query_scalar(
        "SELECT expires_at FROM user_certifications WHERE user_id = ?",
    )
    .bind(&controller.id)
    .fetch_one(&pool)
    .await
    .expect("controller expiry");
    // Pushed roughly six months out
    assert!(controller_expiry > artcc_common::time::unix_now() + 150 * 24 * 3600);

    let former_expiry: i64 = sqlx::query_scalar(
        "SELECT expires_at FROM user_certifications WHERE user_id = ?",
    )
    .bind(&former.id)
    .fetch_one(&pool)
    .await
    .expect("former expiry");
    assert_eq!(former_expiry, 1000);
}

#[tokio::test]
async fn test_rostered_cid_without_user_row_is_untouched() {
    let pool = test_pool().await;

    roster::replace_roster(&pool, &[member(999999, "Ghost", "Member", "S1")])
        .await
        .expect("mirror");
    let summary = service(&pool).sync_memberships().await.expect("sync");

    // Nobody with that CID has logged in, so there is nothing to promote
    assert_eq!(summary.promoted, 0);
    assert_eq!(summary.demoted, 0);
}
