//! Certification and endorsement grants
//!
//! Initial qualifications are derived from the rating code once, at
//! promotion time. Grants are insert-or-ignore on the unique
//! (user, code) pair, so a user who already holds a certification keeps
//! it (and its expiry) untouched.

use artcc_common::time;
use artcc_common::Result;
use sqlx::SqlitePool;
use tracing::info;

/// Certifications are valid for six months, renewed each sync cycle
/// while the holder stays on the roster.
const EXPIRY_MONTHS: u32 = 6;

/// Certification codes whose grant carries a companion endorsement
/// (and whose revocation removes it)
pub const COMPANION_ENDORSEMENTS: &[(&str, &str)] = &[("CTR", "T2-CTR")];

/// Qualifications derived from a rating code
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RatingGrants {
    pub certifications: Vec<&'static str>,
    pub endorsements: Vec<&'static str>,
}

/// Static rating-code lookup. Ratings not present yield empty sets;
/// that is a valid outcome, not an error.
pub fn grants_for_rating(rating: &str) -> RatingGrants {
    let (certifications, mut endorsements): (Vec<&'static str>, Vec<&'static str>) = match rating {
        "S1" => (vec!["GND"], vec!["S-GND"]),
        "S2" => (vec!["TWR"], vec!["S-TWR"]),
        "S3" => (vec!["APP"], vec![]),
        "C1" | "C2" | "C3" | "I1" | "I2" | "I3" => (vec!["CTR"], vec![]),
        _ => (vec![], vec![]),
    };

    // Top-tier certifications imply their companion endorsement
    for cert in &certifications {
        if let Some((_, endorsement)) = COMPANION_ENDORSEMENTS.iter().find(|(c, _)| c == cert) {
            endorsements.push(endorsement);
        }
    }

    RatingGrants {
        certifications,
        endorsements,
    }
}

/// Grant the initial certifications and endorsements for a rating code.
///
/// Returns the intended grant set (for notifications), which may exceed
/// what was actually inserted when rows already existed.
pub async fn grant_initial_certifications_and_endorsements(
    db: &SqlitePool,
    user_id: &str,
    rating: &str,
) -> Result<RatingGrants> {
    let grants = grants_for_rating(rating);
    let now = time::unix_now();
    let expires_at = time::months_from_now(EXPIRY_MONTHS);

    for certification in &grants.certifications {
        sqlx::query(
            "INSERT OR IGNORE INTO user_certifications
             (user_id, certification, created_at, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(certification)
        .bind(now)
        .bind(expires_at)
        .execute(db)
        .await?;
    }

    for endorsement in &grants.endorsements {
        sqlx::query(
            "INSERT OR IGNORE INTO user_endorsements
             (user_id, endorsement, created_at, updated_at, expires_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(endorsement)
        .bind(now)
        .bind(now)
        .bind(expires_at)
        .execute(db)
        .await?;
    }

    info!(
        user_id,
        rating,
        certifications = ?grants.certifications,
        endorsements = ?grants.endorsements,
        "granted initial qualifications"
    );

    Ok(grants)
}

/// Push every active controller's certification expiry to six months
/// out. Blanket renewal, uniform across all rows: the sync schedule is
/// the keep-alive, not per-row expiry proximity.
pub async fn refresh_certifications(db: &SqlitePool) -> Result<u64> {
    let expires_at = time::months_from_now(EXPIRY_MONTHS);
    let result = sqlx::query(
        "UPDATE user_certifications SET expires_at = ?
         WHERE user_id IN (SELECT id FROM users WHERE membership = 'controller')",
    )
    .bind(expires_at)
    .execute(db)
    .await?;

    info!(refreshed = result.rows_affected(), "refreshed certifications");
    Ok(result.rows_affected())
}

/// Remove one certification and any companion endorsement it implied.
/// Returns false when the user never held the certification.
pub async fn revoke_certification(db: &SqlitePool, user_id: &str, code: &str) -> Result<bool> {
    let result = sqlx::query(
        "DELETE FROM user_certifications WHERE user_id = ? AND certification = ?",
    )
    .bind(user_id)
    .bind(code)
    .execute(db)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(false);
    }

    if let Some((_, endorsement)) = COMPANION_ENDORSEMENTS.iter().find(|(c, _)| *c == code) {
        sqlx::query("DELETE FROM user_endorsements WHERE user_id = ? AND endorsement = ?")
            .bind(user_id)
            .bind(endorsement)
            .execute(db)
            .await?;
    }

    info!(user_id, code, "revoked certification");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_student_ratings() {
        assert_eq!(grants_for_rating("S1").certifications, vec!["GND"]);
        assert_eq!(grants_for_rating("S1").endorsements, vec!["S-GND"]);
        assert_eq!(grants_for_rating("S2").certifications, vec!["TWR"]);
        assert_eq!(grants_for_rating("S3").certifications, vec!["APP"]);
        assert!(grants_for_rating("S3").endorsements.is_empty());
    }

    #[test]
    fn test_controller_ratings_imply_companion_endorsement() {
        for rating in ["C1", "C2", "C3", "I1", "I2", "I3"] {
            let grants = grants_for_rating(rating);
            assert_eq!(grants.certifications, vec!["CTR"], "rating {}", rating);
            assert_eq!(grants.endorsements, vec!["T2-CTR"], "rating {}", rating);
        }
    }

    #[test]
    fn test_unknown_rating_yields_empty_sets() {
        let grants = grants_for_rating("OBS");
        assert!(grants.certifications.is_empty());
        assert!(grants.endorsements.is_empty());
    }
}
