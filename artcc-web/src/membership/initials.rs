//! Operating-initials allocation
//!
//! Each controller gets a unique two-letter identifier derived from
//! their name. Candidate order is behaviorally significant: the same
//! name with the same pool of taken initials must always produce the
//! same result, so candidates are generated as an explicit ordered list
//! and the first free, non-banned one wins.

use artcc_common::db::models::User;
use artcc_common::Result;
use sqlx::SqlitePool;
use std::collections::HashSet;
use tracing::info;

const ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// "Pyramid" combinations: first letter + each subsequent letter,
/// scanning from the end of the input backward. "Smith" yields
/// SH, ST, SI, SM.
fn pyramid_combinations(input: &str) -> Vec<String> {
    let chars: Vec<char> = input.chars().collect();
    let mut combos = Vec::new();
    if chars.len() < 2 {
        return combos;
    }
    for i in (1..chars.len()).rev() {
        let combo: String = [chars[0], chars[i]].iter().collect();
        combos.push(combo.to_uppercase());
    }
    combos
}

/// Exhaustive fallback: first letter of the input + the alphabet,
/// run through the same pyramid scan (so Z is tried first, A last).
fn alphabetical_combinations(input: &str) -> Vec<String> {
    match input.chars().next() {
        Some(first) => pyramid_combinations(&format!("{}{}", first, ALPHABET)),
        None => Vec::new(),
    }
}

/// Full candidate list in priority order: pyramid of the last name,
/// pyramid of the first name, then the alphabetical fallbacks.
pub fn candidate_initials(first_name: &str, last_name: &str) -> Vec<String> {
    let mut combos = pyramid_combinations(last_name);
    combos.extend(pyramid_combinations(first_name));
    combos.extend(alphabetical_combinations(last_name));
    combos.extend(alphabetical_combinations(first_name));
    combos
}

/// Pick the first candidate not already taken and not banned
pub fn pick_initials(
    first_name: &str,
    last_name: &str,
    taken: &HashSet<String>,
    banned: &[String],
) -> Option<String> {
    candidate_initials(first_name, last_name)
        .into_iter()
        .find(|c| !taken.contains(c) && !banned.iter().any(|b| b == c))
}

/// Allocate operating initials for a newly promoted controller.
///
/// One-time allocation: a user who already holds initials keeps them.
/// Exhaustion is not an error; the user simply ends up without initials.
/// Returns the allocated value, if any.
pub async fn grant_operating_initials(
    db: &SqlitePool,
    user: &User,
    banned: &[String],
) -> Result<Option<String>> {
    if let Some(existing) = &user.operating_initials {
        info!(user_id = %user.id, initials = %existing, "user already has operating initials");
        return Ok(Some(existing.clone()));
    }

    let taken: HashSet<String> = sqlx::query_scalar::<_, String>(
        "SELECT operating_initials FROM users
         WHERE operating_initials IS NOT NULL AND id != ?",
    )
    .bind(&user.id)
    .fetch_all(db)
    .await?
    .into_iter()
    .collect();

    match pick_initials(&user.first_name, &user.last_name, &taken, banned) {
        Some(initials) => {
            sqlx::query("UPDATE users SET operating_initials = ? WHERE id = ?")
                .bind(&initials)
                .bind(&user.id)
                .execute(db)
                .await?;
            info!(user_id = %user.id, initials = %initials, "granted operating initials");
            Ok(Some(initials))
        }
        None => {
            info!(user_id = %user.id, "no operating initials available");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn taken(values: &[&str]) -> HashSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_pyramid_scans_backward_from_end() {
        assert_eq!(pyramid_combinations("Smith"), vec!["SH", "ST", "SI", "SM"]);
    }

    #[test]
    fn test_pyramid_uppercases() {
        assert_eq!(pyramid_combinations("anne"), vec!["AE", "AN", "AN"]);
    }

    #[test]
    fn test_pyramid_short_inputs() {
        assert!(pyramid_combinations("").is_empty());
        assert!(pyramid_combinations("X").is_empty());
        assert_eq!(pyramid_combinations("Wu"), vec!["WU"]);
    }

    #[test]
    fn test_alphabetical_tries_z_first() {
        let combos = alphabetical_combinations("Smith");
        assert_eq!(combos.len(), 26);
        assert_eq!(combos[0], "SZ");
        assert_eq!(combos[25], "SA");
    }

    #[test]
    fn test_candidate_order_last_name_first() {
        let combos = candidate_initials("Anne", "Smith");
        // 4 from "Smith", 3 from "Anne", then 26 + 26 fallback
        assert_eq!(combos.len(), 4 + 3 + 26 + 26);
        assert_eq!(&combos[..4], &["SH", "ST", "SI", "SM"]);
        assert_eq!(&combos[4..7], &["AE", "AN", "AN"]);
        assert_eq!(combos[7], "SZ");
        assert_eq!(combos[7 + 26], "AZ");
    }

    #[test]
    fn test_pick_first_free_candidate() {
        // Anne Smith with nothing taken gets SH
        assert_eq!(
            pick_initials("Anne", "Smith", &taken(&[]), &[]),
            Some("SH".to_string())
        );
        // SH taken: next in order is ST
        assert_eq!(
            pick_initials("Anne", "Smith", &taken(&["SH"]), &[]),
            Some("ST".to_string())
        );
    }

    #[test]
    fn test_pick_skips_banned() {
        let banned = vec!["SH".to_string()];
        assert_eq!(
            pick_initials("Anne", "Smith", &taken(&[]), &banned),
            Some("ST".to_string())
        );
    }

    #[test]
    fn test_pick_exhaustion_returns_none() {
        // Every candidate for a one-letter name pair blocked
        let mut all = taken(&[]);
        for combo in candidate_initials("A", "S") {
            all.insert(combo);
        }
        assert_eq!(pick_initials("A", "S", &all, &[]), None);
    }

    #[test]
    fn test_pick_deterministic() {
        let pool = taken(&["SH", "ST"]);
        let first = pick_initials("Anne", "Smith", &pool, &[]);
        for _ in 0..10 {
            assert_eq!(pick_initials("Anne", "Smith", &pool, &[]), first);
        }
        assert_eq!(first, Some("SI".to_string()));
    }
}
