//! Timestamp utilities
//!
//! Timestamps are persisted as INTEGER unix seconds; chrono types only
//! appear at the edges (expiry arithmetic, API payload formatting).

use chrono::{DateTime, Months, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current time as unix seconds (the persisted representation)
pub fn unix_now() -> i64 {
    Utc::now().timestamp()
}

/// Unix seconds for a point `months` calendar months in the future.
///
/// Certification/endorsement expiry is always "N months from now";
/// chrono's calendar-aware month arithmetic handles month-length
/// differences (Jan 31 + 1 month = Feb 28/29).
pub fn months_from_now(months: u32) -> i64 {
    Utc::now()
        .checked_add_months(Months::new(months))
        .unwrap_or_else(Utc::now)
        .timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        // Should be a reasonable timestamp (after year 2000)
        assert!(timestamp.timestamp() > 946_684_800);
    }

    #[test]
    fn test_unix_now_matches_now() {
        let a = now().timestamp();
        let b = unix_now();
        assert!((b - a).abs() <= 1);
    }

    #[test]
    fn test_months_from_now_is_in_future() {
        let six_months = months_from_now(6);
        let now_secs = unix_now();
        // At least ~180 days ahead, at most ~186
        assert!(six_months - now_secs >= 180 * 24 * 3600);
        assert!(six_months - now_secs <= 186 * 24 * 3600);
    }

    #[test]
    fn test_months_from_now_zero() {
        let same = months_from_now(0);
        assert!((same - unix_now()).abs() <= 1);
    }
}
