use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rand::RngCore;

/// Checks that an email belongs to the configured institutional domain.
/// Comparison is case-insensitive on the whole address.
pub fn is_institutional_email(email: &str, allowed_domain: &str) -> bool {
    let email = email.trim().to_lowercase();
    let suffix = format!("@{}", allowed_domain.to_lowercase());
    email.ends_with(&suffix) && email.len() > suffix.len()
}

/// Random 32-byte hex token for email verification links.
pub fn generate_verification_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Midnight UTC of a calendar date.
pub fn date_to_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Remaining whole days until expiry, rounded up. Negative once expired.
pub fn days_until_expiry(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    // Equivalent to `i64::div_ceil(86_400)` (still unstable on stable toolchains):
    // ceiling division by a positive divisor.
    let secs = (expires_at - now).num_seconds();
    let q = secs / 86_400;
    let r = secs % 86_400;
    if r > 0 { q + 1 } else { q }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_institutional_email() {
        assert!(is_institutional_email("student@illinois.edu", "illinois.edu"));
        assert!(is_institutional_email("Student@Illinois.EDU", "illinois.edu"));
        assert!(!is_institutional_email("user@gmail.com", "illinois.edu"));
        assert!(!is_institutional_email(
            "user@notillinois.edu.evil.com",
            "illinois.edu"
        ));
        assert!(!is_institutional_email("@illinois.edu", "illinois.edu"));
    }

    #[test]
    fn test_verification_token_shape() {
        let token = generate_verification_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_verification_token());
    }

    #[test]
    fn test_hold_period_expiry() {
        // dateFound = 2024-01-01 with a 30 day hold => expires 2024-01-31
        let date_found = date_to_utc(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        let expires_at = date_found + Duration::days(30);
        assert_eq!(
            expires_at,
            date_to_utc(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap())
        );

        // requested on 2024-01-25 reports 6 days remaining
        let now = Utc.with_ymd_and_hms(2024, 1, 25, 10, 30, 0).unwrap();
        assert_eq!(days_until_expiry(expires_at, now), 6);

        let midnight = date_to_utc(NaiveDate::from_ymd_opt(2024, 1, 25).unwrap());
        assert_eq!(days_until_expiry(expires_at, midnight), 6);
    }

    #[test]
    fn test_expired_item_counts_down_past_zero() {
        let expires_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap();
        assert!(days_until_expiry(expires_at, now) < 0);
    }
}
