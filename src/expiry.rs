//! Expiry checks for RFC3339 timestamps.

use std::time::SystemTime;

use aws_smithy_types::{DateTime, date_time::Format};
use log::debug;

/// Parses an RFC3339 timestamp, accepting both `Z` and numeric offsets.
pub fn parse_rfc3339(timestamp: &str) -> Option<SystemTime> {
    let parsed = DateTime::from_str(timestamp, Format::DateTime)
        .or_else(|_| DateTime::from_str(timestamp, Format::DateTimeWithOffset))
        .ok()?;
    SystemTime::try_from(parsed).ok()
}

/// Returns `true` if `expiration` is unparseable or not strictly after `now`.
pub fn is_expired_at(expiration: &str, now: SystemTime) -> bool {
    match parse_rfc3339(expiration) {
        Some(expires_at) => now > expires_at,
        None => {
            debug!("Unparseable expiration {expiration:?}, treating as expired");
            true
        }
    }
}

pub fn is_expired(expiration: &str) -> bool {
    is_expired_at(expiration, SystemTime::now())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_far_future_and_past() {
        assert!(!is_expired("2999-01-01T00:00:00Z"));
        assert!(is_expired("2000-01-01T00:00:00Z"));
    }

    #[test]
    fn test_monotonic_around_instant() {
        let t = "2024-01-02T15:04:05Z";
        let instant = parse_rfc3339(t).unwrap();
        assert!(!is_expired_at(t, instant - Duration::from_secs(1)));
        assert!(!is_expired_at(t, instant));
        assert!(is_expired_at(t, instant + Duration::from_millis(1)));
    }

    #[test]
    fn test_offsets_and_fractions() {
        let utc = parse_rfc3339("2024-01-02T15:04:05Z").unwrap();
        assert_eq!(parse_rfc3339("2024-01-03T00:04:05+09:00"), Some(utc));
        assert_eq!(
            parse_rfc3339("2024-01-02T15:04:05.250Z"),
            Some(utc + Duration::from_millis(250))
        );
    }

    #[test]
    fn test_unparseable_is_expired() {
        for input in ["", "not-a-date", "2024-01-02", "2024-01-02 15:04:05", "1700000000"] {
            assert!(is_expired(input), "{input:?} should count as expired");
        }
    }
}
