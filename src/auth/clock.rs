//! Timestamp generation for edgeX API authentication.
//!
//! Every request carries the client's wall-clock time in milliseconds; for
//! private requests the same value is part of the signed content.

use time::OffsetDateTime;

/// Trait for providing request timestamps.
///
/// Swap in a fixed implementation to make signatures reproducible in tests.
pub trait TimestampProvider: Send + Sync {
    /// Milliseconds since the UNIX epoch.
    fn now_millis(&self) -> u64;
}

/// Reads the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Create a new system clock provider.
    pub fn new() -> Self {
        Self
    }
}

impl TimestampProvider for SystemClock {
    fn now_millis(&self) -> u64 {
        let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
        u64::try_from(nanos / 1_000_000).unwrap_or_default()
    }
}

/// Always returns the same timestamp.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub u64);

impl TimestampProvider for FixedClock {
    fn now_millis(&self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_recent() {
        let now = SystemClock::new().now_millis();
        // 2023-11-14 in milliseconds; anything earlier means a unit mistake.
        assert!(now > 1_700_000_000_000);
    }

    #[test]
    fn test_system_clock_non_decreasing() {
        let clock = SystemClock::new();
        let first = clock.now_millis();
        let second = clock.now_millis();
        assert!(second >= first);
    }

    #[test]
    fn test_fixed_clock() {
        assert_eq!(FixedClock(1234).now_millis(), 1234);
    }
}
