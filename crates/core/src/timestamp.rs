//! Wall-clock timestamps
//!
//! Timestamps are microseconds since Unix epoch. They stamp transition log
//! entries, message send times and reply deadlines. Ordering between
//! messages never relies on them; that is what the per-sender sequence
//! number is for.

use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Microsecond-precision timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Unix epoch (1970-01-01 00:00:00 UTC)
    pub const EPOCH: Timestamp = Timestamp(0);

    /// Maximum representable timestamp
    pub const MAX: Timestamp = Timestamp(u64::MAX);

    /// Current wall-clock time
    ///
    /// Returns epoch if the system clock reads before 1970.
    pub fn now() -> Self {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Timestamp(duration.as_micros() as u64)
    }

    /// Create a timestamp from microseconds since epoch
    #[inline]
    pub const fn from_micros(micros: u64) -> Self {
        Timestamp(micros)
    }

    /// Create a timestamp from milliseconds since epoch
    #[inline]
    pub const fn from_millis(millis: u64) -> Self {
        Timestamp(millis.saturating_mul(1_000))
    }

    /// Microseconds since epoch
    #[inline]
    pub const fn as_micros(&self) -> u64 {
        self.0
    }

    /// Milliseconds since epoch (truncates)
    #[inline]
    pub const fn as_millis(&self) -> u64 {
        self.0 / 1_000
    }

    /// A deadline `duration` from now
    pub fn deadline_in(duration: Duration) -> Self {
        Self::now().saturating_add(duration)
    }

    /// Add a duration, saturating at `Timestamp::MAX`
    pub fn saturating_add(&self, duration: Duration) -> Self {
        Timestamp(self.0.saturating_add(duration.as_micros() as u64))
    }

    /// Elapsed time since an earlier timestamp, `None` if `earlier` is later
    pub fn duration_since(&self, earlier: Timestamp) -> Option<Duration> {
        self.0.checked_sub(earlier.0).map(Duration::from_micros)
    }

    /// True when this timestamp, taken as a deadline, lies strictly before `now`
    #[inline]
    pub fn has_passed(&self, now: Timestamp) -> bool {
        self.0 < now.0
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Timestamp::EPOCH
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:06}", self.0 / 1_000_000, self.0 % 1_000_000)
    }
}

impl From<u64> for Timestamp {
    fn from(micros: u64) -> Self {
        Timestamp::from_micros(micros)
    }
}

impl From<Timestamp> for u64 {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_units() {
        let ts = Timestamp::from_millis(5000);
        assert_eq!(ts.as_millis(), 5000);
        assert_eq!(ts.as_micros(), 5_000_000);
    }

    #[test]
    fn test_timestamp_now_advances() {
        let before = Timestamp::now();
        std::thread::sleep(Duration::from_millis(1));
        let after = Timestamp::now();
        assert!(after > before);
    }

    #[test]
    fn test_deadline_has_passed() {
        let deadline = Timestamp::from_micros(1_000);
        assert!(!deadline.has_passed(Timestamp::from_micros(999)));
        assert!(!deadline.has_passed(Timestamp::from_micros(1_000)));
        assert!(deadline.has_passed(Timestamp::from_micros(1_001)));
    }

    #[test]
    fn test_deadline_in_future() {
        let deadline = Timestamp::deadline_in(Duration::from_secs(60));
        assert!(!deadline.has_passed(Timestamp::now()));
    }

    #[test]
    fn test_saturating_add_at_max() {
        assert_eq!(
            Timestamp::MAX.saturating_add(Duration::from_micros(1)),
            Timestamp::MAX
        );
    }

    #[test]
    fn test_duration_since() {
        let t1 = Timestamp::from_micros(1000);
        let t2 = Timestamp::from_micros(3000);
        assert_eq!(t2.duration_since(t1), Some(Duration::from_micros(2000)));
        assert!(t1.duration_since(t2).is_none());
    }

    #[test]
    fn test_display() {
        assert_eq!(Timestamp::from_micros(1_234_567_890).to_string(), "1234.567890");
    }
}
