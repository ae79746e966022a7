//! Injectable wall-clock time.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::{Error, Result};

/// A source of wall-clock time.
pub trait Clock: Send + Sync {
    /// Current time.
    fn now(&self) -> SystemTime;
}

/// The operating system's real-time clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// A clock frozen at one instant. Useful for tests and replay tooling.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(SystemTime);

impl FixedClock {
    /// Freeze the clock at `secs` seconds after the Unix epoch.
    pub fn from_unix(secs: u64) -> Self {
        Self(UNIX_EPOCH + Duration::from_secs(secs))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> SystemTime {
        self.0
    }
}

/// Whole seconds since the Unix epoch according to `clock`.
pub fn unix_seconds(clock: &dyn Clock) -> Result<u64> {
    clock
        .now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| Error::Clock(format!("time is before the Unix epoch: {}", e)))
}

/// Index of the `width`-second bucket containing `unix_secs`.
///
/// `width` must be non-zero; callers validate it up front.
pub const fn time_bucket(unix_secs: u64, width: u64) -> u64 {
    unix_secs / width
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = FixedClock::from_unix(1_700_000_000);
        assert_eq!(unix_seconds(&clock).unwrap(), 1_700_000_000);
    }

    #[test]
    fn test_system_clock_is_after_epoch() {
        assert!(unix_seconds(&SystemClock).unwrap() > 1_600_000_000);
    }

    #[test]
    fn test_pre_epoch_is_error() {
        struct Backwards;
        impl Clock for Backwards {
            fn now(&self) -> SystemTime {
                UNIX_EPOCH - Duration::from_secs(1)
            }
        }
        assert!(matches!(unix_seconds(&Backwards), Err(Error::Clock(_))));
    }

    #[test]
    fn test_time_bucket() {
        assert_eq!(time_bucket(0, 3600), 0);
        assert_eq!(time_bucket(3599, 3600), 0);
        assert_eq!(time_bucket(3600, 3600), 1);
        assert_eq!(time_bucket(86_400, 43_200), 2);
    }
}
