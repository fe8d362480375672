//! Shared runtime-mutable sampling interval.

use crate::error::LoggerError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Exclusive upper bound for the interval: one day.
pub const MAX_INTERVAL_SECS: u64 = 86_400;

/// Sampling interval in seconds, shared between the sampling loop and the
/// MQTT control handler.
///
/// The control handler writes from the messaging task while the loop reads
/// at the top of each cycle, so the value is atomic. The loop takes one
/// snapshot per cycle; a change applies at the next cycle boundary.
pub struct SamplingInterval {
    secs: AtomicU64,
}

impl SamplingInterval {
    /// Create with an initial value, rejecting out-of-range configuration.
    pub fn new(secs: u64) -> Result<Self, LoggerError> {
        if !in_range(secs) {
            return Err(LoggerError::InvalidConfig(format!(
                "sampling interval must be between 1 and {} seconds, got {}",
                MAX_INTERVAL_SECS - 1,
                secs
            )));
        }
        Ok(Self {
            secs: AtomicU64::new(secs),
        })
    }

    /// Current value in seconds.
    pub fn secs(&self) -> u64 {
        self.secs.load(Ordering::SeqCst)
    }

    /// Current value as a sleepable duration.
    pub fn get(&self) -> Duration {
        Duration::from_secs(self.secs())
    }

    /// Apply a new value if it lies in the open range (0, 86400).
    /// Returns whether the value was applied.
    pub fn set(&self, secs: u64) -> bool {
        if !in_range(secs) {
            return false;
        }
        self.secs.store(secs, Ordering::SeqCst);
        true
    }
}

fn in_range(secs: u64) -> bool {
    secs > 0 && secs < MAX_INTERVAL_SECS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_out_of_range() {
        assert!(SamplingInterval::new(0).is_err());
        assert!(SamplingInterval::new(MAX_INTERVAL_SECS).is_err());
        assert!(SamplingInterval::new(1).is_ok());
        assert!(SamplingInterval::new(MAX_INTERVAL_SECS - 1).is_ok());
    }

    #[test]
    fn test_set_applies_in_range_values() {
        let interval = SamplingInterval::new(30).unwrap();
        assert!(interval.set(45));
        assert_eq!(interval.secs(), 45);
        assert_eq!(interval.get(), Duration::from_secs(45));
    }

    #[test]
    fn test_set_rejects_and_leaves_unchanged() {
        let interval = SamplingInterval::new(30).unwrap();
        assert!(!interval.set(0));
        assert_eq!(interval.secs(), 30);
        assert!(!interval.set(MAX_INTERVAL_SECS));
        assert_eq!(interval.secs(), 30);
        assert!(!interval.set(u64::MAX));
        assert_eq!(interval.secs(), 30);
    }
}
