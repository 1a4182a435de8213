//! Conversions between the time units used at the API boundary (seconds)
//! and inside backends (milliseconds).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TimeUnit {
    Microseconds,
    Milliseconds,
    Seconds,
}

impl TimeUnit {
    fn micros_per_unit(self) -> i64 {
        match self {
            TimeUnit::Microseconds => 1,
            TimeUnit::Milliseconds => 1_000,
            TimeUnit::Seconds => 1_000_000,
        }
    }

    /// Convert a fractional value into whole `target` units, truncating
    /// toward zero.
    pub fn to_whole(self, value: f64, target: TimeUnit) -> i64 {
        if target < self {
            let multiplier = self.micros_per_unit() / target.micros_per_unit();
            (value * multiplier as f64) as i64
        } else {
            let divider = target.micros_per_unit() / self.micros_per_unit();
            (value / divider as f64) as i64
        }
    }

    /// Convert a whole value into fractional `target` units.
    pub fn to_fractional(self, value: i64, target: TimeUnit) -> f64 {
        if target < self {
            let multiplier = self.micros_per_unit() / target.micros_per_unit();
            value as f64 * multiplier as f64
        } else {
            let divider = target.micros_per_unit() / self.micros_per_unit();
            value as f64 / divider as f64
        }
    }
}

/// Seconds (API) to milliseconds (backend), truncating.
pub fn secs_to_millis(secs: f64) -> i64 {
    TimeUnit::Seconds.to_whole(secs, TimeUnit::Milliseconds)
}

pub fn millis_to_secs(millis: i64) -> f64 {
    TimeUnit::Milliseconds.to_fractional(millis, TimeUnit::Seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_finer_unit() {
        assert_eq!(TimeUnit::Seconds.to_whole(1.5, TimeUnit::Milliseconds), 1500);
    }

    #[test]
    fn test_to_coarser_unit_truncates() {
        assert_eq!(
            TimeUnit::Milliseconds.to_whole(1500.5, TimeUnit::Seconds),
            1
        );
    }

    #[test]
    fn test_same_unit() {
        assert_eq!(TimeUnit::Seconds.to_whole(2.9, TimeUnit::Seconds), 2);
    }

    #[test]
    fn test_fractional_conversion() {
        assert_eq!(millis_to_secs(2500), 2.5);
        assert_eq!(
            TimeUnit::Seconds.to_fractional(3, TimeUnit::Microseconds),
            3_000_000.0
        );
    }

    #[test]
    fn test_negative_offsets_truncate_toward_zero() {
        assert_eq!(secs_to_millis(-0.0015), -1);
    }
}
