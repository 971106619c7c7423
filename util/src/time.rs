//! General time utility functions

use std::time::Duration;

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// A wait time in seconds that cannot be turned into a `Duration`.
#[derive(Debug, Copy, Clone, PartialEq, thiserror::Error)]
#[error("{0} s is not a valid wait time, must be finite and non-negative")]
pub struct InvalidDuration(pub f64);

/// Convert a number of seconds read from the parameters into a `Duration`.
pub fn duration_from_secs(secs: f64) -> Result<Duration, InvalidDuration> {
    if secs.is_finite() && secs >= 0.0 && secs < u64::MAX as f64 {
        Ok(Duration::from_secs_f64(secs))
    }
    else {
        Err(InvalidDuration(secs))
    }
}

/// Convert a chrono duration into a number of seconds, or `None` if overflow
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    duration
        .num_nanoseconds()
        .map(|ns| ns as f64 / NANOS_PER_SECOND as f64)
}

/// Get the time left in a cycle of length `period` after `elapsed` has
/// passed, or the overrun if the cycle took longer than the period.
pub fn cycle_remainder(period: Duration, elapsed: Duration) -> Result<Duration, Duration> {
    match period.checked_sub(elapsed) {
        Some(d) => Ok(d),
        None => Err(elapsed - period)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_duration_to_seconds() {
        assert_eq!(duration_to_seconds(chrono::Duration::milliseconds(1500)), Some(1.5));
        assert_eq!(duration_to_seconds(chrono::Duration::zero()), Some(0.0));
    }

    #[test]
    fn test_duration_from_secs() {
        assert_eq!(duration_from_secs(0.05), Ok(Duration::from_millis(50)));
        assert_eq!(duration_from_secs(0.0), Ok(Duration::from_secs(0)));

        assert!(duration_from_secs(-0.1).is_err());
        assert!(duration_from_secs(f64::INFINITY).is_err());
        assert!(duration_from_secs(f64::NAN).is_err());
        assert!(duration_from_secs(1e30).is_err());
    }

    #[test]
    fn test_cycle_remainder() {
        let period = Duration::from_millis(5);

        assert_eq!(
            cycle_remainder(period, Duration::from_millis(2)), 
            Ok(Duration::from_millis(3))
        );
        assert_eq!(
            cycle_remainder(period, Duration::from_millis(7)), 
            Err(Duration::from_millis(2))
        );
        assert_eq!(cycle_remainder(period, period), Ok(Duration::from_millis(0)));
    }
}
