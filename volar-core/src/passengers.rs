use std::fmt;

use crate::{CoreResult, ReservationError};

/// Passenger count for a single reservation, never below
/// [`PassengerCount::MIN`] and never above the [`PassengerLimit`] it was
/// built against.
///
/// The same bound applies to new bookings and to edits of existing ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PassengerCount(u32);

impl PassengerCount {
    pub const MIN: u32 = 1;
    /// Upper bound when no limit is configured.
    pub const DEFAULT_MAX: u32 = 10;

    /// Validates against the default limit.
    pub fn new(count: u32) -> CoreResult<Self> {
        PassengerLimit::default().count(count)
    }

    /// Forces an out-of-range count (e.g. a legacy server value) into the
    /// default bounds.
    pub fn clamped(count: u32) -> Self {
        PassengerLimit::default().clamp(count)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Next count up under the default limit.
    pub fn increment(self) -> CoreResult<Self> {
        PassengerLimit::default().increment(self)
    }

    /// Next count down, saturating at the minimum.
    pub fn decrement(self) -> Self {
        Self(self.0.saturating_sub(1).max(Self::MIN))
    }
}

/// Largest passenger count a booking or edit may select. Configured through
/// `booking.max_passengers`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassengerLimit(u32);

impl PassengerLimit {
    pub fn new(max: u32) -> CoreResult<Self> {
        if max < PassengerCount::MIN {
            return Err(ReservationError::Validation(format!(
                "Passenger limit must be at least {}",
                PassengerCount::MIN
            )));
        }
        Ok(Self(max))
    }

    pub fn max(self) -> u32 {
        self.0
    }

    pub fn count(self, count: u32) -> CoreResult<PassengerCount> {
        if count < PassengerCount::MIN {
            return Err(ReservationError::Validation(format!(
                "A reservation needs at least {} passenger",
                PassengerCount::MIN
            )));
        }
        if count > self.0 {
            return Err(self.limit_error());
        }
        Ok(PassengerCount(count))
    }

    /// Exceeding the maximum is rejected, not clamped.
    pub fn increment(self, current: PassengerCount) -> CoreResult<PassengerCount> {
        self.count(current.0 + 1)
    }

    pub fn clamp(self, count: u32) -> PassengerCount {
        PassengerCount(count.clamp(PassengerCount::MIN, self.0))
    }

    fn limit_error(self) -> ReservationError {
        ReservationError::Validation(format!(
            "No more than {} passengers can be selected per reservation",
            self.0
        ))
    }
}

impl Default for PassengerLimit {
    fn default() -> Self {
        Self(PassengerCount::DEFAULT_MAX)
    }
}

impl Default for PassengerCount {
    fn default() -> Self {
        Self(Self::MIN)
    }
}

impl fmt::Display for PassengerCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        assert!(PassengerCount::new(0).is_err());
        assert_eq!(PassengerCount::new(1).unwrap().get(), 1);
        assert_eq!(PassengerCount::new(10).unwrap().get(), 10);
        assert!(matches!(PassengerCount::new(11), Err(ReservationError::Validation(_))));
    }

    #[test]
    fn test_increment_rejects_past_max() {
        let ten = PassengerCount::new(10).unwrap();
        assert!(ten.increment().is_err());
        assert_eq!(PassengerCount::new(9).unwrap().increment().unwrap(), ten);
    }

    #[test]
    fn test_decrement_clamps_at_min() {
        let one = PassengerCount::default();
        assert_eq!(one.decrement(), one);
        assert_eq!(PassengerCount::new(3).unwrap().decrement().get(), 2);
    }

    #[test]
    fn test_clamped() {
        assert_eq!(PassengerCount::clamped(0).get(), 1);
        assert_eq!(PassengerCount::clamped(14).get(), 10);
    }

    #[test]
    fn test_configured_limit() {
        let four = PassengerLimit::new(4).unwrap();
        assert_eq!(four.max(), 4);
        assert!(four.count(5).is_err());

        let at_max = four.count(4).unwrap();
        let err = four.increment(at_max).unwrap_err();
        assert_eq!(
            err,
            ReservationError::Validation(
                "No more than 4 passengers can be selected per reservation".to_string()
            )
        );
        assert_eq!(four.clamp(9).get(), 4);
    }

    #[test]
    fn test_limit_above_default_allows_larger_groups() {
        let twelve = PassengerLimit::new(12).unwrap();
        assert_eq!(twelve.count(12).unwrap().get(), 12);
        assert!(PassengerLimit::new(0).is_err());
        assert_eq!(PassengerLimit::default().max(), 10);
    }
}
