use std::num::NonZeroU64;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_QUIET_PERIOD_MS: u64 = 500;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("quiet period must be a positive number of milliseconds")]
    ZeroQuietPeriod,
}

/// Time the input must stay quiet before a submission fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QuietPeriod(NonZeroU64);

impl QuietPeriod {
    pub fn from_millis(millis: u64) -> Result<Self, SettingsError> {
        NonZeroU64::new(millis)
            .map(Self)
            .ok_or(SettingsError::ZeroQuietPeriod)
    }

    pub fn as_millis(self) -> u64 {
        self.0.get()
    }

    pub fn as_duration(self) -> Duration {
        Duration::from_millis(self.0.get())
    }
}

impl Default for QuietPeriod {
    fn default() -> Self {
        Self(NonZeroU64::MIN.saturating_add(DEFAULT_QUIET_PERIOD_MS - 1))
    }
}

/// Identifies one scheduled submission. A newer ticket supersedes all older ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerTicket(pub u64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_quiet_period_is_rejected() {
        assert_eq!(
            QuietPeriod::from_millis(0),
            Err(SettingsError::ZeroQuietPeriod)
        );
    }

    #[test]
    fn default_quiet_period_is_half_a_second() {
        assert_eq!(QuietPeriod::default().as_millis(), 500);
        assert_eq!(
            QuietPeriod::default().as_duration(),
            Duration::from_millis(500)
        );
    }
}
