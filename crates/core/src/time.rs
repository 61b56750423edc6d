use chrono::{DateTime, Duration, Utc};

/// Wall-clock source for timestamps (session start, report generation).
///
/// The exam countdown itself is driven by ticks, not by this clock.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    System,
    Fixed(DateTime<Utc>),
}

impl Clock {
    #[must_use]
    pub fn system() -> Self {
        Self::System
    }

    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::System => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// Move a fixed clock forward. No effect on the system clock.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }

    #[must_use]
    pub fn is_fixed(&self) -> bool {
        matches!(self, Clock::Fixed(_))
    }
}

/// Render a countdown as `MM:SS`. Minutes are not wrapped into hours.
#[must_use]
pub fn format_countdown(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Deterministic timestamp for tests and examples (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Returns a deterministic `DateTime<Utc>` for tests and doc examples.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown_is_zero_padded() {
        assert_eq!(format_countdown(0), "00:00");
        assert_eq!(format_countdown(59), "00:59");
        assert_eq!(format_countdown(61), "01:01");
        assert_eq!(format_countdown(180 * 60), "180:00");
    }

    #[test]
    fn fixed_clock_advances() {
        let mut clock = Clock::fixed(fixed_now());
        clock.advance(Duration::seconds(30));
        assert_eq!(clock.now(), fixed_now() + Duration::seconds(30));
        assert!(clock.is_fixed());
    }
}
