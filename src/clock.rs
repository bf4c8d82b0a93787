//! Injectable time source.
//!
//! Core operations never read ambient time directly; they receive a [`Clock`]
//! so that due-date classification, payment-date defaulting, and report
//! generation stay deterministic under test.

use chrono::{DateTime, Local, NaiveDate, Utc};

/// Provides "today" (local calendar date) and "now" (UTC timestamp).
pub trait Clock: Send + Sync {
    /// Current local calendar date, used for payment-date defaults and
    /// overdue classification.
    fn today(&self) -> NaiveDate;

    /// Current timestamp, used for `created_at`/`updated_at` columns.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a fixed instant, for deterministic tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    /// The date reported by [`Clock::today`].
    pub today: NaiveDate,
    /// The timestamp reported by [`Clock::now`].
    pub now: DateTime<Utc>,
}

impl FixedClock {
    /// Pins the clock to the given date, with "now" at midnight UTC of it.
    #[must_use]
    pub fn on(today: NaiveDate) -> Self {
        Self {
            today,
            now: today.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc(),
        }
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.today
    }

    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_reports_pinned_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let clock = FixedClock::on(date);

        assert_eq!(clock.today(), date);
        assert_eq!(clock.now().date_naive(), date);
    }
}
