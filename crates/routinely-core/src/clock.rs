//! Clock collaborator.
//!
//! Date handling is built on explicit calendar dates (`chrono::NaiveDate`),
//! never on formatted date strings, so the record key is timezone-independent.

use chrono::{Local, NaiveDate, Weekday};

/// Source of "today" and the locale's first day of the week.
///
/// The completion state machine and timer consult the clock to reject
/// future-dated mutations; the statistics engine uses it to anchor the
/// current week.
pub trait Clock: Send {
    /// The current calendar date.
    fn today(&self) -> NaiveDate;

    /// First day of the week for rate/histogram windows.
    fn first_day_of_week(&self) -> Weekday;
}

/// Wall-clock implementation over the local timezone.
#[derive(Debug, Clone)]
pub struct SystemClock {
    week_start: Weekday,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            week_start: Weekday::Mon,
        }
    }

    /// Override the week start (from configuration).
    pub fn with_week_start(week_start: Weekday) -> Self {
        Self { week_start }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn first_day_of_week(&self) -> Weekday {
        self.week_start
    }
}

/// Deterministic clock pinned to a fixed date (for tests).
#[derive(Debug, Clone)]
pub struct FixedClock {
    pub today: NaiveDate,
    pub week_start: Weekday,
}

impl FixedClock {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            week_start: Weekday::Mon,
        }
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.today
    }

    fn first_day_of_week(&self) -> Weekday {
        self.week_start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_reports_pinned_date() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        let clock = FixedClock::new(date);
        assert_eq!(clock.today(), date);
        assert_eq!(clock.first_day_of_week(), Weekday::Mon);
    }

    #[test]
    fn system_clock_week_start_override() {
        let clock = SystemClock::with_week_start(Weekday::Sun);
        assert_eq!(clock.first_day_of_week(), Weekday::Sun);
    }
}
