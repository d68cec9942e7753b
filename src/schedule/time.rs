use chrono::{Local, NaiveDate};

use crate::domain::YearMonth;

/// Clock abstracts access to the current date so resolution stays deterministic in tests.
pub trait Clock: Send + Sync {
    /// Returns the current local calendar date.
    fn today(&self) -> NaiveDate;

    /// Returns the month containing `today()`.
    fn current_month(&self) -> YearMonth {
        YearMonth::from_date(self.today())
    }
}

/// Clock backed by the machine's local time zone.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock pinned to a single date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
