//! Source of "today" for planner and streak lookups.

use chrono::{Datelike, Local, NaiveDate, Weekday};

/// Resolves the current calendar day.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;

    fn weekday(&self) -> Weekday {
        self.today().weekday()
    }
}

/// Wall clock in the local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock pinned to one date. Used by tests and replays.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl FixedClock {
    /// First date on or after 2024-01-07 (a Sunday) falling on `weekday`.
    pub fn on(weekday: Weekday) -> Self {
        let sunday = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap_or_default();
        let offset = weekday.num_days_from_sunday() as u64;
        Self(sunday + chrono::Days::new(offset))
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Full English weekday name, as used for planner keys ("Monday").
pub fn full_weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Sun => "Sunday",
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
    }
}

/// Parse a full or abbreviated weekday name, case-insensitively.
pub fn parse_weekday(name: &str) -> Option<Weekday> {
    name.trim().parse::<Weekday>().ok()
}
