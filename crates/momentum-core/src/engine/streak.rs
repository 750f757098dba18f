//! Weekly completion tally.
//!
//! Each weekday token records whether at least one habit was completed on
//! that day. [`StreakTracker::count`] is the number of marked days this
//! week (0-7). It is a tally, not a run of consecutive days.

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::clock::Clock;
use crate::habit::Habit;
use crate::storage::{load_json, save_json, KeyValueStore};

/// Storage key of the streak blob.
pub const STREAK_STORAGE_KEY: &str = "completedDays";

/// One distinct token per day of the week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WeekdayToken {
    Sun,
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
}

impl WeekdayToken {
    pub const ALL: [WeekdayToken; 7] = [
        WeekdayToken::Sun,
        WeekdayToken::Mon,
        WeekdayToken::Tue,
        WeekdayToken::Wed,
        WeekdayToken::Thu,
        WeekdayToken::Fri,
        WeekdayToken::Sat,
    ];

    /// Single-letter label for compact week strips.
    pub fn initial(self) -> char {
        match self {
            WeekdayToken::Sun | WeekdayToken::Sat => 'S',
            WeekdayToken::Mon => 'M',
            WeekdayToken::Tue | WeekdayToken::Thu => 'T',
            WeekdayToken::Wed => 'W',
            WeekdayToken::Fri => 'F',
        }
    }
}

impl From<Weekday> for WeekdayToken {
    fn from(day: Weekday) -> Self {
        WeekdayToken::ALL[day.num_days_from_sunday() as usize]
    }
}

/// Token -> "had a completed habit" flags.
pub type StreakMap = BTreeMap<WeekdayToken, bool>;

fn empty_streak() -> StreakMap {
    WeekdayToken::ALL.iter().map(|&day| (day, false)).collect()
}

/// Owns the streak map and its persistence.
pub struct StreakTracker {
    days: StreakMap,
    storage: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl StreakTracker {
    /// Tracker with the persisted map already loaded.
    pub fn load(storage: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        let mut tracker = Self {
            days: empty_streak(),
            storage,
            clock,
        };
        tracker.reload();
        tracker
    }

    /// Re-read the persisted map; every token missing from it is false.
    pub fn reload(&mut self) {
        let mut days = empty_streak();
        match load_json::<StreakMap>(self.storage.as_ref(), STREAK_STORAGE_KEY) {
            Ok(Some(stored)) => days.extend(stored),
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Ignoring unreadable streak map"),
        }
        self.days = days;
    }

    /// Mark today according to `habits` and persist the whole map.
    pub fn update(&mut self, habits: &[Habit]) {
        let today = WeekdayToken::from(self.clock.weekday());
        let completed = habits.iter().any(|h| h.is_completed);
        self.days.insert(today, completed);
        if let Err(e) = save_json(self.storage.as_ref(), STREAK_STORAGE_KEY, &self.days) {
            tracing::warn!(error = %e, "Failed to persist streak map");
        }
    }

    /// Number of marked days, always within 0..=7.
    pub fn count(&self) -> usize {
        self.days.values().filter(|&&done| done).count()
    }

    pub fn days(&self) -> &StreakMap {
        &self.days
    }
}
