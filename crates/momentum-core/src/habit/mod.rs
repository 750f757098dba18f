//! Habit records and list ordering.
//!
//! A [`Habit`] carries two identities:
//!
//! - `id`: a [`HabitId`] generated once when the value is constructed. It
//!   never changes and is what the presentation layer keys rows on.
//! - `remote_id`: the document id confirmed by the remote store after the
//!   first successful save. Absent means "never persisted".
//!
//! A habit that has never been persisted is written under its local id, so
//! every save of one habit targets the same document even when the first
//! one has not returned yet.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable in-memory identity of a habit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HabitId(Uuid);

impl HabitId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for HabitId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HabitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Outcome of the most recent remote write for a habit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    /// Matches what the store last acknowledged
    #[default]
    Clean,
    /// A write has been issued and not yet completed
    Pending,
    /// The last write failed; the local value is kept anyway
    Failed,
}

/// One trackable habit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Habit {
    pub id: HabitId,
    pub remote_id: Option<String>,
    pub name: String,
    pub is_completed: bool,
    #[serde(default)]
    pub sync_state: SyncState,
}

impl Habit {
    /// A fresh, incomplete, never-persisted habit.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: HabitId::new(),
            remote_id: None,
            name: name.into(),
            is_completed: false,
            sync_state: SyncState::Pending,
        }
    }

    /// A habit as loaded from the remote store.
    pub fn from_remote(remote_id: impl Into<String>, name: impl Into<String>, is_completed: bool) -> Self {
        Self {
            id: HabitId::new(),
            remote_id: Some(remote_id.into()),
            name: name.into(),
            is_completed,
            sync_state: SyncState::Clean,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.remote_id.is_some()
    }

    /// Id of the document this habit is written to.
    pub fn document_id(&self) -> String {
        match &self.remote_id {
            Some(id) => id.clone(),
            None => self.id.to_string(),
        }
    }
}

/// Reorder so every incomplete habit precedes every completed one.
///
/// Relative order inside each group is preserved (`sort_by_key` is stable).
pub fn stable_partition(habits: &mut [Habit]) {
    habits.sort_by_key(|h| h.is_completed);
}

/// Move the habit at `index` to the end of the group it now belongs to.
///
/// A habit whose completion just flipped is treated as the newest member of
/// its new group: completing it makes it the last completed entry, reopening
/// it makes it the last incomplete entry. Returns the new index, or `None`
/// when `index` is out of range. The list must already be partitioned apart
/// from the moved habit.
pub fn move_to_group_end(habits: &mut Vec<Habit>, index: usize) -> Option<usize> {
    if index >= habits.len() {
        return None;
    }
    let habit = habits.remove(index);
    let target = if habit.is_completed {
        habits.len()
    } else {
        habits.iter().take_while(|h| !h.is_completed).count()
    };
    habits.insert(target, habit);
    Some(target)
}

/// True when no completed habit precedes an incomplete one.
pub fn is_partitioned(habits: &[Habit]) -> bool {
    habits
        .windows(2)
        .all(|pair| !(pair[0].is_completed && !pair[1].is_completed))
}

/// Number of completed habits.
pub fn completed_count(habits: &[Habit]) -> usize {
    habits.iter().filter(|h| h.is_completed).count()
}

/// Completed / total, or 0.0 for an empty list.
pub fn progress(habits: &[Habit]) -> f64 {
    if habits.is_empty() {
        0.0
    } else {
        completed_count(habits) as f64 / habits.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn habit(name: &str, done: bool) -> Habit {
        let mut h = Habit::new(name);
        h.is_completed = done;
        h
    }

    fn names(habits: &[Habit]) -> Vec<&str> {
        habits.iter().map(|h| h.name.as_str()).collect()
    }

    #[test]
    fn new_habit_is_unpersisted_and_incomplete() {
        let h = Habit::new("Run");
        assert!(!h.is_persisted());
        assert!(!h.is_completed);
        assert_eq!(h.sync_state, SyncState::Pending);
    }

    #[test]
    fn identity_survives_remote_id_assignment() {
        let mut h = Habit::new("Read");
        let before = h.id;
        h.remote_id = Some("doc-1".into());
        assert_eq!(h.id, before);
    }

    #[test]
    fn unsaved_habit_is_written_under_its_local_id() {
        let mut h = Habit::new("Run");
        assert_eq!(h.document_id(), h.id.to_string());
        h.remote_id = Some("a".into());
        assert_eq!(h.document_id(), "a");
    }

    #[test]
    fn each_habit_gets_a_distinct_id() {
        assert_ne!(Habit::new("a").id, Habit::new("a").id);
    }

    #[test]
    fn partition_keeps_relative_order() {
        let mut list = vec![
            habit("a", true),
            habit("b", false),
            habit("c", true),
            habit("d", false),
        ];
        stable_partition(&mut list);
        assert_eq!(names(&list), ["b", "d", "a", "c"]);
        assert!(is_partitioned(&list));
    }

    #[test]
    fn completing_moves_habit_behind_existing_completed() {
        let mut list = vec![habit("a", false), habit("b", true)];
        list[0].is_completed = true;
        assert_eq!(move_to_group_end(&mut list, 0), Some(1));
        assert_eq!(names(&list), ["b", "a"]);
    }

    #[test]
    fn reopening_moves_habit_to_end_of_incomplete_group() {
        let mut list = vec![habit("a", false), habit("b", true), habit("c", true)];
        list[2].is_completed = false;
        assert_eq!(move_to_group_end(&mut list, 2), Some(1));
        assert_eq!(names(&list), ["a", "c", "b"]);
        assert!(is_partitioned(&list));
    }

    #[test]
    fn move_out_of_range_is_none() {
        let mut list = vec![habit("a", false)];
        assert_eq!(move_to_group_end(&mut list, 3), None);
    }

    #[test]
    fn progress_of_empty_list_is_zero() {
        assert_eq!(progress(&[]), 0.0);
        let list = vec![habit("a", true), habit("b", false)];
        assert_eq!(completed_count(&list), 1);
        assert!((progress(&list) - 0.5).abs() < f64::EPSILON);
    }
}
