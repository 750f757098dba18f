//! Optimistic add / toggle / delete.
//!
//! Each operation changes local state immediately and then issues its
//! remote write. A failed write only records an error; the local change
//! stays.

use std::collections::BTreeSet;

use super::HabitCoordinator;
use crate::habit::{move_to_group_end, stable_partition, Habit, HabitId};

impl HabitCoordinator {
    /// Replace the pending input buffer.
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.state.pending_input = text.into();
        self.publish();
    }

    /// Add the pending input as a habit.
    pub fn submit_input(&mut self) -> Option<HabitId> {
        let text = self.state.pending_input.clone();
        self.add(&text)
    }

    /// Add a habit named `raw_name` (trimmed). Blank names are ignored.
    ///
    /// Returns the new habit's id.
    pub fn add(&mut self, raw_name: &str) -> Option<HabitId> {
        let name = raw_name.trim();
        if name.is_empty() {
            return None;
        }

        let habit = Habit::new(name);
        let id = habit.id;
        self.state.habits.push(habit);
        stable_partition(&mut self.state.habits);
        self.state.pending_input.clear();
        self.queue_save(id);
        self.publish();
        Some(id)
    }

    /// Flip completion of the habit with `id`. Unknown ids are ignored.
    ///
    /// The habit moves to the end of the group it joins. Returns the new
    /// completion value.
    pub fn toggle(&mut self, id: HabitId) -> Option<bool> {
        let index = self.state.habits.iter().position(|h| h.id == id)?;
        let completed = {
            let habit = &mut self.state.habits[index];
            habit.is_completed = !habit.is_completed;
            habit.is_completed
        };
        move_to_group_end(&mut self.state.habits, index);
        self.update_streak();
        self.queue_save(id);
        self.publish();
        Some(completed)
    }

    /// Remove the habits at `positions` (indices into the current list).
    ///
    /// Out-of-range and repeated positions are ignored. Habits that were
    /// never persisted are dropped without contacting the store. Returns the
    /// removed habits in list order.
    pub fn delete(&mut self, positions: &[usize]) -> Vec<Habit> {
        let len = self.state.habits.len();
        let targets: BTreeSet<usize> = positions.iter().copied().filter(|&p| p < len).collect();

        let mut removed: Vec<Habit> = targets
            .iter()
            .rev()
            .map(|&p| self.state.habits.remove(p))
            .collect();
        removed.reverse();

        for habit in &removed {
            if habit.remote_id.is_some() {
                self.queue_delete(habit.clone());
            } else {
                tracing::debug!(habit = %habit.name, "Skipping remote delete of unsaved habit");
            }
        }

        self.update_streak();
        self.publish();
        removed
    }

    /// Remove habits by id rather than position.
    pub fn delete_ids(&mut self, ids: &[HabitId]) -> Vec<Habit> {
        let positions: Vec<usize> = self
            .state
            .habits
            .iter()
            .enumerate()
            .filter(|(_, h)| ids.contains(&h.id))
            .map(|(i, _)| i)
            .collect();
        self.delete(&positions)
    }
}
