//! Loading remote habits and merging today's planner tasks.

use std::collections::HashSet;

use super::{Completion, HabitCoordinator, OperationError};
use crate::clock::full_weekday_name;
use crate::error::StoreError;
use crate::habit::{stable_partition, Habit};

impl HabitCoordinator {
    /// The view became active: load if there is nothing to show yet, and
    /// refresh the streak map from storage.
    pub fn activate(&mut self) {
        if self.state.habits.is_empty() && self.scope.is_some() && !self.state.is_loading {
            self.load();
        }
        self.streak.reload();
        self.publish();
    }

    /// Start loading the signed-in user's habits.
    ///
    /// The result is applied when its completion arrives: on success the
    /// list is replaced, planner tasks are merged and the streak updated;
    /// on failure the list is left alone and the load error recorded.
    pub fn load(&mut self) {
        let Some(scope) = self.scope.clone() else {
            tracing::warn!("Cannot load habits without a signed-in user");
            self.state.last_error = Some(OperationError::load(StoreError::AuthRequired));
            self.publish();
            return;
        };

        self.state.is_loading = true;
        self.state.last_error = None;
        let store = self.store.clone();
        self.spawn(async move { Completion::Loaded(store.load_habits(&scope).await) });
        self.publish();
    }

    pub(super) fn apply_loaded(&mut self, result: Result<Vec<Habit>, StoreError>) {
        self.state.is_loading = false;
        match result {
            Ok(mut habits) => {
                tracing::info!(count = habits.len(), "Loaded habits");
                stable_partition(&mut habits);
                self.state.habits = habits;
                self.merge_planner_tasks();
                self.update_streak();
            }
            Err(e) => {
                tracing::warn!(error = %e, "Error loading habits");
                self.state.last_error = Some(OperationError::load(e));
            }
        }
    }

    /// Add today's planner tasks that are not already habits.
    ///
    /// Runs at most once per session: the merge-window flag is set even when
    /// nothing was added, and only [`reset`](Self::reset) clears it. Names
    /// are compared exactly, against existing habits and against tasks
    /// already added in this pass.
    pub fn merge_planner_tasks(&mut self) {
        if self.state.merged_planner {
            return;
        }

        let today = full_weekday_name(self.clock.weekday());
        let tasks = self.planner.tasks_for_day(today);
        let mut seen: HashSet<String> = self.state.habits.iter().map(|h| h.name.clone()).collect();

        let mut added = Vec::new();
        for task in tasks {
            if seen.contains(&task) {
                continue;
            }
            let habit = Habit::new(task.clone());
            seen.insert(task);
            added.push(habit.id);
            self.state.habits.push(habit);
        }

        for &id in &added {
            self.queue_save(id);
        }
        if !added.is_empty() {
            tracing::info!(day = today, added = added.len(), "Merged planner tasks into habits");
            stable_partition(&mut self.state.habits);
        }
        self.state.merged_planner = true;
        self.publish();
    }
}
