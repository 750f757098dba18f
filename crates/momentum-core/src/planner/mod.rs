//! Weekly planner: weekday name -> ordered task names.
//!
//! The habit engine only reads through [`PlannerStore::tasks_for_day`].
//! [`PlannerData`] owns the write path and persists the whole map under
//! [`PLANNER_STORAGE_KEY`] after every change.

use indexmap::IndexMap;
use std::sync::{Arc, RwLock};

use crate::error::StorageError;
use crate::storage::{load_json, save_json, KeyValueStore};

/// Storage key of the planner blob.
pub const PLANNER_STORAGE_KEY: &str = "savedPlannerTasks";

/// Ordered weekday -> tasks mapping as stored on disk.
pub type PlannerTaskMap = IndexMap<String, Vec<String>>;

/// Read access to the planner.
pub trait PlannerStore: Send + Sync {
    /// Tasks planned for `day` (a full weekday name), empty if none.
    fn tasks_for_day(&self, day: &str) -> Vec<String>;
}

/// Planner backed by a [`KeyValueStore`].
pub struct PlannerData {
    tasks_by_day: RwLock<PlannerTaskMap>,
    storage: Arc<dyn KeyValueStore>,
}

impl PlannerData {
    /// Load the persisted map. A missing or unreadable blob yields an empty
    /// planner.
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let tasks_by_day = match load_json::<PlannerTaskMap>(storage.as_ref(), PLANNER_STORAGE_KEY) {
            Ok(Some(map)) => map,
            Ok(None) => PlannerTaskMap::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unreadable planner tasks");
                PlannerTaskMap::new()
            }
        };
        Self {
            tasks_by_day: RwLock::new(tasks_by_day),
            storage,
        }
    }

    /// Append `task` to `day`'s list and persist.
    pub fn add_task(&self, day: &str, task: &str) -> Result<(), StorageError> {
        let mut map = self.write();
        map.entry(day.to_string()).or_default().push(task.to_string());
        save_json(self.storage.as_ref(), PLANNER_STORAGE_KEY, &*map)
    }

    /// Remove the task at `index` from `day` and persist. Returns the removed
    /// task, or `None` if there was nothing at that position.
    pub fn delete_task(&self, day: &str, index: usize) -> Result<Option<String>, StorageError> {
        let mut map = self.write();
        let removed = match map.get_mut(day) {
            Some(tasks) if index < tasks.len() => Some(tasks.remove(index)),
            _ => None,
        };
        if removed.is_some() {
            save_json(self.storage.as_ref(), PLANNER_STORAGE_KEY, &*map)?;
        }
        Ok(removed)
    }

    /// Snapshot of the whole map.
    pub fn days(&self) -> PlannerTaskMap {
        self.read().clone()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, PlannerTaskMap> {
        self.tasks_by_day.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, PlannerTaskMap> {
        self.tasks_by_day.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl PlannerStore for PlannerData {
    fn tasks_for_day(&self, day: &str) -> Vec<String> {
        self.read().get(day).cloned().unwrap_or_default()
    }
}
