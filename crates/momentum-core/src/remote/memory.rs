//! In-memory document store.
//!
//! Holds raw JSON documents per user, so malformed documents can be seeded,
//! and records every call it receives. Failures can be injected per
//! operation. Used by tests.

use async_trait::async_trait;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Mutex;

use super::{decode_documents, HabitDocument, RemoteHabitStore, UserScope};
use crate::error::StoreError;
use crate::habit::Habit;

/// A call observed by [`MemoryHabitStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Load {
        user_id: String,
    },
    Save {
        user_id: String,
        remote_id: Option<String>,
        name: String,
        is_completed: bool,
    },
    Delete {
        user_id: String,
        remote_id: Option<String>,
    },
}

/// Operation selector for failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Load,
    Save,
    Delete,
}

#[derive(Default)]
struct Inner {
    collections: HashMap<String, IndexMap<String, serde_json::Value>>,
    calls: Vec<StoreCall>,
    failures: HashMap<StoreOp, StoreError>,
}

#[derive(Default)]
pub struct MemoryHabitStore {
    inner: Mutex<Inner>,
}

impl MemoryHabitStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Insert a raw document for `user_id`, bypassing encoding.
    pub fn insert_raw(&self, user_id: &str, document_id: &str, raw: serde_json::Value) {
        self.inner()
            .collections
            .entry(user_id.to_string())
            .or_default()
            .insert(document_id.to_string(), raw);
    }

    /// Insert a well-formed habit document.
    pub fn insert(&self, user_id: &str, document_id: &str, name: &str, is_completed: bool) {
        let doc = HabitDocument {
            name: name.to_string(),
            is_completed,
        };
        let raw = serde_json::to_value(doc).unwrap_or_default();
        self.insert_raw(user_id, document_id, raw);
    }

    /// Make every subsequent `op` fail with `error` until cleared.
    pub fn fail(&self, op: StoreOp, error: StoreError) {
        self.inner().failures.insert(op, error);
    }

    pub fn clear_failure(&self, op: StoreOp) {
        self.inner().failures.remove(&op);
    }

    /// Every call received so far, in arrival order.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.inner().calls.clone()
    }

    pub fn save_calls(&self) -> Vec<StoreCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, StoreCall::Save { .. }))
            .collect()
    }

    pub fn delete_calls(&self) -> Vec<StoreCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, StoreCall::Delete { .. }))
            .collect()
    }

    /// Raw documents currently stored for `user_id`.
    pub fn documents(&self, user_id: &str) -> IndexMap<String, serde_json::Value> {
        self.inner()
            .collections
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }

    fn check_scope(scope: &UserScope) -> Result<(), StoreError> {
        if scope.user_id.is_empty() {
            Err(StoreError::AuthRequired)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RemoteHabitStore for MemoryHabitStore {
    async fn load_habits(&self, scope: &UserScope) -> Result<Vec<Habit>, StoreError> {
        Self::check_scope(scope)?;
        let mut inner = self.inner();
        inner.calls.push(StoreCall::Load {
            user_id: scope.user_id.clone(),
        });
        if let Some(err) = inner.failures.get(&StoreOp::Load) {
            return Err(err.clone());
        }
        let habits = match inner.collections.get(&scope.user_id) {
            Some(docs) => decode_documents(docs.iter().map(|(id, raw)| (id.as_str(), raw))),
            None => Vec::new(),
        };
        Ok(habits)
    }

    async fn save_habit(&self, habit: &Habit, scope: &UserScope) -> Result<String, StoreError> {
        Self::check_scope(scope)?;
        let mut inner = self.inner();
        inner.calls.push(StoreCall::Save {
            user_id: scope.user_id.clone(),
            remote_id: habit.remote_id.clone(),
            name: habit.name.clone(),
            is_completed: habit.is_completed,
        });
        if let Some(err) = inner.failures.get(&StoreOp::Save) {
            return Err(err.clone());
        }

        let raw = serde_json::to_value(HabitDocument::from_habit(habit)).map_err(|e| {
            StoreError::Encode {
                name: habit.name.clone(),
                message: e.to_string(),
            }
        })?;
        let document_id = habit.document_id();
        inner
            .collections
            .entry(scope.user_id.clone())
            .or_default()
            .insert(document_id.clone(), raw);
        Ok(document_id)
    }

    async fn delete_habit(&self, habit: &Habit, scope: &UserScope) -> Result<(), StoreError> {
        Self::check_scope(scope)?;
        let mut inner = self.inner();
        inner.calls.push(StoreCall::Delete {
            user_id: scope.user_id.clone(),
            remote_id: habit.remote_id.clone(),
        });
        let Some(remote_id) = habit.remote_id.as_deref() else {
            return Err(StoreError::MissingRemoteId(habit.name.clone()));
        };
        if let Some(err) = inner.failures.get(&StoreOp::Delete) {
            return Err(err.clone());
        }
        if let Some(docs) = inner.collections.get_mut(&scope.user_id) {
            docs.shift_remove(remote_id);
        }
        Ok(())
    }
}
