//! Habit store kept in the local key-value store.
//!
//! Backs the CLI's offline mode. Documents are kept per user as raw JSON
//! under [`LOCAL_HABITS_KEY`], with the same upsert-by-document-id rules as
//! the remote stores.

use async_trait::async_trait;
use indexmap::IndexMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{decode_documents, HabitDocument, RemoteHabitStore, UserScope};
use crate::error::StoreError;
use crate::habit::Habit;
use crate::storage::{load_json, save_json, KeyValueStore};

/// Storage key of the offline habit collections.
pub const LOCAL_HABITS_KEY: &str = "offlineHabits";

type Collections = IndexMap<String, IndexMap<String, serde_json::Value>>;

/// [`RemoteHabitStore`] over a [`KeyValueStore`].
pub struct LocalHabitStore {
    storage: Arc<dyn KeyValueStore>,
    // Serializes read-modify-write cycles on the blob.
    write_lock: Mutex<()>,
}

impl LocalHabitStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            storage,
            write_lock: Mutex::new(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read(&self) -> Result<Collections, StoreError> {
        Ok(load_json::<Collections>(self.storage.as_ref(), LOCAL_HABITS_KEY)?.unwrap_or_default())
    }

    fn write(&self, collections: &Collections) -> Result<(), StoreError> {
        Ok(save_json(self.storage.as_ref(), LOCAL_HABITS_KEY, collections)?)
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
impl RemoteHabitStore for LocalHabitStore {
    async fn load_habits(&self, scope: &UserScope) -> Result<Vec<Habit>, StoreError> {
        Self::check_scope(scope)?;
        let collections = {
            let _guard = self.lock();
            self.read()?
        };
        Ok(match collections.get(&scope.user_id) {
            Some(docs) => decode_documents(docs.iter().map(|(id, raw)| (id.as_str(), raw))),
            None => Vec::new(),
        })
    }

    async fn save_habit(&self, habit: &Habit, scope: &UserScope) -> Result<String, StoreError> {
        Self::check_scope(scope)?;
        let raw = serde_json::to_value(HabitDocument::from_habit(habit)).map_err(|e| StoreError::Encode {
            name: habit.name.clone(),
            message: e.to_string(),
        })?;
        let document_id = habit.document_id();

        let _guard = self.lock();
        let mut collections = self.read()?;
        collections
            .entry(scope.user_id.clone())
            .or_default()
            .insert(document_id.clone(), raw);
        self.write(&collections)?;
        Ok(document_id)
    }

    async fn delete_habit(&self, habit: &Habit, scope: &UserScope) -> Result<(), StoreError> {
        Self::check_scope(scope)?;
        let remote_id = habit
            .remote_id
            .as_deref()
            .ok_or_else(|| StoreError::MissingRemoteId(habit.name.clone()))?;

        let _guard = self.lock();
        let mut collections = self.read()?;
        if let Some(docs) = collections.get_mut(&scope.user_id) {
            if docs.shift_remove(remote_id).is_some() {
                self.write(&collections)?;
            }
        }
        Ok(())
    }
}
