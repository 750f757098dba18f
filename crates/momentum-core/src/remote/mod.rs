//! Remote per-user habit document store.
//!
//! Every call is scoped to one authenticated user. Documents carry only
//! `{name, isCompleted}`; the document id is the habit's `remote_id`, or
//! its local id before the first save has been confirmed.

pub mod firestore;
pub mod local;
pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::habit::Habit;

pub use firestore::FirestoreHabitStore;
pub use local::LocalHabitStore;
pub use memory::{MemoryHabitStore, StoreCall, StoreOp};

/// The authenticated user a remote call acts for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserScope {
    pub user_id: String,
    /// Bearer token presented to the store, if it needs one.
    pub id_token: Option<String>,
}

impl UserScope {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            id_token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.id_token = Some(token.into());
        self
    }
}

/// Wire form of a habit document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitDocument {
    pub name: String,
    pub is_completed: bool,
}

impl HabitDocument {
    pub fn from_habit(habit: &Habit) -> Self {
        Self {
            name: habit.name.clone(),
            is_completed: habit.is_completed,
        }
    }

    pub fn into_habit(self, remote_id: impl Into<String>) -> Habit {
        Habit::from_remote(remote_id, self.name, self.is_completed)
    }
}

/// Decode one raw document, reporting which document failed.
pub fn decode_document(document_id: &str, raw: &serde_json::Value) -> Result<Habit, StoreError> {
    serde_json::from_value::<HabitDocument>(raw.clone())
        .map(|doc| doc.into_habit(document_id))
        .map_err(|e| StoreError::Decode {
            document_id: document_id.to_string(),
            message: e.to_string(),
        })
}

/// Decode a batch, dropping (and logging) documents that fail.
pub fn decode_documents<'a, I>(documents: I) -> Vec<Habit>
where
    I: IntoIterator<Item = (&'a str, &'a serde_json::Value)>,
{
    documents
        .into_iter()
        .filter_map(|(id, raw)| match decode_document(id, raw) {
            Ok(habit) => Some(habit),
            Err(e) => {
                tracing::warn!(document = id, error = %e, "Skipping undecodable habit document");
                None
            }
        })
        .collect()
}

/// Remote persistence for habits.
#[async_trait]
pub trait RemoteHabitStore: Send + Sync {
    /// All decodable habits of `scope`'s user.
    async fn load_habits(&self, scope: &UserScope) -> Result<Vec<Habit>, StoreError>;

    /// Create or overwrite the document at [`Habit::document_id`].
    /// Returns the document id it is stored under.
    async fn save_habit(&self, habit: &Habit, scope: &UserScope) -> Result<String, StoreError>;

    /// Delete a persisted habit. Habits without a `remote_id` are rejected
    /// with [`StoreError::MissingRemoteId`].
    async fn delete_habit(&self, habit: &Habit, scope: &UserScope) -> Result<(), StoreError>;
}
