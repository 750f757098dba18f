//! Firestore REST adapter.
//!
//! Habits live at `users/{uid}/habits/{docId}`. Firestore wraps every field
//! in a typed value (`{"stringValue": "Run"}`); this module converts between
//! that form and plain [`HabitDocument`] JSON.
//!
//! Saves are upserts (`PATCH habits/{docId}`) keyed on
//! [`Habit::document_id`], so overlapping saves of one habit land on one
//! document and the last write wins.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde_json::{json, Map, Value};
use url::Url;

use super::{decode_documents, HabitDocument, RemoteHabitStore, UserScope};
use crate::error::StoreError;
use crate::habit::Habit;
use crate::storage::RemoteConfig;

/// Firestore-backed [`RemoteHabitStore`].
#[derive(Debug, Clone)]
pub struct FirestoreHabitStore {
    client: Client,
    api_base: String,
    project_id: String,
    database: String,
}

impl FirestoreHabitStore {
    pub fn new(
        api_base: impl Into<String>,
        project_id: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.into(),
            project_id: project_id.into(),
            database: database.into(),
        }
    }

    pub fn from_config(config: &RemoteConfig) -> Self {
        Self::new(&config.api_base, &config.project_id, &config.database)
    }

    /// URL of the user's habit collection, or of one document in it.
    fn habits_url(&self, scope: &UserScope, document_id: Option<&str>) -> Result<Url, StoreError> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|e| StoreError::RemoteIo(format!("invalid api base '{}': {e}", self.api_base)))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| StoreError::RemoteIo(format!("api base '{}' cannot hold a path", self.api_base)))?;
            segments.pop_if_empty().extend([
                "projects",
                self.project_id.as_str(),
                "databases",
                self.database.as_str(),
                "documents",
                "users",
                scope.user_id.as_str(),
                "habits",
            ]);
            if let Some(id) = document_id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url, scope: &UserScope) -> Result<RequestBuilder, StoreError> {
        let token = scope.id_token.as_deref().ok_or(StoreError::AuthRequired)?;
        Ok(self.client.request(method, url).bearer_auth(token))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value, StoreError> {
        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(StoreError::AuthRequired);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::RemoteIo(format!("HTTP {status}: {body}")));
        }
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| StoreError::RemoteIo(format!("invalid response body: {e}")))
    }
}

/// Last path segment of a Firestore document name.
pub fn document_id(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

/// Unwrap Firestore typed values into plain JSON.
///
/// Unknown value kinds are kept as-is so that decoding reports them.
pub fn fields_to_plain(fields: &Value) -> Value {
    let Some(obj) = fields.as_object() else {
        return Value::Null;
    };
    let plain: Map<String, Value> = obj
        .iter()
        .map(|(key, typed)| {
            let value = if let Some(s) = typed.get("stringValue") {
                s.clone()
            } else if let Some(b) = typed.get("booleanValue") {
                b.clone()
            } else if let Some(i) = typed.get("integerValue") {
                i.as_str()
                    .and_then(|s| s.parse::<i64>().ok())
                    .map(Value::from)
                    .unwrap_or_else(|| i.clone())
            } else if let Some(d) = typed.get("doubleValue") {
                d.clone()
            } else if typed.get("nullValue").is_some() {
                Value::Null
            } else {
                typed.clone()
            };
            (key.clone(), value)
        })
        .collect();
    Value::Object(plain)
}

/// Wrap a habit document in Firestore's typed field form.
pub fn document_fields(doc: &HabitDocument) -> Value {
    json!({
        "fields": {
            "name": { "stringValue": doc.name },
            "isCompleted": { "booleanValue": doc.is_completed },
        }
    })
}

#[async_trait]
impl RemoteHabitStore for FirestoreHabitStore {
    async fn load_habits(&self, scope: &UserScope) -> Result<Vec<Habit>, StoreError> {
        let mut raw_documents: Vec<(String, Value)> = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.habits_url(scope, None)?;
            if let Some(token) = &page_token {
                url.query_pairs_mut().append_pair("pageToken", token);
            }
            let body = self.send(self.request(Method::GET, url, scope)?).await?;

            if let Some(documents) = body.get("documents").and_then(Value::as_array) {
                for document in documents {
                    let id = document
                        .get("name")
                        .and_then(Value::as_str)
                        .map(document_id)
                        .unwrap_or_default()
                        .to_string();
                    let plain = fields_to_plain(document.get("fields").unwrap_or(&Value::Null));
                    raw_documents.push((id, plain));
                }
            }

            page_token = body
                .get("nextPageToken")
                .and_then(Value::as_str)
                .filter(|t| !t.is_empty())
                .map(str::to_string);
            if page_token.is_none() {
                break;
            }
        }

        let habits = decode_documents(raw_documents.iter().map(|(id, raw)| (id.as_str(), raw)));
        tracing::info!(
            user = %scope.user_id,
            loaded = habits.len(),
            skipped = raw_documents.len() - habits.len(),
            "Loaded habits"
        );
        Ok(habits)
    }

    async fn save_habit(&self, habit: &Habit, scope: &UserScope) -> Result<String, StoreError> {
        // PATCH creates the document when it does not exist yet.
        let id = habit.document_id();
        let body = document_fields(&HabitDocument::from_habit(habit));
        let url = self.habits_url(scope, Some(&id))?;
        let saved = self.send(self.request(Method::PATCH, url, scope)?.json(&body)).await?;

        let stored_as = saved
            .get("name")
            .and_then(Value::as_str)
            .map(document_id)
            .unwrap_or(id.as_str())
            .to_string();
        tracing::debug!(user = %scope.user_id, document = %stored_as, "Saved habit");
        Ok(stored_as)
    }

    async fn delete_habit(&self, habit: &Habit, scope: &UserScope) -> Result<(), StoreError> {
        let id = habit
            .remote_id
            .as_deref()
            .ok_or_else(|| StoreError::MissingRemoteId(habit.name.clone()))?;
        let url = self.habits_url(scope, Some(id))?;
        self.send(self.request(Method::DELETE, url, scope)?).await?;
        tracing::info!(user = %scope.user_id, document = id, "Deleted habit");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_id_is_last_segment() {
        assert_eq!(
            document_id("projects/p/databases/(default)/documents/users/u/habits/abc"),
            "abc"
        );
        assert_eq!(document_id("abc"), "abc");
    }

    #[test]
    fn typed_fields_unwrap_to_plain_json() {
        let fields = json!({
            "name": {"stringValue": "Run"},
            "isCompleted": {"booleanValue": true},
            "count": {"integerValue": "3"},
        });
        assert_eq!(
            fields_to_plain(&fields),
            json!({"name": "Run", "isCompleted": true, "count": 3})
        );
    }

    #[test]
    fn collection_url_escapes_user_id() {
        let store = FirestoreHabitStore::new("https://example.test/v1", "proj", "(default)");
        let scope = UserScope::new("a/b");
        let url = store.habits_url(&scope, Some("doc1")).unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.test/v1/projects/proj/databases/(default)/documents/users/a%2Fb/habits/doc1"
        );
    }

    #[test]
    fn request_without_token_requires_auth() {
        let store = FirestoreHabitStore::new("https://example.test/v1", "proj", "(default)");
        let url = store.habits_url(&UserScope::new("u"), None).unwrap();
        let result = store.request(Method::GET, url, &UserScope::new("u"));
        assert!(matches!(result, Err(StoreError::AuthRequired)));
    }
}
