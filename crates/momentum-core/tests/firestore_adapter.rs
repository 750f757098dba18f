//! Firestore adapter tests against a mocked REST endpoint.

use mockito::{Matcher, Server};
use momentum_core::remote::FirestoreHabitStore;
use momentum_core::{Habit, RemoteHabitStore, StoreError, UserScope};
use serde_json::json;

const COLLECTION: &str = "/v1/projects/proj/databases/(default)/documents/users/u1/habits";

fn store_for(server: &Server) -> FirestoreHabitStore {
    FirestoreHabitStore::new(format!("{}/v1", server.url()), "proj", "(default)")
}

fn scope() -> UserScope {
    UserScope::new("u1").with_token("tok")
}

fn document(id: &str, fields: serde_json::Value) -> serde_json::Value {
    json!({
        "name": format!("projects/proj/databases/(default)/documents/users/u1/habits/{id}"),
        "fields": fields,
    })
}

#[tokio::test]
async fn test_load_follows_pages_and_skips_bad_documents() {
    let mut server = Server::new_async().await;
    let first = server
        .mock("GET", COLLECTION)
        .match_query(Matcher::Regex("^$".into()))
        .match_header("authorization", "Bearer tok")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "documents": [
                    document("a", json!({"name": {"stringValue": "Run"}, "isCompleted": {"booleanValue": false}})),
                    document("b", json!({"title": {"stringValue": "Broken"}})),
                ],
                "nextPageToken": "p2",
            })
            .to_string(),
        )
        .create_async()
        .await;
    let second = server
        .mock("GET", COLLECTION)
        .match_query(Matcher::UrlEncoded("pageToken".into(), "p2".into()))
        .with_status(200)
        .with_body(
            json!({
                "documents": [
                    document("c", json!({"name": {"stringValue": "Read"}, "isCompleted": {"booleanValue": true}})),
                ],
            })
            .to_string(),
        )
        .create_async()
        .await;

    let habits = store_for(&server).load_habits(&scope()).await.unwrap();

    first.assert_async().await;
    second.assert_async().await;
    let loaded: Vec<_> = habits
        .iter()
        .map(|h| (h.remote_id.as_deref(), h.name.as_str(), h.is_completed))
        .collect();
    assert_eq!(loaded, [(Some("a"), "Run", false), (Some("c"), "Read", true)]);
}

#[tokio::test]
async fn test_empty_collection_loads_nothing() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", COLLECTION)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let habits = store_for(&server).load_habits(&scope()).await.unwrap();
    mock.assert_async().await;
    assert!(habits.is_empty());
}

#[tokio::test]
async fn test_save_new_habit_upserts_under_local_id() {
    let mut server = Server::new_async().await;
    let habit = Habit::new("Meditate");
    let local_id = habit.id.to_string();
    let mock = server
        .mock("PATCH", format!("{COLLECTION}/{local_id}").as_str())
        .match_query(Matcher::Any)
        .match_body(Matcher::Json(json!({
            "fields": {
                "name": {"stringValue": "Meditate"},
                "isCompleted": {"booleanValue": false},
            }
        })))
        .with_status(200)
        .with_body(document(&local_id, json!({})).to_string())
        .create_async()
        .await;

    let remote_id = store_for(&server).save_habit(&habit, &scope()).await.unwrap();

    mock.assert_async().await;
    assert_eq!(remote_id, local_id);
}

#[tokio::test]
async fn test_repeated_saves_of_new_habit_target_one_document() {
    let mut server = Server::new_async().await;
    let mut habit = Habit::new("Run");
    let mock = server
        .mock("PATCH", format!("{COLLECTION}/{}", habit.id).as_str())
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("{}")
        .expect(2)
        .create_async()
        .await;
    let create = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let store = store_for(&server);
    let first = store.save_habit(&habit, &scope()).await.unwrap();
    habit.is_completed = true;
    let second = store.save_habit(&habit, &scope()).await.unwrap();

    mock.assert_async().await;
    create.assert_async().await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_save_persisted_habit_overwrites_document() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("PATCH", format!("{COLLECTION}/a").as_str())
        .match_query(Matcher::Any)
        .match_body(Matcher::Json(json!({
            "fields": {
                "name": {"stringValue": "Run"},
                "isCompleted": {"booleanValue": true},
            }
        })))
        .with_status(200)
        .with_body(document("a", json!({})).to_string())
        .create_async()
        .await;

    let habit = Habit::from_remote("a", "Run", true);
    let remote_id = store_for(&server).save_habit(&habit, &scope()).await.unwrap();

    mock.assert_async().await;
    assert_eq!(remote_id, "a");
}

#[tokio::test]
async fn test_delete_removes_document() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("DELETE", format!("{COLLECTION}/a").as_str())
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let habit = Habit::from_remote("a", "Run", false);
    store_for(&server).delete_habit(&habit, &scope()).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_delete_unsaved_habit_is_rejected_locally() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("DELETE", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let err = store_for(&server)
        .delete_habit(&Habit::new("Run"), &scope())
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert_eq!(err, StoreError::MissingRemoteId("Run".into()));
}

#[tokio::test]
async fn test_unauthorized_maps_to_auth_required() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", COLLECTION)
        .match_query(Matcher::Any)
        .with_status(401)
        .with_body(r#"{"error": {"status": "UNAUTHENTICATED"}}"#)
        .create_async()
        .await;

    let err = store_for(&server).load_habits(&scope()).await.unwrap_err();
    assert_eq!(err, StoreError::AuthRequired);
}

#[tokio::test]
async fn test_missing_token_sends_nothing() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let err = store_for(&server)
        .load_habits(&UserScope::new("u1"))
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert_eq!(err, StoreError::AuthRequired);
}

#[tokio::test]
async fn test_server_error_is_remote_io() {
    let mut server = Server::new_async().await;
    let habit = Habit::new("Run");
    let _mock = server
        .mock("PATCH", format!("{COLLECTION}/{}", habit.id).as_str())
        .match_query(Matcher::Any)
        .with_status(503)
        .with_body("unavailable")
        .create_async()
        .await;

    let err = store_for(&server)
        .save_habit(&habit, &scope())
        .await
        .unwrap_err();

    match err {
        StoreError::RemoteIo(message) => {
            assert!(message.contains("503"));
            assert!(message.contains("unavailable"));
        }
        other => panic!("expected RemoteIo, got {other:?}"),
    }
}
