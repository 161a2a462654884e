//! End-to-end tests driving the full router against a file-backed database.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use qrvault::config::ServerConfig;
use qrvault::{Server, Storage};

fn router_for(storage: Arc<Storage>) -> Router {
    Server::new(ServerConfig::default(), storage).router()
}

async fn call(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = router
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn save_list_delete_round() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(Storage::open(dir.path().join("vault.db")).unwrap());
    let router = router_for(Arc::clone(&storage));

    let (status, saved) = call(
        &router,
        Method::POST,
        "/api/save",
        Some(json!({ "content": "hello", "user_id": "abc" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(saved["content"], "hello");
    let id = saved["id"].as_i64().unwrap();

    let (status, history) = call(&router, Method::GET, "/api/history?user_id=abc", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history, json!([saved]));

    let (status, deleted) = call(
        &router,
        Method::DELETE,
        &format!("/api/history/{id}?user_id=abc"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted, json!({ "message": "Deleted" }));

    let (status, history) = call(&router, Method::GET, "/api/history?user_id=abc", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history, json!([]));

    // The client outlives its records
    let stats = storage.stats().unwrap();
    assert_eq!(stats.total_clients, 1);
    assert_eq!(stats.total_records, 0);
}

#[tokio::test]
async fn repeated_saves_share_one_client() {
    let storage = Arc::new(Storage::open_in_memory().unwrap());
    let router = router_for(Arc::clone(&storage));

    for content in ["first", "second"] {
        let (status, _) = call(
            &router,
            Method::POST,
            "/api/save",
            Some(json!({ "content": content, "user_id": "new-client" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let stats = storage.stats().unwrap();
    assert_eq!(stats.total_clients, 1);
    assert_eq!(stats.total_records, 2);
}

#[tokio::test]
async fn concurrent_first_saves_create_one_client() {
    let storage = Arc::new(Storage::open_in_memory().unwrap());
    let router = router_for(Arc::clone(&storage));

    let mut tasks = Vec::new();
    for i in 0..8 {
        let router = router.clone();
        tasks.push(tokio::spawn(async move {
            call(
                &router,
                Method::POST,
                "/api/save",
                Some(json!({ "content": format!("item {i}"), "user_id": "racer" })),
            )
            .await
            .0
        }));
    }
    for task in tasks {
        assert_eq!(task.await.unwrap(), StatusCode::CREATED);
    }

    let stats = storage.stats().unwrap();
    assert_eq!(stats.total_clients, 1);
    assert_eq!(stats.total_records, 8);
}

#[tokio::test]
async fn purged_client_leaves_no_records() {
    let storage = Arc::new(Storage::open_in_memory().unwrap());
    let router = router_for(Arc::clone(&storage));

    for user in ["keep", "drop", "drop"] {
        call(
            &router,
            Method::POST,
            "/api/save",
            Some(json!({ "content": "payload", "user_id": user })),
        )
        .await;
    }

    {
        let mut session = storage.session().unwrap();
        let summary = qrvault::vault::purge_client(&mut session, "drop")
            .unwrap()
            .unwrap();
        assert_eq!(summary.records_deleted, 2);
    }

    let (_, history) = call(&router, Method::GET, "/api/history?user_id=drop", None).await;
    assert_eq!(history, json!([]));
    let (_, history) = call(&router, Method::GET, "/api/history?user_id=keep", None).await;
    assert_eq!(history.as_array().unwrap().len(), 1);

    let stats = storage.stats().unwrap();
    assert_eq!(stats.total_clients, 1);
    assert_eq!(stats.total_records, 1);
}
