use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, app_with_store, Db, Task, User};
use serde_json::Value;
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn form_request(uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(body.to_string())
        .unwrap()
}

fn get_request(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn delete_request(uri: &str) -> Request<String> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(String::new())
        .unwrap()
}

async fn seeded() -> (Db, i64, i64) {
    let db = Db::default();
    let mut store = db.write().await;
    let ada = store.insert_user("Ada", Some("ada@example.com"));
    let task = store.insert_task(ada.id, "Write report", "", "high").unwrap();
    drop(store);
    (db, ada.id, task.id)
}

// --- list ---

#[tokio::test]
async fn list_users_empty() {
    let resp = app().oneshot(get_request("/get_users")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let users: Vec<User> = body_json(resp).await;
    assert!(users.is_empty());
}

#[tokio::test]
async fn list_tasks_embeds_owner() {
    let (db, ada, _) = seeded().await;
    let resp = app_with_store(db).oneshot(get_request("/get_tasks")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let tasks: Vec<Value> = body_json(resp).await;
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["users"]["id"], ada);
    assert_eq!(tasks[0]["users"]["name"], "Ada");
    assert_eq!(tasks[0]["status"], "pending");
}

#[tokio::test]
async fn list_user_tasks_for_unknown_user_is_empty() {
    let (db, _, _) = seeded().await;
    let resp = app_with_store(db)
        .oneshot(get_request("/get_user_tasks/999"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let tasks: Vec<Task> = body_json(resp).await;
    assert!(tasks.is_empty());
}

// --- register ---

#[tokio::test]
async fn register_user_succeeds() {
    let resp = app()
        .oneshot(form_request("/register_user", "name=Grace+Hopper&email=grace%40navy.mil"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["name"], "Grace Hopper");
    assert_eq!(body["user"]["email"], "grace@navy.mil");
}

#[tokio::test]
async fn register_user_requires_name() {
    let resp = app()
        .oneshot(form_request("/register_user", "email=x%40y.z"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = body_json(resp).await;
    assert_eq!(body["error"], "Name is required");
}

#[tokio::test]
async fn register_user_rejects_duplicates() {
    let (db, _, _) = seeded().await;

    let resp = app_with_store(db.clone())
        .oneshot(form_request("/register_user", "name=Ada"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = body_json(resp).await;
    assert_eq!(body["error"], "User with this name already exists");

    let resp = app_with_store(db)
        .oneshot(form_request("/register_user", "name=Other&email=ada%40example.com"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = body_json(resp).await;
    assert_eq!(body["error"], "User with this email already exists");
}

// --- add task ---

#[tokio::test]
async fn add_task_defaults_priority() {
    let (db, ada, _) = seeded().await;
    let resp = app_with_store(db)
        .oneshot(form_request("/add_task", &format!("user_id={ada}&title=Chores")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["task"]["priority"], "medium");
    assert_eq!(body["task"]["status"], "pending");
}

#[tokio::test]
async fn add_task_unknown_user_returns_404() {
    let resp = app()
        .oneshot(form_request("/add_task", "user_id=42&title=Orphan"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = body_json(resp).await;
    assert_eq!(body["error"], "User not found");
}

#[tokio::test]
async fn add_task_requires_title() {
    let resp = app()
        .oneshot(form_request("/add_task", "user_id=1&title="))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = body_json(resp).await;
    assert_eq!(body["error"], "User and task title are required");
}

// --- update status ---

#[tokio::test]
async fn update_status_stamps_updated_at() {
    let (db, _, task) = seeded().await;
    let resp = app_with_store(db)
        .oneshot(form_request(
            "/update_task_status",
            &format!("task_id={task}&status=completed"),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body["task"]["status"], "completed");
    assert!(body["task"]["updated_at"].is_string());
}

#[tokio::test]
async fn update_status_rejects_unknown_status() {
    let (db, _, task) = seeded().await;
    let resp = app_with_store(db)
        .oneshot(form_request(
            "/update_task_status",
            &format!("task_id={task}&status=archived"),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = body_json(resp).await;
    assert_eq!(body["error"], "Invalid status");
}

#[tokio::test]
async fn update_status_unknown_task_fails() {
    let resp = app()
        .oneshot(form_request("/update_task_status", "task_id=77&status=pending"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

// --- delete ---

#[tokio::test]
async fn delete_user_cascades_to_tasks() {
    let (db, ada, _) = seeded().await;
    db.write().await.insert_task(ada, "Second", "", "low").unwrap();

    let resp = app_with_store(db.clone())
        .oneshot(delete_request(&format!("/delete_user/{ada}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body["success"], true);

    let store = db.read().await;
    assert!(store.users().is_empty());
    assert!(store.tasks(None).is_empty());
}

#[tokio::test]
async fn delete_task_is_idempotent() {
    let (db, _, task) = seeded().await;
    for _ in 0..2 {
        let resp = app_with_store(db.clone())
            .oneshot(delete_request(&format!("/delete_task/{task}")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
    assert!(db.read().await.tasks(None).is_empty());
}

#[tokio::test]
async fn delete_with_non_numeric_id_returns_400() {
    let resp = app().oneshot(delete_request("/delete_task/abc")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- full lifecycle over one service ---

#[tokio::test]
async fn register_add_update_delete_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(form_request("/register_user", "name=Linus"))
        .await
        .unwrap();
    let body: Value = body_json(resp).await;
    let user_id = body["user"]["id"].as_i64().unwrap();

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(form_request(
            "/add_task",
            &format!("user_id={user_id}&title=Merge+window&priority=high&description=rc1"),
        ))
        .await
        .unwrap();
    let body: Value = body_json(resp).await;
    let task_id = body["task"]["id"].as_i64().unwrap();
    assert_eq!(body["task"]["description"], "rc1");

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(form_request(
            "/update_task_status",
            &format!("task_id={task_id}&status=in_progress"),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get_request(&format!("/get_user_tasks/{user_id}")))
        .await
        .unwrap();
    let tasks: Vec<Task> = body_json(resp).await;
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].status, "in_progress");

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(delete_request(&format!("/delete_task/{task_id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get_request("/get_tasks"))
        .await
        .unwrap();
    let tasks: Vec<Task> = body_json(resp).await;
    assert!(tasks.is_empty());
}
