use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Form, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};

pub const PRIORITIES: [&str; 3] = ["low", "medium", "high"];
pub const STATUSES: [&str; 3] = ["pending", "in_progress", "completed"];

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Owner {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
}

/// A task row joined with its owner, as `/get_tasks` returns it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub priority: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub users: Owner,
}

#[derive(Clone, Debug)]
struct TaskRow {
    id: i64,
    user_id: i64,
    title: String,
    description: String,
    priority: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct RegisterUser {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Deserialize)]
pub struct AddTask {
    pub user_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateTaskStatus {
    pub task_id: Option<String>,
    pub status: Option<String>,
}

/// In-memory tables. Ids are assigned sequentially starting at 1.
#[derive(Debug, Default)]
pub struct Store {
    users: BTreeMap<i64, User>,
    tasks: BTreeMap<i64, TaskRow>,
    next_user_id: i64,
    next_task_id: i64,
}

impl Store {
    pub fn insert_user(&mut self, name: &str, email: Option<&str>) -> User {
        self.next_user_id += 1;
        let user = User {
            id: self.next_user_id,
            name: name.to_string(),
            email: email.map(str::to_string),
            created_at: Utc::now(),
        };
        self.users.insert(user.id, user.clone());
        user
    }

    /// Insert a task for an existing user; `None` if the user is unknown.
    pub fn insert_task(&mut self, user_id: i64, title: &str, description: &str, priority: &str) -> Option<Task> {
        if !self.users.contains_key(&user_id) {
            return None;
        }
        self.next_task_id += 1;
        let row = TaskRow {
            id: self.next_task_id,
            user_id,
            title: title.to_string(),
            description: description.to_string(),
            priority: priority.to_string(),
            status: "pending".to_string(),
            created_at: Utc::now(),
            updated_at: None,
        };
        self.tasks.insert(row.id, row.clone());
        self.join(&row)
    }

    /// Users ordered by name.
    pub fn users(&self) -> Vec<User> {
        let mut users: Vec<User> = self.users.values().cloned().collect();
        users.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        users
    }

    /// Tasks newest first, optionally restricted to one owner.
    pub fn tasks(&self, owner: Option<i64>) -> Vec<Task> {
        let mut rows: Vec<&TaskRow> = self
            .tasks
            .values()
            .filter(|t| owner.is_none_or(|id| t.user_id == id))
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        rows.into_iter().filter_map(|row| self.join(row)).collect()
    }

    fn join(&self, row: &TaskRow) -> Option<Task> {
        let user = self.users.get(&row.user_id)?;
        Some(Task {
            id: row.id,
            user_id: row.user_id,
            title: row.title.clone(),
            description: row.description.clone(),
            priority: row.priority.clone(),
            status: row.status.clone(),
            created_at: row.created_at,
            updated_at: row.updated_at,
            users: Owner {
                id: user.id,
                name: user.name.clone(),
                email: user.email.clone(),
            },
        })
    }
}

pub type Db = Arc<RwLock<Store>>;

type Reply = (StatusCode, Json<Value>);

pub fn app() -> Router {
    app_with_store(Db::default())
}

/// Router over a caller-owned store, so tests can seed or inspect it.
pub fn app_with_store(db: Db) -> Router {
    Router::new()
        .route("/get_users", get(get_users))
        .route("/get_tasks", get(get_tasks))
        .route("/get_user_tasks/{user_id}", get(get_user_tasks))
        .route("/register_user", post(register_user))
        .route("/add_task", post(add_task))
        .route("/update_task_status", post(update_task_status))
        .route("/delete_task/{task_id}", delete(delete_task))
        .route("/delete_user/{user_id}", delete(delete_user))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn ok(body: Value) -> Reply {
    (StatusCode::OK, Json(body))
}

fn fail(status: StatusCode, message: &str) -> Reply {
    tracing::debug!(%status, reason = message, "request rejected");
    (status, Json(json!({ "error": message })))
}

/// Trimmed, non-empty form value.
fn field(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

async fn get_users(State(db): State<Db>) -> Json<Vec<User>> {
    Json(db.read().await.users())
}

async fn get_tasks(State(db): State<Db>) -> Json<Vec<Task>> {
    Json(db.read().await.tasks(None))
}

async fn get_user_tasks(State(db): State<Db>, Path(user_id): Path<i64>) -> Json<Vec<Task>> {
    Json(db.read().await.tasks(Some(user_id)))
}

async fn register_user(State(db): State<Db>, Form(input): Form<RegisterUser>) -> Reply {
    let Some(name) = field(&input.name) else {
        return fail(StatusCode::BAD_REQUEST, "Name is required");
    };
    let email = field(&input.email);

    let mut store = db.write().await;
    if store.users.values().any(|u| u.name == name) {
        return fail(StatusCode::BAD_REQUEST, "User with this name already exists");
    }
    if let Some(email) = email {
        if store.users.values().any(|u| u.email.as_deref() == Some(email)) {
            return fail(StatusCode::BAD_REQUEST, "User with this email already exists");
        }
    }
    let user = store.insert_user(name, email);
    tracing::info!(id = user.id, "user registered");
    ok(json!({ "success": true, "user": user }))
}

async fn add_task(State(db): State<Db>, Form(input): Form<AddTask>) -> Reply {
    let (Some(user_id), Some(title)) = (field(&input.user_id), field(&input.title)) else {
        return fail(StatusCode::BAD_REQUEST, "User and task title are required");
    };
    let Ok(user_id) = user_id.parse::<i64>() else {
        return fail(StatusCode::BAD_REQUEST, "Invalid user id");
    };
    let priority = field(&input.priority).unwrap_or("medium");
    if !PRIORITIES.contains(&priority) {
        return fail(StatusCode::BAD_REQUEST, "Invalid priority");
    }
    let description = field(&input.description).unwrap_or_default();

    match db.write().await.insert_task(user_id, title, description, priority) {
        Some(task) => {
            tracing::info!(id = task.id, user_id, "task added");
            ok(json!({ "success": true, "task": task }))
        }
        None => fail(StatusCode::NOT_FOUND, "User not found"),
    }
}

async fn update_task_status(State(db): State<Db>, Form(input): Form<UpdateTaskStatus>) -> Reply {
    let (Some(task_id), Some(status)) = (field(&input.task_id), field(&input.status)) else {
        return fail(StatusCode::BAD_REQUEST, "Task ID and status are required");
    };
    if !STATUSES.contains(&status) {
        return fail(StatusCode::BAD_REQUEST, "Invalid status");
    }
    let Ok(task_id) = task_id.parse::<i64>() else {
        return fail(StatusCode::BAD_REQUEST, "Invalid task id");
    };

    let mut store = db.write().await;
    let Some(row) = store.tasks.get_mut(&task_id) else {
        return fail(StatusCode::INTERNAL_SERVER_ERROR, "Failed to update task");
    };
    row.status = status.to_string();
    row.updated_at = Some(Utc::now());
    let row = row.clone();
    match store.join(&row) {
        Some(task) => ok(json!({ "success": true, "task": task })),
        None => fail(StatusCode::INTERNAL_SERVER_ERROR, "Failed to update task"),
    }
}

/// Deleting a missing task still succeeds, like a `DELETE ... WHERE id = ?`.
async fn delete_task(State(db): State<Db>, Path(task_id): Path<i64>) -> Reply {
    db.write().await.tasks.remove(&task_id);
    ok(json!({ "success": true }))
}

/// Removes the user and, by cascade, every task it owns.
async fn delete_user(State(db): State<Db>, Path(user_id): Path<i64>) -> Reply {
    let mut store = db.write().await;
    if store.users.remove(&user_id).is_some() {
        store.tasks.retain(|_, t| t.user_id != user_id);
        tracing::info!(user_id, "user deleted");
    }
    ok(json!({ "success": true }))
}
