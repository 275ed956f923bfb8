//! Stateless HTTP request builder and response parser for the task board API.
//!
//! # Design
//! `TaskboardClient` holds only a `base_url` and carries no mutable state
//! between calls. Each endpoint is split into a `build_*` method that produces
//! an `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! All mutating endpoints share one reply shape, so they share
//! `parse_mutation`.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, CONTENT_TYPE_FORM};
use crate::types::{AddTask, MutationReply, RegisterUser, Task, TaskId, UpdateTaskStatus, User, UserId};

/// Stateless client for the task board API.
///
/// Builds `HttpRequest` values and parses `HttpResponse` values without
/// touching the network.
#[derive(Debug, Clone)]
pub struct TaskboardClient {
    base_url: String,
}

impl TaskboardClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_list_users(&self) -> HttpRequest {
        self.get("/get_users".to_string())
    }

    pub fn build_list_tasks(&self) -> HttpRequest {
        self.get("/get_tasks".to_string())
    }

    pub fn build_list_user_tasks(&self, user_id: UserId) -> HttpRequest {
        self.get(format!("/get_user_tasks/{user_id}"))
    }

    pub fn build_register_user(&self, input: &RegisterUser) -> Result<HttpRequest, ApiError> {
        self.post_form("/register_user", input)
    }

    pub fn build_add_task(&self, input: &AddTask) -> Result<HttpRequest, ApiError> {
        self.post_form("/add_task", input)
    }

    pub fn build_update_task_status(&self, input: &UpdateTaskStatus) -> Result<HttpRequest, ApiError> {
        self.post_form("/update_task_status", input)
    }

    pub fn build_delete_task(&self, id: TaskId) -> HttpRequest {
        self.delete(format!("/delete_task/{id}"))
    }

    pub fn build_delete_user(&self, id: UserId) -> HttpRequest {
        self.delete(format!("/delete_user/{id}"))
    }

    pub fn parse_list_users(&self, response: HttpResponse) -> Result<Vec<User>, ApiError> {
        parse_collection(response)
    }

    /// Parses both `/get_tasks` and `/get_user_tasks/{id}`.
    pub fn parse_list_tasks(&self, response: HttpResponse) -> Result<Vec<Task>, ApiError> {
        parse_collection(response)
    }

    /// Interpret the `{success, error?}` reply of any mutating endpoint.
    ///
    /// Success requires both a 2xx status and `success: true`. A reply that
    /// carries an `error` string becomes `Rejected`, whatever its status.
    pub fn parse_mutation(&self, response: HttpResponse) -> Result<(), ApiError> {
        let reply: Option<MutationReply> = serde_json::from_str(&response.body).ok();
        match reply {
            Some(reply) if response.is_success() && reply.success => Ok(()),
            Some(MutationReply {
                error: Some(message), ..
            }) => Err(ApiError::Rejected {
                status: response.status,
                message,
            }),
            Some(_) if response.is_success() => Err(ApiError::HttpError {
                status: response.status,
                body: response.body,
            }),
            None if response.is_success() => Err(ApiError::DeserializationError(format!(
                "unexpected reply body: {}",
                response.body
            ))),
            _ => Err(status_error(response)),
        }
    }

    fn get(&self, path: String) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}{path}", self.base_url),
            headers: Vec::new(),
            body: None,
        }
    }

    fn delete(&self, path: String) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Delete,
            path: format!("{}{path}", self.base_url),
            headers: Vec::new(),
            body: None,
        }
    }

    fn post_form<T: Serialize>(&self, path: &str, input: &T) -> Result<HttpRequest, ApiError> {
        let body = serde_urlencoded::to_string(input).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}{path}", self.base_url),
            headers: vec![("content-type".to_string(), CONTENT_TYPE_FORM.to_string())],
            body: Some(body),
        })
    }
}

fn parse_collection<T: DeserializeOwned>(response: HttpResponse) -> Result<Vec<T>, ApiError> {
    if !response.is_success() {
        return Err(status_error(response));
    }
    serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

/// Map a non-success status to the appropriate `ApiError` variant.
fn status_error(response: HttpResponse) -> ApiError {
    if response.status == 404 {
        return ApiError::NotFound;
    }
    ApiError::HttpError {
        status: response.status,
        body: response.body,
    }
}
