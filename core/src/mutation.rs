//! Mutating operations and what the client does around them.
//!
//! Each `Mutation` knows its request, which collections to reload after a
//! success, the notification texts, and whether the user must confirm it
//! first. The session drives the round-trip; this module only describes it.

use crate::client::TaskboardClient;
use crate::error::ApiError;
use crate::http::HttpRequest;
use crate::state::{Collection, FormKind};
use crate::types::{AddTask, RegisterUser, TaskId, UpdateTaskStatus, UserId};

pub const CONFIRM_DELETE_TASK: &str = "Are you sure you want to delete this task?";
pub const CONFIRM_DELETE_USER: &str =
    "Are you sure you want to delete this user? This will also delete all their tasks.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    RegisterUser(RegisterUser),
    AddTask(AddTask),
    UpdateTaskStatus(UpdateTaskStatus),
    DeleteTask(TaskId),
    DeleteUser(UserId),
}

impl Mutation {
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::RegisterUser(_) => "register_user",
            Mutation::AddTask(_) => "add_task",
            Mutation::UpdateTaskStatus(_) => "update_task_status",
            Mutation::DeleteTask(_) => "delete_task",
            Mutation::DeleteUser(_) => "delete_user",
        }
    }

    pub fn build_request(&self, client: &TaskboardClient) -> Result<HttpRequest, ApiError> {
        match self {
            Mutation::RegisterUser(input) => client.build_register_user(input),
            Mutation::AddTask(input) => client.build_add_task(input),
            Mutation::UpdateTaskStatus(input) => client.build_update_task_status(input),
            Mutation::DeleteTask(id) => Ok(client.build_delete_task(*id)),
            Mutation::DeleteUser(id) => Ok(client.build_delete_user(*id)),
        }
    }

    /// Collections reloaded, in order, after a successful reply. Deleting a
    /// user cascades to its tasks server-side, so both lists go stale.
    pub fn reloads(&self) -> &'static [Collection] {
        match self {
            Mutation::RegisterUser(_) => &[Collection::Users],
            Mutation::AddTask(_) | Mutation::UpdateTaskStatus(_) | Mutation::DeleteTask(_) => &[Collection::Tasks],
            Mutation::DeleteUser(_) => &[Collection::Users, Collection::Tasks],
        }
    }

    /// Form reset after a success, if the mutation came from one.
    pub fn form(&self) -> Option<FormKind> {
        match self {
            Mutation::RegisterUser(_) => Some(FormKind::User),
            Mutation::AddTask(_) => Some(FormKind::Task),
            _ => None,
        }
    }

    pub fn confirmation(&self) -> Option<&'static str> {
        match self {
            Mutation::DeleteTask(_) => Some(CONFIRM_DELETE_TASK),
            Mutation::DeleteUser(_) => Some(CONFIRM_DELETE_USER),
            _ => None,
        }
    }

    pub fn success_message(&self) -> &'static str {
        match self {
            Mutation::RegisterUser(_) => "User registered successfully!",
            Mutation::AddTask(_) => "Task added successfully!",
            Mutation::UpdateTaskStatus(_) => "Task status updated!",
            Mutation::DeleteTask(_) => "Task deleted successfully!",
            Mutation::DeleteUser(_) => "User deleted successfully!",
        }
    }

    pub fn fallback_error(&self) -> &'static str {
        match self {
            Mutation::RegisterUser(_) => "Error registering user",
            Mutation::AddTask(_) => "Error adding task",
            Mutation::UpdateTaskStatus(_) => "Error updating task",
            Mutation::DeleteTask(_) => "Error deleting task",
            Mutation::DeleteUser(_) => "Error deleting user",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpMethod;
    use crate::types::Status;

    #[test]
    fn delete_user_reloads_both_collections() {
        assert_eq!(
            Mutation::DeleteUser(1).reloads(),
            &[Collection::Users, Collection::Tasks]
        );
        assert_eq!(Mutation::DeleteTask(1).reloads(), &[Collection::Tasks]);
    }

    #[test]
    fn only_deletes_need_confirmation() {
        assert!(Mutation::DeleteTask(1).confirmation().is_some());
        assert!(Mutation::DeleteUser(1).confirmation().is_some());
        let update = Mutation::UpdateTaskStatus(UpdateTaskStatus {
            task_id: 1,
            status: Status::Completed,
        });
        assert!(update.confirmation().is_none());
        assert!(update.form().is_none());
    }

    #[test]
    fn build_request_dispatches_to_client() {
        let client = TaskboardClient::new("http://svc");
        let req = Mutation::DeleteUser(8).build_request(&client).unwrap();
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(req.path, "http://svc/delete_user/8");
    }
}
