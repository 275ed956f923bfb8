//! Client-side form validation.
//!
//! Raw form input arrives as text from the host. A form only turns into a
//! request payload once it passes these checks, so a rejected form can never
//! reach the network.

use crate::error::ValidationError;
use crate::types::{AddTask, Priority, RegisterUser, UserId};

pub const MIN_NAME_LENGTH: usize = 2;
pub const MIN_TITLE_LENGTH: usize = 3;

pub const NAME_TOO_SHORT: ValidationError =
    ValidationError::new("name", "Name must be at least 2 characters long");
pub const EMAIL_INVALID: ValidationError =
    ValidationError::new("email", "Please enter a valid email address");
pub const TITLE_TOO_SHORT: ValidationError =
    ValidationError::new("title", "Task title must be at least 3 characters long");
pub const OWNER_MISSING: ValidationError = ValidationError::new("user_id", "Please select a user");

/// Raw contents of the register-user form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserForm {
    pub name: String,
    pub email: String,
}

/// Raw contents of the add-task form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskForm {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub user_id: Option<UserId>,
}

pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().chars().count() < MIN_NAME_LENGTH {
        return Err(NAME_TOO_SHORT);
    }
    Ok(())
}

/// An empty email is allowed; a non-empty one must at least contain `@`.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if !email.is_empty() && !email.contains('@') {
        return Err(EMAIL_INVALID);
    }
    Ok(())
}

pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().chars().count() < MIN_TITLE_LENGTH {
        return Err(TITLE_TOO_SHORT);
    }
    Ok(())
}

impl UserForm {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// Validate and convert into the `/register_user` payload.
    pub fn validate(&self) -> Result<RegisterUser, ValidationError> {
        validate_name(&self.name)?;
        validate_email(&self.email)?;
        let email = self.email.trim();
        Ok(RegisterUser {
            name: self.name.trim().to_string(),
            email: (!email.is_empty()).then(|| email.to_string()),
        })
    }
}

impl TaskForm {
    /// Validate and convert into the `/add_task` payload.
    pub fn validate(&self) -> Result<AddTask, ValidationError> {
        validate_title(&self.title)?;
        let user_id = self.user_id.ok_or(OWNER_MISSING)?;
        let description = self.description.trim();
        Ok(AddTask {
            title: self.title.trim().to_string(),
            description: (!description.is_empty()).then(|| description.to_string()),
            priority: self.priority,
            user_id,
        })
    }
}
