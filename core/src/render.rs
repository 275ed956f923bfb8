//! HTML fragment rendering for users and tasks.
//!
//! Every function here is pure. User-supplied text (names, emails, titles,
//! descriptions) always goes through `escape_html` before it is embedded, and
//! identifiers and enum values are rendered from typed fields only.

use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::types::{Status, Task, User};

pub const USERS_EMPTY_STATE: &str = concat!(
    "<div class=\"empty-state\">",
    "<i class=\"fas fa-user-friends\"></i>",
    "<p>No users registered yet. Add a user above to get started!</p>",
    "</div>"
);

pub const USER_TASKS_EMPTY_STATE: &str = concat!(
    "<div class=\"empty-state\">",
    "<i class=\"fas fa-clipboard-list\"></i>",
    "<p>No tasks assigned to this user yet.</p>",
    "</div>"
);

pub const USER_OPTION_PLACEHOLDER: &str = "<option value=\"\">Select a user...</option>";

/// Escape the five HTML metacharacters.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            c => out.push(c),
        }
    }
    out
}

/// `Jan 5, 2024`
pub fn format_date(at: &DateTime<Utc>) -> String {
    at.format("%b %-d, %Y").to_string()
}

pub fn user_card(user: &User) -> String {
    let name = escape_html(&user.name);
    let mut html = String::new();
    let _ = write!(
        html,
        "<div class=\"user-card\" data-user-id=\"{id}\">\
         <div class=\"user-info\">\
         <div class=\"user-avatar\"><i class=\"fas fa-user-circle\"></i></div>\
         <div class=\"user-details\">\
         <h3>{name}</h3>",
        id = user.id,
    );
    if let Some(email) = user.email() {
        let _ = write!(html, "<p class=\"user-email\">{}</p>", escape_html(email));
    }
    let _ = write!(
        html,
        "<p class=\"user-joined\">Joined: {joined}</p>\
         </div></div>\
         <div class=\"user-actions\">\
         <button class=\"view-tasks-btn\" data-action=\"show-user-tasks\" data-user-id=\"{id}\" data-user-name=\"{name}\">\
         <i class=\"fas fa-tasks\"></i> View Tasks</button>\
         <button class=\"delete-user-btn\" data-action=\"delete-user\" data-user-id=\"{id}\">\
         <i class=\"fas fa-trash\"></i></button>\
         </div></div>",
        joined = format_date(&user.created_at),
        id = user.id,
    );
    html
}

pub fn task_card(task: &Task) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        "<div class=\"task-card priority-{priority} status-{status}\" data-task-id=\"{id}\">\
         <div class=\"task-header\">\
         <div class=\"task-priority\">\
         <span class=\"priority-badge priority-{priority}\"><i class=\"fas fa-flag\"></i> {label}</span>\
         </div>\
         <div class=\"task-status\">\
         <select class=\"status-select\" data-action=\"update-task-status\" data-task-id=\"{id}\">",
        priority = task.priority,
        status = task.status,
        label = task.priority.label(),
        id = task.id,
    );
    for status in Status::ALL {
        let selected = if status == task.status { " selected" } else { "" };
        let _ = write!(
            html,
            "<option value=\"{value}\"{selected}>{label}</option>",
            value = status.as_str(),
            label = status.label(),
        );
    }
    let _ = write!(
        html,
        "</select></div></div>\
         <div class=\"task-content\">\
         <h3 class=\"task-title\">{}</h3>",
        escape_html(&task.title)
    );
    if let Some(description) = task.description() {
        let _ = write!(html, "<p class=\"task-description\">{}</p>", escape_html(description));
    }
    let _ = write!(
        html,
        "</div>\
         <div class=\"task-footer\">\
         <div class=\"task-user\"><i class=\"fas fa-user\"></i> <strong>{owner}</strong></div>\
         <div class=\"task-date\"><i class=\"fas fa-calendar\"></i> {date}</div>\
         <button class=\"delete-task-btn\" data-action=\"delete-task\" data-task-id=\"{id}\">\
         <i class=\"fas fa-trash\"></i></button>\
         </div></div>",
        owner = escape_html(&task.owner.name),
        date = format_date(&task.created_at),
        id = task.id,
    );
    html
}

/// The users list, or the empty state when there are none.
pub fn users_fragment(users: &[User]) -> String {
    if users.is_empty() {
        return USERS_EMPTY_STATE.to_string();
    }
    users.iter().map(user_card).collect()
}

/// The main task list. `filtered_out` tells the empty state whether the
/// filters hid any fetched task, in which case it suggests adjusting them.
pub fn tasks_fragment(visible: &[&Task], filtered_out: bool) -> String {
    if visible.is_empty() {
        return tasks_empty_state(filtered_out);
    }
    visible.iter().map(|t| task_card(t)).collect()
}

pub fn tasks_empty_state(filtered_out: bool) -> String {
    let hint = if filtered_out { "Try adjusting your filters or " } else { "" };
    format!(
        "<div class=\"empty-state\">\
         <i class=\"fas fa-clipboard-list\"></i>\
         <p>No tasks found. {hint}Add a task above to get started!</p>\
         </div>"
    )
}

/// Task list for the per-user panel.
pub fn user_tasks_fragment(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return USER_TASKS_EMPTY_STATE.to_string();
    }
    tasks.iter().map(task_card).collect()
}

pub fn user_tasks_title(user_name: &str) -> String {
    format!("Tasks for {}", escape_html(user_name))
}

/// Owner choices for the add-task form.
pub fn user_options(users: &[User]) -> String {
    let mut html = String::from(USER_OPTION_PLACEHOLDER);
    for user in users {
        let _ = write!(html, "<option value=\"{}\">{}</option>", user.id, escape_html(&user.name));
    }
    html
}
