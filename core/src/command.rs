//! Command dispatch table.
//!
//! Every user action the client reacts to is a `Command`. Hosts either build
//! them directly or parse them from a line of text:
//!
//! ```text
//! register Ada Lovelace | ada@example.com
//! add-task 3 | high | Write report | due friday
//! status 7 completed
//! delete-task 7 -y
//! filter-status pending
//! filter-priority
//! refresh tasks
//! ```

use std::str::FromStr;

use thiserror::Error;

use crate::error::ParseEnumError;
use crate::filter::parse_filter;
use crate::state::Collection;
use crate::types::{Priority, Status, TaskId, UserId};
use crate::validate::{TaskForm, UserForm};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    RegisterUser(UserForm),
    AddTask(TaskForm),
    UpdateTaskStatus { task_id: TaskId, status: Status },
    /// `confirmed` skips the confirmation prompt (`-y` on the command line).
    DeleteTask { task_id: TaskId, confirmed: bool },
    DeleteUser { user_id: UserId, confirmed: bool },
    Refresh(Option<Collection>),
    SetStatusFilter(Option<Status>),
    SetPriorityFilter(Option<Priority>),
    ShowUserTasks(UserId),
    CloseUserTasks,
    Online,
    Offline,
    /// Close the user-tasks panel if open, otherwise clear both forms.
    Escape,
    Shutdown,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command: '{0}'\n  hint: try register, add-task, status, delete-task, delete-user, refresh, filter-status, filter-priority, show, close, online, offline, escape, quit")]
    Unknown(String),

    #[error("{command}: missing {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("{command}: '{value}' is not a valid id")]
    InvalidId { command: &'static str, value: String },

    #[error("{command}: unexpected argument '{value}'")]
    UnexpectedArgument { command: &'static str, value: String },

    #[error(transparent)]
    InvalidValue(#[from] ParseEnumError),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };
        match head {
            "" => Err(CommandError::Empty),
            "register" => parse_register(rest),
            "add-task" => parse_add_task(rest),
            "status" => {
                let mut args = rest.split_whitespace();
                let task_id = parse_id("status", args.next())?;
                let status: Status = args
                    .next()
                    .ok_or(CommandError::MissingArgument {
                        command: "status",
                        argument: "status",
                    })?
                    .parse()?;
                no_more("status", args.next())?;
                Ok(Command::UpdateTaskStatus { task_id, status })
            }
            "delete-task" => {
                let (id, confirmed) = parse_delete("delete-task", rest)?;
                Ok(Command::DeleteTask {
                    task_id: id,
                    confirmed,
                })
            }
            "delete-user" => {
                let (id, confirmed) = parse_delete("delete-user", rest)?;
                Ok(Command::DeleteUser {
                    user_id: id,
                    confirmed,
                })
            }
            "refresh" => match rest {
                "" => Ok(Command::Refresh(None)),
                "users" => Ok(Command::Refresh(Some(Collection::Users))),
                "tasks" => Ok(Command::Refresh(Some(Collection::Tasks))),
                other => Err(CommandError::UnexpectedArgument {
                    command: "refresh",
                    value: other.to_string(),
                }),
            },
            "filter-status" => Ok(Command::SetStatusFilter(parse_filter::<Status>(rest)?)),
            "filter-priority" => Ok(Command::SetPriorityFilter(parse_filter::<Priority>(rest)?)),
            "show" => {
                let mut args = rest.split_whitespace();
                let user_id = parse_id("show", args.next())?;
                no_more("show", args.next())?;
                Ok(Command::ShowUserTasks(user_id))
            }
            "close" => bare(Command::CloseUserTasks, "close", rest),
            "online" => bare(Command::Online, "online", rest),
            "offline" => bare(Command::Offline, "offline", rest),
            "escape" => bare(Command::Escape, "escape", rest),
            "quit" | "exit" => bare(Command::Shutdown, "quit", rest),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

fn fields(rest: &str) -> Vec<&str> {
    rest.split('|').map(str::trim).collect()
}

fn parse_register(rest: &str) -> Result<Command, CommandError> {
    let fields = fields(rest);
    let name = fields.first().copied().unwrap_or_default();
    let email = fields.get(1).copied().unwrap_or_default();
    if let Some(extra) = fields.get(2) {
        return Err(CommandError::UnexpectedArgument {
            command: "register",
            value: extra.to_string(),
        });
    }
    Ok(Command::RegisterUser(UserForm::new(name, email)))
}

fn parse_add_task(rest: &str) -> Result<Command, CommandError> {
    let fields = fields(rest);
    let user_id = match fields.first().copied().unwrap_or_default() {
        "" => None,
        raw => Some(parse_id("add-task", Some(raw))?),
    };
    let priority: Priority = match fields.get(1).copied().unwrap_or_default() {
        "" => Priority::default(),
        raw => raw.parse()?,
    };
    let title = fields.get(2).copied().unwrap_or_default();
    let description = fields.get(3..).map(|d| d.join(" | ")).unwrap_or_default();
    Ok(Command::AddTask(TaskForm {
        title: title.to_string(),
        description,
        priority,
        user_id,
    }))
}

fn parse_delete(command: &'static str, rest: &str) -> Result<(i64, bool), CommandError> {
    let mut args = rest.split_whitespace();
    let id = parse_id(command, args.next())?;
    let confirmed = match args.next() {
        None => false,
        Some("-y" | "--yes") => true,
        Some(other) => {
            return Err(CommandError::UnexpectedArgument {
                command,
                value: other.to_string(),
            })
        }
    };
    no_more(command, args.next())?;
    Ok((id, confirmed))
}

fn parse_id(command: &'static str, raw: Option<&str>) -> Result<i64, CommandError> {
    let raw = raw.ok_or(CommandError::MissingArgument { command, argument: "id" })?;
    raw.parse().map_err(|_| CommandError::InvalidId {
        command,
        value: raw.to_string(),
    })
}

fn no_more(command: &'static str, extra: Option<&str>) -> Result<(), CommandError> {
    match extra {
        Some(value) => Err(CommandError::UnexpectedArgument {
            command,
            value: value.to_string(),
        }),
        None => Ok(()),
    }
}

fn bare(command: Command, name: &'static str, rest: &str) -> Result<Command, CommandError> {
    no_more(name, (!rest.is_empty()).then_some(rest))?;
    Ok(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Command {
        line.parse().unwrap()
    }

    #[test]
    fn register_with_and_without_email() {
        assert_eq!(
            parse("register Ada Lovelace | ada@example.com"),
            Command::RegisterUser(UserForm::new("Ada Lovelace", "ada@example.com"))
        );
        assert_eq!(parse("register Bob"), Command::RegisterUser(UserForm::new("Bob", "")));
    }

    #[test]
    fn register_keeps_invalid_input_for_validation() {
        assert_eq!(parse("register A"), Command::RegisterUser(UserForm::new("A", "")));
    }

    #[test]
    fn add_task_full() {
        assert_eq!(
            parse("add-task 3 | high | Write report | due | friday"),
            Command::AddTask(TaskForm {
                title: "Write report".to_string(),
                description: "due | friday".to_string(),
                priority: Priority::High,
                user_id: Some(3),
            })
        );
    }

    #[test]
    fn add_task_defaults() {
        assert_eq!(
            parse("add-task | | Chores"),
            Command::AddTask(TaskForm {
                title: "Chores".to_string(),
                description: String::new(),
                priority: Priority::Medium,
                user_id: None,
            })
        );
    }

    #[test]
    fn status_update() {
        assert_eq!(
            parse("status 7 in_progress"),
            Command::UpdateTaskStatus {
                task_id: 7,
                status: Status::InProgress
            }
        );
        assert!(matches!(
            "status 7 done".parse::<Command>(),
            Err(CommandError::InvalidValue(_))
        ));
    }

    #[test]
    fn deletes_with_optional_confirmation() {
        assert_eq!(
            parse("delete-task 4"),
            Command::DeleteTask {
                task_id: 4,
                confirmed: false
            }
        );
        assert_eq!(
            parse("delete-user 2 -y"),
            Command::DeleteUser {
                user_id: 2,
                confirmed: true
            }
        );
        assert_eq!(
            "delete-user two".parse::<Command>(),
            Err(CommandError::InvalidId {
                command: "delete-user",
                value: "two".to_string()
            })
        );
    }

    #[test]
    fn filters_and_refresh() {
        assert_eq!(parse("filter-status completed"), Command::SetStatusFilter(Some(Status::Completed)));
        assert_eq!(parse("filter-status"), Command::SetStatusFilter(None));
        assert_eq!(parse("filter-priority low"), Command::SetPriorityFilter(Some(Priority::Low)));
        assert_eq!(parse("refresh"), Command::Refresh(None));
        assert_eq!(parse("refresh users"), Command::Refresh(Some(Collection::Users)));
    }

    #[test]
    fn bare_commands() {
        assert_eq!(parse("  online "), Command::Online);
        assert_eq!(parse("quit"), Command::Shutdown);
        assert_eq!(parse("show 5"), Command::ShowUserTasks(5));
        assert!(matches!(
            "close now".parse::<Command>(),
            Err(CommandError::UnexpectedArgument { .. })
        ));
    }

    #[test]
    fn unknown_and_empty() {
        assert_eq!("".parse::<Command>(), Err(CommandError::Empty));
        assert!(matches!("dance".parse::<Command>(), Err(CommandError::Unknown(_))));
    }
}
