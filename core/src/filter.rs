//! Client-side task filtering.

use std::str::FromStr;

use crate::types::{Priority, Status, Task};

/// Current status and priority filters. `None` means "no filter".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: Option<Status>,
    pub priority: Option<Priority>,
}

impl TaskFilter {
    pub fn is_active(&self) -> bool {
        self.status.is_some() || self.priority.is_some()
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.status.is_none_or(|s| task.status == s) && self.priority.is_none_or(|p| task.priority == p)
    }

    /// Tasks passing both filters, in their fetched order.
    pub fn apply<'a>(&self, tasks: &'a [Task]) -> Vec<&'a Task> {
        tasks.iter().filter(|t| self.matches(t)).collect()
    }
}

/// Parse a filter select value; the empty string clears the filter.
pub fn parse_filter<T: FromStr>(raw: &str) -> Result<Option<T>, T::Err> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse().map(Some)
}
