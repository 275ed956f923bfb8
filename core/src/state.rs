//! Client-held application state.
//!
//! # Design
//! `AppState` is the only mutable state in the client and is owned by a
//! single `Session`. It keeps the last successfully loaded collections, so a
//! failed reload leaves the previous data (and its rendering) intact.
//!
//! Overlapping loads of the same collection are ordered by sequence number:
//! `begin_*` hands out a ticket, and `apply_*` accepts a result only if its
//! ticket is newer than the last one applied. A response for an older
//! request arriving late is dropped instead of overwriting newer data.

use crate::filter::TaskFilter;
use crate::types::{Task, User, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Tasks,
    UserTasks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormKind {
    User,
    Task,
}

/// Submit state of one form: `Idle -> Submitting -> Idle`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormState {
    #[default]
    Idle,
    Submitting,
}

/// Ticket identifying one in-flight load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    pub collection: Collection,
    pub seq: u64,
}

#[derive(Debug, Default)]
struct Sequencer {
    issued: u64,
    applied: u64,
}

impl Sequencer {
    fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    fn accept(&mut self, seq: u64) -> bool {
        if seq <= self.applied {
            return false;
        }
        self.applied = seq;
        true
    }

    /// Make every ticket issued so far stale.
    fn discard_pending(&mut self) {
        self.applied = self.issued;
    }
}

/// Contents of the per-user task panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserTasksPanel {
    pub user_id: UserId,
    pub user_name: String,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Default)]
pub struct AppState {
    users: Vec<User>,
    tasks: Vec<Task>,
    filter: TaskFilter,
    user_tasks: Option<UserTasksPanel>,
    user_form: FormState,
    task_form: FormState,
    online: bool,
    users_seq: Sequencer,
    tasks_seq: Sequencer,
    user_tasks_seq: Sequencer,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            online: true,
            ..Self::default()
        }
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// Every task from the last successful load, unfiltered.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn visible_tasks(&self) -> Vec<&Task> {
        self.filter.apply(&self.tasks)
    }

    /// True when the filter hides at least one loaded task.
    pub fn filter_hides_tasks(&self) -> bool {
        self.filter.is_active() && self.visible_tasks().len() < self.tasks.len()
    }

    pub fn filter_mut(&mut self) -> &mut TaskFilter {
        &mut self.filter
    }

    pub fn user_name(&self, id: UserId) -> Option<&str> {
        self.users.iter().find(|u| u.id == id).map(|u| u.name.as_str())
    }

    pub fn user_tasks(&self) -> Option<&UserTasksPanel> {
        self.user_tasks.as_ref()
    }

    /// Close the panel. Loads for it still in flight will be dropped, so a
    /// late reply cannot reopen it. Returns whether it was open.
    pub fn close_user_tasks(&mut self) -> bool {
        self.user_tasks_seq.discard_pending();
        self.user_tasks.take().is_some()
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    pub fn set_online(&mut self, online: bool) {
        self.online = online;
    }

    pub fn begin_load(&mut self, collection: Collection) -> LoadTicket {
        let seq = match collection {
            Collection::Users => self.users_seq.issue(),
            Collection::Tasks => self.tasks_seq.issue(),
            Collection::UserTasks => self.user_tasks_seq.issue(),
        };
        LoadTicket { collection, seq }
    }

    /// Replace the user list. Returns false, leaving state untouched, when
    /// the ticket is stale.
    pub fn apply_users(&mut self, ticket: LoadTicket, users: Vec<User>) -> bool {
        debug_assert_eq!(ticket.collection, Collection::Users);
        if !self.users_seq.accept(ticket.seq) {
            return false;
        }
        self.users = users;
        true
    }

    pub fn apply_tasks(&mut self, ticket: LoadTicket, tasks: Vec<Task>) -> bool {
        debug_assert_eq!(ticket.collection, Collection::Tasks);
        if !self.tasks_seq.accept(ticket.seq) {
            return false;
        }
        self.tasks = tasks;
        true
    }

    pub fn apply_user_tasks(&mut self, ticket: LoadTicket, panel: UserTasksPanel) -> bool {
        debug_assert_eq!(ticket.collection, Collection::UserTasks);
        if !self.user_tasks_seq.accept(ticket.seq) {
            return false;
        }
        self.user_tasks = Some(panel);
        true
    }

    pub fn form_state(&self, form: FormKind) -> FormState {
        match form {
            FormKind::User => self.user_form,
            FormKind::Task => self.task_form,
        }
    }

    pub fn is_submitting(&self, form: FormKind) -> bool {
        self.form_state(form) == FormState::Submitting
    }

    /// Enter `Submitting`. Fails if the form is already submitting.
    pub fn begin_submit(&mut self, form: FormKind) -> bool {
        let state = self.form_state_mut(form);
        if *state == FormState::Submitting {
            return false;
        }
        *state = FormState::Submitting;
        true
    }

    /// Back to `Idle`, whatever the outcome.
    pub fn end_submit(&mut self, form: FormKind) {
        *self.form_state_mut(form) = FormState::Idle;
    }

    fn form_state_mut(&mut self, form: FormKind) -> &mut FormState {
        match form {
            FormKind::User => &mut self.user_form,
            FormKind::Task => &mut self.task_form,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::types::{Priority, Status, TaskOwner};

    fn user(id: UserId, name: &str) -> User {
        User {
            id,
            name: name.to_string(),
            email: None,
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
        }
    }

    fn task(id: i64, status: Status) -> Task {
        Task {
            id,
            user_id: 1,
            title: format!("task {id}"),
            description: None,
            priority: Priority::Medium,
            status,
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            updated_at: None,
            owner: TaskOwner {
                id: 1,
                name: "Ada".to_string(),
                email: None,
            },
        }
    }

    #[test]
    fn new_state_is_online_and_empty() {
        let state = AppState::new();
        assert!(state.is_online());
        assert!(state.users().is_empty());
        assert!(state.user_tasks().is_none());
        assert_eq!(state.form_state(FormKind::User), FormState::Idle);
    }

    #[test]
    fn newest_ticket_wins_over_late_arrival() {
        let mut state = AppState::new();
        let first = state.begin_load(Collection::Users);
        let second = state.begin_load(Collection::Users);

        assert!(state.apply_users(second, vec![user(2, "Newer")]));
        assert!(!state.apply_users(first, vec![user(1, "Stale")]));
        assert_eq!(state.users()[0].name, "Newer");
    }

    #[test]
    fn in_order_arrivals_all_apply() {
        let mut state = AppState::new();
        let first = state.begin_load(Collection::Tasks);
        let second = state.begin_load(Collection::Tasks);
        assert!(state.apply_tasks(first, vec![task(1, Status::Pending)]));
        assert!(state.apply_tasks(second, vec![task(2, Status::Pending)]));
        assert_eq!(state.tasks()[0].id, 2);
    }

    #[test]
    fn sequences_are_per_collection() {
        let mut state = AppState::new();
        let users = state.begin_load(Collection::Users);
        let _tasks = state.begin_load(Collection::Tasks);
        let _more_tasks = state.begin_load(Collection::Tasks);
        assert!(state.apply_users(users, vec![user(1, "Ada")]));
    }

    #[test]
    fn filter_hint_only_when_something_hidden() {
        let mut state = AppState::new();
        let ticket = state.begin_load(Collection::Tasks);
        state.apply_tasks(ticket, vec![task(1, Status::Pending), task(2, Status::Completed)]);
        assert!(!state.filter_hides_tasks());

        state.filter_mut().status = Some(Status::Pending);
        assert!(state.filter_hides_tasks());
        assert_eq!(state.visible_tasks().len(), 1);
    }

    #[test]
    fn form_cannot_submit_twice() {
        let mut state = AppState::new();
        assert!(state.begin_submit(FormKind::Task));
        assert!(!state.begin_submit(FormKind::Task));
        assert!(state.begin_submit(FormKind::User));
        state.end_submit(FormKind::Task);
        assert_eq!(state.form_state(FormKind::Task), FormState::Idle);
        assert!(state.begin_submit(FormKind::Task));
    }

    #[test]
    fn closing_panel_drops_its_pending_load() {
        let mut state = AppState::new();
        let ticket = state.begin_load(Collection::UserTasks);
        assert!(!state.close_user_tasks());

        let panel = UserTasksPanel {
            user_id: 1,
            user_name: "Ada".to_string(),
            tasks: Vec::new(),
        };
        assert!(!state.apply_user_tasks(ticket, panel.clone()));
        assert!(state.user_tasks().is_none());

        let reopened = state.begin_load(Collection::UserTasks);
        assert!(state.apply_user_tasks(reopened, panel));
    }

    #[test]
    fn user_name_lookup() {
        let mut state = AppState::new();
        let ticket = state.begin_load(Collection::Users);
        state.apply_users(ticket, vec![user(4, "Grace")]);
        assert_eq!(state.user_name(4), Some("Grace"));
        assert_eq!(state.user_name(5), None);
    }
}
