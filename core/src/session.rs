//! The client sync controller.
//!
//! # Design
//! A `Session` owns the `AppState`, a `TaskboardClient`, a `Transport` that
//! performs the HTTP round-trips, and a `View` that receives rendered
//! fragments and notifications. Commands, refresh ticks and request
//! completions are handled one at a time on a single-threaded runtime.
//!
//! Starting an operation never waits on the network. The request is pushed
//! onto an in-flight set and its completion comes back through the same loop,
//! so a slow endpoint only delays the operation that called it. Results of
//! overlapping loads are ordered by `LoadTicket`; the newest request wins.
//!
//! Loads replace a whole collection and re-render it; a failed load leaves
//! the previous rendering alone and notifies. Mutations reload the affected
//! collections only on success.

use std::ops::ControlFlow;
use std::rc::Rc;
use std::time::Duration;

use futures::future::LocalBoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::time::{interval_at, sleep_until, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::client::TaskboardClient;
use crate::command::Command;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::mutation::Mutation;
use crate::render;
use crate::state::{AppState, Collection, FormKind, LoadTicket, UserTasksPanel};
use crate::types::{Priority, Status, TaskId, UpdateTaskStatus, UserId};
use crate::validate::{TaskForm, UserForm};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_NOTIFICATION_TTL: Duration = Duration::from_secs(3);

/// Executes `HttpRequest`s. Implemented by the host (reqwest, ureq, a test
/// double). Returning `Err` means the request never completed; any HTTP
/// status, including errors, is an `Ok` response.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// Receives everything the session wants to show.
pub trait View {
    fn render_users(&mut self, html: &str);
    fn render_user_options(&mut self, html: &str);
    fn render_tasks(&mut self, html: &str);
    fn show_user_tasks(&mut self, title: &str, html: &str);
    fn hide_user_tasks(&mut self);
    fn notify(&mut self, notification: Notification);
    /// The latest notification's time-to-live has passed.
    fn dismiss_notification(&mut self);
    /// Ask the user to confirm a destructive action.
    fn confirm(&mut self, prompt: &str) -> bool;
    /// Disable (`true`) or re-enable (`false`) a form's submit control.
    fn set_submitting(&mut self, form: FormKind, submitting: bool);
    fn reset_form(&mut self, form: FormKind);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

/// A transient message. `run` dismisses it once `ttl` has passed, unless a
/// newer one replaced it first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    pub ttl: Duration,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub refresh_interval: Duration,
    pub notification_ttl: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            notification_ttl: DEFAULT_NOTIFICATION_TTL,
        }
    }
}

/// What an in-flight request was issued for.
#[derive(Debug)]
enum Pending {
    Users(LoadTicket),
    Tasks(LoadTicket),
    UserTasks {
        ticket: LoadTicket,
        user_id: UserId,
        user_name: String,
    },
    Mutation(Mutation),
}

type Completion = (Pending, Result<HttpResponse, ApiError>);

pub struct Session<T, V> {
    client: TaskboardClient,
    transport: Rc<T>,
    view: V,
    state: AppState,
    config: SessionConfig,
    in_flight: FuturesUnordered<LocalBoxFuture<'static, Completion>>,
    notice_deadline: Option<Instant>,
}

impl<T: Transport + 'static, V: View> Session<T, V> {
    pub fn new(client: TaskboardClient, transport: T, view: V, config: SessionConfig) -> Self {
        Self {
            client,
            transport: Rc::new(transport),
            view,
            state: AppState::new(),
            config,
            in_flight: FuturesUnordered::new(),
            notice_deadline: None,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Number of requests issued but not yet completed.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Load both collections, then process commands, refresh ticks and
    /// request completions until `Shutdown` or until every command sender is
    /// dropped. Requests still in flight at that point are abandoned.
    pub async fn run(&mut self, mut commands: mpsc::Receiver<Command>) {
        let period = self.config.refresh_interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(base_url = self.client.base_url(), ?period, "session started");
        self.load_all();

        loop {
            let deadline = self.notice_deadline;
            tokio::select! {
                biased;

                Some((pending, result)) = self.in_flight.next(), if !self.in_flight.is_empty() => {
                    self.complete(pending, result);
                }
                command = commands.recv() => {
                    let Some(command) = command else { break };
                    if self.dispatch(command).is_break() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    debug!(in_flight = self.in_flight.len(), online = self.state.is_online(), "refresh tick");
                    self.load_all();
                }
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.notice_deadline = None;
                    self.view.dismiss_notification();
                }
            }
        }

        if !self.in_flight.is_empty() {
            debug!(abandoned = self.in_flight.len(), "dropping in-flight requests");
            self.in_flight.clear();
        }
        info!("session stopped");
    }

    /// Drive every in-flight request, and any reload it triggers, to
    /// completion.
    pub async fn settle(&mut self) {
        while let Some((pending, result)) = self.in_flight.next().await {
            self.complete(pending, result);
        }
    }

    /// Start the work for one command. Network results arrive later through
    /// `run` or `settle`.
    pub fn dispatch(&mut self, command: Command) -> ControlFlow<()> {
        debug!(?command, "dispatch");
        match command {
            Command::RegisterUser(form) => self.register_user(form),
            Command::AddTask(form) => self.add_task(form),
            Command::UpdateTaskStatus { task_id, status } => self.update_task_status(task_id, status),
            Command::DeleteTask { task_id, confirmed } => self.delete_task(task_id, confirmed),
            Command::DeleteUser { user_id, confirmed } => self.delete_user(user_id, confirmed),
            Command::Refresh(None) => self.load_all(),
            Command::Refresh(Some(collection)) => self.reload(collection),
            Command::SetStatusFilter(status) => self.set_status_filter(status),
            Command::SetPriorityFilter(priority) => self.set_priority_filter(priority),
            Command::ShowUserTasks(user_id) => self.show_user_tasks(user_id),
            Command::CloseUserTasks => self.close_user_tasks(),
            Command::Online => self.online(),
            Command::Offline => self.offline(),
            Command::Escape => self.escape(),
            Command::Shutdown => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    pub fn load_all(&mut self) {
        self.load_users();
        self.load_tasks();
    }

    pub fn load_users(&mut self) {
        let ticket = self.state.begin_load(Collection::Users);
        let request = self.client.build_list_users();
        self.send(Pending::Users(ticket), request);
    }

    /// Fetch all tasks; the current filter is applied when they arrive.
    pub fn load_tasks(&mut self) {
        let ticket = self.state.begin_load(Collection::Tasks);
        let request = self.client.build_list_tasks();
        self.send(Pending::Tasks(ticket), request);
    }

    pub fn show_user_tasks(&mut self, user_id: UserId) {
        let user_name = self
            .state
            .user_name(user_id)
            .map(str::to_string)
            .unwrap_or_else(|| format!("user #{user_id}"));
        let ticket = self.state.begin_load(Collection::UserTasks);
        let request = self.client.build_list_user_tasks(user_id);
        self.send(
            Pending::UserTasks {
                ticket,
                user_id,
                user_name,
            },
            request,
        );
    }

    pub fn close_user_tasks(&mut self) {
        if self.state.close_user_tasks() {
            self.view.hide_user_tasks();
        }
    }

    pub fn register_user(&mut self, form: UserForm) {
        match form.validate() {
            Ok(input) => self.submit(FormKind::User, Mutation::RegisterUser(input)),
            Err(err) => {
                debug!(field = err.field, "user form rejected");
                self.notify_error(err.to_string());
            }
        }
    }

    pub fn add_task(&mut self, form: TaskForm) {
        match form.validate() {
            Ok(input) => self.submit(FormKind::Task, Mutation::AddTask(input)),
            Err(err) => {
                debug!(field = err.field, "task form rejected");
                self.notify_error(err.to_string());
            }
        }
    }

    pub fn update_task_status(&mut self, task_id: TaskId, status: Status) {
        self.mutate(Mutation::UpdateTaskStatus(UpdateTaskStatus { task_id, status }));
    }

    /// `confirmed` skips the prompt; otherwise the view must confirm.
    pub fn delete_task(&mut self, task_id: TaskId, confirmed: bool) {
        self.confirm_then_mutate(Mutation::DeleteTask(task_id), confirmed);
    }

    pub fn delete_user(&mut self, user_id: UserId, confirmed: bool) {
        self.confirm_then_mutate(Mutation::DeleteUser(user_id), confirmed);
    }

    pub fn set_status_filter(&mut self, status: Option<Status>) {
        self.state.filter_mut().status = status;
        self.load_tasks();
    }

    pub fn set_priority_filter(&mut self, priority: Option<Priority>) {
        self.state.filter_mut().priority = priority;
        self.load_tasks();
    }

    pub fn online(&mut self) {
        info!("connection restored");
        self.state.set_online(true);
        self.notify_success("Connection restored".to_string());
        self.load_all();
    }

    pub fn offline(&mut self) {
        warn!("connection lost");
        self.state.set_online(false);
        self.notify_error("You are offline".to_string());
    }

    pub fn escape(&mut self) {
        if self.state.close_user_tasks() {
            self.view.hide_user_tasks();
        } else {
            self.view.reset_form(FormKind::User);
            self.view.reset_form(FormKind::Task);
        }
    }

    fn reload(&mut self, collection: Collection) {
        match collection {
            Collection::Users => self.load_users(),
            Collection::Tasks => self.load_tasks(),
            Collection::UserTasks => {
                if let Some(user_id) = self.state.user_tasks().map(|p| p.user_id) {
                    self.show_user_tasks(user_id);
                }
            }
        }
    }

    fn send(&mut self, pending: Pending, request: HttpRequest) {
        debug!(method = %request.method, url = %request.path, ?pending, "request issued");
        let transport = Rc::clone(&self.transport);
        self.in_flight.push(
            async move {
                let result = transport.execute(request).await;
                (pending, result)
            }
            .boxed_local(),
        );
    }

    fn complete(&mut self, pending: Pending, result: Result<HttpResponse, ApiError>) {
        match pending {
            Pending::Users(ticket) => self.finish_users(ticket, result),
            Pending::Tasks(ticket) => self.finish_tasks(ticket, result),
            Pending::UserTasks {
                ticket,
                user_id,
                user_name,
            } => self.finish_user_tasks(ticket, user_id, user_name, result),
            Pending::Mutation(mutation) => self.finish_mutation(mutation, result),
        }
    }

    fn finish_users(&mut self, ticket: LoadTicket, result: Result<HttpResponse, ApiError>) {
        match result.and_then(|response| self.client.parse_list_users(response)) {
            Ok(users) => {
                let count = users.len();
                if !self.state.apply_users(ticket, users) {
                    debug!(seq = ticket.seq, "dropping stale user list");
                    return;
                }
                debug!(count, "users loaded");
                self.view.render_users(&render::users_fragment(self.state.users()));
                self.view.render_user_options(&render::user_options(self.state.users()));
            }
            Err(err) => {
                warn!(error = %err, online = self.state.is_online(), "failed to load users");
                self.notify_error("Error loading users".to_string());
            }
        }
    }

    fn finish_tasks(&mut self, ticket: LoadTicket, result: Result<HttpResponse, ApiError>) {
        match result.and_then(|response| self.client.parse_list_tasks(response)) {
            Ok(tasks) => {
                let count = tasks.len();
                if !self.state.apply_tasks(ticket, tasks) {
                    debug!(seq = ticket.seq, "dropping stale task list");
                    return;
                }
                debug!(count, "tasks loaded");
                self.render_tasks();
            }
            Err(err) => {
                warn!(error = %err, online = self.state.is_online(), "failed to load tasks");
                self.notify_error("Error loading tasks".to_string());
            }
        }
    }

    fn finish_user_tasks(
        &mut self,
        ticket: LoadTicket,
        user_id: UserId,
        user_name: String,
        result: Result<HttpResponse, ApiError>,
    ) {
        match result.and_then(|response| self.client.parse_list_tasks(response)) {
            Ok(tasks) => {
                let html = render::user_tasks_fragment(&tasks);
                let title = render::user_tasks_title(&user_name);
                let panel = UserTasksPanel {
                    user_id,
                    user_name,
                    tasks,
                };
                if !self.state.apply_user_tasks(ticket, panel) {
                    debug!(seq = ticket.seq, "dropping stale user task list");
                    return;
                }
                self.view.show_user_tasks(&title, &html);
            }
            Err(err) => {
                warn!(user_id, error = %err, online = self.state.is_online(), "failed to load user tasks");
                self.notify_error("Error loading user tasks".to_string());
            }
        }
    }

    fn render_tasks(&mut self) {
        let html = render::tasks_fragment(&self.state.visible_tasks(), self.state.filter_hides_tasks());
        self.view.render_tasks(&html);
    }

    /// Enter `Submitting` and send; `finish_mutation` returns to `Idle`.
    fn submit(&mut self, form: FormKind, mutation: Mutation) {
        if !self.state.begin_submit(form) {
            warn!(?form, "form already submitting");
            return;
        }
        self.view.set_submitting(form, true);
        self.mutate(mutation);
    }

    fn confirm_then_mutate(&mut self, mutation: Mutation, confirmed: bool) {
        if let Some(prompt) = mutation.confirmation() {
            if !confirmed && !self.view.confirm(prompt) {
                debug!(mutation = mutation.name(), "declined");
                return;
            }
        }
        self.mutate(mutation);
    }

    fn mutate(&mut self, mutation: Mutation) {
        match mutation.build_request(&self.client) {
            Ok(request) => self.send(Pending::Mutation(mutation), request),
            Err(err) => self.finish_mutation(mutation, Err(err)),
        }
    }

    /// Leave `Submitting` whatever the outcome. On success notify, reset the
    /// source form and reload; on failure nothing is reloaded.
    fn finish_mutation(&mut self, mutation: Mutation, result: Result<HttpResponse, ApiError>) {
        let form = mutation.form().filter(|form| self.state.is_submitting(*form));
        if let Some(form) = form {
            self.state.end_submit(form);
            self.view.set_submitting(form, false);
        }

        match result.and_then(|response| self.client.parse_mutation(response)) {
            Ok(()) => {
                info!(mutation = mutation.name(), "mutation accepted");
                self.notify_success(mutation.success_message().to_string());
                if let Some(form) = form {
                    self.view.reset_form(form);
                }
                for collection in mutation.reloads() {
                    self.reload(*collection);
                }
            }
            Err(err) => {
                warn!(mutation = mutation.name(), error = %err, "mutation failed");
                self.notify_error(err.user_message(mutation.fallback_error()));
            }
        }
    }

    fn notify_success(&mut self, message: String) {
        self.notify(NotificationKind::Success, message);
    }

    fn notify_error(&mut self, message: String) {
        self.notify(NotificationKind::Error, message);
    }

    fn notify(&mut self, kind: NotificationKind, message: String) {
        let ttl = self.config.notification_ttl;
        self.notice_deadline = Some(Instant::now() + ttl);
        self.view.notify(Notification { kind, message, ttl });
    }
}
