//! A `View` that renders the board into a standalone HTML file and reports
//! notifications on the terminal.
//!
//! # Design
//! The view keeps the latest fragment for every region of the page. Each
//! change rewrites the whole file, so opening or reloading it in a browser
//! always shows the current board. A notification stays in the page until
//! the session dismisses it, which rewrites the file without the banner.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use taskboard_core::render::escape_html;
use taskboard_core::{FormKind, Notification, NotificationKind, View};
use tracing::{debug, warn};

const STYLE: &str = "body{font-family:sans-serif;margin:2rem;background:#f5f6fa}\
.notification{padding:.75rem 1rem;border-radius:4px;color:#fff}\
.notification.success{background:#2ecc71}.notification.error{background:#e74c3c}\
.user-card,.task-card{background:#fff;margin:.5rem 0;padding:1rem;border-radius:6px}\
.priority-high{border-left:4px solid #e74c3c}.priority-medium{border-left:4px solid #f39c12}\
.priority-low{border-left:4px solid #2ecc71}.empty-state{color:#888}\
.submit-btn.loading{opacity:.6}";

pub struct HtmlFileView {
    out: PathBuf,
    assume_yes: bool,
    users: String,
    user_options: String,
    tasks: String,
    user_tasks: Option<(String, String)>,
    banner: Option<Notification>,
    user_form_busy: bool,
    task_form_busy: bool,
}

impl HtmlFileView {
    pub fn new(out: impl Into<PathBuf>, assume_yes: bool) -> Self {
        Self {
            out: out.into(),
            assume_yes,
            users: String::new(),
            user_options: String::new(),
            tasks: String::new(),
            user_tasks: None,
            banner: None,
            user_form_busy: false,
            task_form_busy: false,
        }
    }

    pub fn out(&self) -> &Path {
        &self.out
    }

    /// The complete page for the current state.
    pub fn page(&self) -> String {
        let mut html = String::from("<!DOCTYPE html>\n<html lang=\"en\"><head><meta charset=\"utf-8\">");
        html.push_str("<title>Task Manager</title><style>");
        html.push_str(STYLE);
        html.push_str("</style></head><body>");

        if let Some(banner) = &self.banner {
            let class = match banner.kind {
                NotificationKind::Success => "success",
                NotificationKind::Error => "error",
            };
            html.push_str(&format!(
                "<div class=\"notification {class}\">{}</div>",
                escape_html(&banner.message)
            ));
        }

        html.push_str("<section id=\"users\"><h2>Users</h2>");
        html.push_str(&form_button("user-form", "Register User", self.user_form_busy));
        html.push_str("<div id=\"users-list\">");
        html.push_str(&self.users);
        html.push_str("</div></section>");

        html.push_str("<section id=\"tasks\"><h2>Tasks</h2>");
        html.push_str("<select id=\"task-user\" name=\"user_id\">");
        html.push_str(&self.user_options);
        html.push_str("</select>");
        html.push_str(&form_button("task-form", "Add Task", self.task_form_busy));
        html.push_str("<div id=\"tasks-list\">");
        html.push_str(&self.tasks);
        html.push_str("</div></section>");

        if let Some((title, body)) = &self.user_tasks {
            html.push_str("<div id=\"user-tasks-modal\" class=\"modal\"><h2 id=\"modal-title\">");
            html.push_str(title);
            html.push_str("</h2><div id=\"modal-tasks-list\">");
            html.push_str(body);
            html.push_str("</div></div>");
        }

        html.push_str("</body></html>\n");
        html
    }

    fn write(&self) -> io::Result<()> {
        fs::write(&self.out, self.page())
    }

    fn refresh(&self) {
        if let Err(err) = self.write() {
            warn!(path = %self.out.display(), error = %err, "failed to write page");
        }
    }
}

fn form_button(form: &str, label: &str, busy: bool) -> String {
    if busy {
        format!("<button form=\"{form}\" class=\"submit-btn loading\" disabled>{label}</button>")
    } else {
        format!("<button form=\"{form}\" class=\"submit-btn\">{label}</button>")
    }
}

impl View for HtmlFileView {
    fn render_users(&mut self, html: &str) {
        self.users = html.to_string();
        self.refresh();
    }

    fn render_user_options(&mut self, html: &str) {
        self.user_options = html.to_string();
        self.refresh();
    }

    fn render_tasks(&mut self, html: &str) {
        self.tasks = html.to_string();
        self.refresh();
    }

    fn show_user_tasks(&mut self, title: &str, html: &str) {
        println!("{title}");
        self.user_tasks = Some((title.to_string(), html.to_string()));
        self.refresh();
    }

    fn hide_user_tasks(&mut self) {
        self.user_tasks = None;
        self.refresh();
    }

    fn notify(&mut self, notification: Notification) {
        match notification.kind {
            NotificationKind::Success => println!("ok: {}", notification.message),
            NotificationKind::Error => eprintln!("error: {}", notification.message),
        }
        self.banner = Some(notification);
        self.refresh();
    }

    fn dismiss_notification(&mut self) {
        if self.banner.take().is_some() {
            self.refresh();
        }
    }

    fn confirm(&mut self, prompt: &str) -> bool {
        if !self.assume_yes {
            eprintln!("{prompt}\n  hint: repeat the command with -y to confirm");
        }
        self.assume_yes
    }

    fn set_submitting(&mut self, form: FormKind, submitting: bool) {
        match form {
            FormKind::User => self.user_form_busy = submitting,
            FormKind::Task => self.task_form_busy = submitting,
        }
        self.refresh();
    }

    /// Forms are typed fresh on every command line; nothing is retained.
    fn reset_form(&mut self, form: FormKind) {
        debug!(?form, "form reset");
    }
}
