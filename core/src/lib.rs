//! Client core for the task board service.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern), keeps the client-side view of
//! users and tasks, filters and renders them to HTML fragments, and drives
//! loads, mutations, periodic refresh and connectivity changes through a
//! `Session`.
//!
//! # Design
//! - `TaskboardClient` is stateless; it holds only `base_url`.
//! - Each endpoint is split into `build_*` and `parse_*`, so the I/O boundary
//!   is explicit. A host-supplied `Transport` performs the round-trip.
//! - `AppState` is owned by one `Session`; there are no globals.
//! - Rendering is pure and escapes every user-supplied string.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod command;
pub mod error;
pub mod filter;
pub mod http;
pub mod mutation;
pub mod render;
pub mod session;
pub mod state;
pub mod types;
pub mod validate;

pub use client::TaskboardClient;
pub use command::{Command, CommandError};
pub use error::{ApiError, ParseEnumError, ValidationError};
pub use filter::TaskFilter;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use mutation::Mutation;
pub use session::{Notification, NotificationKind, Session, SessionConfig, Transport, View};
pub use state::{AppState, Collection, FormKind, FormState};
pub use types::{AddTask, Priority, RegisterUser, Status, Task, TaskId, TaskOwner, UpdateTaskStatus, User, UserId};
pub use validate::{TaskForm, UserForm};
