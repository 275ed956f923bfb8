//! Terminal host for the task board client.
//!
//! Wires `taskboard_core::Session` to a reqwest `Transport` and an
//! `HtmlFileView`, configured from flags and environment variables.

pub mod config;
pub mod transport;
pub mod view;

pub use config::{Args, Config, ConfigError};
pub use transport::ReqwestTransport;
pub use view::HtmlFileView;
