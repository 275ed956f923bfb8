//! Command-line and environment configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use reqwest::Url;
use taskboard_core::SessionConfig;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

/// Terminal client for the task board service.
///
/// Reads commands from stdin, one per line, and writes the rendered board to
/// an HTML file after every change.
#[derive(Debug, Parser)]
#[command(name = "taskboard", version)]
pub struct Args {
    /// Base URL of the task board service
    #[arg(long, env = "TASKBOARD_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Seconds between automatic reloads of users and tasks
    #[arg(long, env = "TASKBOARD_REFRESH_SECS", default_value_t = 30)]
    pub refresh_secs: u64,

    /// HTML file rewritten after each render
    #[arg(long, env = "TASKBOARD_OUT", default_value = "taskboard.html")]
    pub out: PathBuf,

    /// Confirm destructive commands without asking
    #[arg(short = 'y', long)]
    pub assume_yes: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("refresh interval must be greater than zero")]
    ZeroRefreshInterval,
}

/// Validated settings for one run.
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub session: SessionConfig,
    pub out: PathBuf,
    pub assume_yes: bool,
}

impl TryFrom<Args> for Config {
    type Error = ConfigError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let base_url = validate_base_url(&args.base_url)?;
        if args.refresh_secs == 0 {
            return Err(ConfigError::ZeroRefreshInterval);
        }
        Ok(Config {
            base_url,
            session: SessionConfig {
                refresh_interval: Duration::from_secs(args.refresh_secs),
                ..SessionConfig::default()
            },
            out: args.out,
            assume_yes: args.assume_yes,
        })
    }
}

fn validate_base_url(raw: &str) -> Result<String, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidBaseUrl {
        url: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    Ok(raw.trim_end_matches('/').to_string())
}
