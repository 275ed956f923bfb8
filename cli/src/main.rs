use std::io::BufRead;
use std::thread;

use anyhow::Context;
use clap::Parser;
use taskboard::{Args, Config, HtmlFileView, ReqwestTransport};
use taskboard_core::{Command, Session, TaskboardClient};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

const COMMAND_BUFFER: usize = 32;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("taskboard=info,taskboard_core=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::try_from(Args::parse())?;
    let transport = ReqwestTransport::new().context("building HTTP client")?;
    let view = HtmlFileView::new(&config.out, config.assume_yes);
    tracing::info!(out = %config.out.display(), "writing board");

    let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
    thread::spawn(move || read_commands(tx));

    let client = TaskboardClient::new(&config.base_url);
    let mut session = Session::new(client, transport, view, config.session);
    session.run(rx).await;
    Ok(())
}

/// Parse stdin line by line until EOF, `quit`, or the session goes away.
fn read_commands(tx: mpsc::Sender<Command>) {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                tracing::warn!(error = %err, "failed to read stdin");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<Command>() {
            Ok(command) => {
                let quit = command == Command::Shutdown;
                if tx.blocking_send(command).is_err() || quit {
                    break;
                }
            }
            Err(err) => eprintln!("error: {err}"),
        }
    }
}
