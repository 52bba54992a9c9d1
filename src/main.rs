mod catalog;
mod config;
mod error;
mod export;
mod grade;
mod import;
mod intake;
mod ipc;
mod logging;
mod notify;
mod seed;
mod session;
mod sheet;
mod stats;
mod store;
mod summary;
mod validate;

use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};

fn main() -> Result<()> {
    let config = config::Config::load().context("Failed to load configuration")?;
    logging::init_tracing(env!("CARGO_PKG_NAME"), &config.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "gradebookd starting");

    let mut state = ipc::AppState::new(config);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "stdin closed with error");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id.
                tracing::warn!(error = %e, "unparseable request line");
                let reply = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                let _ = writeln!(stdout, "{reply}");
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }

    if state.session.take().is_some() {
        tracing::info!("session closed at exit");
    }
    Ok(())
}
