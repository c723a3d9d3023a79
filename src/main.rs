mod auth;
mod config;
mod dashboard;
mod db;
mod ipc;
mod model;
mod session;
mod store;

use std::io::{self, BufRead, Write};

fn main() -> anyhow::Result<()> {
    // stdout carries the protocol; logging stays on stderr.
    env_logger::init();

    let cfg = config::Config::from_env();
    let store = match cfg.store_path() {
        Some(path) if cfg.is_configured() => {
            let conn = db::open_store(&path)?;
            log::info!("store opened at {}", path.to_string_lossy());
            Some(conn)
        }
        _ => {
            log::warn!(
                "{} / {} not set (or left at a placeholder); running degraded",
                config::STORE_URL_VAR,
                config::STORE_KEY_VAR
            );
            None
        }
    };

    let mut state = ipc::AppState::new(cfg, store);
    state.sessions.initialize();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without a request id; emit a bare error and
                // move on.
                let resp = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() },
                });
                let _ = writeln!(stdout, "{}", resp);
                let _ = stdout.flush();
                continue;
            }
        };

        log::debug!("handling {}", req.method);
        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }

    Ok(())
}
