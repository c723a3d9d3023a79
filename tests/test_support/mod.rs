#![allow(dead_code)]

use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

pub fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

pub struct Daemon {
    pub child: Child,
    pub stdin: ChildStdin,
    pub reader: BufReader<ChildStdout>,
    seq: u64,
}

pub fn spawn(configure: impl FnOnce(&mut Command)) -> Daemon {
    let exe = env!("CARGO_BIN_EXE_tutord");
    let mut cmd = Command::new(exe);
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .env_remove("TUTORD_STORE_URL")
        .env_remove("TUTORD_STORE_KEY");
    configure(&mut cmd);
    let mut child = cmd.spawn().expect("spawn tutord");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    Daemon {
        child,
        stdin,
        reader: BufReader::new(stdout),
        seq: 0,
    }
}

/// Daemon with a fresh store in its own temp workspace.
pub fn spawn_daemon(prefix: &str) -> (Daemon, PathBuf) {
    let workspace = temp_dir(prefix);
    let store = workspace.join("tutor.sqlite3");
    let daemon = spawn(|cmd| {
        cmd.env(
            "TUTORD_STORE_URL",
            format!("sqlite://{}", store.to_string_lossy()),
        )
        .env("TUTORD_STORE_KEY", "test-public-key");
    });
    (daemon, workspace)
}

/// Daemon with no store configuration at all: degraded mode.
pub fn spawn_degraded() -> Daemon {
    spawn(|_| {})
}

impl Daemon {
    pub fn request(&mut self, method: &str, params: serde_json::Value) -> serde_json::Value {
        self.seq += 1;
        let id = self.seq.to_string();
        let payload = json!({
            "id": id,
            "method": method,
            "params": params,
        });
        writeln!(self.stdin, "{}", payload).expect("write request");
        self.stdin.flush().expect("flush request");

        let mut line = String::new();
        self.reader.read_line(&mut line).expect("read response line");
        assert!(!line.trim().is_empty(), "empty response for {}", method);
        let value: serde_json::Value =
            serde_json::from_str(line.trim()).expect("parse response json");
        assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id.as_str()));
        value
    }

    pub fn request_ok(&mut self, method: &str, params: serde_json::Value) -> serde_json::Value {
        let value = self.request(method, params);
        assert_eq!(
            value.get("ok").and_then(|v| v.as_bool()),
            Some(true),
            "expected ok for {}: {}",
            method,
            value
        );
        value.get("result").cloned().unwrap_or_default()
    }

    /// Asserts failure and returns the error code.
    pub fn request_err(&mut self, method: &str, params: serde_json::Value) -> String {
        let value = self.request(method, params);
        assert_eq!(
            value.get("ok").and_then(|v| v.as_bool()),
            Some(false),
            "expected error for {}: {}",
            method,
            value
        );
        value
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str())
            .expect("error code")
            .to_string()
    }

    /// Provision a teacher account and sign it in; returns the profile id.
    pub fn sign_in_teacher(&mut self, email: &str, name: &str) -> String {
        let _ = self.request_ok(
            "admin.createTeacher",
            json!({ "email": email, "password": "secret123", "fullName": name }),
        );
        let signed_in = self.request_ok(
            "auth.signIn",
            json!({ "email": email, "password": "secret123" }),
        );
        signed_in["profile"]["id"]
            .as_str()
            .expect("teacher id")
            .to_string()
    }

    /// Self-register a student (which signs the session in); returns the
    /// profile id.
    pub fn sign_up_student(&mut self, email: &str, name: &str) -> String {
        let signed_up = self.request_ok(
            "auth.signUp",
            json!({ "email": email, "password": "secret123", "fullName": name }),
        );
        signed_up["profile"]["id"]
            .as_str()
            .expect("student id")
            .to_string()
    }

    pub fn sign_out(&mut self) {
        let _ = self.request_ok("auth.signOut", json!({}));
    }

    pub fn sign_in(&mut self, email: &str) {
        let _ = self.request_ok(
            "auth.signIn",
            json!({ "email": email, "password": "secret123" }),
        );
    }

    pub fn shutdown(mut self, workspace: Option<PathBuf>) {
        drop(self.stdin);
        let _ = self.child.wait();
        if let Some(ws) = workspace {
            let _ = std::fs::remove_dir_all(ws);
        }
    }
}
