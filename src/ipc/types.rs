use crate::config::Config;
use crate::dashboard::{StudentDashboard, TeacherDashboard};
use crate::session::{SessionStore, SessionSubscription};
use rusqlite::Connection;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub config: Config,
    /// `None` means degraded mode: the store env was absent or left at a
    /// placeholder, so list reads come back empty and everything else
    /// fails explicitly instead of crashing.
    pub store: Option<Connection>,
    pub sessions: SessionStore,
    session_events: SessionSubscription,
    pub teacher_dash: Option<TeacherDashboard>,
    pub student_dash: Option<StudentDashboard>,
}

impl AppState {
    pub fn new(config: Config, store: Option<Connection>) -> AppState {
        let mut sessions = SessionStore::new();
        let session_events = sessions.subscribe();
        AppState {
            config,
            store,
            sessions,
            session_events,
            teacher_dash: None,
            student_dash: None,
        }
    }

    /// Tear down dashboard state when the session changed since the last
    /// request. Runs before every dispatch, so dashboards never outlive
    /// the session they were opened under.
    pub fn reconcile_session(&mut self) {
        if !self.session_events.pending().is_empty() {
            self.teacher_dash = None;
            self.student_dash = None;
        }
    }
}
