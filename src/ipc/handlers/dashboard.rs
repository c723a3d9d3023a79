use super::require_role;
use crate::dashboard::{StudentDashboard, TeacherDashboard};
use crate::ipc::error::{err, ok, store_err};
use crate::ipc::types::{AppState, Request};
use crate::model::Role;
use chrono::Local;

fn today() -> String {
    Local::now().date_naive().format("%Y-%m-%d").to_string()
}

fn handle_teacher_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.store.as_ref() else {
        return err(
            &req.id,
            "not_configured",
            "store not configured: set TUTORD_STORE_URL and TUTORD_STORE_KEY",
            None,
        );
    };
    let teacher = match require_role(state, req, Role::Teacher) {
        Ok(p) => p,
        Err(e) => return e,
    };

    match TeacherDashboard::open(conn, &teacher.id) {
        Ok(dash) => {
            let summary = dash.summary();
            state.teacher_dash = Some(dash);
            ok(&req.id, summary)
        }
        Err(e) => store_err(&req.id, e),
    }
}

/// Served from the controller's in-memory collections; mutations have
/// already been reconciled into them, so no queries run here.
fn handle_teacher_summary(state: &mut AppState, req: &Request) -> serde_json::Value {
    let teacher = match require_role(state, req, Role::Teacher) {
        Ok(p) => p,
        Err(e) => return e,
    };
    match state.teacher_dash.as_ref() {
        Some(dash) if dash.teacher_id == teacher.id => ok(&req.id, dash.summary()),
        _ => err(&req.id, "not_open", "open the dashboard first", None),
    }
}

fn handle_student_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.store.as_ref() else {
        return err(
            &req.id,
            "not_configured",
            "store not configured: set TUTORD_STORE_URL and TUTORD_STORE_KEY",
            None,
        );
    };
    let student = match require_role(state, req, Role::Student) {
        Ok(p) => p,
        Err(e) => return e,
    };

    match StudentDashboard::open(conn, &student.id, &today()) {
        Ok(dash) => {
            let summary = dash.summary();
            state.student_dash = Some(dash);
            ok(&req.id, summary)
        }
        Err(e) => store_err(&req.id, e),
    }
}

fn handle_student_summary(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student = match require_role(state, req, Role::Student) {
        Ok(p) => p,
        Err(e) => return e,
    };
    match state.student_dash.as_ref() {
        Some(dash) if dash.student_id == student.id => ok(&req.id, dash.summary()),
        _ => err(&req.id, "not_open", "open the dashboard first", None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "dashboard.teacher.open" => Some(handle_teacher_open(state, req)),
        "dashboard.teacher.summary" => Some(handle_teacher_summary(state, req)),
        "dashboard.student.open" => Some(handle_student_open(state, req)),
        "dashboard.student.summary" => Some(handle_student_summary(state, req)),
        _ => None,
    }
}
