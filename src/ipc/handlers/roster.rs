use super::{require_role, required_str, store_conn};
use crate::ipc::error::{ok, store_err};
use crate::ipc::types::{AppState, Request};
use crate::model::Role;
use crate::store;
use serde_json::json;

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.store.as_ref() else {
        return ok(&req.id, json!({ "students": [] }));
    };
    let teacher = match require_role(state, req, Role::Teacher) {
        Ok(p) => p,
        Err(e) => return e,
    };

    match store::list_roster(conn, &teacher.id) {
        Ok(rows) => ok(&req.id, json!({ "students": rows })),
        Err(e) => store_err(&req.id, e),
    }
}

/// Lookup is exact-match after trim/lowercase; a miss is a result, not an
/// error, so the caller can show "no student with that email" directly.
fn handle_search(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match store_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let _teacher = match require_role(state, req, Role::Teacher) {
        Ok(p) => p,
        Err(e) => return e,
    };
    let email = match required_str(req, "email") {
        Ok(v) => v,
        Err(e) => return e,
    };

    match store::search_student_by_email(conn, &email) {
        Ok(Some(student)) => ok(&req.id, json!({ "found": true, "student": student })),
        Ok(None) => ok(&req.id, json!({ "found": false })),
        Err(e) => store_err(&req.id, e),
    }
}

fn handle_add(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match store_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let teacher = match require_role(state, req, Role::Teacher) {
        Ok(p) => p,
        Err(e) => return e,
    };
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(e) => return e,
    };

    match store::add_relation(conn, &teacher.id, &student_id) {
        Ok(relation) => {
            let result = ok(&req.id, json!({ "relation": relation }));
            if let Some(dash) = state.teacher_dash.as_mut() {
                if dash.teacher_id == teacher.id {
                    dash.apply_relation_added(relation);
                }
            }
            result
        }
        Err(e) => store_err(&req.id, e),
    }
}

fn handle_remove(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match store_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let teacher = match require_role(state, req, Role::Teacher) {
        Ok(p) => p,
        Err(e) => return e,
    };
    let relation_id = match required_str(req, "relationId") {
        Ok(v) => v,
        Err(e) => return e,
    };

    match store::remove_relation(conn, &teacher.id, &relation_id) {
        Ok(()) => {
            if let Some(dash) = state.teacher_dash.as_mut() {
                if dash.teacher_id == teacher.id {
                    dash.apply_relation_removed(&relation_id);
                }
            }
            ok(&req.id, json!({ "removed": true }))
        }
        Err(e) => store_err(&req.id, e),
    }
}

/// Linked students flattened for the lesson form dropdown.
fn handle_student_options(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.store.as_ref() else {
        return ok(&req.id, json!({ "students": [] }));
    };
    let teacher = match require_role(state, req, Role::Teacher) {
        Ok(p) => p,
        Err(e) => return e,
    };

    match store::student_options(conn, &teacher.id) {
        Ok(rows) => ok(&req.id, json!({ "students": rows })),
        Err(e) => store_err(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "roster.list" => Some(handle_list(state, req)),
        "roster.searchStudent" => Some(handle_search(state, req)),
        "roster.add" => Some(handle_add(state, req)),
        "roster.remove" => Some(handle_remove(state, req)),
        "roster.studentOptions" => Some(handle_student_options(state, req)),
        _ => None,
    }
}
