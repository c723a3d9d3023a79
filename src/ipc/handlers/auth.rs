use super::{opt_str, required_str, store_conn};
use crate::auth;
use crate::ipc::error::{ok, store_err};
use crate::ipc::types::{AppState, Request};
use crate::model::Role;
use serde_json::json;

fn profile_json(profile: &crate::model::Profile) -> serde_json::Value {
    json!({
        "profile": profile,
        "isTeacher": profile.role == Role::Teacher,
        "isStudent": profile.role == Role::Student,
    })
}

fn handle_sign_up(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match store_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let email = match required_str(req, "email") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let password = match req.params.get("password").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return crate::ipc::error::err(&req.id, "bad_params", "missing password", None),
    };
    let full_name = match opt_str(req, "fullName") {
        Ok(v) => v,
        Err(e) => return e,
    };

    match auth::sign_up(conn, &email, &password, full_name) {
        Ok(profile) => {
            log::info!("registered student {}", profile.id);
            state.sessions.set_signed_in(profile.clone());
            ok(&req.id, profile_json(&profile))
        }
        Err(e) => store_err(&req.id, e),
    }
}

fn handle_sign_in(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match store_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let email = match required_str(req, "email") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let password = match req.params.get("password").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return crate::ipc::error::err(&req.id, "bad_params", "missing password", None),
    };

    match auth::sign_in(conn, &email, &password) {
        Ok(profile) => {
            state.sessions.set_signed_in(profile.clone());
            ok(&req.id, profile_json(&profile))
        }
        Err(e) => store_err(&req.id, e),
    }
}

fn handle_sign_out(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.sessions.clear();
    ok(&req.id, json!({ "signedOut": true }))
}

fn handle_session(state: &mut AppState, req: &Request) -> serde_json::Value {
    let mut result = json!({
        "state": state.sessions.phase().as_str(),
    });
    if let Some(profile) = state.sessions.current() {
        result["profile"] = serde_json::to_value(profile).unwrap_or_default();
        result["isTeacher"] = json!(profile.role == Role::Teacher);
        result["isStudent"] = json!(profile.role == Role::Student);
    }
    ok(&req.id, result)
}

/// Substitute for the hosted console: teachers are provisioned here, never
/// through self-registration.
fn handle_create_teacher(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match store_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let email = match required_str(req, "email") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let password = match req.params.get("password").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return crate::ipc::error::err(&req.id, "bad_params", "missing password", None),
    };
    let full_name = match opt_str(req, "fullName") {
        Ok(v) => v,
        Err(e) => return e,
    };

    match auth::create_teacher(conn, &email, &password, full_name) {
        Ok(profile) => {
            log::info!("provisioned teacher {}", profile.id);
            ok(&req.id, json!({ "profile": profile }))
        }
        Err(e) => store_err(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "auth.signUp" => Some(handle_sign_up(state, req)),
        "auth.signIn" => Some(handle_sign_in(state, req)),
        "auth.signOut" => Some(handle_sign_out(state, req)),
        "auth.session" => Some(handle_session(state, req)),
        "admin.createTeacher" => Some(handle_create_teacher(state, req)),
        _ => None,
    }
}
