pub mod auth;
pub mod core;
pub mod dashboard;
pub mod lessons;
pub mod roster;

use crate::ipc::error::err;
use crate::ipc::types::{AppState, Request};
use crate::model::{Profile, Role};
use rusqlite::Connection;

/// Store handle, or the degraded-mode failure.
pub fn store_conn<'a>(
    state: &'a AppState,
    req: &Request,
) -> Result<&'a Connection, serde_json::Value> {
    state.store.as_ref().ok_or_else(|| {
        err(
            &req.id,
            "not_configured",
            "store not configured: set TUTORD_STORE_URL and TUTORD_STORE_KEY",
            None,
        )
    })
}

pub fn current_profile(state: &AppState, req: &Request) -> Result<Profile, serde_json::Value> {
    state
        .sessions
        .current()
        .cloned()
        .ok_or_else(|| err(&req.id, "no_session", "sign in first", None))
}

/// Role gate standing in for the hosted store's row-level policies.
pub fn require_role(
    state: &AppState,
    req: &Request,
    role: Role,
) -> Result<Profile, serde_json::Value> {
    let profile = current_profile(state, req)?;
    if profile.role != role {
        return Err(err(
            &req.id,
            "forbidden",
            format!("requires a {} session", role.as_str()),
            None,
        ));
    }
    Ok(profile)
}

pub fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

/// Optional string parameter. Absent, null, and empty all read as `None`;
/// a present value of any other type is a wire error, not a silent skip.
pub fn opt_str(req: &Request, key: &str) -> Result<Option<String>, serde_json::Value> {
    match req.params.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => {
            let trimmed = s.trim().to_string();
            Ok(if trimmed.is_empty() { None } else { Some(trimmed) })
        }
        Some(_) => Err(err(
            &req.id,
            "bad_params",
            format!("{} must be a string", key),
            None,
        )),
    }
}
