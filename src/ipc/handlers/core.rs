use crate::ipc::error::ok;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn mode(state: &AppState) -> &'static str {
    if state.store.is_some() {
        "ready"
    } else {
        "degraded"
    }
}

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "mode": mode(state),
        }),
    )
}

fn handle_config_status(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "configured": state.config.is_configured(),
            "mode": mode(state),
            "storeUrlSet": state.config.store_url.is_some(),
            "storeKeySet": state.config.store_key.is_some(),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "config.status" => Some(handle_config_status(state, req)),
        _ => None,
    }
}
