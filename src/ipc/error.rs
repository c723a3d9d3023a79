use crate::store::StoreError;
use serde_json::json;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

/// Access-layer errors pass through unchanged; this is the single place
/// they are mapped to wire codes.
pub fn store_err(id: &str, e: StoreError) -> serde_json::Value {
    let code = match &e {
        StoreError::NotConfigured => "not_configured",
        StoreError::Auth(_) => "auth_error",
        StoreError::ProfileCreation(_) => "profile_creation_failed",
        StoreError::Validation(_) => "validation_error",
        StoreError::DuplicateRelation => "duplicate_relation",
        StoreError::NotFound(_) => "not_found",
        StoreError::Db(_) => "remote_error",
    };
    err(id, code, e.to_string(), None)
}
