use super::{current_profile, opt_str, require_role, required_str, store_conn};
use crate::ipc::error::{err, ok, store_err};
use crate::ipc::types::{AppState, Request};
use crate::model::{Lesson, LessonStatus, Role};
use crate::store::{self, LessonInput, LessonPatch};
use chrono::Local;
use serde_json::json;

fn today() -> String {
    Local::now().date_naive().format("%Y-%m-%d").to_string()
}

fn parse_status(req: &Request, key: &str) -> Result<Option<LessonStatus>, serde_json::Value> {
    match req.params.get(key).and_then(|v| v.as_str()) {
        None => Ok(None),
        Some(raw) => LessonStatus::parse(raw).map(Some).ok_or_else(|| {
            err(
                &req.id,
                "bad_params",
                format!("{key} must be one of: scheduled, completed, cancelled"),
                None,
            )
        }),
    }
}

/// Optional text field from a patch: absent leaves the stored value,
/// null or empty clears it, anything non-string is a wire error.
fn patch_text(req: &Request, key: &str) -> Result<Option<Option<String>>, serde_json::Value> {
    match req.params.get(key) {
        None => Ok(None),
        Some(serde_json::Value::Null) => Ok(Some(None)),
        Some(serde_json::Value::String(s)) => {
            let trimmed = s.trim().to_string();
            Ok(Some(if trimmed.is_empty() { None } else { Some(trimmed) }))
        }
        Some(_) => Err(err(
            &req.id,
            "bad_params",
            format!("{} must be a string or null", key),
            None,
        )),
    }
}

fn lessons_json(rows: &[Lesson], viewer: Role) -> serde_json::Value {
    json!(rows.iter().map(|l| l.viewed_by(viewer)).collect::<Vec<_>>())
}

fn build_patch(
    req: &Request,
    status: Option<LessonStatus>,
) -> Result<LessonPatch, serde_json::Value> {
    Ok(LessonPatch {
        student_id: opt_str(req, "studentId")?,
        subject: opt_str(req, "subject")?,
        lesson_date: opt_str(req, "lessonDate")?,
        start_time: opt_str(req, "startTime")?,
        end_time: opt_str(req, "endTime")?,
        description: patch_text(req, "description")?,
        meeting_link: patch_text(req, "meetingLink")?,
        notes: patch_text(req, "notes")?,
        status,
    })
}

/// Reconcile an open teacher dashboard from a mutation's return value.
fn apply_saved(state: &mut AppState, teacher_id: &str, lesson: Lesson) {
    if let Some(dash) = state.teacher_dash.as_mut() {
        if dash.teacher_id == teacher_id {
            dash.apply_lesson_saved(lesson);
        }
    }
}

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    // Degraded mode: lists read as empty rather than failing, before any
    // session check, matching the unconfigured remote client.
    let Some(conn) = state.store.as_ref() else {
        return ok(&req.id, json!({ "lessons": [] }));
    };
    let profile = match current_profile(state, req) {
        Ok(p) => p,
        Err(e) => return e,
    };
    let status = match parse_status(req, "status") {
        Ok(v) => v,
        Err(e) => return e,
    };

    match store::list_lessons(conn, &profile.id, profile.role, status) {
        Ok(rows) => ok(&req.id, json!({ "lessons": lessons_json(&rows, profile.role) })),
        Err(e) => store_err(&req.id, e),
    }
}

fn handle_upcoming(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.store.as_ref() else {
        return ok(&req.id, json!({ "lessons": [] }));
    };
    let profile = match current_profile(state, req) {
        Ok(p) => p,
        Err(e) => return e,
    };

    match store::upcoming_lessons(conn, &profile.id, profile.role, &today()) {
        Ok(rows) => ok(&req.id, json!({ "lessons": lessons_json(&rows, profile.role) })),
        Err(e) => store_err(&req.id, e),
    }
}

fn handle_create(state: &mut AppState, req: &Request) -> serde_json::Value {
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
    let subject = match required_str(req, "subject") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let lesson_date = match required_str(req, "lessonDate") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let start_time = match required_str(req, "startTime") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let end_time = match required_str(req, "endTime") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let description = match opt_str(req, "description") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let meeting_link = match opt_str(req, "meetingLink") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let notes = match opt_str(req, "notes") {
        Ok(v) => v,
        Err(e) => return e,
    };

    let input = LessonInput {
        student_id,
        subject,
        lesson_date,
        start_time,
        end_time,
        description,
        meeting_link,
        notes,
        status: LessonStatus::Scheduled,
    };

    match store::create_lesson(conn, &teacher.id, input) {
        Ok(lesson) => {
            let result = ok(&req.id, json!({ "lesson": lesson }));
            apply_saved(state, &teacher.id, lesson);
            result
        }
        Err(e) => store_err(&req.id, e),
    }
}

fn handle_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match store_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let teacher = match require_role(state, req, Role::Teacher) {
        Ok(p) => p,
        Err(e) => return e,
    };
    let lesson_id = match required_str(req, "lessonId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let status = match parse_status(req, "status") {
        Ok(v) => v,
        Err(e) => return e,
    };

    let patch = match build_patch(req, status) {
        Ok(p) => p,
        Err(e) => return e,
    };

    match store::update_lesson(conn, &teacher.id, &lesson_id, patch) {
        Ok(lesson) => {
            let result = ok(&req.id, json!({ "lesson": lesson }));
            apply_saved(state, &teacher.id, lesson);
            result
        }
        Err(e) => store_err(&req.id, e),
    }
}

fn handle_update_status(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match store_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let teacher = match require_role(state, req, Role::Teacher) {
        Ok(p) => p,
        Err(e) => return e,
    };
    let lesson_id = match required_str(req, "lessonId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let status_raw = match required_str(req, "status") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(status) = LessonStatus::parse(&status_raw) else {
        return err(
            &req.id,
            "bad_params",
            "status must be one of: scheduled, completed, cancelled",
            None,
        );
    };

    let patch = LessonPatch {
        status: Some(status),
        ..Default::default()
    };
    match store::update_lesson(conn, &teacher.id, &lesson_id, patch) {
        Ok(lesson) => {
            let result = ok(&req.id, json!({ "lesson": lesson }));
            apply_saved(state, &teacher.id, lesson);
            result
        }
        Err(e) => store_err(&req.id, e),
    }
}

fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match store_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let teacher = match require_role(state, req, Role::Teacher) {
        Ok(p) => p,
        Err(e) => return e,
    };
    let lesson_id = match required_str(req, "lessonId") {
        Ok(v) => v,
        Err(e) => return e,
    };

    match store::delete_lesson(conn, &teacher.id, &lesson_id) {
        Ok(()) => {
            if let Some(dash) = state.teacher_dash.as_mut() {
                if dash.teacher_id == teacher.id {
                    dash.apply_lesson_removed(&lesson_id);
                }
            }
            ok(&req.id, json!({ "deleted": true }))
        }
        Err(e) => store_err(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "lessons.list" => Some(handle_list(state, req)),
        "lessons.upcoming" => Some(handle_upcoming(state, req)),
        "lessons.create" => Some(handle_create(state, req)),
        "lessons.update" => Some(handle_update(state, req)),
        "lessons.updateStatus" => Some(handle_update_status(state, req)),
        "lessons.delete" => Some(handle_delete(state, req)),
        _ => None,
    }
}
