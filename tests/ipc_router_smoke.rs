mod test_support;

use serde_json::json;
use std::io::{BufRead, Write};
use test_support::spawn_daemon;

#[test]
fn every_method_family_answers_and_unknowns_are_explicit() {
    let (mut d, ws) = spawn_daemon("tutord-smoke");

    let health = d.request_ok("health", json!({}));
    assert_eq!(health["mode"], "ready");
    assert!(health["version"].as_str().is_some());

    let status = d.request_ok("config.status", json!({}));
    assert_eq!(status["configured"], true);
    assert_eq!(status["storeUrlSet"], true);

    let session = d.request_ok("auth.session", json!({}));
    assert_eq!(session["state"], "ready");

    let student_id = d.sign_up_student("smoke-s@example.com", "Smoke Student");
    d.sign_out();
    let _ = d.sign_in_teacher("smoke-t@example.com", "Smoke Teacher");

    let _ = d.request_ok("roster.add", json!({ "studentId": student_id }));
    let _ = d.request_ok("roster.searchStudent", json!({ "email": "smoke-s@example.com" }));
    let _ = d.request_ok("roster.list", json!({}));
    let _ = d.request_ok("roster.studentOptions", json!({}));

    let created = d.request_ok(
        "lessons.create",
        json!({
            "studentId": student_id,
            "subject": "Smoke",
            "lessonDate": "2999-01-01",
            "startTime": "10:00",
            "endTime": "11:00",
        }),
    );
    let lesson_id = created["lesson"]["id"].as_str().expect("id").to_string();
    let _ = d.request_ok("lessons.list", json!({}));
    let _ = d.request_ok("lessons.upcoming", json!({}));
    let _ = d.request_ok(
        "lessons.update",
        json!({ "lessonId": lesson_id, "subject": "Smoke again" }),
    );
    let _ = d.request_ok(
        "lessons.updateStatus",
        json!({ "lessonId": lesson_id, "status": "cancelled" }),
    );
    let _ = d.request_ok("dashboard.teacher.open", json!({}));
    let _ = d.request_ok("dashboard.teacher.summary", json!({}));
    let _ = d.request_ok("lessons.delete", json!({ "lessonId": lesson_id }));

    let code = d.request_err("no.such.method", json!({}));
    assert_eq!(code, "not_implemented");

    // Missing wire parameters are bad_params, not a store error.
    let code = d.request_err("lessons.create", json!({}));
    assert_eq!(code, "bad_params");

    d.shutdown(Some(ws));
}

#[test]
fn wrong_typed_optional_params_are_rejected_not_skipped() {
    let (mut d, ws) = spawn_daemon("tutord-smoke-types");

    let code = d.request_err(
        "auth.signUp",
        json!({ "email": "s@example.com", "password": "secret123", "fullName": 12 }),
    );
    assert_eq!(code, "bad_params");

    let student_id = d.sign_up_student("s@example.com", "Sena");
    d.sign_out();
    let _ = d.sign_in_teacher("t@example.com", "Tan");

    let code = d.request_err(
        "lessons.create",
        json!({
            "studentId": student_id,
            "subject": "Math",
            "lessonDate": "2999-01-01",
            "startTime": "10:00",
            "endTime": "11:00",
            "notes": 5,
        }),
    );
    assert_eq!(code, "bad_params");

    let created = d.request_ok(
        "lessons.create",
        json!({
            "studentId": student_id,
            "subject": "Math",
            "lessonDate": "2999-01-01",
            "startTime": "10:00",
            "endTime": "11:00",
            "notes": "fractions",
        }),
    );
    let lesson_id = created["lesson"]["id"].as_str().expect("id").to_string();

    let code = d.request_err(
        "lessons.update",
        json!({ "lessonId": lesson_id, "subject": 7 }),
    );
    assert_eq!(code, "bad_params");
    let code = d.request_err(
        "lessons.update",
        json!({ "lessonId": lesson_id, "notes": ["a"] }),
    );
    assert_eq!(code, "bad_params");

    // The failed patches left the row untouched; null still clears.
    let listed = d.request_ok("lessons.list", json!({}));
    assert_eq!(listed["lessons"][0]["subject"], "Math");
    assert_eq!(listed["lessons"][0]["notes"], "fractions");
    let updated = d.request_ok(
        "lessons.update",
        json!({ "lessonId": lesson_id, "notes": null }),
    );
    assert!(updated["lesson"].get("notes").is_none());

    d.shutdown(Some(ws));
}

#[test]
fn malformed_input_line_is_answered_not_fatal() {
    let (mut d, ws) = spawn_daemon("tutord-smoke-badjson");

    writeln!(d.stdin, "this is not json").expect("write");
    d.stdin.flush().expect("flush");
    let mut line = String::new();
    d.reader.read_line(&mut line).expect("read");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse");
    assert_eq!(value["ok"], false);
    assert_eq!(value["error"]["code"], "bad_json");

    // The daemon stays up and keeps answering.
    let health = d.request_ok("health", json!({}));
    assert_eq!(health["mode"], "ready");

    d.shutdown(Some(ws));
}
