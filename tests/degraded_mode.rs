mod test_support;

use serde_json::json;
use test_support::{spawn, spawn_degraded};

#[test]
fn unconfigured_store_reads_empty_and_fails_everything_else() {
    let mut d = spawn_degraded();

    let health = d.request_ok("health", json!({}));
    assert_eq!(health["mode"], "degraded");

    let status = d.request_ok("config.status", json!({}));
    assert_eq!(status["configured"], false);
    assert_eq!(status["mode"], "degraded");
    assert_eq!(status["storeUrlSet"], false);
    assert_eq!(status["storeKeySet"], false);

    // Reads succeed empty, without a session and without an error.
    for method in ["lessons.list", "lessons.upcoming"] {
        let result = d.request_ok(method, json!({}));
        assert!(result["lessons"].as_array().expect("lessons").is_empty());
    }
    for method in ["roster.list", "roster.studentOptions"] {
        let result = d.request_ok(method, json!({}));
        assert!(result["students"].as_array().expect("students").is_empty());
    }

    // Everything that needs the store fails with the same code, so the
    // caller can surface one "connect your store" message.
    let probes: [(&str, serde_json::Value); 7] = [
        (
            "auth.signUp",
            json!({ "email": "a@example.com", "password": "secret123" }),
        ),
        (
            "auth.signIn",
            json!({ "email": "a@example.com", "password": "secret123" }),
        ),
        (
            "lessons.create",
            json!({
                "studentId": "x",
                "subject": "Math",
                "lessonDate": "2999-01-01",
                "startTime": "10:00",
                "endTime": "11:00",
            }),
        ),
        ("roster.add", json!({ "studentId": "x" })),
        ("roster.searchStudent", json!({ "email": "a@example.com" })),
        ("dashboard.teacher.open", json!({})),
        ("dashboard.student.open", json!({})),
    ];
    for (method, params) in probes {
        let code = d.request_err(method, params);
        assert_eq!(code, "not_configured", "method {}", method);
    }

    // Signing out is still harmless.
    d.sign_out();
    let session = d.request_ok("auth.session", json!({}));
    assert_eq!(session["state"], "ready");
    assert!(session.get("profile").is_none());

    d.shutdown(None);
}

#[test]
fn placeholder_credentials_count_as_unconfigured() {
    let mut d = spawn(|cmd| {
        cmd.env("TUTORD_STORE_URL", "https://your-project.example.com")
            .env("TUTORD_STORE_KEY", "your-anon-key");
    });

    let health = d.request_ok("health", json!({}));
    assert_eq!(health["mode"], "degraded");
    let status = d.request_ok("config.status", json!({}));
    assert_eq!(status["configured"], false);

    d.shutdown(None);
}
