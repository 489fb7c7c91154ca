//! Integration tests for the audit backend API
//!
//! Drives the full router with in-memory sqlite, a stub identity verifier,
//! and zero analysis delay, covering the submit/poll workflow, task
//! replacement, login, and profile updates.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use base64::{engine::general_purpose, Engine as _};
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt; // for `oneshot` method

use hea_api::services::StaticTokenVerifier;
use hea_api::{build_router, AppState};

const GOOD_TOKEN: &str = "test-id-token";
const BOUNDARY: &str = "hea-test-boundary";

/// Test helper: build app state over an in-memory database
///
/// A single pooled connection keeps every query on the same in-memory
/// sqlite instance.
async fn setup_state(analysis_delay: Duration) -> AppState {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool");
    hea_api::db::init_schema(&pool).await.expect("schema");

    AppState::new(
        pool,
        Arc::new(StaticTokenVerifier::new(GOOD_TOKEN, "subject-1")),
        analysis_delay,
    )
}

async fn setup_app(analysis_delay: Duration) -> (axum::Router, AppState) {
    let state = setup_state(analysis_delay).await;
    (build_router(state.clone()), state)
}

/// Test helper: build a multipart submission body
///
/// `media` entries are (filename, content_type, bytes); part names are
/// media0, media1, ...
fn multipart_body(uid: &str, task_json: &str, media: &[(&str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();

    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(b"Content-Disposition: form-data; name=\"uid\"\r\n\r\n");
    body.extend_from_slice(uid.as_bytes());
    body.extend_from_slice(b"\r\n");

    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(b"Content-Disposition: form-data; name=\"task_json\"\r\n\r\n");
    body.extend_from_slice(task_json.as_bytes());
    body.extend_from_slice(b"\r\n");

    for (i, (filename, content_type, bytes)) in media.iter().enumerate() {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"media{}\"; filename=\"{}\"\r\n",
                i, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn submit_request(uid: &str, task_json: &str, media: &[(&str, &str, &[u8])]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/leakage/detect_leak")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(uid, task_json, media)))
        .unwrap()
}

fn json_request(method: &str, uri: &str, payload: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Test helper: extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

async fn submit(app: &axum::Router, uid: &str, task_json: &str, media: &[(&str, &str, &[u8])]) -> String {
    let response = app
        .clone()
        .oneshot(submit_request(uid, task_json, media))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "queued");
    body["jobId"].as_str().expect("jobId present").to_string()
}

async fn poll(app: &axum::Router, job_id: &str) -> Value {
    let response = app
        .clone()
        .oneshot(get_request(&format!("/leakage/detect_leak/{}", job_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    extract_json(response.into_body()).await
}

/// Poll until the job reaches a terminal state
async fn poll_until_terminal(app: &axum::Router, job_id: &str) -> Value {
    for _ in 0..200 {
        let body = poll(app, job_id).await;
        let status = body["status"].as_str().unwrap_or_default().to_string();
        if status == "done" || status == "error" {
            return body;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {} never reached a terminal state", job_id);
}

// =============================================================================
// Health endpoints
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _state) = setup_app(Duration::ZERO).await;

    let response = app.clone().oneshot(get_request("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "hea-api");
    assert!(body["version"].is_string());

    let response = app.oneshot(get_request("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "server running");
}

// =============================================================================
// Submit / poll workflow
// =============================================================================

#[tokio::test]
async fn test_submit_returns_queued_and_completes() {
    let (app, _state) = setup_app(Duration::ZERO).await;

    let job_id = submit(
        &app,
        "user-1",
        r#"{"taskID": "T1", "type": "window", "title": "Drafty window"}"#,
        &[],
    )
    .await;

    let body = poll_until_terminal(&app, &job_id).await;
    assert_eq!(body["status"], "done");

    let report = &body["report"];
    assert_eq!(report["taskID"], "T1");
    assert_eq!(report["leakSeverity"], "Moderate");
    let suggestions = report["suggestions"].as_array().unwrap();
    assert!((1..=5).contains(&suggestions.len()));

    // No media was stored, so there is no report photo and no image
    assert!(report["reportPhotoID"].is_null());
    assert!(body["image"].is_null());
}

#[tokio::test]
async fn test_job_ids_are_unique_across_submissions() {
    let (app, _state) = setup_app(Duration::ZERO).await;

    let a = submit(&app, "user-1", r#"{"taskID": "TA"}"#, &[]).await;
    let b = submit(&app, "user-1", r#"{"taskID": "TB"}"#, &[]).await;
    assert_ne!(a, b);

    poll_until_terminal(&app, &a).await;
    poll_until_terminal(&app, &b).await;
}

#[tokio::test]
async fn test_poll_status_is_monotonic() {
    let (app, _state) = setup_app(Duration::from_millis(50)).await;

    let job_id = submit(&app, "user-1", r#"{"taskID": "T1"}"#, &[]).await;

    fn rank(status: &str) -> u8 {
        match status {
            "queued" => 0,
            "processing" => 1,
            "done" | "error" => 2,
            other => panic!("unexpected status {}", other),
        }
    }

    let mut last = 0u8;
    for _ in 0..200 {
        let body = poll(&app, &job_id).await;
        let status = body["status"].as_str().unwrap();
        let current = rank(status);
        assert!(current >= last, "status regressed to {}", status);
        last = current;
        if current == 2 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("job never finished");
}

#[tokio::test]
async fn test_poll_unknown_job_is_404() {
    let (app, _state) = setup_app(Duration::ZERO).await;

    let response = app
        .oneshot(get_request(
            "/leakage/detect_leak/00000000-0000-0000-0000-000000000000",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_submit_without_task_id_is_400() {
    let (app, _state) = setup_app(Duration::ZERO).await;

    let response = app
        .oneshot(submit_request("user-1", r#"{"title": "no id here"}"#, &[]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_stray_enum_values_do_not_fail_submission() {
    let (app, state) = setup_app(Duration::from_secs(30)).await;

    // Delay is long enough that the worker has not touched the row yet
    let _job_id = submit(
        &app,
        "user-1",
        r#"{"taskID": "T1", "type": "skylight", "state": "bogus"}"#,
        &[],
    )
    .await;

    let task = hea_api::db::tasks::get_task(&state.db, "T1")
        .await
        .unwrap()
        .unwrap();
    assert!(task.task_type.is_none());
    assert_eq!(task.state, hea_api::models::TaskState::Draft);
}

#[tokio::test]
async fn test_task_row_deleted_under_worker_surfaces_as_error() {
    let (app, state) = setup_app(Duration::from_millis(200)).await;

    let job_id = submit(&app, "user-1", r#"{"taskID": "T1"}"#, &[]).await;

    // Pull the task row out from under the sleeping worker; the worker
    // must record an error, not silently succeed
    sqlx::query("DELETE FROM leakage_tasks WHERE task_id = 'T1'")
        .execute(&state.db)
        .await
        .unwrap();

    let body = poll_until_terminal(&app, &job_id).await;
    assert_eq!(body["status"], "error");
    assert!(body["error"].as_str().unwrap().contains("missing"));
}

// =============================================================================
// Replacement semantics
// =============================================================================

#[tokio::test]
async fn test_resubmission_replaces_task_and_suggestions() {
    let (app, state) = setup_app(Duration::ZERO).await;

    let first = submit(&app, "user-1", r#"{"taskID": "T1", "title": "First"}"#, &[]).await;
    poll_until_terminal(&app, &first).await;

    let old_suggestions = hea_api::db::tasks::get_suggestions(&state.db, "T1")
        .await
        .unwrap();
    assert!(!old_suggestions.is_empty());

    let second = submit(&app, "user-1", r#"{"taskID": "T1", "title": "Second"}"#, &[]).await;
    poll_until_terminal(&app, &second).await;

    let task = hea_api::db::tasks::get_task(&state.db, "T1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(task.title, "Second");

    // No suggestion inherited from the prior version
    let new_suggestions = hea_api::db::tasks::get_suggestions(&state.db, "T1")
        .await
        .unwrap();
    assert!((1..=5).contains(&new_suggestions.len()));
    for old in &old_suggestions {
        assert!(new_suggestions
            .iter()
            .all(|s| s.suggestion_id != old.suggestion_id));
    }
}

#[tokio::test]
async fn test_resubmission_while_job_in_flight_is_409() {
    let (app, _state) = setup_app(Duration::from_secs(30)).await;

    let _job_id = submit(&app, "user-1", r#"{"taskID": "T1", "title": "First"}"#, &[]).await;

    let response = app
        .oneshot(submit_request(
            "user-1",
            r#"{"taskID": "T1", "title": "Second"}"#,
            &[],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "CONFLICT");
}

// =============================================================================
// Media handling
// =============================================================================

#[tokio::test]
async fn test_report_photo_prefers_first_rgb_upload() {
    let (app, _state) = setup_app(Duration::ZERO).await;

    let rgb_bytes: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3];
    let thermal_bytes: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 9, 9];

    let job_id = submit(
        &app,
        "user-1",
        r#"{"taskID": "T1", "type": "window"}"#,
        &[
            ("room_thermal.png", "image/png", thermal_bytes),
            ("window.jpg", "image/jpeg", rgb_bytes),
        ],
    )
    .await;

    let body = poll_until_terminal(&app, &job_id).await;
    assert_eq!(body["status"], "done");

    // The cover photo is the first rgb reference, not the thermal one
    let report_photo = body["report"]["reportPhotoID"].as_str().unwrap();
    let image = &body["image"];
    assert_eq!(image["mediaId"].as_str().unwrap(), report_photo);
    assert_eq!(image["contentType"], "image/jpeg");

    let decoded = general_purpose::STANDARD
        .decode(image["data"].as_str().unwrap())
        .unwrap();
    assert_eq!(decoded, rgb_bytes);

    // The blob is also retrievable directly
    let response = app
        .oneshot(get_request(&format!("/media/{}", report_photo)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], rgb_bytes);
}

#[tokio::test]
async fn test_thermal_only_upload_becomes_report_photo() {
    let (app, _state) = setup_app(Duration::ZERO).await;

    let thermal_bytes: &[u8] = &[1, 2, 3];
    let job_id = submit(
        &app,
        "user-1",
        r#"{"taskID": "T1"}"#,
        &[("wall_thermal.png", "image/png", thermal_bytes)],
    )
    .await;

    let body = poll_until_terminal(&app, &job_id).await;
    assert_eq!(body["status"], "done");
    assert!(body["report"]["reportPhotoID"].is_string());
    assert_eq!(body["image"]["contentType"], "image/png");
}

#[tokio::test]
async fn test_vanished_report_photo_fails_poll() {
    let (app, state) = setup_app(Duration::ZERO).await;

    let job_id = submit(
        &app,
        "user-1",
        r#"{"taskID": "T1"}"#,
        &[("window.jpg", "image/jpeg", &[1, 2, 3])],
    )
    .await;

    let body = poll_until_terminal(&app, &job_id).await;
    assert_eq!(body["status"], "done");

    // The referenced photo disappearing from the media store is a fatal
    // error for the poll, not a silent omission
    sqlx::query("DELETE FROM media")
        .execute(&state.db)
        .await
        .unwrap();

    let response = app
        .oneshot(get_request(&format!("/leakage/detect_leak/{}", job_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
}

#[tokio::test]
async fn test_media_unknown_id_is_404() {
    let (app, _state) = setup_app(Duration::ZERO).await;

    let response = app.oneshot(get_request("/media/no-such-id")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Login
// =============================================================================

#[tokio::test]
async fn test_login_creates_then_recognizes_user() {
    let (app, state) = setup_app(Duration::ZERO).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            json!({ "id_token": GOOD_TOKEN, "uid": "user-1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["action"], "created");
    assert_eq!(body["user_id"], "user-1");

    let profile = hea_api::db::users::get_user(&state.db, "user-1")
        .await
        .unwrap()
        .unwrap();

    let response = app
        .oneshot(json_request(
            "POST",
            "/auth/login",
            json!({ "id_token": GOOD_TOKEN, "uid": "user-1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["action"], "exists");

    // A second login does not touch the timestamps
    let unchanged = hea_api::db::users::get_user(&state.db, "user-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unchanged.created_at, profile.created_at);
    assert_eq!(unchanged.updated_at, profile.updated_at);
}

#[tokio::test]
async fn test_login_with_bad_token_is_401() {
    let (app, _state) = setup_app(Duration::ZERO).await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/auth/login",
            json!({ "id_token": "forged", "uid": "user-1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

// =============================================================================
// Profile updates
// =============================================================================

#[tokio::test]
async fn test_profile_partial_update() {
    let (app, state) = setup_app(Duration::ZERO).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            json!({ "id_token": GOOD_TOKEN, "uid": "user-1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/update_profile",
            json!({ "userID": "user-1", "electricCompany": "Duquesne Light" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let after_first = hea_api::db::users::get_user(&state.db, "user-1")
        .await
        .unwrap()
        .unwrap();

    let response = app
        .oneshot(json_request(
            "POST",
            "/auth/update_profile",
            json!({ "userID": "user-1", "zip": "15213" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "profile updated");
    assert_eq!(body["userID"], "user-1");

    // zip applied, energy company untouched, timestamp advanced
    let profile = hea_api::db::users::get_user(&state.db, "user-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(profile.zip_code.as_deref(), Some("15213"));
    assert_eq!(profile.energy_company.as_deref(), Some("Duquesne Light"));
    assert!(profile.updated_at >= after_first.updated_at);
}

#[tokio::test]
async fn test_profile_update_unknown_user_is_404() {
    let (app, _state) = setup_app(Duration::ZERO).await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/auth/update_profile",
            json!({ "userID": "ghost", "zip": "15213" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
