//! HTTP API tests driving the router in-process

mod common;

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio_test::assert_ok;
use tower::ServiceExt;

use coderoom::{
    config::JwtConfig, handlers, models::Principal, services::IdentityService, state::AppState,
};

struct TestApp {
    app: Router,
    state: AppState,
    _staging: TempDir,
}

impl TestApp {
    fn new() -> Self {
        let staging = tempfile::tempdir().unwrap();
        let state = common::app_state(
            Arc::new(common::EchoBackend),
            common::test_config(staging.path()),
        );
        Self {
            app: handlers::app(state.clone()),
            state,
            _staging: staging,
        }
    }

    async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = assert_ok!(self.app.clone().oneshot(request).await);
        let status = response.status();
        let bytes = assert_ok!(to_bytes(response.into_body(), usize::MAX).await);
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    /// Room created by `owner` with a single "hi" round
    async fn create_room(&self, owner: &str, capacity: usize) -> String {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/v1/rooms",
                Some(owner),
                Some(json!({
                    "title": "Lunch duel",
                    "capacity": capacity,
                    "problems": [{ "title": "Say hi", "expected_output": "hi" }]
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["id"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn test_health_and_runtimes_are_public() {
    let app = TestApp::new();

    let (status, body) = app.call(Method::GET, "/api/v1/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sandbox"], "up");

    let (status, body) = app.call(Method::GET, "/api/v1/runtimes", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let languages: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["language"].as_str().unwrap())
        .collect();
    assert_eq!(languages, vec!["cpp", "java", "javascript", "python", "rust"]);
}

#[tokio::test]
async fn test_room_routes_require_a_valid_token() {
    let app = TestApp::new();

    let (status, body) = app.call(Method::GET, "/api/v1/rooms", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let (status, body) = app
        .call(Method::GET, "/api/v1/rooms", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_TOKEN");

    let stale = IdentityService::new(&JwtConfig {
        secret: "integration-secret".to_string(),
        expiry_hours: -1,
    });
    let (expired, _) = stale
        .issue_token(&Principal::new(uuid::Uuid::new_v4(), "late"))
        .unwrap();
    let (status, body) = app
        .call(Method::GET, "/api/v1/rooms", Some(&expired), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "TOKEN_EXPIRED");
}

#[tokio::test]
async fn test_full_round_over_http() {
    let app = TestApp::new();
    let (_, owner) = common::user(&app.state, "owner");
    let (u1, t1) = common::user(&app.state, "u1");
    let (_, t2) = common::user(&app.state, "u2");
    let room = app.create_room(&owner, 4).await;

    for token in [&t1, &t2] {
        let (status, _) = app
            .call(Method::POST, &format!("/api/v1/rooms/{}/join", room), Some(token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    // u2 not ready yet
    app.call(Method::POST, &format!("/api/v1/rooms/{}/ready", room), Some(&t1), None)
        .await;
    let (status, body) = app
        .call(Method::POST, &format!("/api/v1/rooms/{}/start", room), Some(&owner), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "NOT_ALL_READY");

    app.call(Method::POST, &format!("/api/v1/rooms/{}/ready", room), Some(&t2), None)
        .await;
    let (status, body) = app
        .call(Method::POST, &format!("/api/v1/rooms/{}/start", room), Some(&owner), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "IN_PROGRESS");
    assert!(body["current_problem"].get("expected_output").is_none());

    let (status, body) = app
        .call(
            Method::POST,
            &format!("/api/v1/rooms/{}/submissions", room),
            Some(&t1),
            Some(json!({ "language": "python", "source_code": "print(\"hi\")" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["verdict"]["kind"], "ACCEPTED");
    assert_eq!(body["verdict"]["score"], 100);
    assert_eq!(body["result"]["classification"], "SUCCESS");
    let submission_id = body["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .call(
            Method::POST,
            &format!("/api/v1/rooms/{}/submissions", room),
            Some(&t2),
            Some(json!({
                "language": "java",
                "source_code": "public class Main { public static void main(String[] a) { System.out.println(\"hi\") } }"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["verdict"]["kind"], "COMPILE_ERROR");
    assert_eq!(body["verdict"]["score"], 0);

    let (_, body) = app
        .call(Method::GET, &format!("/api/v1/rooms/{}/standings", room), Some(&t1), None)
        .await;
    assert_eq!(body["status"], "FINISHED");
    assert_eq!(body["standings"][0]["user"]["id"], u1.id.to_string());
    assert_eq!(body["standings"][0]["total_score"], 100);

    let (_, body) = app
        .call(Method::GET, &format!("/api/v1/rooms/{}/scores?round=0", room), Some(&t1), None)
        .await;
    assert_eq!(body["scores"].as_array().unwrap().len(), 2);

    let (status, body) = app
        .call(Method::GET, "/api/v1/users/me/submissions", Some(&t1), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);

    let (status, _) = app
        .call(Method::GET, &format!("/api/v1/submissions/{}", submission_id), Some(&t1), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app
        .call(Method::GET, &format!("/api/v1/submissions/{}", submission_id), Some(&t2), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_join_conflicts_and_validation() {
    let app = TestApp::new();
    let (_, owner) = common::user(&app.state, "owner");
    let room = app.create_room(&owner, 2).await;

    let (_, t1) = common::user(&app.state, "u1");
    let (_, t2) = common::user(&app.state, "u2");
    let (_, t3) = common::user(&app.state, "u3");
    let join = format!("/api/v1/rooms/{}/join", room);

    assert_eq!(app.call(Method::POST, &join, Some(&t1), None).await.0, StatusCode::OK);
    let (status, body) = app.call(Method::POST, &join, Some(&t1), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "ALREADY_JOINED");

    assert_eq!(app.call(Method::POST, &join, Some(&t2), None).await.0, StatusCode::OK);
    let (status, body) = app.call(Method::POST, &join, Some(&t3), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "ROOM_FULL");

    let (status, body) = app
        .call(
            Method::POST,
            "/api/v1/rooms",
            Some(&owner),
            Some(json!({ "title": "", "problems": [] })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let missing = format!("/api/v1/rooms/{}", uuid::Uuid::new_v4());
    let (status, body) = app.call(Method::GET, &missing, Some(&t1), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "ROOM_NOT_FOUND");
}

#[tokio::test]
async fn test_submission_rejections() {
    let app = TestApp::new();
    let (_, owner) = common::user(&app.state, "owner");
    let (_, t1) = common::user(&app.state, "u1");
    let room = app.create_room(&owner, 4).await;
    app.call(Method::POST, &format!("/api/v1/rooms/{}/join", room), Some(&t1), None)
        .await;
    let submit = format!("/api/v1/rooms/{}/submissions", room);

    let (status, body) = app
        .call(
            Method::POST,
            &submit,
            Some(&t1),
            Some(json!({ "language": "cobol", "source_code": "DISPLAY 'hi'." })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "UNSUPPORTED_LANGUAGE");

    let oversized = "#".repeat(70 * 1024);
    let (status, body) = app
        .call(
            Method::POST,
            &submit,
            Some(&t1),
            Some(json!({ "language": "python", "source_code": oversized })),
        )
        .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["error"]["code"], "PAYLOAD_TOO_LARGE");

    let (status, body) = app
        .call(
            Method::POST,
            &submit,
            Some(&t1),
            Some(json!({ "language": "python", "source_code": "print(\"hi\")" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "INVALID_ROOM_STATE");
}

#[tokio::test]
async fn test_owner_manages_room() {
    let app = TestApp::new();
    let (_, owner) = common::user(&app.state, "owner");
    let (_, other) = common::user(&app.state, "other");
    let room = app.create_room(&owner, 4).await;
    let path = format!("/api/v1/rooms/{}", room);

    let (status, _) = app
        .call(Method::PUT, &path, Some(&other), Some(json!({ "title": "Hijacked" })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .call(Method::PUT, &path, Some(&owner), Some(json!({ "title": "Evening duel", "capacity": 8 })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Evening duel");
    assert_eq!(body["capacity"], 8);

    let (status, body) = app.call(Method::GET, "/api/v1/rooms", Some(&other), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);

    let (status, _) = app.call(Method::DELETE, &path, Some(&owner), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.call(Method::GET, &path, Some(&owner), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
