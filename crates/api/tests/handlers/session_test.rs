use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use crate::test_utils::TestContext;

#[tokio::test]
async fn test_anonymous_session() {
    let ctx = TestContext::new().await;

    let body: Value = ctx.server.get("/session").await.json();
    assert_eq!(body["volunteer"], Value::Null);
    assert_eq!(body["view"], "Participant");
    assert_eq!(body["mode"], "connected");
    assert_eq!(body["allowed"], json!([]));
}

#[tokio::test]
async fn test_login_lands_on_attendance() {
    let ctx = TestContext::new().await;

    let response = ctx
        .server
        .post("/session/login")
        .json(&json!({ "volunteerId": "v1", "password": "sewa-101" }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["volunteer"]["id"], "v1");
    assert_eq!(body["view"], "Attendance");
    // Passwords never leave the server.
    assert_eq!(body["volunteer"].get("password"), None);
}

#[tokio::test]
async fn test_restricted_volunteer_lands_on_points() {
    let ctx = TestContext::new().await;
    ctx.login_gurpreet().await;

    let body: Value = ctx.server.get("/session").await.json();
    assert_eq!(body["view"], "Points");
    assert_eq!(body["allowed"], json!(["AwardScore", "DeleteScore"]));
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let ctx = TestContext::new().await;

    let response = ctx
        .server
        .post("/session/login")
        .json(&json!({ "volunteerId": "v1", "password": "wrong" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let body: Value = ctx.server.get("/session").await.json();
    assert_eq!(body["volunteer"], Value::Null);
}

#[tokio::test]
async fn test_logout_resets_view() {
    let ctx = TestContext::new().await;
    ctx.login_admin().await;

    ctx.server
        .put("/session/view")
        .json(&json!({ "view": "Dashboard" }))
        .await
        .assert_status_ok();

    let body: Value = ctx.server.post("/session/logout").await.json();
    assert_eq!(body["volunteer"], Value::Null);
    assert_eq!(body["view"], "Participant");
}

#[tokio::test]
async fn test_restricted_volunteer_cannot_open_dashboard_view() {
    let ctx = TestContext::new().await;
    ctx.login_gurpreet().await;

    ctx.server
        .put("/session/view")
        .json(&json!({ "view": "Dashboard" }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let body: Value = ctx.server.get("/session").await.json();
    assert_eq!(body["view"], "Points");
}
