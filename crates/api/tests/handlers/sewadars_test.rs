use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use crate::test_utils::TestContext;

#[tokio::test]
async fn test_list_hides_placeholder_rows() {
    let ctx = TestContext::new().await;

    let body: Value = ctx.server.get("/sewadars").await.json();
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(names.len(), 20);
    assert!(!names.contains(&"Test Sewadar"));
    assert!(!names.contains(&"Dummy Entry"));
}

#[tokio::test]
async fn test_add_sewadar_registers_and_marks_present() {
    let ctx = TestContext::new().await;
    ctx.login_harjeet().await;

    let response = ctx
        .server
        .post("/sewadars")
        .json(&json!({ "name": "  Jaspreet Kaur ", "gender": "Ladies", "group": "Ladies" }))
        .await;
    response.assert_status(StatusCode::CREATED);

    let body: Value = response.json();
    let id = body["sewadar"]["id"].as_str().unwrap();
    assert!(id.starts_with("L-Added-"));
    assert_eq!(body["sewadar"]["name"], "Jaspreet Kaur");
    assert_eq!(body["attendance"]["status"], "marked");

    let snapshot = ctx.state.engine.snapshot().await;
    assert!(snapshot.sewadars.iter().any(|s| s.id == id));
    assert_eq!(snapshot.attendance.len(), 1);
}

#[tokio::test]
async fn test_add_sewadar_rejects_mismatched_group() {
    let ctx = TestContext::new().await;
    ctx.login_harjeet().await;

    ctx.server
        .post("/sewadars")
        .json(&json!({ "name": "Kirpal Singh", "gender": "Gents", "group": "Ladies" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_resync_is_super_admin_only() {
    let ctx = TestContext::new().await;
    ctx.login_harjeet().await;
    ctx.server
        .post("/sewadars/resync")
        .await
        .assert_status(StatusCode::FORBIDDEN);

    ctx.login_admin().await;
    let body: Value = ctx.server.post("/sewadars/resync").await.json();
    assert_eq!(body.as_array().unwrap().len(), 20);
}
