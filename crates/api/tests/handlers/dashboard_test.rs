use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use crate::test_utils::{TODAY, TestContext};

#[tokio::test]
async fn test_dashboard_summarizes_today() {
    let ctx = TestContext::new().await;
    ctx.login_harjeet().await;

    ctx.server
        .post("/attendance/G-MON-01/toggle")
        .await
        .assert_status_ok();
    ctx.server
        .post("/scores")
        .json(&json!({ "sewadarId": "G-MON-01", "game": "Chess" }))
        .await
        .assert_status(StatusCode::CREATED);

    let body: Value = ctx.server.get("/dashboard").await.json();
    assert_eq!(body["date"], TODAY);
    assert_eq!(body["present"], 1);
    assert_eq!(body["rosterSize"], 20);
    assert_eq!(body["leaderboard"][0]["group"], "Monday");
    assert_eq!(body["leaderboard"][0]["points"], 105);
    assert_eq!(body["standings"][0]["breakdown"]["Chess"], 5);
}

#[tokio::test]
async fn test_dashboard_forbidden_for_restricted_volunteer() {
    let ctx = TestContext::new().await;
    ctx.login_gurpreet().await;

    ctx.server
        .get("/dashboard")
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_repair_and_fix_need_super_admin() {
    let ctx = TestContext::new().await;
    ctx.login_harjeet().await;

    ctx.server
        .post("/dashboard/fix-points")
        .await
        .assert_status(StatusCode::FORBIDDEN);
    ctx.server
        .post("/dashboard/repair-attendance")
        .await
        .assert_status(StatusCode::FORBIDDEN);

    ctx.login_admin().await;
    let fixed: Value = ctx.server.post("/dashboard/fix-points").await.json();
    assert_eq!(fixed, json!({ "corrected": 0 }));

    let repaired: Value = ctx.server.post("/dashboard/repair-attendance").await.json();
    assert_eq!(repaired, json!({ "created": [], "removed": 0 }));
}
