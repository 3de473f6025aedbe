use std::time::Duration;

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use sewa_sync::Confirmation;

use crate::test_utils::TestContext;

async fn award(ctx: &TestContext, sewadar_id: &str, game: &str) -> Value {
    let response = ctx
        .server
        .post("/scores")
        .json(&json!({ "sewadarId": sewadar_id, "game": game }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json()
}

#[tokio::test]
async fn test_award_defaults_to_five_points() {
    let ctx = TestContext::new().await;
    ctx.login_gurpreet().await;
    ctx.mark_present(&["G-TUE-01"]).await;

    let score = award(&ctx, "G-TUE-01", "Carrom Board").await;
    assert_eq!(score["points"], 5);
    assert_eq!(score["volunteerId"], "v3");
    assert_eq!(score["isDeleted"], false);

    let listed: Value = ctx
        .server
        .get("/scores")
        .add_query_param("sewadarId", "G-TUE-01")
        .await
        .json();
    let games: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["game"].as_str().unwrap())
        .collect();
    assert_eq!(games, vec!["Daily Attendance", "Carrom Board"]);
}

#[tokio::test]
async fn test_sixth_award_conflicts() {
    let ctx = TestContext::new().await;
    ctx.login_harjeet().await;
    ctx.mark_present(&["G-MON-01"]).await;

    for _ in 0..5 {
        award(&ctx, "G-MON-01", "Chess").await;
    }

    let response = ctx
        .server
        .post("/scores")
        .json(&json!({ "sewadarId": "G-MON-01", "game": "Chess" }))
        .await;
    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("Limit reached"));
}

#[tokio::test]
async fn test_daily_attendance_is_not_a_game() {
    let ctx = TestContext::new().await;
    ctx.login_harjeet().await;

    ctx.server
        .post("/scores")
        .json(&json!({ "sewadarId": "G-MON-01", "game": "Daily Attendance", "points": 100 }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_absent_sewadar_is_rejected() {
    let ctx = TestContext::new().await;
    ctx.login_harjeet().await;

    let response = ctx
        .server
        .post("/scores")
        .json(&json!({ "sewadarId": "G-MON-01", "game": "Chess" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("not marked present"));
}

#[tokio::test]
async fn test_delete_needs_second_tap() {
    let ctx = TestContext::new().await;
    ctx.login_harjeet().await;
    ctx.mark_present(&["G-MON-01"]).await;
    let score = award(&ctx, "G-MON-01", "Ludo").await;
    let path = format!("/scores/{}", score["id"].as_str().unwrap());

    let first = ctx.server.delete(&path).await;
    first.assert_status(StatusCode::ACCEPTED);
    assert!(ctx.state.engine.snapshot().await.scores.iter().all(|s| !s.is_deleted));

    let second = ctx.server.delete(&path).await;
    second.assert_status_ok();
    let deleted: Value = second.json();
    assert_eq!(deleted["isDeleted"], true);

    // Only the attendance points stay live.
    let live: Value = ctx.server.get("/scores").await.json();
    assert_eq!(live.as_array().unwrap().len(), 1);
    assert_eq!(live[0]["game"], "Daily Attendance");

    let all: Value = ctx
        .server
        .get("/scores")
        .add_query_param("includeDeleted", "true")
        .await
        .json();
    assert_eq!(all.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_expired_tap_rearms() {
    let ctx = TestContext::with_confirmation(Confirmation::new(Duration::from_millis(20))).await;
    ctx.login_harjeet().await;
    ctx.mark_present(&["G-MON-01"]).await;
    let score = award(&ctx, "G-MON-01", "Ludo").await;
    let path = format!("/scores/{}", score["id"].as_str().unwrap());

    ctx.server.delete(&path).await.assert_status(StatusCode::ACCEPTED);
    tokio::time::sleep(Duration::from_millis(50)).await;
    ctx.server.delete(&path).await.assert_status(StatusCode::ACCEPTED);
}

#[tokio::test]
async fn test_tapping_another_score_replaces_pending() {
    let ctx = TestContext::new().await;
    ctx.login_harjeet().await;
    ctx.mark_present(&["G-MON-01"]).await;
    let first = award(&ctx, "G-MON-01", "Ludo").await;
    let second = award(&ctx, "G-MON-01", "Tambola").await;
    let first_path = format!("/scores/{}", first["id"].as_str().unwrap());
    let second_path = format!("/scores/{}", second["id"].as_str().unwrap());

    ctx.server.delete(&first_path).await.assert_status(StatusCode::ACCEPTED);
    ctx.server.delete(&second_path).await.assert_status(StatusCode::ACCEPTED);
    ctx.server.delete(&first_path).await.assert_status(StatusCode::ACCEPTED);
}

#[tokio::test]
async fn test_delete_unknown_score_is_not_found() {
    let ctx = TestContext::new().await;
    ctx.login_harjeet().await;

    ctx.server
        .delete("/scores/man-1-nope")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_anonymous_delete_is_forbidden() {
    let ctx = TestContext::new().await;

    ctx.server
        .delete("/scores/man-1-nope")
        .await
        .assert_status(StatusCode::FORBIDDEN);
}
