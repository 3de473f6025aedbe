use pretty_assertions::assert_eq;
use sewa_core::aggregate::{game_total, sewadar_total};
use sewa_core::errors::SewaError;
use sewa_core::models::{DAILY_ATTENDANCE, GAME_SCORE_CAP};
use sewa_db::models::ScoreRow;
use sewa_db::{MemoryStore, RemoteStore, Table};
use std::sync::Arc;

use crate::test_utils::*;

#[tokio::test]
async fn test_sixth_award_is_rejected() {
    let ctx = TestContext::new().await;
    let actor = harjeet();
    ctx.engine.toggle_attendance(Some(&actor), "G-FRI-01").await.unwrap();

    for points in [5, 5, 10, 5, 5] {
        ctx.engine
            .award_score(Some(&actor), "G-FRI-01", "Chess", points)
            .await
            .unwrap();
    }

    let err = ctx
        .engine
        .award_score(Some(&actor), "G-FRI-01", "Chess", 5)
        .await
        .unwrap_err();
    assert!(matches!(err, SewaError::Capacity(_)));

    let scores = ctx.engine.snapshot().await.scores;
    let chess: Vec<_> = scores.iter().filter(|s| s.game == "Chess").collect();
    assert_eq!(chess.len(), GAME_SCORE_CAP);
    assert!(chess.iter().all(|s| s.id.starts_with("man-") && !s.is_deleted));
    assert_eq!(game_total(&scores, "G-FRI-01", "Chess"), 30);
    // Plus the attendance points.
    assert_eq!(
        ctx.remote.select_scores(Table::Scores).await.unwrap().len(),
        GAME_SCORE_CAP + 1
    );

    // Other games have their own cap.
    ctx.engine
        .award_score(Some(&actor), "G-FRI-01", "Ludo", 5)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_soft_delete_frees_a_slot() {
    let ctx = TestContext::new().await;
    let actor = harjeet();
    ctx.engine.toggle_attendance(Some(&actor), "G-FRI-01").await.unwrap();

    let mut awarded = Vec::new();
    for points in [5, 5, 5, 5, 7] {
        awarded.push(
            ctx.engine
                .award_score(Some(&actor), "G-FRI-01", "Chess", points)
                .await
                .unwrap(),
        );
    }
    let before = sewadar_total(&ctx.engine.snapshot().await.scores, "G-FRI-01");

    let deleted = ctx
        .engine
        .delete_score(Some(&actor), &awarded[4].id)
        .await
        .unwrap();
    assert!(deleted.is_deleted);

    let scores = ctx.engine.snapshot().await.scores;
    assert_eq!(scores.len(), 6);
    assert!(scores.iter().find(|s| s.id == deleted.id).unwrap().is_deleted);
    assert_eq!(sewadar_total(&scores, "G-FRI-01"), before - 7);

    let remote = ctx.remote.select_scores(Table::Scores).await.unwrap();
    assert_eq!(remote.len(), 6);
    assert!(remote.iter().find(|r| r.id == deleted.id).unwrap().is_deleted);

    ctx.engine
        .award_score(Some(&actor), "G-FRI-01", "Chess", 5)
        .await
        .unwrap();
    let scores = ctx.engine.snapshot().await.scores;
    assert_eq!(scores.len(), 7);
    assert_eq!(
        scores.iter().filter(|s| s.is_live() && s.game == "Chess").count(),
        GAME_SCORE_CAP
    );
}

#[tokio::test]
async fn test_daily_attendance_is_not_a_manual_game() {
    let ctx = TestContext::new().await;
    let actor = harjeet();

    let err = ctx
        .engine
        .award_score(Some(&actor), "G-MON-01", DAILY_ATTENDANCE, 100)
        .await
        .unwrap_err();
    assert!(matches!(err, SewaError::Validation(_)));

    for (game, points) in [("", 5), ("Chess", 0), ("Chess", -5)] {
        let err = ctx
            .engine
            .award_score(Some(&actor), "G-MON-01", game, points)
            .await
            .unwrap_err();
        assert!(matches!(err, SewaError::Validation(_)), "{:?}", (game, points));
    }

    assert!(ctx.engine.snapshot().await.scores.is_empty());
}

#[tokio::test]
async fn test_absent_sewadar_gets_no_points() {
    let ctx = TestContext::new().await;
    let actor = harjeet();

    let err = ctx
        .engine
        .award_score(Some(&actor), "G-MON-01", "Chess", 5)
        .await
        .unwrap_err();
    assert!(matches!(err, SewaError::Validation(_)));
    assert!(ctx.engine.snapshot().await.scores.is_empty());
    assert!(ctx.remote.select_scores(Table::Scores).await.unwrap().is_empty());

    // Unmarking takes the sewadar off the points list again.
    ctx.engine.toggle_attendance(Some(&actor), "G-MON-01").await.unwrap();
    ctx.engine
        .award_score(Some(&actor), "G-MON-01", "Chess", 5)
        .await
        .unwrap();
    ctx.engine.toggle_attendance(Some(&actor), "G-MON-01").await.unwrap();
    assert!(matches!(
        ctx.engine.award_score(Some(&actor), "G-MON-01", "Chess", 5).await,
        Err(SewaError::Validation(_))
    ));
}

#[tokio::test]
async fn test_attendance_scores_do_not_count_toward_cap() {
    let ctx = TestContext::new().await;
    let actor = harjeet();

    ctx.engine.toggle_attendance(Some(&actor), "G-MON-01").await.unwrap();
    for _ in 0..GAME_SCORE_CAP {
        ctx.engine
            .award_score(Some(&actor), "G-MON-01", "Tambola", 5)
            .await
            .unwrap();
    }
    assert_eq!(ctx.engine.snapshot().await.scores.len(), GAME_SCORE_CAP + 1);
}

#[tokio::test]
async fn test_restricted_volunteer_awards_and_deletes() {
    let ctx = TestContext::new().await;
    let actor = gurpreet();
    ctx.engine.toggle_attendance(Some(&harjeet()), "L-05").await.unwrap();

    let score = ctx
        .engine
        .award_score(Some(&actor), "L-05", "Ludo", 5)
        .await
        .unwrap();
    assert!(score.id.starts_with("lscore-"));
    assert_eq!(score.volunteer_id, "v3");

    ctx.engine.delete_score(Some(&actor), &score.id).await.unwrap();

    let err = ctx
        .engine
        .award_score(None, "L-05", "Ludo", 5)
        .await
        .unwrap_err();
    assert!(matches!(err, SewaError::Permission(_)));
}

#[tokio::test]
async fn test_deleting_twice_is_a_no_op() {
    let ctx = TestContext::new().await;
    let actor = harjeet();
    ctx.engine.toggle_attendance(Some(&actor), "G-MON-01").await.unwrap();
    let score = ctx
        .engine
        .award_score(Some(&actor), "G-MON-01", "Cricket", 5)
        .await
        .unwrap();

    ctx.engine.delete_score(Some(&actor), &score.id).await.unwrap();
    let revision = ctx.engine.store().revision();
    let again = ctx.engine.delete_score(Some(&actor), &score.id).await.unwrap();

    assert!(again.is_deleted);
    assert_eq!(ctx.engine.store().revision(), revision);
}

#[tokio::test]
async fn test_delete_unknown_score() {
    let ctx = TestContext::new().await;
    let err = ctx
        .engine
        .delete_score(Some(&harjeet()), "man-missing")
        .await
        .unwrap_err();
    assert!(matches!(err, SewaError::NotFound(_)));
}

#[tokio::test]
async fn test_delete_finds_score_in_other_partition() {
    let remote = Arc::new(MemoryStore::new());
    seed_remote(&remote).await;
    // Filed under the ladies table although the sewadar is gents.
    remote
        .insert_score(
            Table::LadiesScores,
            ScoreRow {
                id: "lscore-1".to_string(),
                sewadar_id: "G-SAT-01".to_string(),
                name: "Mohinder Pal".to_string(),
                game: "Carrom Board".to_string(),
                points: 5,
                timestamp: at(NINE_AM).timestamp_millis(),
                volunteer_id: "v2".to_string(),
                is_deleted: false,
            },
        )
        .await
        .unwrap();
    let ctx = TestContext::over(remote).await;

    ctx.engine
        .delete_score(Some(&harjeet()), "lscore-1")
        .await
        .unwrap();

    let rows = ctx.remote.select_scores(Table::LadiesScores).await.unwrap();
    assert!(rows[0].is_deleted);
    assert!(ctx.engine.snapshot().await.scores[0].is_deleted);
}
