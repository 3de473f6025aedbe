use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use sewa_db::models::{AttendanceRow, ScoreRow, SewadarRow};
use sewa_db::{ChangeEvent, RowChange, Table};
use sewa_sync::AttendanceOutcome;

use crate::test_utils::*;

fn attendance_row(sewadar_id: &str) -> AttendanceRow {
    AttendanceRow {
        sewadar_id: sewadar_id.to_string(),
        name: "Baldev Singh".to_string(),
        date: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
        timestamp: at(NINE_AM).timestamp_millis(),
        volunteer_id: "v2".to_string(),
    }
}

fn score_row(id: &str, is_deleted: bool) -> ScoreRow {
    ScoreRow {
        id: id.to_string(),
        sewadar_id: "G-MON-02".to_string(),
        name: "Baldev Singh".to_string(),
        game: "Volleyball".to_string(),
        points: 5,
        timestamp: at(NINE_AM).timestamp_millis(),
        volunteer_id: "v2".to_string(),
        is_deleted,
    }
}

fn score_event(change: RowChange<ScoreRow>) -> ChangeEvent {
    ChangeEvent::Score {
        table: Table::Scores,
        change,
    }
}

#[tokio::test]
async fn test_duplicate_insert_is_ignored() {
    let ctx = TestContext::new().await;
    let event = ChangeEvent::Attendance {
        table: Table::Attendance,
        change: RowChange::Insert(attendance_row("G-MON-02")),
    };

    assert!(ctx.engine.apply_change(event.clone()).await);
    assert!(!ctx.engine.apply_change(event).await);
    assert_eq!(ctx.engine.snapshot().await.attendance.len(), 1);
}

#[tokio::test]
async fn test_update_before_insert_converges() {
    let ctx = TestContext::new().await;

    // The soft delete arrives before the row it deletes.
    ctx.engine
        .apply_change(score_event(RowChange::Update {
            new: score_row("man-7", true),
            old: None,
        }))
        .await;
    ctx.engine
        .apply_change(score_event(RowChange::Insert(score_row("man-7", false))))
        .await;

    let scores = ctx.engine.snapshot().await.scores;
    assert_eq!(scores.len(), 1);
    assert!(scores[0].is_deleted);
}

#[tokio::test]
async fn test_score_update_only_moves_the_delete_flag() {
    let ctx = TestContext::new().await;
    ctx.engine
        .apply_change(score_event(RowChange::Insert(score_row("man-8", false))))
        .await;

    let mut changed = score_row("man-8", true);
    changed.points = 500;
    changed.game = "Cricket".to_string();
    ctx.engine
        .apply_change(score_event(RowChange::Update {
            new: changed,
            old: Some(score_row("man-8", false)),
        }))
        .await;

    let score = ctx.engine.snapshot().await.scores.remove(0);
    assert!(score.is_deleted);
    assert_eq!(score.points, 5);
    assert_eq!(score.game, "Volleyball");
}

#[tokio::test]
async fn test_deletes_remove_by_natural_key() {
    let ctx = TestContext::new().await;
    ctx.engine
        .apply_change(ChangeEvent::Attendance {
            table: Table::Attendance,
            change: RowChange::Insert(attendance_row("G-MON-02")),
        })
        .await;
    ctx.engine
        .apply_change(score_event(RowChange::Insert(score_row("man-9", false))))
        .await;

    ctx.engine
        .apply_change(ChangeEvent::Attendance {
            table: Table::Attendance,
            change: RowChange::Delete(attendance_row("G-MON-02")),
        })
        .await;
    ctx.engine
        .apply_change(score_event(RowChange::Delete(score_row("man-9", false))))
        .await;
    ctx.engine
        .apply_change(ChangeEvent::Sewadar {
            table: Table::Sewadars,
            change: RowChange::Delete(SewadarRow {
                id: "G-MON-02".to_string(),
                name: "Baldev Singh".to_string(),
                gender: "Gents".to_string(),
                group: "Monday".to_string(),
            }),
        })
        .await;

    let snapshot = ctx.engine.snapshot().await;
    assert!(snapshot.attendance.is_empty());
    assert!(snapshot.scores.is_empty());
    assert!(!snapshot.sewadars.iter().any(|s| s.id == "G-MON-02"));

    // Deleting again changes nothing.
    assert!(
        !ctx.engine
            .apply_change(score_event(RowChange::Delete(score_row("man-9", false))))
            .await
    );
}

#[tokio::test]
async fn test_placeholder_and_attendance_updates_are_ignored() {
    let ctx = TestContext::new().await;
    let mut placeholder = score_row("man-10", false);
    placeholder.name = "Dummy Entry".to_string();

    assert!(
        !ctx.engine
            .apply_change(score_event(RowChange::Insert(placeholder)))
            .await
    );
    assert!(
        !ctx.engine
            .apply_change(ChangeEvent::Attendance {
                table: Table::Attendance,
                change: RowChange::Update {
                    new: attendance_row("G-MON-02"),
                    old: None,
                },
            })
            .await
    );
    let snapshot = ctx.engine.snapshot().await;
    assert!(snapshot.scores.is_empty());
    assert!(snapshot.attendance.is_empty());
}

#[tokio::test]
async fn test_sewadar_update_replaces_row() {
    let ctx = TestContext::new().await;
    ctx.engine
        .apply_change(ChangeEvent::Sewadar {
            table: Table::Sewadars,
            change: RowChange::Update {
                new: SewadarRow {
                    id: "G-MON-02".to_string(),
                    name: "Baldev Singh Ji".to_string(),
                    gender: "Gents".to_string(),
                    group: "Tuesday".to_string(),
                },
                old: None,
            },
        })
        .await;

    let snapshot = ctx.engine.snapshot().await;
    let sewadar = snapshot.sewadars.iter().find(|s| s.id == "G-MON-02").unwrap();
    assert_eq!(sewadar.name, "Baldev Singh Ji");
    assert_eq!(sewadar.group.to_string(), "Tuesday");
}

#[test_log::test(tokio::test)]
async fn test_listener_delivers_other_clients_writes() {
    let ctx = TestContext::new().await;
    let other = ctx.second_client().await;
    let _listener = other.spawn_listener().unwrap();

    let outcome = ctx
        .engine
        .toggle_attendance(Some(&harjeet()), "G-THU-01")
        .await
        .unwrap();
    let AttendanceOutcome::Marked { score, .. } = outcome else {
        panic!("expected a mark");
    };

    wait_until(other.store(), |e| {
        e.attendance_for("G-THU-01", at(NINE_AM).date_naive()).is_some() && e.score(&score.id).is_some()
    })
    .await;

    let deleted = ctx
        .engine
        .award_score(Some(&harjeet()), "G-THU-01", "Chess", 5)
        .await
        .unwrap();
    ctx.engine.delete_score(Some(&harjeet()), &deleted.id).await.unwrap();

    wait_until(other.store(), |e| {
        e.score(&deleted.id).is_some_and(|s| s.is_deleted)
    })
    .await;
}

#[test_log::test(tokio::test)]
async fn test_listener_recovers_from_feed_restart() {
    let ctx = TestContext::new().await;
    let other = ctx.second_client().await;
    let _listener = other.spawn_listener().unwrap();
    let today = at(NINE_AM).date_naive();

    // Marked while `other` has no live feed; only a fresh fetch carries it over.
    ctx.remote.restart_feed();
    ctx.engine
        .toggle_attendance(Some(&harjeet()), "G-THU-01")
        .await
        .unwrap();
    wait_until(other.store(), |e| e.attendance_for("G-THU-01", today).is_some()).await;

    // Delivered over the new subscription.
    ctx.engine
        .toggle_attendance(Some(&harjeet()), "G-THU-02")
        .await
        .unwrap();
    wait_until(other.store(), |e| e.attendance_for("G-THU-02", today).is_some()).await;
}

#[tokio::test]
async fn test_own_notifications_are_no_ops() {
    let ctx = TestContext::new().await;
    let _listener = ctx.engine.spawn_listener().unwrap();

    ctx.engine
        .toggle_attendance(Some(&harjeet()), "G-THU-02")
        .await
        .unwrap();
    ctx.engine
        .award_score(Some(&harjeet()), "G-THU-02", "Ludo", 5)
        .await
        .unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    let snapshot = ctx.engine.snapshot().await;
    assert_eq!(snapshot.attendance.len(), 1);
    assert_eq!(snapshot.scores.len(), 2);
}
