use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use pretty_assertions::assert_eq;
use sewa_core::errors::SewaError;
use sewa_core::models::{DAILY_ATTENDANCE, Gender, Group};
use sewa_core::roles::RoleGate;
use sewa_core::roster::seed_roster;
use sewa_core::rules::RewardPolicy;
use sewa_db::mock::MockRemote;
use sewa_db::models::SewadarRow;
use sewa_db::{RemoteStore, StoreError, Table};
use sewa_sync::{AttendanceOutcome, Engine, FixedClock, MemoryCache, SyncMode};
use tokio::sync::broadcast;

use crate::test_utils::*;

/// A mock that bootstraps with the seed roster and no activity.
fn bootstrapped_mock() -> MockRemote {
    let mut remote = MockRemote::new();
    let (events, _) = broadcast::channel(16);

    remote.expect_subscribe().returning(move || events.subscribe());
    remote.expect_select_sewadars().returning(|table| {
        Ok(seed_roster()
            .iter()
            .filter(|s| s.partition() == table.partition())
            .map(SewadarRow::from)
            .collect())
    });
    remote.expect_select_attendance().returning(|_| Ok(Vec::new()));
    remote.expect_select_scores().returning(|_| Ok(Vec::new()));
    remote
}

async fn engine_over(remote: MockRemote) -> Arc<Engine> {
    Engine::connect(
        Some(Arc::new(remote) as Arc<dyn RemoteStore>),
        Arc::new(MemoryCache::new()),
        RoleGate::new(directory()),
        RewardPolicy::default(),
        Arc::new(FixedClock::new(at(NINE_AM))),
    )
    .await
}

fn offline() -> StoreError {
    StoreError::Unavailable("connection refused".to_string())
}

#[tokio::test]
async fn test_unreachable_remote_falls_back_to_local_only() {
    let mut remote = MockRemote::new();
    let (events, _) = broadcast::channel(16);
    remote.expect_subscribe().returning(move || events.subscribe());
    remote
        .expect_select_sewadars()
        .returning(|_| Err(offline()));
    // No write expectations: a local-only engine must never call the remote.

    let engine = engine_over(remote).await;
    assert_eq!(engine.mode(), SyncMode::LocalOnly);

    let registration = engine
        .add_sewadar(Some(&harjeet()), "Kirpal Singh", Gender::Gents, Group::Sunday)
        .await
        .unwrap();
    assert!(matches!(registration.attendance, AttendanceOutcome::Marked { .. }));
    assert_eq!(engine.snapshot().await.attendance.len(), 1);
}

#[tokio::test]
async fn test_failed_write_leaves_store_untouched() {
    let mut remote = bootstrapped_mock();
    remote.expect_insert_attendance().returning(|_, _| Ok(()));
    remote.expect_insert_score().returning(|_, _| Err(offline()));
    let engine = engine_over(remote).await;
    assert_eq!(engine.mode(), SyncMode::Connected);

    // The attendance row lands, its points do not.
    engine
        .toggle_attendance(Some(&harjeet()), "G-MON-01")
        .await
        .unwrap_err();
    let err = engine
        .award_score(Some(&harjeet()), "G-MON-01", "Chess", 5)
        .await
        .unwrap_err();

    assert!(matches!(err, SewaError::RemoteWrite(_)));
    assert!(err.user_message().starts_with("Could not save the change"));
    assert!(engine.snapshot().await.scores.is_empty());
}

#[tokio::test]
async fn test_unique_violation_means_already_marked() {
    let mut remote = bootstrapped_mock();
    remote.expect_insert_attendance().times(1).returning(|table, row| {
        Err(StoreError::UniqueViolation {
            table,
            key: row.sewadar_id,
        })
    });
    let engine = engine_over(remote).await;

    let outcome = engine
        .toggle_attendance(Some(&harjeet()), "G-MON-01")
        .await
        .unwrap();

    assert_eq!(outcome, AttendanceOutcome::AlreadyMarked);
    assert!(engine.snapshot().await.attendance.is_empty());
}

#[tokio::test]
async fn test_partial_mark_is_repaired() {
    let mut remote = bootstrapped_mock();
    remote
        .expect_insert_attendance()
        .times(1)
        .returning(|table, _| {
            assert_eq!(table, Table::Attendance);
            Ok(())
        });
    let score_writes = Arc::new(AtomicUsize::new(0));
    let writes = score_writes.clone();
    remote.expect_insert_score().times(2).returning(move |table, row| {
        assert_eq!(table, Table::Scores);
        assert_eq!(row.game, DAILY_ATTENDANCE);
        // First write is lost, the repair's write goes through.
        if writes.fetch_add(1, Ordering::SeqCst) == 0 {
            Err(offline())
        } else {
            Ok(())
        }
    });
    let engine = engine_over(remote).await;

    let err = engine
        .toggle_attendance(Some(&harjeet()), "G-MON-01")
        .await
        .unwrap_err();
    assert!(matches!(err, SewaError::RemoteWrite(_)));

    let snapshot = engine.snapshot().await;
    assert_eq!(snapshot.attendance.len(), 1);
    assert!(snapshot.scores.is_empty());

    let repair = engine.repair_attendance_scores(Some(&admin())).await.unwrap();
    assert_eq!(repair.created.len(), 1);
    assert_eq!(repair.created[0].points, 100);
    assert_eq!(repair.created[0].timestamp, snapshot.attendance[0].timestamp);
    assert_eq!(engine.snapshot().await.scores, repair.created);
    assert_eq!(score_writes.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_denied_operations_never_reach_the_remote() {
    // Only bootstrap expectations; any write would panic the mock.
    let engine = engine_over(bootstrapped_mock()).await;

    let attempts = [
        engine.toggle_attendance(None, "G-MON-01").await.map(|_| ()),
        engine.toggle_attendance(Some(&gurpreet()), "G-MON-01").await.map(|_| ()),
        engine.award_score(None, "G-MON-01", "Chess", 5).await.map(|_| ()),
        engine.unmark_day(Some(&harjeet()), at(NINE_AM).date_naive()).await.map(|_| ()),
        engine.fix_attendance_points(Some(&harjeet())).await.map(|_| ()),
        engine.repair_attendance_scores(Some(&gurpreet())).await.map(|_| ()),
    ];

    for attempt in attempts {
        assert!(matches!(attempt, Err(SewaError::Permission(_))));
    }
}

#[tokio::test]
async fn test_failed_rebootstrap_keeps_writes_on_the_remote() {
    let ctx = TestContext::new().await;
    ctx.engine
        .toggle_attendance(Some(&harjeet()), "G-MON-01")
        .await
        .unwrap();

    ctx.remote.set_offline(true);
    assert!(ctx.engine.bootstrap().await.is_err());
    assert_eq!(ctx.engine.mode(), SyncMode::Connected);
    assert!(!ctx.engine.snapshot().await.sewadars.is_empty());

    let err = ctx
        .engine
        .award_score(Some(&harjeet()), "G-MON-01", "Chess", 5)
        .await
        .unwrap_err();
    assert!(matches!(err, SewaError::RemoteWrite(_)));
    // Only the attendance points.
    assert_eq!(ctx.engine.snapshot().await.scores.len(), 1);

    ctx.remote.set_offline(false);
    let score = ctx
        .engine
        .award_score(Some(&harjeet()), "G-MON-01", "Chess", 5)
        .await
        .unwrap();
    let remote = ctx.remote.select_scores(Table::Scores).await.unwrap();
    assert!(remote.iter().any(|r| r.id == score.id));
}

#[tokio::test]
async fn test_failed_mark_after_registration_names_the_sewadar() {
    let mut remote = bootstrapped_mock();
    remote
        .expect_insert_sewadars()
        .times(1)
        .returning(|_, _| Ok(()));
    remote
        .expect_insert_attendance()
        .times(1)
        .returning(|_, _| Err(offline()));
    let engine = engine_over(remote).await;

    let err = engine
        .add_sewadar(Some(&harjeet()), "Kirpal Singh", Gender::Gents, Group::Sunday)
        .await
        .unwrap_err();

    let snapshot = engine.snapshot().await;
    let added = snapshot
        .sewadars
        .iter()
        .find(|s| s.name == "Kirpal Singh")
        .unwrap();
    assert!(snapshot.attendance.is_empty());

    match &err {
        SewaError::PartialWrite { completed, .. } => assert!(completed.contains(&added.id)),
        other => panic!("unexpected error {:?}", other),
    }
    assert!(err.user_message().contains(&added.id));
}

#[tokio::test]
async fn test_offline_store_rejects_delete() {
    let ctx = TestContext::new().await;
    ctx.engine
        .toggle_attendance(Some(&harjeet()), "G-MON-01")
        .await
        .unwrap();
    let score = ctx
        .engine
        .award_score(Some(&harjeet()), "G-MON-01", "Chess", 5)
        .await
        .unwrap();

    ctx.remote.set_offline(true);
    let err = ctx
        .engine
        .delete_score(Some(&harjeet()), &score.id)
        .await
        .unwrap_err();
    assert!(matches!(err, SewaError::RemoteWrite(_)));
    let is_deleted = |snapshot: sewa_sync::Snapshot| {
        snapshot
            .scores
            .iter()
            .find(|s| s.id == score.id)
            .map(|s| s.is_deleted)
    };
    assert_eq!(is_deleted(ctx.engine.snapshot().await), Some(false));

    ctx.remote.set_offline(false);
    ctx.engine.delete_score(Some(&harjeet()), &score.id).await.unwrap();
    assert_eq!(is_deleted(ctx.engine.snapshot().await), Some(true));
}
