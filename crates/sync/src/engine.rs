//! The sync engine.
//!
//! Bootstraps the [`Store`] from the remote store, runs every volunteer
//! operation (role gate, business rules, remote write, local apply) and
//! merges remote change notifications back into the store.
//!
//! Remote writes always come first. The local store only reflects a step once
//! its remote write has succeeded, so a failure leaves local state untouched.
//! Composite operations (mark attendance = attendance row + score row) apply
//! step by step; a failure between steps leaves a partial state that
//! [`Engine::repair_attendance_scores`] fixes.

use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use chrono::{DateTime, FixedOffset, NaiveDate};
use eyre::Result;
use serde::Serialize;
use sewa_core::aggregate::{self, DashboardSummary};
use sewa_core::errors::{SewaError, SewaResult};
use sewa_core::ids::{IdGenerator, IdKind};
use sewa_core::models::{
    AttendanceRecord, DAILY_ATTENDANCE, Gender, Group, Partition, ScoreRecord, Sewadar, Volunteer,
};
use sewa_core::roles::{Operation, RoleGate};
use sewa_core::roster::without_placeholders;
use sewa_core::rules::{
    RewardPolicy, check_award, check_present, day_bounds, day_of, is_companion_score,
    is_placeholder_name, validate_new_sewadar,
};
use sewa_db::models::{AttendanceRow, ScoreRow, SewadarRow};
use sewa_db::{ChangeEvent, Entity, RemoteStore, RowChange, ScoreFilter, StoreError, Table};
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::cache::{LocalCache, Slot};
use crate::clock::Clock;
use crate::store::{Snapshot, Store};

const REBOOTSTRAP_MIN_DELAY: Duration = Duration::from_millis(250);
const REBOOTSTRAP_MAX_DELAY: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SyncMode {
    Connected,
    /// No remote store, or none reachable since startup: cache and process
    /// memory only.
    LocalOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum AttendanceOutcome {
    Marked {
        attendance: AttendanceRecord,
        score: ScoreRecord,
    },
    Unmarked {
        attendance: AttendanceRecord,
        #[serde(rename = "removedScores")]
        removed_scores: usize,
    },
    /// Another volunteer marked the sewadar first.
    AlreadyMarked,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub sewadar: Sewadar,
    pub attendance: AttendanceOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayReset {
    pub date: NaiveDate,
    pub attendance: usize,
    pub scores: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Repair {
    pub created: Vec<ScoreRecord>,
    pub removed: usize,
}

fn write_failed(context: &str, err: StoreError) -> SewaError {
    error!(error = %err, "{}", context);
    SewaError::RemoteWrite(eyre::Report::new(err).wrap_err(context.to_string()))
}

fn in_filter(filter: &ScoreFilter, score: &ScoreRecord) -> bool {
    score.sewadar_id == filter.sewadar_id
        && score.game == filter.game
        && score.timestamp >= filter.from_ms
        && score.timestamp < filter.until_ms
}

pub struct Engine {
    remote: Option<Arc<dyn RemoteStore>>,
    // Set by the first successful bootstrap and never cleared. Writes of a
    // connected engine always go to the remote store, reachable or not.
    connected: AtomicBool,
    changes: StdMutex<Option<broadcast::Receiver<ChangeEvent>>>,
    store: Store,
    ids: IdGenerator,
    gate: RoleGate,
    policy: RewardPolicy,
    clock: Arc<dyn Clock>,
    // One volunteer operation at a time per client.
    writes: Mutex<()>,
}

impl Engine {
    /// Hydrates from the cache, then bootstraps from the remote store. Falls
    /// back to local-only mode when there is no remote or it cannot be read.
    pub async fn connect(
        remote: Option<Arc<dyn RemoteStore>>,
        cache: Arc<dyn LocalCache>,
        gate: RoleGate,
        policy: RewardPolicy,
        clock: Arc<dyn Clock>,
    ) -> Arc<Self> {
        // Subscribe before the first fetch so nothing committed in between is lost.
        let changes = remote.as_ref().map(|r| r.subscribe());

        let engine = Self {
            remote,
            connected: AtomicBool::new(false),
            changes: StdMutex::new(changes),
            store: Store::new(cache, Uuid::new_v4()),
            ids: IdGenerator::new(),
            gate,
            policy,
            clock,
            writes: Mutex::new(()),
        };

        if let Err(e) = engine.store.hydrate(&engine.ids).await {
            warn!(error = %e, "could not hydrate from local cache");
        }

        match engine.bootstrap().await {
            Ok(mode) => info!(?mode, "sync engine ready"),
            Err(e) => warn!(error = %e, "remote store unreachable, running local-only"),
        }

        Arc::new(engine)
    }

    /// Replaces the store with a full fetch of all six tables.
    ///
    /// A failed fetch leaves the store and the mode as they were: an engine
    /// that never reached the remote stays local-only, a connected one stays
    /// connected and its writes keep failing until the remote is back.
    pub async fn bootstrap(&self) -> Result<SyncMode> {
        let Some(remote) = self.remote.as_deref() else {
            info!("no remote store configured");
            return Ok(SyncMode::LocalOnly);
        };

        let mut snapshot = match fetch_all(remote).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(mode = ?self.mode(), error = %e, "bootstrap fetch failed");
                return Err(e);
            }
        };

        // Score ids are only unique per table; a repeat across the two
        // partitions gets a migrated id instead of being dropped.
        let fetched: Vec<String> = snapshot.scores.iter().map(|s| s.id.clone()).collect();
        snapshot.scores = self.ids.migrate_score_ids(snapshot.scores);
        let migrated = fetched
            .iter()
            .zip(&snapshot.scores)
            .filter(|(id, score)| **id != score.id)
            .count();
        if migrated > 0 {
            warn!(migrated, "remote scores with blank or repeated ids were given new ids");
        }

        self.store.replace_all(snapshot).await;
        self.connected.store(true, Ordering::SeqCst);
        Ok(SyncMode::Connected)
    }

    /// Bootstraps until a fetch succeeds, backing off between attempts.
    async fn rebootstrap(&self) {
        let mut delay = REBOOTSTRAP_MIN_DELAY;
        loop {
            match self.bootstrap().await {
                Ok(_) => return,
                Err(e) => {
                    error!(error = %e, retry_in = ?delay, "re-bootstrap failed");
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(REBOOTSTRAP_MAX_DELAY);
                }
            }
        }
    }

    pub fn mode(&self) -> SyncMode {
        if self.connected.load(Ordering::SeqCst) {
            SyncMode::Connected
        } else {
            SyncMode::LocalOnly
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn gate(&self) -> &RoleGate {
        &self.gate
    }

    pub fn policy(&self) -> RewardPolicy {
        self.policy
    }

    pub fn origin(&self) -> Uuid {
        self.store.origin()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.now().date_naive()
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.store.snapshot().await
    }

    pub async fn dashboard(
        &self,
        actor: Option<&Volunteer>,
        date: Option<NaiveDate>,
    ) -> SewaResult<DashboardSummary> {
        self.authorize(actor, Operation::ViewDashboard)?;
        let date = date.unwrap_or_else(|| self.today());
        Ok(self
            .store
            .read(|e| aggregate::summarize(e.sewadars(), e.attendance(), e.scores(), date))
            .await)
    }

    fn remote(&self) -> Option<&dyn RemoteStore> {
        if self.connected.load(Ordering::SeqCst) {
            self.remote.as_deref()
        } else {
            None
        }
    }

    fn authorize<'a>(
        &self,
        actor: Option<&'a Volunteer>,
        operation: Operation,
    ) -> SewaResult<&'a Volunteer> {
        match actor {
            Some(volunteer) if self.gate.can_act(Some(volunteer), operation) => Ok(volunteer),
            _ => {
                debug!(volunteer = ?actor.map(|v| &v.id), ?operation, "operation denied");
                Err(SewaError::Permission(format!("{:?}", operation)))
            }
        }
    }

    /// Unmarked becomes present, present becomes unmarked, for today.
    pub async fn toggle_attendance(
        &self,
        actor: Option<&Volunteer>,
        sewadar_id: &str,
    ) -> SewaResult<AttendanceOutcome> {
        let volunteer = self.authorize(actor, Operation::MarkAttendance)?;
        let _guard = self.writes.lock().await;

        let now = self.clock.now();
        let (sewadar, existing) = self
            .store
            .read(|e| {
                (
                    e.sewadar(sewadar_id).cloned(),
                    e.attendance_for(sewadar_id, now.date_naive()).cloned(),
                )
            })
            .await;

        if let Some(record) = existing {
            let removed_scores = self.unmark(&record, *now.offset()).await?;
            return Ok(AttendanceOutcome::Unmarked {
                attendance: record,
                removed_scores,
            });
        }

        let sewadar =
            sewadar.ok_or_else(|| SewaError::NotFound(format!("Sewadar {}", sewadar_id)))?;
        self.mark(volunteer, &sewadar, now).await
    }

    async fn mark(
        &self,
        volunteer: &Volunteer,
        sewadar: &Sewadar,
        now: DateTime<FixedOffset>,
    ) -> SewaResult<AttendanceOutcome> {
        let partition = sewadar.partition();
        let timestamp = now.timestamp_millis();

        let attendance = AttendanceRecord {
            sewadar_id: sewadar.id.clone(),
            name: sewadar.name.clone(),
            date: now.date_naive(),
            timestamp,
            volunteer_id: volunteer.id.clone(),
        };
        let score = ScoreRecord {
            id: self.ids.new_id(IdKind::AttendanceScore(partition)),
            sewadar_id: sewadar.id.clone(),
            name: sewadar.name.clone(),
            game: DAILY_ATTENDANCE.to_string(),
            points: self.policy.points_at(now.time()),
            timestamp,
            volunteer_id: volunteer.id.clone(),
            is_deleted: false,
        };

        let remote = self.remote();
        if let Some(remote) = remote {
            match remote
                .insert_attendance(Table::attendance(partition), AttendanceRow::from(&attendance))
                .await
            {
                Ok(()) => {}
                Err(e) if e.is_unique_violation() => {
                    info!(sewadar = %sewadar.id, "attendance already marked elsewhere");
                    return Ok(AttendanceOutcome::AlreadyMarked);
                }
                Err(e) => return Err(write_failed("Failed to record attendance", e)),
            }
        }

        let inserted = self
            .store
            .apply(&[Slot::Attendance], |e| e.insert_attendance(attendance.clone()))
            .await;
        if !inserted && remote.is_none() {
            return Ok(AttendanceOutcome::AlreadyMarked);
        }

        if let Some(remote) = remote {
            remote
                .insert_score(Table::scores(partition), ScoreRow::from(&score))
                .await
                .map_err(|e| write_failed("Attendance saved without its points", e))?;
        }
        self.store
            .apply(&[Slot::Scores], |e| e.insert_score(score.clone()))
            .await;

        info!(
            sewadar = %sewadar.id,
            points = score.points,
            volunteer = %volunteer.id,
            "attendance marked"
        );
        Ok(AttendanceOutcome::Marked { attendance, score })
    }

    /// Removes one attendance record and hard-deletes its day's
    /// `Daily Attendance` scores. Returns how many scores went.
    async fn unmark(&self, record: &AttendanceRecord, offset: FixedOffset) -> SewaResult<usize> {
        let (from_ms, until_ms) = day_bounds(record.date, offset).ok_or_else(|| {
            SewaError::Internal(format!("No local day for {}", record.date).into())
        })?;
        let partition = record.partition();

        if let Some(remote) = self.remote() {
            remote
                .delete_attendance(
                    Table::attendance(partition),
                    record.sewadar_id.clone(),
                    record.date,
                )
                .await
                .map_err(|e| write_failed("Failed to unmark attendance", e))?;
        }
        self.store
            .apply(&[Slot::Attendance], |e| {
                e.remove_attendance(&record.sewadar_id, record.date)
            })
            .await;

        let filter = ScoreFilter {
            sewadar_id: record.sewadar_id.clone(),
            game: DAILY_ATTENDANCE.to_string(),
            from_ms,
            until_ms,
        };
        if let Some(remote) = self.remote() {
            remote
                .delete_scores(Table::scores(partition), filter.clone())
                .await
                .map_err(|e| write_failed("Attendance removed but its points were not", e))?;
        }
        let removed = self
            .store
            .apply(&[Slot::Scores], |e| {
                e.remove_scores_where(|s| in_filter(&filter, s))
            })
            .await;

        info!(sewadar = %record.sewadar_id, date = %record.date, removed, "attendance unmarked");
        Ok(removed)
    }

    /// Registers a new sewadar and marks them present.
    pub async fn add_sewadar(
        &self,
        actor: Option<&Volunteer>,
        name: &str,
        gender: Gender,
        group: Group,
    ) -> SewaResult<Registration> {
        let volunteer = self.authorize(actor, Operation::AddSewadar)?;
        let name = validate_new_sewadar(name, gender, group)?;
        let _guard = self.writes.lock().await;

        let sewadar = Sewadar {
            id: self.ids.new_id(IdKind::Sewadar(gender)),
            name,
            gender,
            group,
        };

        if let Some(remote) = self.remote() {
            remote
                .insert_sewadars(
                    Table::sewadars(sewadar.partition()),
                    vec![SewadarRow::from(&sewadar)],
                )
                .await
                .map_err(|e| write_failed("Failed to add sewadar", e))?;
        }
        self.store
            .apply(&[Slot::Sewadars], |e| e.insert_sewadar(sewadar.clone()))
            .await;
        info!(sewadar = %sewadar.id, volunteer = %volunteer.id, "sewadar added");

        // Marking must never turn into an unmark for a fresh registration.
        let now = self.clock.now();
        let present = self
            .store
            .read(|e| e.attendance_for(&sewadar.id, now.date_naive()).is_some())
            .await;
        let attendance = if present {
            warn!(sewadar = %sewadar.id, "new sewadar already has attendance today");
            AttendanceOutcome::AlreadyMarked
        } else {
            self.mark(volunteer, &sewadar, now)
                .await
                .map_err(|e| match e {
                    SewaError::RemoteWrite(failed) => SewaError::PartialWrite {
                        completed: format!("Sewadar {} ({}) was added", sewadar.name, sewadar.id),
                        pending: "marking them present".to_string(),
                        failed,
                    },
                    other => other,
                })?
        };

        Ok(Registration {
            sewadar,
            attendance,
        })
    }

    pub async fn award_score(
        &self,
        actor: Option<&Volunteer>,
        sewadar_id: &str,
        game: &str,
        points: i32,
    ) -> SewaResult<ScoreRecord> {
        let volunteer = self.authorize(actor, Operation::AwardScore)?;
        let _guard = self.writes.lock().await;

        let today = self.today();
        let sewadar = self
            .store
            .read(|e| -> SewaResult<Sewadar> {
                let sewadar = e
                    .sewadar(sewadar_id)
                    .cloned()
                    .ok_or_else(|| SewaError::NotFound(format!("Sewadar {}", sewadar_id)))?;
                check_award(e.scores(), sewadar_id, game, points)?;
                check_present(e.attendance(), sewadar_id, today)?;
                Ok(sewadar)
            })
            .await?;

        let partition = sewadar.partition();
        let score = ScoreRecord {
            id: self.ids.new_id(IdKind::ManualScore(partition)),
            sewadar_id: sewadar.id.clone(),
            name: sewadar.name.clone(),
            game: game.to_string(),
            points,
            timestamp: self.clock.now().timestamp_millis(),
            volunteer_id: volunteer.id.clone(),
            is_deleted: false,
        };

        if let Some(remote) = self.remote() {
            remote
                .insert_score(Table::scores(partition), ScoreRow::from(&score))
                .await
                .map_err(|e| write_failed("Failed to award points", e))?;
        }
        self.store
            .apply(&[Slot::Scores], |e| e.insert_score(score.clone()))
            .await;

        info!(sewadar = %sewadar.id, game, points, volunteer = %volunteer.id, "points awarded");
        Ok(score)
    }

    /// Soft delete: the record stays, flagged, and drops out of every total.
    pub async fn delete_score(
        &self,
        actor: Option<&Volunteer>,
        score_id: &str,
    ) -> SewaResult<ScoreRecord> {
        let volunteer = self.authorize(actor, Operation::DeleteScore)?;
        let _guard = self.writes.lock().await;

        let mut score = self
            .store
            .read(|e| e.score(score_id).cloned())
            .await
            .ok_or_else(|| SewaError::NotFound(format!("Score {}", score_id)))?;

        if score.is_deleted {
            debug!(score = %score.id, "score already deleted");
            return Ok(score);
        }

        if let Some(remote) = self.remote() {
            let affected = update_either_partition(score.partition(), |table| {
                remote.set_score_deleted(table, score.id.clone(), true)
            })
            .await
            .map_err(|e| write_failed("Failed to delete points", e))?;

            if affected == 0 {
                return Err(SewaError::NotFound(format!(
                    "Score {} in either scores table",
                    score.id
                )));
            }
        }
        self.store
            .apply(&[Slot::Scores], |e| e.set_score_deleted(&score.id, true))
            .await;

        info!(score = %score.id, volunteer = %volunteer.id, "score deleted");
        score.is_deleted = true;
        Ok(score)
    }

    /// Clean sync: purge both sewadar tables, reseed, and reload the roster.
    /// Attendance and scores are left alone and may reference ids that are
    /// gone afterwards.
    pub async fn resync_roster(
        &self,
        actor: Option<&Volunteer>,
        seed: Vec<Sewadar>,
    ) -> SewaResult<Vec<Sewadar>> {
        let volunteer = self.authorize(actor, Operation::ResyncRoster)?;
        let _guard = self.writes.lock().await;

        let mut seen = HashSet::new();
        let seed: Vec<Sewadar> = without_placeholders(seed)
            .into_iter()
            .filter(|s| {
                let fresh = seen.insert(s.id.clone());
                if !fresh {
                    warn!(sewadar = %s.id, "duplicate id in roster seed");
                }
                fresh
            })
            .collect();

        let roster = match self.remote() {
            Some(remote) => {
                for table in Table::pair(Entity::Sewadar) {
                    let purged = remote
                        .delete_all_sewadars(table)
                        .await
                        .map_err(|e| write_failed("Failed to clear roster", e))?;

                    let rows: Vec<SewadarRow> = seed
                        .iter()
                        .filter(|s| s.partition() == table.partition())
                        .map(SewadarRow::from)
                        .collect();
                    debug!(%table, purged, inserting = rows.len(), "reseeding");
                    if !rows.is_empty() {
                        remote
                            .insert_sewadars(table, rows)
                            .await
                            .map_err(|e| write_failed("Failed to reseed roster", e))?;
                    }
                }

                let mut roster = Vec::new();
                for table in Table::pair(Entity::Sewadar) {
                    let rows = remote
                        .select_sewadars(table)
                        .await
                        .map_err(|e| write_failed("Roster reseeded but could not be re-read", e))?;
                    roster.extend(rows.into_iter().filter_map(to_sewadar));
                }
                without_placeholders(roster)
            }
            None => seed,
        };

        self.store
            .apply(&[Slot::Sewadars], |e| e.replace_sewadars(roster.clone()))
            .await;

        info!(sewadars = roster.len(), volunteer = %volunteer.id, "roster resynced");
        Ok(roster)
    }

    /// Unmarks every sewadar present on `date`.
    pub async fn unmark_day(
        &self,
        actor: Option<&Volunteer>,
        date: NaiveDate,
    ) -> SewaResult<DayReset> {
        let volunteer = self.authorize(actor, Operation::BulkUnmark)?;
        let _guard = self.writes.lock().await;

        let offset = *self.clock.now().offset();
        let records: Vec<AttendanceRecord> = self
            .store
            .read(|e| {
                e.attendance()
                    .iter()
                    .filter(|a| a.date == date)
                    .cloned()
                    .collect()
            })
            .await;

        let mut reset = DayReset {
            date,
            attendance: 0,
            scores: 0,
        };
        for record in &records {
            reset.scores += self.unmark(record, offset).await?;
            reset.attendance += 1;
        }

        info!(%date, attendance = reset.attendance, scores = reset.scores, volunteer = %volunteer.id, "day unmarked");
        Ok(reset)
    }

    /// Recomputes every live `Daily Attendance` score from its timestamp and
    /// corrects the ones that differ. Returns how many were corrected.
    pub async fn fix_attendance_points(&self, actor: Option<&Volunteer>) -> SewaResult<usize> {
        let volunteer = self.authorize(actor, Operation::FixDiscrepancies)?;
        let _guard = self.writes.lock().await;

        let offset = *self.clock.now().offset();
        let policy = self.policy;
        let wrong: Vec<(ScoreRecord, i32)> = self
            .store
            .read(|e| {
                e.scores()
                    .iter()
                    .filter(|s| s.is_daily_attendance() && s.is_live())
                    .filter_map(|s| {
                        let expected = policy.points_for_timestamp(s.timestamp, offset)?;
                        (expected != s.points).then(|| (s.clone(), expected))
                    })
                    .collect()
            })
            .await;

        for (score, points) in &wrong {
            if let Some(remote) = self.remote() {
                update_either_partition(score.partition(), |table| {
                    remote.set_score_points(table, score.id.clone(), *points)
                })
                .await
                .map_err(|e| write_failed("Failed to correct attendance points", e))?;
            }
            self.store
                .apply(&[Slot::Scores], |e| e.set_score_points(&score.id, *points))
                .await;
            debug!(score = %score.id, from = score.points, to = points, "points corrected");
        }

        info!(corrected = wrong.len(), volunteer = %volunteer.id, "attendance points fixed");
        Ok(wrong.len())
    }

    /// Gives every attendance record without a live companion score one, and
    /// hard-deletes `Daily Attendance` scores for days with no attendance.
    pub async fn repair_attendance_scores(&self, actor: Option<&Volunteer>) -> SewaResult<Repair> {
        let volunteer = self.authorize(actor, Operation::FixDiscrepancies)?;
        let _guard = self.writes.lock().await;

        let offset = *self.clock.now().offset();
        let (missing, orphans) = self
            .store
            .read(|e| {
                let missing: Vec<AttendanceRecord> = e
                    .attendance()
                    .iter()
                    .filter(|a| {
                        !e.scores()
                            .iter()
                            .any(|s| s.is_live() && is_companion_score(s, a, offset))
                    })
                    .cloned()
                    .collect();

                let orphans: BTreeSet<(String, NaiveDate)> = e
                    .scores()
                    .iter()
                    .filter(|s| s.is_daily_attendance())
                    .filter_map(|s| Some((s.sewadar_id.clone(), day_of(s.timestamp, offset)?)))
                    .filter(|(sewadar_id, day)| e.attendance_for(sewadar_id, *day).is_none())
                    .collect();

                (missing, orphans)
            })
            .await;

        let mut repair = Repair::default();

        for attendance in missing {
            let partition = attendance.partition();
            let score = ScoreRecord {
                id: self.ids.new_id(IdKind::AttendanceScore(partition)),
                sewadar_id: attendance.sewadar_id.clone(),
                name: attendance.name.clone(),
                game: DAILY_ATTENDANCE.to_string(),
                points: self
                    .policy
                    .points_for_timestamp(attendance.timestamp, offset)
                    .unwrap_or(self.policy.late_points),
                timestamp: attendance.timestamp,
                volunteer_id: attendance.volunteer_id.clone(),
                is_deleted: false,
            };

            if let Some(remote) = self.remote() {
                remote
                    .insert_score(Table::scores(partition), ScoreRow::from(&score))
                    .await
                    .map_err(|e| write_failed("Failed to restore attendance points", e))?;
            }
            self.store
                .apply(&[Slot::Scores], |e| e.insert_score(score.clone()))
                .await;
            repair.created.push(score);
        }

        for (sewadar_id, day) in orphans {
            let Some((from_ms, until_ms)) = day_bounds(day, offset) else {
                continue;
            };
            let filter = ScoreFilter {
                sewadar_id: sewadar_id.clone(),
                game: DAILY_ATTENDANCE.to_string(),
                from_ms,
                until_ms,
            };

            if let Some(remote) = self.remote() {
                remote
                    .delete_scores(Table::scores(Partition::of(&sewadar_id)), filter.clone())
                    .await
                    .map_err(|e| write_failed("Failed to remove orphaned points", e))?;
            }
            repair.removed += self
                .store
                .apply(&[Slot::Scores], |e| {
                    e.remove_scores_where(|s| in_filter(&filter, s))
                })
                .await;
        }

        info!(
            created = repair.created.len(),
            removed = repair.removed,
            volunteer = %volunteer.id,
            "attendance scores repaired"
        );
        Ok(repair)
    }

    /// Merges one remote notification. Every branch is idempotent, so
    /// duplicate or reordered delivery converges. Returns whether the store
    /// changed.
    pub async fn apply_change(&self, event: ChangeEvent) -> bool {
        let table = event.table();
        let applied = match event {
            ChangeEvent::Sewadar { change, .. } => self.apply_sewadar_change(change).await,
            ChangeEvent::Attendance { change, .. } => self.apply_attendance_change(change).await,
            ChangeEvent::Score { change, .. } => self.apply_score_change(change).await,
        };
        debug!(%table, applied, "change notification");
        applied
    }

    async fn apply_sewadar_change(&self, change: RowChange<SewadarRow>) -> bool {
        match change {
            RowChange::Insert(row) => match to_sewadar(row) {
                Some(sewadar) if !is_placeholder_name(&sewadar.name) => {
                    self.store
                        .apply(&[Slot::Sewadars], |e| e.insert_sewadar(sewadar))
                        .await
                }
                _ => false,
            },
            RowChange::Update { new, .. } => match to_sewadar(new) {
                Some(sewadar) if !is_placeholder_name(&sewadar.name) => {
                    self.store
                        .apply(&[Slot::Sewadars], |e| e.upsert_sewadar(sewadar))
                        .await
                }
                _ => false,
            },
            RowChange::Delete(row) => {
                self.store
                    .apply(&[Slot::Sewadars], |e| e.remove_sewadar(&row.id))
                    .await
            }
        }
    }

    async fn apply_attendance_change(&self, change: RowChange<AttendanceRow>) -> bool {
        match change {
            RowChange::Insert(row) if !is_placeholder_name(&row.name) => {
                self.store
                    .apply(&[Slot::Attendance], |e| e.insert_attendance(row.into()))
                    .await
            }
            RowChange::Insert(_) | RowChange::Update { .. } => false,
            RowChange::Delete(row) => {
                self.store
                    .apply(&[Slot::Attendance], |e| {
                        e.remove_attendance(&row.sewadar_id, row.date)
                    })
                    .await
            }
        }
    }

    async fn apply_score_change(&self, change: RowChange<ScoreRow>) -> bool {
        match change {
            RowChange::Insert(row) if !is_placeholder_name(&row.name) => {
                self.store
                    .apply(&[Slot::Scores], |e| e.insert_score(row.into()))
                    .await
            }
            RowChange::Insert(_) => false,
            // Only the soft-delete flag travels; an unseen row is taken whole.
            RowChange::Update { new, .. } => {
                self.store
                    .apply(&[Slot::Scores], |e| {
                        if e.score(&new.id).is_some() {
                            e.set_score_deleted(&new.id, new.is_deleted)
                        } else if is_placeholder_name(&new.name) {
                            false
                        } else {
                            e.insert_score(new.into())
                        }
                    })
                    .await
            }
            RowChange::Delete(row) => {
                self.store
                    .apply(&[Slot::Scores], |e| e.remove_score(&row.id))
                    .await
            }
        }
    }

    /// Applies remote notifications for as long as the engine lives.
    ///
    /// A lagged receiver has missed changes, and a closed one means the feed
    /// was restarted after an outage. Both rebuild the store from a fresh
    /// fetch, retrying until the remote answers.
    pub fn spawn_listener(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let mut changes = self
            .changes
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .take()
            .or_else(|| self.remote.as_ref().map(|r| r.subscribe()))?;
        let engine = Arc::clone(self);

        Some(tokio::spawn(async move {
            info!("change listener started");
            loop {
                match changes.recv().await {
                    Ok(event) => {
                        engine.apply_change(event).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!(missed, "change listener lagged, re-bootstrapping");
                        engine.rebootstrap().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        let Some(remote) = engine.remote.as_ref() else {
                            info!("change feed closed");
                            break;
                        };
                        warn!("change feed restarted, resubscribing and re-bootstrapping");
                        tokio::time::sleep(REBOOTSTRAP_MIN_DELAY).await;
                        changes = remote.subscribe();
                        engine.rebootstrap().await;
                    }
                }
            }
        }))
    }

    /// Reloads collections that another session wrote to a shared cache.
    pub fn spawn_cache_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let mut events = self.store.cache().subscribe();
        let engine = Arc::clone(self);

        tokio::spawn(async move {
            loop {
                let slots: Vec<Slot> = match events.recv().await {
                    Ok(event) if event.origin == engine.origin() => continue,
                    Ok(event) => event
                        .slots
                        .into_iter()
                        .filter(Slot::is_collection)
                        .collect(),
                    Err(broadcast::error::RecvError::Lagged(_)) => Slot::COLLECTIONS.to_vec(),
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                if slots.is_empty() {
                    continue;
                }
                debug!(?slots, "reloading slots written by another session");
                if let Err(e) = engine.store.reload(&slots, &engine.ids).await {
                    warn!(error = %e, "failed to reload from shared cache");
                }
            }
        })
    }
}

fn to_sewadar(row: SewadarRow) -> Option<Sewadar> {
    let id = row.id.clone();
    Sewadar::try_from(row)
        .map_err(|e| warn!(sewadar = %id, error = %e, "skipping malformed sewadar row"))
        .ok()
}

/// Runs `update` against the score table of `home`, then the other partition
/// when no row matched there. Returns rows affected.
async fn update_either_partition<F, Fut>(home: Partition, update: F) -> Result<u64, StoreError>
where
    F: Fn(Table) -> Fut,
    Fut: std::future::Future<Output = Result<u64, StoreError>>,
{
    let affected = update(Table::scores(home)).await?;
    if affected > 0 {
        return Ok(affected);
    }
    update(Table::scores(home.other())).await
}

async fn fetch_all(remote: &dyn RemoteStore) -> Result<Snapshot> {
    let mut snapshot = Snapshot::default();

    for table in Table::pair(Entity::Sewadar) {
        let rows = remote.select_sewadars(table).await?;
        snapshot
            .sewadars
            .extend(rows.into_iter().filter_map(to_sewadar));
    }
    for table in Table::pair(Entity::Attendance) {
        let rows = remote.select_attendance(table).await?;
        snapshot
            .attendance
            .extend(rows.into_iter().map(AttendanceRecord::from));
    }
    for table in Table::pair(Entity::Score) {
        let rows = remote.select_scores(table).await?;
        snapshot
            .scores
            .extend(rows.into_iter().map(ScoreRecord::from));
    }

    let fetched = (
        snapshot.sewadars.len(),
        snapshot.attendance.len(),
        snapshot.scores.len(),
    );
    snapshot.sewadars.retain(|s| !is_placeholder_name(&s.name));
    snapshot.attendance.retain(|a| !is_placeholder_name(&a.name));
    snapshot.scores.retain(|s| !is_placeholder_name(&s.name));

    info!(
        sewadars = snapshot.sewadars.len(),
        attendance = snapshot.attendance.len(),
        scores = snapshot.scores.len(),
        placeholders = fetched.0 + fetched.1 + fetched.2
            - snapshot.sewadars.len()
            - snapshot.attendance.len()
            - snapshot.scores.len(),
        "bootstrapped from remote store"
    );
    Ok(snapshot)
}
