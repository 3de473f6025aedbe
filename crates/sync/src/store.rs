//! Canonical in-memory collections.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use eyre::Result;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sewa_core::ids::IdGenerator;
use sewa_core::models::{AttendanceRecord, ScoreRecord, Sewadar};
use tokio::sync::{RwLock, watch};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cache::{LocalCache, Slot};

/// Read-only copy of every collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub sewadars: Vec<Sewadar>,
    pub attendance: Vec<AttendanceRecord>,
    pub scores: Vec<ScoreRecord>,
}

/// Whether an apply-operation changed anything worth persisting.
pub trait Applied {
    fn changed(&self) -> bool;
}

impl Applied for bool {
    fn changed(&self) -> bool {
        *self
    }
}

impl Applied for usize {
    fn changed(&self) -> bool {
        *self > 0
    }
}

impl Applied for () {
    fn changed(&self) -> bool {
        true
    }
}

/// The three collections. No two entries ever share a natural key.
#[derive(Debug, Default)]
pub struct EntityStore {
    sewadars: Vec<Sewadar>,
    attendance: Vec<AttendanceRecord>,
    scores: Vec<ScoreRecord>,
}

impl EntityStore {
    pub fn sewadars(&self) -> &[Sewadar] {
        &self.sewadars
    }

    pub fn attendance(&self) -> &[AttendanceRecord] {
        &self.attendance
    }

    pub fn scores(&self) -> &[ScoreRecord] {
        &self.scores
    }

    pub fn sewadar(&self, id: &str) -> Option<&Sewadar> {
        self.sewadars.iter().find(|s| s.id == id)
    }

    pub fn attendance_for(&self, sewadar_id: &str, date: NaiveDate) -> Option<&AttendanceRecord> {
        self.attendance
            .iter()
            .find(|a| a.key() == (sewadar_id, date))
    }

    pub fn score(&self, id: &str) -> Option<&ScoreRecord> {
        self.scores.iter().find(|s| s.id == id)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            sewadars: self.sewadars.clone(),
            attendance: self.attendance.clone(),
            scores: self.scores.clone(),
        }
    }

    pub fn insert_sewadar(&mut self, sewadar: Sewadar) -> bool {
        if self.sewadar(&sewadar.id).is_some() {
            return false;
        }
        self.sewadars.push(sewadar);
        true
    }

    /// Replaces the sewadar with the same id, or appends it.
    pub fn upsert_sewadar(&mut self, sewadar: Sewadar) -> bool {
        match self.sewadars.iter_mut().find(|s| s.id == sewadar.id) {
            Some(existing) if *existing == sewadar => false,
            Some(existing) => {
                *existing = sewadar;
                true
            }
            None => {
                self.sewadars.push(sewadar);
                true
            }
        }
    }

    pub fn remove_sewadar(&mut self, id: &str) -> bool {
        let before = self.sewadars.len();
        self.sewadars.retain(|s| s.id != id);
        self.sewadars.len() != before
    }

    pub fn replace_sewadars(&mut self, sewadars: Vec<Sewadar>) {
        let mut seen = HashSet::new();
        self.sewadars = sewadars
            .into_iter()
            .filter(|s| seen.insert(s.id.clone()))
            .collect();
    }

    pub fn insert_attendance(&mut self, record: AttendanceRecord) -> bool {
        if self.attendance_for(&record.sewadar_id, record.date).is_some() {
            return false;
        }
        self.attendance.push(record);
        true
    }

    pub fn remove_attendance(&mut self, sewadar_id: &str, date: NaiveDate) -> bool {
        let before = self.attendance.len();
        self.attendance.retain(|a| a.key() != (sewadar_id, date));
        self.attendance.len() != before
    }

    pub fn replace_attendance(&mut self, attendance: Vec<AttendanceRecord>) {
        let mut seen = HashSet::new();
        self.attendance = attendance
            .into_iter()
            .filter(|a| seen.insert((a.sewadar_id.clone(), a.date)))
            .collect();
    }

    pub fn insert_score(&mut self, score: ScoreRecord) -> bool {
        if self.score(&score.id).is_some() {
            return false;
        }
        self.scores.push(score);
        true
    }

    pub fn set_score_deleted(&mut self, id: &str, is_deleted: bool) -> bool {
        match self.scores.iter_mut().find(|s| s.id == id) {
            Some(score) if score.is_deleted != is_deleted => {
                score.is_deleted = is_deleted;
                true
            }
            _ => false,
        }
    }

    pub fn set_score_points(&mut self, id: &str, points: i32) -> bool {
        match self.scores.iter_mut().find(|s| s.id == id) {
            Some(score) if score.points != points => {
                score.points = points;
                true
            }
            _ => false,
        }
    }

    pub fn remove_score(&mut self, id: &str) -> bool {
        self.remove_scores_where(|s| s.id == id) > 0
    }

    /// Hard delete. Returns how many scores were removed.
    pub fn remove_scores_where(&mut self, predicate: impl Fn(&ScoreRecord) -> bool) -> usize {
        let before = self.scores.len();
        self.scores.retain(|s| !predicate(s));
        before - self.scores.len()
    }

    pub fn replace_scores(&mut self, scores: Vec<ScoreRecord>) {
        let mut seen = HashSet::new();
        self.scores = scores
            .into_iter()
            .filter(|s| seen.insert(s.id.clone()))
            .collect();
    }

    fn slot_value(&self, slot: Slot) -> Result<Option<Value>> {
        let value = match slot {
            Slot::Sewadars => serde_json::to_value(&self.sewadars)?,
            Slot::Attendance => serde_json::to_value(&self.attendance)?,
            Slot::Scores => serde_json::to_value(&self.scores)?,
            Slot::ActiveVolunteer | Slot::ActiveView => return Ok(None),
        };
        Ok(Some(value))
    }
}

/// [`EntityStore`] behind a lock, persisted to the local cache after every
/// change. The revision counter ticks once per applied change.
pub struct Store {
    entities: RwLock<EntityStore>,
    cache: Arc<dyn LocalCache>,
    origin: Uuid,
    revision: watch::Sender<u64>,
}

impl Store {
    pub fn new(cache: Arc<dyn LocalCache>, origin: Uuid) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            entities: RwLock::new(EntityStore::default()),
            cache,
            origin,
            revision,
        }
    }

    pub fn origin(&self) -> Uuid {
        self.origin
    }

    pub fn cache(&self) -> &Arc<dyn LocalCache> {
        &self.cache
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    pub async fn read<R>(&self, f: impl FnOnce(&EntityStore) -> R) -> R {
        let entities = self.entities.read().await;
        f(&entities)
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.entities.read().await.snapshot()
    }

    /// Runs one apply-operation; if it changed anything, writes the named
    /// slots to the cache and ticks the revision.
    pub async fn apply<R: Applied>(&self, slots: &[Slot], f: impl FnOnce(&mut EntityStore) -> R) -> R {
        let mut entities = self.entities.write().await;
        let outcome = f(&mut entities);
        if outcome.changed() {
            self.persist(&entities, slots);
            self.bump();
        }
        outcome
    }

    /// Installs a full snapshot, e.g. the result of a remote bootstrap.
    pub async fn replace_all(&self, snapshot: Snapshot) {
        let mut entities = self.entities.write().await;
        entities.replace_sewadars(snapshot.sewadars);
        entities.replace_attendance(snapshot.attendance);
        entities.replace_scores(snapshot.scores);
        self.persist(&entities, &Slot::COLLECTIONS);
        self.bump();
        info!(
            sewadars = entities.sewadars.len(),
            attendance = entities.attendance.len(),
            scores = entities.scores.len(),
            "store replaced"
        );
    }

    /// Loads the collections from the cache. Scores without a usable id get
    /// a migrated one, and the repaired list is written back.
    pub async fn hydrate(&self, ids: &IdGenerator) -> Result<()> {
        self.load(&Slot::COLLECTIONS, ids).await?;
        let entities = self.entities.read().await;
        info!(
            sewadars = entities.sewadars.len(),
            attendance = entities.attendance.len(),
            scores = entities.scores.len(),
            "store hydrated from cache"
        );
        Ok(())
    }

    /// Re-reads slots another session wrote. Nothing is written back unless
    /// score ids had to be migrated.
    pub async fn reload(&self, slots: &[Slot], ids: &IdGenerator) -> Result<()> {
        self.load(slots, ids).await
    }

    async fn load(&self, slots: &[Slot], ids: &IdGenerator) -> Result<()> {
        let mut entities = self.entities.write().await;
        let mut changed = false;

        for slot in slots {
            match slot {
                Slot::Sewadars => {
                    if let Some(sewadars) = self.read_slot::<Sewadar>(*slot)? {
                        entities.replace_sewadars(sewadars);
                        changed = true;
                    }
                }
                Slot::Attendance => {
                    if let Some(attendance) = self.read_slot::<AttendanceRecord>(*slot)? {
                        entities.replace_attendance(attendance);
                        changed = true;
                    }
                }
                Slot::Scores => {
                    if let Some(scores) = self.read_slot::<ScoreRecord>(*slot)? {
                        let original: Vec<String> = scores.iter().map(|s| s.id.clone()).collect();
                        let migrated = ids.migrate_score_ids(scores);
                        let renamed = migrated
                            .iter()
                            .zip(&original)
                            .filter(|(score, id)| score.id != **id)
                            .count();

                        entities.scores = migrated;
                        changed = true;
                        if renamed > 0 {
                            warn!(renamed, "assigned migrated ids to cached scores");
                            self.persist(&entities, &[Slot::Scores]);
                        }
                    }
                }
                Slot::ActiveVolunteer | Slot::ActiveView => {}
            }
        }

        if changed {
            self.bump();
        }
        Ok(())
    }

    fn read_slot<T: DeserializeOwned>(&self, slot: Slot) -> Result<Option<Vec<T>>> {
        let Some(value) = self.cache.get(slot)? else {
            return Ok(None);
        };
        match serde_json::from_value(value) {
            Ok(items) => Ok(Some(items)),
            Err(e) => {
                warn!(slot = slot.key(), error = %e, "ignoring unreadable cache slot");
                Ok(None)
            }
        }
    }

    fn persist(&self, entities: &EntityStore, slots: &[Slot]) {
        let mut entries = Vec::with_capacity(slots.len());
        for slot in slots {
            match entities.slot_value(*slot) {
                Ok(Some(value)) => entries.push((*slot, value)),
                Ok(None) => {}
                Err(e) => warn!(slot = slot.key(), error = %e, "failed to serialize slot"),
            }
        }
        if entries.is_empty() {
            return;
        }
        // The remote store is the system of record; a cache failure only
        // costs reload resilience.
        if let Err(e) = self.cache.put_many(entries, self.origin) {
            warn!(error = %e, "failed to persist store to local cache");
        }
    }

    fn bump(&self) {
        self.revision.send_modify(|r| *r += 1);
        debug!(revision = *self.revision.borrow(), "store changed");
    }
}
