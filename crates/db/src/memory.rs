//! In-process [`RemoteStore`] with the same key constraints and change feed
//! as the Postgres store. Used for local development and tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::broadcast;
use tracing::debug;

use crate::changes::{ChangeEvent, ChangeFeed, RowChange};
use crate::models::{AttendanceRow, ScoreRow, SewadarRow};
use crate::store::{RemoteStore, ScoreFilter, StoreError, StoreResult, expect_entity};
use crate::tables::{Entity, Table};

const CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Default)]
struct Tables {
    sewadars: HashMap<Table, Vec<SewadarRow>>,
    attendance: HashMap<Table, Vec<AttendanceRow>>,
    scores: HashMap<Table, Vec<ScoreRow>>,
}

pub struct MemoryStore {
    tables: Mutex<Tables>,
    events: ChangeFeed,
    offline: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            events: ChangeFeed::new(CHANNEL_CAPACITY),
            offline: AtomicBool::new(false),
        }
    }

    /// While offline every call fails with [`StoreError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Drops the change feed the way a lost database connection does.
    /// Current subscribers see the feed close.
    pub fn restart_feed(&self) {
        debug!("memory store change feed restarted");
        self.events.restart();
    }

    fn check_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("memory store is offline".to_string()))
        } else {
            Ok(())
        }
    }

    fn with_tables<R>(&self, f: impl FnOnce(&mut Tables) -> R) -> R {
        let mut tables = self
            .tables
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut tables)
    }

    fn publish(&self, events: Vec<ChangeEvent>) {
        for event in events {
            debug!(table = %event.table(), kind = ?event.event_type(), "memory store change");
            // No subscribers is fine.
            self.events.send(event);
        }
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn select_sewadars(&self, table: Table) -> StoreResult<Vec<SewadarRow>> {
        self.check_online()?;
        expect_entity(table, Entity::Sewadar)?;
        Ok(self.with_tables(|t| t.sewadars.get(&table).cloned().unwrap_or_default()))
    }

    async fn select_attendance(&self, table: Table) -> StoreResult<Vec<AttendanceRow>> {
        self.check_online()?;
        expect_entity(table, Entity::Attendance)?;
        Ok(self.with_tables(|t| t.attendance.get(&table).cloned().unwrap_or_default()))
    }

    async fn select_scores(&self, table: Table) -> StoreResult<Vec<ScoreRow>> {
        self.check_online()?;
        expect_entity(table, Entity::Score)?;
        Ok(self.with_tables(|t| t.scores.get(&table).cloned().unwrap_or_default()))
    }

    async fn insert_sewadars(&self, table: Table, rows: Vec<SewadarRow>) -> StoreResult<()> {
        self.check_online()?;
        expect_entity(table, Entity::Sewadar)?;

        let inserted = self.with_tables(|t| {
            let existing = t.sewadars.entry(table).or_default();
            // All-or-nothing like a single multi-row INSERT.
            for (i, row) in rows.iter().enumerate() {
                let clash = existing.iter().any(|r| r.id == row.id)
                    || rows[..i].iter().any(|r| r.id == row.id);
                if clash {
                    return Err(StoreError::UniqueViolation {
                        table,
                        key: row.id.clone(),
                    });
                }
            }
            existing.extend(rows.iter().cloned());
            Ok(rows)
        })?;

        self.publish(
            inserted
                .into_iter()
                .map(|row| ChangeEvent::Sewadar {
                    table,
                    change: RowChange::Insert(row),
                })
                .collect(),
        );
        Ok(())
    }

    async fn delete_all_sewadars(&self, table: Table) -> StoreResult<u64> {
        self.check_online()?;
        expect_entity(table, Entity::Sewadar)?;

        let removed = self.with_tables(|t| t.sewadars.remove(&table).unwrap_or_default());
        let count = removed.len() as u64;

        self.publish(
            removed
                .into_iter()
                .map(|row| ChangeEvent::Sewadar {
                    table,
                    change: RowChange::Delete(row),
                })
                .collect(),
        );
        Ok(count)
    }

    async fn insert_attendance(&self, table: Table, row: AttendanceRow) -> StoreResult<()> {
        self.check_online()?;
        expect_entity(table, Entity::Attendance)?;

        self.with_tables(|t| {
            let rows = t.attendance.entry(table).or_default();
            if rows
                .iter()
                .any(|r| r.sewadar_id == row.sewadar_id && r.date == row.date)
            {
                return Err(StoreError::UniqueViolation {
                    table,
                    key: format!("({}, {})", row.sewadar_id, row.date),
                });
            }
            rows.push(row.clone());
            Ok(())
        })?;

        self.publish(vec![ChangeEvent::Attendance {
            table,
            change: RowChange::Insert(row),
        }]);
        Ok(())
    }

    async fn delete_attendance(
        &self,
        table: Table,
        sewadar_id: String,
        date: NaiveDate,
    ) -> StoreResult<u64> {
        self.check_online()?;
        expect_entity(table, Entity::Attendance)?;

        let removed = self.with_tables(|t| {
            let rows = t.attendance.entry(table).or_default();
            let (gone, kept): (Vec<_>, Vec<_>) = rows
                .drain(..)
                .partition(|r| r.sewadar_id == sewadar_id && r.date == date);
            *rows = kept;
            gone
        });
        let count = removed.len() as u64;

        self.publish(
            removed
                .into_iter()
                .map(|row| ChangeEvent::Attendance {
                    table,
                    change: RowChange::Delete(row),
                })
                .collect(),
        );
        Ok(count)
    }

    async fn insert_score(&self, table: Table, row: ScoreRow) -> StoreResult<()> {
        self.check_online()?;
        expect_entity(table, Entity::Score)?;

        self.with_tables(|t| {
            let rows = t.scores.entry(table).or_default();
            if rows.iter().any(|r| r.id == row.id) {
                return Err(StoreError::UniqueViolation {
                    table,
                    key: row.id.clone(),
                });
            }
            rows.push(row.clone());
            Ok(())
        })?;

        self.publish(vec![ChangeEvent::Score {
            table,
            change: RowChange::Insert(row),
        }]);
        Ok(())
    }

    async fn set_score_deleted(
        &self,
        table: Table,
        id: String,
        is_deleted: bool,
    ) -> StoreResult<u64> {
        self.check_online()?;
        expect_entity(table, Entity::Score)?;

        let updated = self.with_tables(|t| {
            let rows = t.scores.entry(table).or_default();
            rows.iter_mut().find(|r| r.id == id).map(|row| {
                let old = row.clone();
                row.is_deleted = is_deleted;
                (row.clone(), old)
            })
        });

        Ok(match updated {
            Some((new, old)) => {
                self.publish(vec![ChangeEvent::Score {
                    table,
                    change: RowChange::Update {
                        new,
                        old: Some(old),
                    },
                }]);
                1
            }
            None => 0,
        })
    }

    async fn set_score_points(&self, table: Table, id: String, points: i32) -> StoreResult<u64> {
        self.check_online()?;
        expect_entity(table, Entity::Score)?;

        let updated = self.with_tables(|t| {
            let rows = t.scores.entry(table).or_default();
            rows.iter_mut().find(|r| r.id == id).map(|row| {
                let old = row.clone();
                row.points = points;
                (row.clone(), old)
            })
        });

        Ok(match updated {
            Some((new, old)) => {
                self.publish(vec![ChangeEvent::Score {
                    table,
                    change: RowChange::Update {
                        new,
                        old: Some(old),
                    },
                }]);
                1
            }
            None => 0,
        })
    }

    async fn delete_scores(&self, table: Table, filter: ScoreFilter) -> StoreResult<u64> {
        self.check_online()?;
        expect_entity(table, Entity::Score)?;

        let removed = self.with_tables(|t| {
            let rows = t.scores.entry(table).or_default();
            let (gone, kept): (Vec<_>, Vec<_>) = rows.drain(..).partition(|r| filter.matches(r));
            *rows = kept;
            gone
        });
        let count = removed.len() as u64;

        self.publish(
            removed
                .into_iter()
                .map(|row| ChangeEvent::Score {
                    table,
                    change: RowChange::Delete(row),
                })
                .collect(),
        );
        Ok(count)
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.events.subscribe()
    }
}
