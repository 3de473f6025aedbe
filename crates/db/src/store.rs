use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::changes::ChangeEvent;
use crate::models::{AttendanceRow, ScoreRow, SewadarRow};
use crate::tables::{Entity, Table};

#[derive(Error, Debug)]
pub enum StoreError {
    /// A row with the same natural key already exists.
    #[error("Duplicate {key} in {table}")]
    UniqueViolation { table: Table, key: String },

    #[error("Table {0} does not hold {1} rows")]
    TableMismatch(Table, Entity),

    #[error("Remote store unavailable: {0}")]
    Unavailable(String),

    #[error("Remote store error: {0}")]
    Backend(#[from] eyre::Report),
}

impl StoreError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, StoreError::UniqueViolation { .. })
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Matches `Daily Attendance`-style score rows for one sewadar, one game, and
/// a half-open timestamp range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreFilter {
    pub sewadar_id: String,
    pub game: String,
    pub from_ms: i64,
    pub until_ms: i64,
}

impl ScoreFilter {
    pub fn matches(&self, row: &ScoreRow) -> bool {
        row.sewadar_id == self.sewadar_id
            && row.game == self.game
            && row.timestamp >= self.from_ms
            && row.timestamp < self.until_ms
    }
}

pub(crate) fn expect_entity(table: Table, entity: Entity) -> StoreResult<()> {
    if table.entity() == entity {
        Ok(())
    } else {
        Err(StoreError::TableMismatch(table, entity))
    }
}

/// The shared, durable system of record.
///
/// Every table is addressed explicitly; callers pick the partition. Natural
/// keys are unique: sewadar `id`, attendance `(sewadar_id, date)`, score `id`.
/// Counts returned by update/delete are affected rows.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn select_sewadars(&self, table: Table) -> StoreResult<Vec<SewadarRow>>;

    async fn select_attendance(&self, table: Table) -> StoreResult<Vec<AttendanceRow>>;

    async fn select_scores(&self, table: Table) -> StoreResult<Vec<ScoreRow>>;

    async fn insert_sewadars(&self, table: Table, rows: Vec<SewadarRow>) -> StoreResult<()>;

    async fn delete_all_sewadars(&self, table: Table) -> StoreResult<u64>;

    async fn insert_attendance(&self, table: Table, row: AttendanceRow) -> StoreResult<()>;

    async fn delete_attendance(
        &self,
        table: Table,
        sewadar_id: String,
        date: NaiveDate,
    ) -> StoreResult<u64>;

    async fn insert_score(&self, table: Table, row: ScoreRow) -> StoreResult<()>;

    async fn set_score_deleted(&self, table: Table, id: String, is_deleted: bool)
    -> StoreResult<u64>;

    async fn set_score_points(&self, table: Table, id: String, points: i32) -> StoreResult<u64>;

    async fn delete_scores(&self, table: Table, filter: ScoreFilter) -> StoreResult<u64>;

    /// Change notifications for all six tables. The receiver closes when the
    /// feed restarts after an outage; subscribers then re-read every table.
    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent>;
}
