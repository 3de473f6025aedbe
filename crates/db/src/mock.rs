use async_trait::async_trait;
use chrono::NaiveDate;
use mockall::mock;
use tokio::sync::broadcast;

use crate::changes::ChangeEvent;
use crate::models::{AttendanceRow, ScoreRow, SewadarRow};
use crate::store::{RemoteStore, ScoreFilter, StoreResult};
use crate::tables::Table;

mock! {
    pub Remote {}

    #[async_trait]
    impl RemoteStore for Remote {
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
        async fn set_score_deleted(
            &self,
            table: Table,
            id: String,
            is_deleted: bool,
        ) -> StoreResult<u64>;
        async fn set_score_points(&self, table: Table, id: String, points: i32) -> StoreResult<u64>;
        async fn delete_scores(&self, table: Table, filter: ScoreFilter) -> StoreResult<u64>;
        fn subscribe(&self) -> broadcast::Receiver<ChangeEvent>;
    }
}
