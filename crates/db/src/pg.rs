//! Postgres-backed [`RemoteStore`].
//!
//! Writes go through the repository functions. Change notifications come from
//! the `sewa_notify_change` trigger over `LISTEN`, are decoded, and fanned out
//! on a [`ChangeFeed`]. A lost listener connection is re-established with
//! backoff and the feed is restarted.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use eyre::Result;
use sqlx::postgres::PgListener;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::changes::{ChangeEvent, ChangeFeed, RawChange};
use crate::models::{AttendanceRow, ScoreRow, SewadarRow};
use crate::repositories::{attendance, scores, sewadars};
use crate::schema::CHANGE_CHANNEL;
use crate::store::{RemoteStore, ScoreFilter, StoreResult};
use crate::tables::Table;
use crate::{DbPool, create_pool};

const CHANNEL_CAPACITY: usize = 1024;
const RECONNECT_MIN_DELAY: Duration = Duration::from_millis(500);
const RECONNECT_MAX_DELAY: Duration = Duration::from_secs(30);

pub struct PgStore {
    pool: DbPool,
    events: Arc<ChangeFeed>,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = create_pool(database_url).await?;
        Self::from_pool(pool).await
    }

    /// Starts listening before returning so no change after this call is missed.
    pub async fn from_pool(pool: DbPool) -> Result<Self> {
        let events = Arc::new(ChangeFeed::new(CHANNEL_CAPACITY));

        let listener = listen(&pool).await?;
        info!("Listening for row changes on {}", CHANGE_CHANNEL);

        tokio::spawn(forward_changes(pool.clone(), listener, events.clone()));

        Ok(Self { pool, events })
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

async fn listen(pool: &DbPool) -> Result<PgListener> {
    let mut listener = PgListener::connect_with(pool).await?;
    listener.listen(CHANGE_CHANNEL).await?;
    Ok(listener)
}

async fn forward_changes(pool: DbPool, mut listener: PgListener, events: Arc<ChangeFeed>) {
    loop {
        // PgListener reconnects on its own; an error here means that failed.
        let notification = match listener.recv().await {
            Ok(notification) => notification,
            Err(e) => {
                error!("Change listener lost its connection: {}", e);
                listener = relisten(&pool).await;
                // Notifications sent while disconnected are gone; subscribers
                // see the feed close and re-read the tables.
                events.restart();
                info!("Change listener reconnected");
                continue;
            }
        };

        let event = RawChange::parse(notification.payload()).and_then(ChangeEvent::try_from);
        match event {
            Ok(event) => {
                debug!("{:?} on {}", event.event_type(), event.table());
                // No receivers is fine; nobody is listening yet.
                events.send(event);
            }
            Err(e) => warn!("Dropping change notification: {:#}", e),
        }
    }
}

/// Retries `LISTEN` with capped exponential backoff until it succeeds.
async fn relisten(pool: &DbPool) -> PgListener {
    let mut delay = RECONNECT_MIN_DELAY;
    loop {
        tokio::time::sleep(delay).await;
        match listen(pool).await {
            Ok(listener) => return listener,
            Err(e) => {
                warn!("Reconnecting change listener failed, retrying in {:?}: {}", delay, e);
                delay = (delay * 2).min(RECONNECT_MAX_DELAY);
            }
        }
    }
}

#[async_trait]
impl RemoteStore for PgStore {
    async fn select_sewadars(&self, table: Table) -> StoreResult<Vec<SewadarRow>> {
        sewadars::select_sewadars(&self.pool, table).await
    }

    async fn select_attendance(&self, table: Table) -> StoreResult<Vec<AttendanceRow>> {
        attendance::select_attendance(&self.pool, table).await
    }

    async fn select_scores(&self, table: Table) -> StoreResult<Vec<ScoreRow>> {
        scores::select_scores(&self.pool, table).await
    }

    async fn insert_sewadars(&self, table: Table, rows: Vec<SewadarRow>) -> StoreResult<()> {
        sewadars::insert_sewadars(&self.pool, table, rows).await
    }

    async fn delete_all_sewadars(&self, table: Table) -> StoreResult<u64> {
        sewadars::delete_all_sewadars(&self.pool, table).await
    }

    async fn insert_attendance(&self, table: Table, row: AttendanceRow) -> StoreResult<()> {
        attendance::insert_attendance(&self.pool, table, row).await
    }

    async fn delete_attendance(
        &self,
        table: Table,
        sewadar_id: String,
        date: NaiveDate,
    ) -> StoreResult<u64> {
        attendance::delete_attendance(&self.pool, table, &sewadar_id, date).await
    }

    async fn insert_score(&self, table: Table, row: ScoreRow) -> StoreResult<()> {
        scores::insert_score(&self.pool, table, row).await
    }

    async fn set_score_deleted(
        &self,
        table: Table,
        id: String,
        is_deleted: bool,
    ) -> StoreResult<u64> {
        scores::set_score_deleted(&self.pool, table, &id, is_deleted).await
    }

    async fn set_score_points(&self, table: Table, id: String, points: i32) -> StoreResult<u64> {
        scores::set_score_points(&self.pool, table, &id, points).await
    }

    async fn delete_scores(&self, table: Table, filter: ScoreFilter) -> StoreResult<u64> {
        scores::delete_scores(&self.pool, table, &filter).await
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.events.subscribe()
    }
}
