pub mod changes;
pub mod memory;
pub mod mock;
pub mod models;
pub mod pg;
pub mod repositories;
pub mod schema;
pub mod store;
pub mod tables;

pub use changes::{ChangeEvent, ChangeFeed, EventType, RowChange};
pub use memory::MemoryStore;
pub use pg::PgStore;
pub use store::{RemoteStore, ScoreFilter, StoreError, StoreResult};
pub use tables::{Entity, Table};

use eyre::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};

pub type DbPool = Pool<Postgres>;

pub async fn create_pool(database_url: &str) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}
