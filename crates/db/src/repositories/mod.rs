pub mod attendance;
pub mod scores;
pub mod sewadars;

use crate::store::StoreError;
use crate::tables::Table;

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(err.to_string())
            }
            other => StoreError::Backend(eyre::Report::new(other)),
        }
    }
}

/// Turns a key collision into [`StoreError::UniqueViolation`] so callers can
/// tell a lost race from a broken connection.
pub(crate) fn map_write_error(table: Table, key: String, err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::UniqueViolation { table, key }
        }
        _ => err.into(),
    }
}
