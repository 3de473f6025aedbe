use eyre::Result;
use sqlx::{Pool, Postgres};
use tracing::info;

use crate::tables::{Entity, Table};

/// `LISTEN` channel every table publishes its row changes on.
pub const CHANGE_CHANNEL: &str = "sewa_changes";

pub async fn initialize_database(pool: &Pool<Postgres>) -> Result<()> {
    info!("Initializing database schema...");

    for table in Table::pair(Entity::Sewadar) {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                gender TEXT NOT NULL,
                "group" TEXT NOT NULL
            );
            "#,
            table
        ))
        .execute(pool)
        .await?;
    }

    // One mark per sewadar per day; a concurrent second insert fails here.
    for table in Table::pair(Entity::Attendance) {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                sewadar_id TEXT NOT NULL,
                name TEXT NOT NULL DEFAULT '',
                "date" DATE NOT NULL,
                "timestamp" BIGINT NOT NULL,
                volunteer_id TEXT NOT NULL,
                PRIMARY KEY (sewadar_id, "date")
            );
            "#,
            table
        ))
        .execute(pool)
        .await?;
    }

    for table in Table::pair(Entity::Score) {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id TEXT PRIMARY KEY,
                sewadar_id TEXT NOT NULL,
                name TEXT NOT NULL DEFAULT '',
                game TEXT NOT NULL,
                points INTEGER NOT NULL,
                "timestamp" BIGINT NOT NULL,
                volunteer_id TEXT NOT NULL,
                is_deleted BOOLEAN NOT NULL DEFAULT FALSE
            );
            "#,
            table
        ))
        .execute(pool)
        .await?;

        sqlx::query(&format!(
            "CREATE INDEX IF NOT EXISTS idx_{0}_sewadar_game ON {0}(sewadar_id, game);",
            table
        ))
        .execute(pool)
        .await?;
    }

    // Row change feed: {table, eventType, new, old}
    sqlx::query(&format!(
        r#"
        CREATE OR REPLACE FUNCTION sewa_notify_change() RETURNS trigger AS $$
        BEGIN
            PERFORM pg_notify('{}', json_build_object(
                'table', TG_TABLE_NAME,
                'eventType', TG_OP,
                'new', CASE WHEN TG_OP = 'DELETE' THEN NULL ELSE row_to_json(NEW) END,
                'old', CASE WHEN TG_OP = 'INSERT' THEN NULL ELSE row_to_json(OLD) END
            )::text);
            RETURN NULL;
        END;
        $$ LANGUAGE plpgsql;
        "#,
        CHANGE_CHANNEL
    ))
    .execute(pool)
    .await?;

    for table in Table::ALL {
        sqlx::query(&format!("DROP TRIGGER IF EXISTS sewa_notify ON {};", table))
            .execute(pool)
            .await?;

        sqlx::query(&format!(
            r#"
            CREATE TRIGGER sewa_notify
            AFTER INSERT OR UPDATE OR DELETE ON {}
            FOR EACH ROW EXECUTE FUNCTION sewa_notify_change();
            "#,
            table
        ))
        .execute(pool)
        .await?;
    }

    info!("Database schema initialized successfully.");
    Ok(())
}
