use crate::models::ScoreRow;
use crate::repositories::map_write_error;
use crate::store::{ScoreFilter, StoreResult, expect_entity};
use crate::tables::{Entity, Table};
use sqlx::{Pool, Postgres};

pub async fn select_scores(pool: &Pool<Postgres>, table: Table) -> StoreResult<Vec<ScoreRow>> {
    expect_entity(table, Entity::Score)?;

    let rows = sqlx::query_as::<_, ScoreRow>(&format!(
        r#"
        SELECT id, sewadar_id, name, game, points, "timestamp", volunteer_id, is_deleted
        FROM {}
        ORDER BY "timestamp" ASC
        "#,
        table
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn insert_score(pool: &Pool<Postgres>, table: Table, row: ScoreRow) -> StoreResult<()> {
    expect_entity(table, Entity::Score)?;

    sqlx::query(&format!(
        r#"
        INSERT INTO {} (id, sewadar_id, name, game, points, "timestamp", volunteer_id, is_deleted)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
        table
    ))
    .bind(&row.id)
    .bind(&row.sewadar_id)
    .bind(&row.name)
    .bind(&row.game)
    .bind(row.points)
    .bind(row.timestamp)
    .bind(&row.volunteer_id)
    .bind(row.is_deleted)
    .execute(pool)
    .await
    .map_err(|e| map_write_error(table, row.id.clone(), e))?;

    Ok(())
}

pub async fn set_score_deleted(
    pool: &Pool<Postgres>,
    table: Table,
    id: &str,
    is_deleted: bool,
) -> StoreResult<u64> {
    expect_entity(table, Entity::Score)?;

    let result = sqlx::query(&format!(
        r#"
        UPDATE {}
        SET is_deleted = $2
        WHERE id = $1
        "#,
        table
    ))
    .bind(id)
    .bind(is_deleted)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

pub async fn set_score_points(
    pool: &Pool<Postgres>,
    table: Table,
    id: &str,
    points: i32,
) -> StoreResult<u64> {
    expect_entity(table, Entity::Score)?;

    let result = sqlx::query(&format!(
        r#"
        UPDATE {}
        SET points = $2
        WHERE id = $1
        "#,
        table
    ))
    .bind(id)
    .bind(points)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

pub async fn delete_scores(
    pool: &Pool<Postgres>,
    table: Table,
    filter: &ScoreFilter,
) -> StoreResult<u64> {
    expect_entity(table, Entity::Score)?;

    let result = sqlx::query(&format!(
        r#"
        DELETE FROM {}
        WHERE sewadar_id = $1 AND game = $2 AND "timestamp" >= $3 AND "timestamp" < $4
        "#,
        table
    ))
    .bind(&filter.sewadar_id)
    .bind(&filter.game)
    .bind(filter.from_ms)
    .bind(filter.until_ms)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
