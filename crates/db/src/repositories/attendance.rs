use crate::models::AttendanceRow;
use crate::repositories::map_write_error;
use crate::store::{StoreResult, expect_entity};
use crate::tables::{Entity, Table};
use chrono::NaiveDate;
use sqlx::{Pool, Postgres};

pub async fn select_attendance(
    pool: &Pool<Postgres>,
    table: Table,
) -> StoreResult<Vec<AttendanceRow>> {
    expect_entity(table, Entity::Attendance)?;

    let rows = sqlx::query_as::<_, AttendanceRow>(&format!(
        r#"
        SELECT sewadar_id, name, "date", "timestamp", volunteer_id
        FROM {}
        ORDER BY "timestamp" ASC
        "#,
        table
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Fails with `UniqueViolation` when the sewadar is already marked that day.
pub async fn insert_attendance(
    pool: &Pool<Postgres>,
    table: Table,
    row: AttendanceRow,
) -> StoreResult<()> {
    expect_entity(table, Entity::Attendance)?;

    sqlx::query(&format!(
        r#"
        INSERT INTO {} (sewadar_id, name, "date", "timestamp", volunteer_id)
        VALUES ($1, $2, $3, $4, $5)
        "#,
        table
    ))
    .bind(&row.sewadar_id)
    .bind(&row.name)
    .bind(row.date)
    .bind(row.timestamp)
    .bind(&row.volunteer_id)
    .execute(pool)
    .await
    .map_err(|e| map_write_error(table, format!("({}, {})", row.sewadar_id, row.date), e))?;

    Ok(())
}

pub async fn delete_attendance(
    pool: &Pool<Postgres>,
    table: Table,
    sewadar_id: &str,
    date: NaiveDate,
) -> StoreResult<u64> {
    expect_entity(table, Entity::Attendance)?;

    let result = sqlx::query(&format!(
        r#"
        DELETE FROM {}
        WHERE sewadar_id = $1 AND "date" = $2
        "#,
        table
    ))
    .bind(sewadar_id)
    .bind(date)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
