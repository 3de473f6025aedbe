use crate::models::SewadarRow;
use crate::repositories::map_write_error;
use crate::store::{StoreResult, expect_entity};
use crate::tables::{Entity, Table};
use sqlx::{Pool, Postgres};

pub async fn select_sewadars(pool: &Pool<Postgres>, table: Table) -> StoreResult<Vec<SewadarRow>> {
    expect_entity(table, Entity::Sewadar)?;

    let rows = sqlx::query_as::<_, SewadarRow>(&format!(
        r#"
        SELECT id, name, gender, "group"
        FROM {}
        ORDER BY name ASC
        "#,
        table
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Inserts the whole batch in one transaction.
pub async fn insert_sewadars(
    pool: &Pool<Postgres>,
    table: Table,
    rows: Vec<SewadarRow>,
) -> StoreResult<()> {
    expect_entity(table, Entity::Sewadar)?;

    let sql = format!(
        r#"
        INSERT INTO {} (id, name, gender, "group")
        VALUES ($1, $2, $3, $4)
        "#,
        table
    );

    let mut tx = pool.begin().await?;
    for row in rows {
        sqlx::query(&sql)
            .bind(&row.id)
            .bind(&row.name)
            .bind(&row.gender)
            .bind(&row.group)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_write_error(table, row.id.clone(), e))?;
    }
    tx.commit().await?;

    tracing::debug!("Inserted sewadar batch into {}", table);
    Ok(())
}

pub async fn delete_all_sewadars(pool: &Pool<Postgres>, table: Table) -> StoreResult<u64> {
    expect_entity(table, Entity::Sewadar)?;

    let result = sqlx::query(&format!("DELETE FROM {}", table))
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
