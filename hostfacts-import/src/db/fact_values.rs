//! Fact value database operations

use hostfacts_common::db::{FactValue, StoredFact};
use hostfacts_common::Result;
use sqlx::{Row, Sqlite, SqlitePool};
use uuid::Uuid;

/// Load a host's fact values for one taxonomy, joined with their names
///
/// Ordered by fact name so callers see a stable order.
pub async fn load_for_host(
    pool: &SqlitePool,
    host_id: Uuid,
    fact_type: &str,
) -> Result<Vec<StoredFact>> {
    let rows = sqlx::query(
        r#"
        SELECT v.guid AS value_id, n.name, v.value
        FROM fact_values v
        JOIN fact_names n ON n.guid = v.fact_name_id
        WHERE v.host_id = ? AND n.fact_type = ?
        ORDER BY n.name
        "#,
    )
    .bind(host_id.to_string())
    .bind(fact_type)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            let value_id: String = row.get("value_id");
            Ok(StoredFact {
                value_id: Uuid::parse_str(&value_id)?,
                name: row.get("name"),
                value: row.get("value"),
            })
        })
        .collect()
}

/// Insert a fact value
pub async fn create<'e, E>(executor: E, fact_value: &FactValue) -> Result<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO fact_values (guid, host_id, fact_name_id, value, created_at, updated_at)
        VALUES (?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(fact_value.guid.to_string())
    .bind(fact_value.host_id.to_string())
    .bind(fact_value.fact_name_id.to_string())
    .bind(&fact_value.value)
    .execute(executor)
    .await?;

    Ok(())
}

/// Overwrite the value of one fact value row
pub async fn update_value<'e, E>(executor: E, value_id: Uuid, value: &str) -> Result<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query("UPDATE fact_values SET value = ?, updated_at = CURRENT_TIMESTAMP WHERE guid = ?")
        .bind(value)
        .bind(value_id.to_string())
        .execute(executor)
        .await?;

    Ok(())
}

/// Delete one fact value row
pub async fn destroy<'e, E>(executor: E, value_id: Uuid) -> Result<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query("DELETE FROM fact_values WHERE guid = ?")
        .bind(value_id.to_string())
        .execute(executor)
        .await?;

    Ok(())
}
