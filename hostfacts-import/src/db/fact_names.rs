//! Fact name database operations

use hostfacts_common::db::FactName;
use hostfacts_common::Result;
use sqlx::{Row, Sqlite, SqlitePool};
use std::collections::HashMap;
use uuid::Uuid;

/// Load every fact name of one taxonomy, indexed by name
pub async fn index_by_type(
    pool: &SqlitePool,
    fact_type: &str,
) -> Result<HashMap<String, FactName>> {
    let rows = sqlx::query("SELECT guid, name, fact_type FROM fact_names WHERE fact_type = ?")
        .bind(fact_type)
        .fetch_all(pool)
        .await?;

    let mut index = HashMap::with_capacity(rows.len());
    for row in rows {
        let fact_name = fact_name_from_row(&row)?;
        index.insert(fact_name.name.clone(), fact_name);
    }

    Ok(index)
}

/// Insert a new fact name
///
/// Fails with a unique violation if the (fact_type, name) pair already exists.
pub async fn create<'e, E>(executor: E, fact_type: &str, name: &str) -> Result<FactName>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let fact_name = FactName::new(fact_type, name);

    sqlx::query("INSERT INTO fact_names (guid, name, fact_type) VALUES (?, ?, ?)")
        .bind(fact_name.guid.to_string())
        .bind(&fact_name.name)
        .bind(&fact_name.fact_type)
        .execute(executor)
        .await?;

    Ok(fact_name)
}

fn fact_name_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<FactName> {
    let guid: String = row.get("guid");
    Ok(FactName {
        guid: Uuid::parse_str(&guid)?,
        name: row.get("name"),
        fact_type: row.get("fact_type"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        hostfacts_common::db::create_schema(&pool)
            .await
            .expect("Schema initialization failed");
        pool
    }

    #[tokio::test]
    async fn test_create_and_index() {
        let pool = test_pool().await;

        create(&pool, "puppet", "os").await.unwrap();
        create(&pool, "puppet", "kernel").await.unwrap();
        create(&pool, "ansible", "os").await.unwrap();

        let index = index_by_type(&pool, "puppet").await.unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index["os"].fact_type, "puppet");

        let ansible = index_by_type(&pool, "ansible").await.unwrap();
        assert_eq!(ansible.len(), 1);
        assert_ne!(ansible["os"].guid, index["os"].guid);
        assert!(!ansible.contains_key("kernel"));
    }

    #[tokio::test]
    async fn test_duplicate_create_fails() {
        let pool = test_pool().await;

        create(&pool, "puppet", "os").await.unwrap();
        assert!(create(&pool, "puppet", "os").await.is_err());
    }
}
