//! Tests for database initialization and schema constraints

use hostfacts_common::db::{
    create_schema, get_schema_version, init_database, CURRENT_SCHEMA_VERSION,
};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    create_schema(&pool).await.expect("Schema creation failed");
    pool
}

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("nested").join("hostfacts.db");

    let result = init_database(&db_path).await;

    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("hostfacts.db");

    let pool1 = init_database(&db_path).await.unwrap();
    sqlx::query("INSERT INTO hosts (guid, name) VALUES ('h1', 'web01.example.com')")
        .execute(&pool1)
        .await
        .unwrap();
    pool1.close().await;

    let pool2 = init_database(&db_path).await;
    assert!(pool2.is_ok(), "Failed to open existing database: {:?}", pool2.as_ref().err());
    let pool2 = pool2.unwrap();

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM hosts")
        .fetch_one(&pool2)
        .await
        .unwrap();
    assert_eq!(count, 1, "Existing rows must survive re-initialization");
}

#[tokio::test]
async fn test_schema_version_recorded() {
    let pool = memory_pool().await;

    // Running it twice must not fail or add versions
    create_schema(&pool).await.unwrap();

    assert_eq!(get_schema_version(&pool).await.unwrap(), CURRENT_SCHEMA_VERSION);
}

#[tokio::test]
async fn test_fact_name_unique_per_type() {
    let pool = memory_pool().await;

    sqlx::query("INSERT INTO fact_names (guid, name, fact_type) VALUES ('n1', 'os', 'puppet')")
        .execute(&pool)
        .await
        .unwrap();

    // Same name under another taxonomy is fine
    sqlx::query("INSERT INTO fact_names (guid, name, fact_type) VALUES ('n2', 'os', 'ansible')")
        .execute(&pool)
        .await
        .unwrap();

    let duplicate = sqlx::query(
        "INSERT INTO fact_names (guid, name, fact_type) \
         VALUES ('n3', 'os', 'puppet')",
    )
    .execute(&pool)
    .await;
    assert!(duplicate.is_err(), "Duplicate (fact_type, name) must be rejected");
}

#[tokio::test]
async fn test_fact_values_cascade_with_host() {
    let pool = memory_pool().await;

    sqlx::query("INSERT INTO hosts (guid, name) VALUES ('h1', 'db01')")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO fact_names (guid, name, fact_type) VALUES ('n1', 'os', 'puppet')")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query(
        "INSERT INTO fact_values (guid, host_id, fact_name_id, value) \
         VALUES ('v1', 'h1', 'n1', 'linux')",
    )
    .execute(&pool)
    .await
    .unwrap();

    let duplicate = sqlx::query(
        "INSERT INTO fact_values (guid, host_id, fact_name_id, value) \
         VALUES ('v2', 'h1', 'n1', 'bsd')",
    )
    .execute(&pool)
    .await;
    assert!(duplicate.is_err(), "One value per (host, fact name)");

    sqlx::query("DELETE FROM hosts WHERE guid = 'h1'")
        .execute(&pool)
        .await
        .unwrap();

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM fact_values")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0, "Fact values must be removed with their host");

    let names: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM fact_names")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(names, 1, "Fact names are not owned by hosts");
}

#[tokio::test]
async fn test_fact_values_require_existing_host() {
    let pool = memory_pool().await;

    sqlx::query("INSERT INTO fact_names (guid, name, fact_type) VALUES ('n1', 'os', 'puppet')")
        .execute(&pool)
        .await
        .unwrap();

    let orphan = sqlx::query(
        "INSERT INTO fact_values (guid, host_id, fact_name_id, value) \
         VALUES ('v1', 'missing', 'n1', 'linux')",
    )
    .execute(&pool)
    .await;
    assert!(orphan.is_err(), "Foreign keys must be enforced");
}

#[tokio::test]
async fn test_audit_action_constrained() {
    let pool = memory_pool().await;

    let bad = sqlx::query(
        "INSERT INTO fact_audits (host_id, fact_name, fact_type, action) \
         VALUES ('h1', 'os', 'puppet', 'rename')",
    )
    .execute(&pool)
    .await;
    assert!(bad.is_err());
}
