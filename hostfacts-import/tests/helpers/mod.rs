//! Shared fixtures for fact import integration tests

#![allow(dead_code)]

use hostfacts_import::db::fact_values;
use hostfacts_import::{save_host, Host};
use serde_json::{Map, Value};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::collections::BTreeMap;

/// In-memory database with the hostfacts schema
///
/// Single connection so every query sees the same in-memory database.
pub async fn test_pool() -> SqlitePool {
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

/// Host row that already exists in the database
pub async fn saved_host(pool: &SqlitePool, name: &str) -> Host {
    let mut host = Host::new(name);
    save_host(pool, &mut host, false).await.expect("Failed to save host");
    host
}

/// JSON object literal as a fact map
pub fn facts(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("fact fixture must be an object, got {}", other),
    }
}

/// Stored facts of one taxonomy as a name to value map
pub async fn stored_facts(
    pool: &SqlitePool,
    host: &Host,
    fact_type: &str,
) -> BTreeMap<String, String> {
    fact_values::load_for_host(pool, host.guid, fact_type)
        .await
        .expect("Failed to load facts")
        .into_iter()
        .map(|fact| (fact.name, fact.value))
        .collect()
}

pub fn map(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
