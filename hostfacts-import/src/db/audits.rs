//! Fact audit trail
//!
//! Rows are written alongside each per-row fact value change, inside the same
//! transaction as the change itself.

use hostfacts_common::db::{AuditAction, FactAudit};
use hostfacts_common::{Error, Result};
use sqlx::{Row, Sqlite, SqlitePool};
use uuid::Uuid;

/// One change to record
#[derive(Debug, Clone, Copy)]
pub struct AuditEntry<'a> {
    pub host_id: Uuid,
    pub fact_name: &'a str,
    pub fact_type: &'a str,
    pub action: AuditAction,
    pub old_value: Option<&'a str>,
    pub new_value: Option<&'a str>,
}

/// Write one audit row
pub async fn record<'e, E>(executor: E, entry: AuditEntry<'_>) -> Result<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO fact_audits (host_id, fact_name, fact_type, action, old_value, new_value)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(entry.host_id.to_string())
    .bind(entry.fact_name)
    .bind(entry.fact_type)
    .bind(entry.action.as_str())
    .bind(entry.old_value)
    .bind(entry.new_value)
    .execute(executor)
    .await?;

    Ok(())
}

/// Load a host's audit trail, oldest first
pub async fn for_host(pool: &SqlitePool, host_id: Uuid) -> Result<Vec<FactAudit>> {
    let rows = sqlx::query(
        r#"
        SELECT id, host_id, fact_name, fact_type, action, old_value, new_value, created_at
        FROM fact_audits
        WHERE host_id = ?
        ORDER BY id
        "#,
    )
    .bind(host_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            let host_id: String = row.get("host_id");
            let action: String = row.get("action");
            Ok(FactAudit {
                id: row.get("id"),
                host_id: Uuid::parse_str(&host_id)?,
                fact_name: row.get("fact_name"),
                fact_type: row.get("fact_type"),
                action: AuditAction::parse(&action).ok_or_else(|| {
                    Error::InvalidInput(format!("Unknown audit action '{}'", action))
                })?,
                old_value: row.get("old_value"),
                new_value: row.get("new_value"),
                created_at: row.try_get("created_at")?,
            })
        })
        .collect()
}
