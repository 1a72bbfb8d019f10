//! Host database operations
//!
//! A host that has not been saved yet has no row, so fact values for it are
//! built in memory and written by [`save_host`].

use crate::db::{audits, fact_values};
use hostfacts_common::db::{AuditAction, FactName, FactValue, StoredFact};
use hostfacts_common::Result;
use sqlx::{Row, SqlitePool};
use std::fmt;
use tracing::debug;
use uuid::Uuid;

/// Fact value built for an unsaved host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFactValue {
    pub fact_name: FactName,
    pub fact_value: FactValue,
}

/// Managed host
#[derive(Debug, Clone)]
pub struct Host {
    pub guid: Uuid,
    pub name: String,
    new_record: bool,
    pending: Vec<PendingFactValue>,
}

impl Host {
    /// Build a host that is not yet stored
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            guid: Uuid::new_v4(),
            name: name.into(),
            new_record: true,
            pending: Vec::new(),
        }
    }

    /// True until the host has been written by [`save_host`]
    pub fn is_new_record(&self) -> bool {
        self.new_record
    }

    /// Attach a fact value in memory without writing it
    pub fn build_fact_value(&mut self, fact_name: &FactName, value: &str) {
        let fact_value = FactValue::new(self.guid, fact_name.guid, value);
        self.pending.push(PendingFactValue {
            fact_name: fact_name.clone(),
            fact_value,
        });
    }

    /// Fact values waiting for the host to be saved
    pub fn pending_fact_values(&self) -> &[PendingFactValue] {
        &self.pending
    }

    /// Pending fact values of one taxonomy, in the shape of stored rows
    pub fn pending_facts(&self, fact_type: &str) -> Vec<StoredFact> {
        self.pending
            .iter()
            .filter(|pending| pending.fact_name.fact_type == fact_type)
            .map(|pending| StoredFact {
                value_id: pending.fact_value.guid,
                name: pending.fact_name.name.clone(),
                value: pending.fact_value.value.clone(),
            })
            .collect()
    }

    /// Drop a pending fact value; false if no pending value has that id
    pub fn discard_pending_fact_value(&mut self, value_id: Uuid) -> bool {
        let before = self.pending.len();
        self.pending.retain(|pending| pending.fact_value.guid != value_id);
        self.pending.len() != before
    }

    /// Replace the value of a pending fact value in place
    pub fn update_pending_fact_value(&mut self, value_id: Uuid, value: &str) -> bool {
        match self
            .pending
            .iter_mut()
            .find(|pending| pending.fact_value.guid == value_id)
        {
            Some(pending) => {
                pending.fact_value.value = value.to_string();
                true
            }
            None => false,
        }
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Load host by name
pub async fn find_host_by_name(pool: &SqlitePool, name: &str) -> Result<Option<Host>> {
    let row = sqlx::query("SELECT guid, name FROM hosts WHERE name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => {
            let guid_str: String = row.get("guid");
            Ok(Some(Host {
                guid: Uuid::parse_str(&guid_str)?,
                name: row.get("name"),
                new_record: false,
                pending: Vec::new(),
            }))
        }
        None => Ok(None),
    }
}

/// Load host by name, or build an unsaved one
pub async fn find_or_build_host(pool: &SqlitePool, name: &str) -> Result<Host> {
    match find_host_by_name(pool, name).await? {
        Some(host) => Ok(host),
        None => {
            debug!("Host '{}' not found, building new record", name);
            Ok(Host::new(name))
        }
    }
}

/// Save host and flush its pending fact values
///
/// The host row and every pending value are written in one transaction.
/// When `audit` is set each flushed value gets a `create` audit row.
pub async fn save_host(pool: &SqlitePool, host: &mut Host, audit: bool) -> Result<()> {
    let mut tx = pool.begin().await?;

    if host.new_record {
        sqlx::query(
            r#"
            INSERT INTO hosts (guid, name, created_at, updated_at)
            VALUES (?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
            "#,
        )
        .bind(host.guid.to_string())
        .bind(&host.name)
        .execute(&mut *tx)
        .await?;
    } else {
        sqlx::query("UPDATE hosts SET name = ?, updated_at = CURRENT_TIMESTAMP WHERE guid = ?")
            .bind(&host.name)
            .bind(host.guid.to_string())
            .execute(&mut *tx)
            .await?;
    }

    for pending in &host.pending {
        fact_values::create(&mut *tx, &pending.fact_value).await?;
        if audit {
            audits::record(
                &mut *tx,
                audits::AuditEntry {
                    host_id: host.guid,
                    fact_name: &pending.fact_name.name,
                    fact_type: &pending.fact_name.fact_type,
                    action: AuditAction::Create,
                    old_value: None,
                    new_value: Some(&pending.fact_value.value),
                },
            )
            .await?;
        }
    }

    tx.commit().await?;

    debug!(
        "Saved host '{}' with {} pending fact values",
        host.name,
        host.pending.len()
    );
    host.pending.clear();
    host.new_record = false;

    Ok(())
}
