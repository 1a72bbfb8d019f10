//! Fact reconciliation
//!
//! Brings the stored facts of one host and one taxonomy in line with a freshly
//! reported fact map in three phases:
//!
//! 1. delete stored facts missing from the report
//! 2. add reported facts missing from the store
//! 3. update stored facts whose value changed
//!
//! The phases are separate database interactions. A fact that fails to be
//! added is logged and flags the run as failed, but the remaining facts and
//! the update phase still run; the failure is reported once at the end.

use super::normalize::{normalize, NormalizedFacts};
use super::FactImporter;
use crate::db::audits::{self, AuditEntry};
use crate::db::hosts::Host;
use crate::db::{fact_names, fact_values};
use hostfacts_common::config::ImportConfig;
use hostfacts_common::db::{AuditAction, FactName, FactValue, StoredFact};
use hostfacts_common::{Error, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::SqlitePool;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Number of facts touched by each phase of one import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportCounters {
    /// Facts considered for addition, including ones that failed
    pub added: usize,
    pub updated: usize,
    pub deleted: usize,
}

/// Per-run reconciliation settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Write a `fact_audits` row with every fact value change
    pub audit: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self { audit: true }
    }
}

impl ReconcileOptions {
    pub fn from_config(config: &ImportConfig) -> Self {
        Self {
            audit: config.audit_fact_changes,
        }
    }
}

/// Reconciles one host's reported facts against the database
///
/// For a host that is not saved yet the stored set is the host's pending
/// fact values, so repeated imports before [`save_host`](crate::save_host)
/// edit those in place.
pub struct FactReconciler<'a> {
    pool: &'a SqlitePool,
    importer: Arc<dyn FactImporter>,
    host: &'a mut Host,
    facts: NormalizedFacts,
    options: ReconcileOptions,
    counters: ImportCounters,
    error: bool,
}

impl<'a> FactReconciler<'a> {
    /// Normalize `raw` facts for `host` under `importer`'s taxonomy
    pub fn new(
        pool: &'a SqlitePool,
        importer: Arc<dyn FactImporter>,
        host: &'a mut Host,
        raw: &Map<String, Value>,
    ) -> Self {
        Self {
            pool,
            importer,
            host,
            facts: normalize(raw),
            options: ReconcileOptions::default(),
            counters: ImportCounters::default(),
            error: false,
        }
    }

    pub fn with_options(mut self, options: ReconcileOptions) -> Self {
        self.options = options;
        self
    }

    /// Normalized facts this reconciler will store
    pub fn facts(&self) -> &NormalizedFacts {
        &self.facts
    }

    /// Counters of the last [`import`](Self::import), also after a failed one
    pub fn counters(&self) -> ImportCounters {
        self.counters
    }

    /// Run all three phases
    ///
    /// Returns [`Error::ImportFailed`] after every phase ran if any fact
    /// could not be added. Changes made up to that point stay committed.
    pub async fn import(&mut self) -> Result<ImportCounters> {
        self.error = false;
        self.counters = ImportCounters::default();

        self.delete_removed_facts().await?;
        let stored = self.add_new_facts().await?;
        self.update_facts(&stored).await?;

        if self.error {
            return Err(Error::ImportFailed {
                host: self.host.name.clone(),
            });
        }

        info!(
            "Import facts for '{}' completed. Added: {}, Updated: {}, Deleted {} facts",
            self.host, self.counters.added, self.counters.updated, self.counters.deleted
        );
        Ok(self.counters)
    }

    fn fact_type(&self) -> String {
        self.importer.fact_name_type().to_string()
    }

    /// Stored facts of this taxonomy keyed by name
    async fn stored_facts(&self, fact_type: &str) -> Result<BTreeMap<String, StoredFact>> {
        let stored = if self.host.is_new_record() {
            self.host.pending_facts(fact_type)
        } else {
            fact_values::load_for_host(self.pool, self.host.guid, fact_type).await?
        };

        Ok(stored
            .into_iter()
            .map(|fact| (fact.name.clone(), fact))
            .collect())
    }

    async fn delete_removed_facts(&mut self) -> Result<()> {
        let fact_type = self.fact_type();
        let removed: Vec<StoredFact> = self
            .stored_facts(&fact_type)
            .await?
            .into_values()
            .filter(|fact| !self.facts.contains_key(&fact.name))
            .collect();

        // One statement per row so each deletion gets its own audit record
        for fact in &removed {
            self.destroy_fact_value(fact, &fact_type).await?;
        }

        self.counters.deleted = removed.len();
        debug!(
            "Merging facts for '{}': deleted {} facts",
            self.host, self.counters.deleted
        );
        Ok(())
    }

    /// Returns the stored facts as they were before any addition
    async fn add_new_facts(&mut self) -> Result<BTreeMap<String, StoredFact>> {
        let fact_type = self.fact_type();
        let stored = self.stored_facts(&fact_type).await?;

        let to_create: Vec<String> = self
            .facts
            .keys()
            .filter(|name| !stored.contains_key(*name))
            .cloned()
            .collect();

        if !to_create.is_empty() {
            let mut fact_names = fact_names::index_by_type(self.pool, &fact_type).await?;
            for name in &to_create {
                let value = self.facts[name].clone();
                if let Err(e) = self.add_fact(&mut fact_names, &fact_type, name, &value).await {
                    error!("Fact {} could not be imported because of {}", name, e);
                    self.error = true;
                }
            }
        }

        self.counters.added = to_create.len();
        debug!(
            "Merging facts for '{}': added {} facts",
            self.host, self.counters.added
        );
        Ok(stored)
    }

    async fn add_fact(
        &mut self,
        fact_names: &mut HashMap<String, FactName>,
        fact_type: &str,
        name: &str,
        value: &str,
    ) -> Result<()> {
        let fact_name = match fact_names.get(name) {
            Some(fact_name) => fact_name.clone(),
            None => {
                let created = fact_names::create(self.pool, fact_type, name).await?;
                fact_names.insert(name.to_string(), created.clone());
                created
            }
        };

        // An unsaved host has no row to reference yet
        if self.host.is_new_record() {
            self.host.build_fact_value(&fact_name, value);
            return Ok(());
        }

        let fact_value = FactValue::new(self.host.guid, fact_name.guid, value);
        if !self.options.audit {
            return fact_values::create(self.pool, &fact_value).await;
        }

        let mut tx = self.pool.begin().await?;
        fact_values::create(&mut *tx, &fact_value).await?;
        audits::record(
            &mut *tx,
            AuditEntry {
                host_id: self.host.guid,
                fact_name: name,
                fact_type,
                action: AuditAction::Create,
                old_value: None,
                new_value: Some(value),
            },
        )
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn update_facts(&mut self, stored: &BTreeMap<String, StoredFact>) -> Result<()> {
        let fact_type = self.fact_type();

        let to_update: Vec<(String, &StoredFact)> = stored
            .values()
            .filter_map(|fact| match self.facts.get(&fact.name) {
                Some(new_value) if *new_value != fact.value => Some((new_value.clone(), fact)),
                _ => None,
            })
            .collect();

        self.counters.updated = to_update.len();
        if to_update.is_empty() {
            debug!("No facts update required for {}", self.host);
            return Ok(());
        }

        debug!(
            "Merging facts for '{}': updated {} facts",
            self.host, self.counters.updated
        );

        for (new_value, fact) in to_update {
            self.update_fact_value(fact, &new_value, &fact_type).await?;
        }
        Ok(())
    }

    async fn destroy_fact_value(&mut self, fact: &StoredFact, fact_type: &str) -> Result<()> {
        if self.host.is_new_record() {
            self.host.discard_pending_fact_value(fact.value_id);
            return Ok(());
        }

        if !self.options.audit {
            return fact_values::destroy(self.pool, fact.value_id).await;
        }

        let mut tx = self.pool.begin().await?;
        fact_values::destroy(&mut *tx, fact.value_id).await?;
        audits::record(
            &mut *tx,
            AuditEntry {
                host_id: self.host.guid,
                fact_name: &fact.name,
                fact_type,
                action: AuditAction::Destroy,
                old_value: Some(&fact.value),
                new_value: None,
            },
        )
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn update_fact_value(
        &mut self,
        fact: &StoredFact,
        new_value: &str,
        fact_type: &str,
    ) -> Result<()> {
        if self.host.is_new_record() {
            self.host.update_pending_fact_value(fact.value_id, new_value);
            return Ok(());
        }

        if !self.options.audit {
            return fact_values::update_value(self.pool, fact.value_id, new_value).await;
        }

        let mut tx = self.pool.begin().await?;
        fact_values::update_value(&mut *tx, fact.value_id, new_value).await?;
        audits::record(
            &mut *tx,
            AuditEntry {
                host_id: self.host.guid,
                fact_name: &fact.name,
                fact_type,
                action: AuditAction::Update,
                old_value: Some(&fact.value),
                new_value: Some(new_value),
            },
        )
        .await?;
        tx.commit().await?;
        Ok(())
    }
}
