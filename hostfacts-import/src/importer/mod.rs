//! Fact importers
//!
//! An importer is the strategy for one fact source (Puppet, Ansible, a custom
//! agent): it names the fact taxonomy it owns and the smart proxy features
//! allowed to upload its facts. The [`FactReconciler`] does the actual diff
//! against the database for whichever importer it is given.

pub mod normalize;
pub mod reconciler;
pub mod registry;

pub use normalize::{normalize, NormalizedFacts};
pub use reconciler::{FactReconciler, ImportCounters, ReconcileOptions};
pub use registry::{ImporterRegistry, DEFAULT_IMPORTER_KEY};

use crate::db::hosts::Host;
use hostfacts_common::config::ImporterDefinition;
use hostfacts_common::Result;
use serde_json::{Map, Value};
use sqlx::SqlitePool;
use std::fmt;
use tracing::debug;

/// A source of host facts
pub trait FactImporter: Send + Sync + fmt::Debug {
    /// Taxonomy tag of the fact names this importer owns
    fn fact_name_type(&self) -> &str;

    /// Smart proxy features authorized to upload facts for this importer
    fn authorized_proxy_features(&self) -> Vec<String> {
        debug!(
            "Importer {:?} does not implement authorized_proxy_features.",
            self
        );
        Vec::new()
    }

    /// Whether imports may run in the background; they never do here
    fn supports_background(&self) -> bool {
        false
    }
}

/// Puppet facts, the default importer
#[derive(Debug, Clone, Copy, Default)]
pub struct PuppetFactImporter;

impl FactImporter for PuppetFactImporter {
    fn fact_name_type(&self) -> &str {
        "puppet"
    }

    fn authorized_proxy_features(&self) -> Vec<String> {
        vec!["Puppet".to_string()]
    }
}

/// Importer whose taxonomy and features are supplied at runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfiguredFactImporter {
    fact_name_type: String,
    authorized_features: Vec<String>,
}

impl ConfiguredFactImporter {
    pub fn new(fact_name_type: impl Into<String>, authorized_features: Vec<String>) -> Self {
        Self {
            fact_name_type: fact_name_type.into(),
            authorized_features,
        }
    }

    pub fn from_definition(definition: &ImporterDefinition) -> Self {
        Self::new(
            definition.fact_name_type.clone(),
            definition.authorized_features.clone(),
        )
    }
}

impl FactImporter for ConfiguredFactImporter {
    fn fact_name_type(&self) -> &str {
        &self.fact_name_type
    }

    fn authorized_proxy_features(&self) -> Vec<String> {
        self.authorized_features.clone()
    }
}

/// Resolve the importer for `importer_key` and reconcile `raw` facts for `host`
///
/// Counters are returned on success; on failure use [`FactReconciler`]
/// directly to read the counters of the partial run.
pub async fn import_facts(
    pool: &SqlitePool,
    registry: &ImporterRegistry,
    importer_key: &str,
    host: &mut Host,
    raw: &Map<String, Value>,
    options: ReconcileOptions,
) -> Result<ImportCounters> {
    let importer = registry.resolve(importer_key);
    let mut reconciler = FactReconciler::new(pool, importer, host, raw).with_options(options);
    reconciler.import().await
}
