//! Importer registry
//!
//! Maps importer keys to [`FactImporter`] strategies. Unknown keys resolve to
//! the default importer. Keys are compared trimmed and lowercased, so
//! `"Puppet"` and `" puppet"` name the same importer.
//!
//! Callers receive the registry by reference. [`global`] provides a lazily
//! built process-wide instance for code that has nowhere to inject one from.

use super::{ConfiguredFactImporter, FactImporter, PuppetFactImporter};
use hostfacts_common::config::ImportConfig;
use hostfacts_common::{Error, Result};
use once_cell::sync::Lazy;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

/// Key of the built-in default importer
pub const DEFAULT_IMPORTER_KEY: &str = "puppet";

static GLOBAL: Lazy<ImporterRegistry> = Lazy::new(ImporterRegistry::new);

/// Process-wide registry holding the built-in importers
pub fn global() -> &'static ImporterRegistry {
    &GLOBAL
}

struct RegistryState {
    importers: HashMap<String, Arc<dyn FactImporter>>,
    // Invariant: always a key of `importers`
    default_key: String,
}

/// Thread-safe importer key to strategy mapping
pub struct ImporterRegistry {
    state: RwLock<RegistryState>,
}

impl ImporterRegistry {
    /// Registry with the built-in Puppet importer as default
    pub fn new() -> Self {
        let mut importers: HashMap<String, Arc<dyn FactImporter>> = HashMap::new();
        importers.insert(DEFAULT_IMPORTER_KEY.to_string(), Arc::new(PuppetFactImporter));

        Self {
            state: RwLock::new(RegistryState {
                importers,
                default_key: DEFAULT_IMPORTER_KEY.to_string(),
            }),
        }
    }

    /// Registry with the built-ins plus every importer declared in configuration
    ///
    /// Fails if the configured default key names no importer.
    pub fn from_config(config: &ImportConfig) -> Result<Self> {
        let registry = Self::new();
        for definition in &config.importers {
            registry.register(
                &definition.key,
                Arc::new(ConfiguredFactImporter::from_definition(definition)),
            );
        }
        registry.set_default(&config.default_importer)?;

        info!(
            "Importer registry ready: {} (default '{}')",
            registry.keys().join(", "),
            normalize_key(&config.default_importer)
        );
        Ok(registry)
    }

    /// Register an importer, replacing any earlier one under the same key
    pub fn register(&self, key: &str, importer: Arc<dyn FactImporter>) {
        let key = normalize_key(key);
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.importers.insert(key.clone(), importer).is_some() {
            debug!("Replaced fact importer '{}'", key);
        } else {
            debug!("Registered fact importer '{}'", key);
        }
    }

    /// Make a registered key the fallback for unknown keys
    pub fn set_default(&self, key: &str) -> Result<()> {
        let key = normalize_key(key);
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if !state.importers.contains_key(&key) {
            return Err(Error::NotFound(format!("Fact importer '{}' is not registered", key)));
        }
        state.default_key = key;
        Ok(())
    }

    /// Importer registered under `key`, or the default importer
    pub fn resolve(&self, key: &str) -> Arc<dyn FactImporter> {
        let key = normalize_key(key);
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        match state.importers.get(&key) {
            Some(importer) => Arc::clone(importer),
            None => {
                debug!(
                    "No fact importer '{}', falling back to '{}'",
                    key, state.default_key
                );
                state
                    .importers
                    .get(&state.default_key)
                    .map(Arc::clone)
                    .unwrap_or_else(|| Arc::new(PuppetFactImporter) as Arc<dyn FactImporter>)
            }
        }
    }

    /// Registered keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let mut keys: Vec<String> = state.importers.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Key unknown lookups fall back to
    pub fn default_key(&self) -> String {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.default_key.clone()
    }

    /// Union of every importer's authorized smart proxy features
    pub fn aggregated_authorized_features(&self) -> BTreeSet<String> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state
            .importers
            .values()
            .map(|importer| importer.authorized_proxy_features())
            .filter(|features| !features.is_empty())
            .flatten()
            .collect()
    }

    /// Whether the importer for `key` may run in the background
    pub fn supports_background(&self, key: &str) -> bool {
        self.resolve(key).supports_background()
    }
}

impl Default for ImporterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}
