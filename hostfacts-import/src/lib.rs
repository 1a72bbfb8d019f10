//! hostfacts-import library interface
//!
//! Reconciles externally reported host facts against the hostfacts database.
//! The binary in `main.rs` is a thin driver over these APIs.

pub mod db;
pub mod importer;

pub use crate::db::hosts::{find_or_build_host, save_host, Host};
pub use crate::importer::{
    import_facts, ConfiguredFactImporter, FactImporter, FactReconciler, ImportCounters,
    ImporterRegistry, PuppetFactImporter, ReconcileOptions,
};
