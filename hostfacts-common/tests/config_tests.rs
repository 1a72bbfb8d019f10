//! Tests for configuration loading and root folder resolution
//!
//! Tests touching HOSTFACTS_ROOT_FOLDER are marked #[serial] so they do not
//! race on the process environment.

use hostfacts_common::config::{
    default_root_folder, resolve_root_folder, ImporterDefinition, TomlConfig, ROOT_FOLDER_ENV,
};
use hostfacts_common::Error;
use serial_test::serial;
use std::env;
use std::path::{Path, PathBuf};

#[test]
fn test_empty_config_uses_defaults() {
    let config = TomlConfig::parse("").unwrap();

    assert!(config.database_path.is_none());
    assert!(config.root_folder.is_none());
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.import.default_importer, "puppet");
    assert!(config.import.audit_fact_changes);
    assert!(config.import.importers.is_empty());
}

#[test]
fn test_full_config_parses() {
    let config = TomlConfig::parse(
        r#"
        database_path = "/srv/facts/hostfacts.db"
        root_folder = "/srv/facts"

        [logging]
        level = "debug"

        [import]
        default_importer = "ansible"
        audit_fact_changes = false

        [[import.importers]]
        key = "ansible"
        fact_name_type = "ansible"
        authorized_features = ["Ansible"]

        [[import.importers]]
        key = "chef"
        fact_name_type = "chef"
        "#,
    )
    .unwrap();

    assert_eq!(config.database_path, Some(PathBuf::from("/srv/facts/hostfacts.db")));
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.import.default_importer, "ansible");
    assert!(!config.import.audit_fact_changes);
    assert_eq!(
        config.import.importers,
        vec![
            ImporterDefinition {
                key: "ansible".to_string(),
                fact_name_type: "ansible".to_string(),
                authorized_features: vec!["Ansible".to_string()],
            },
            ImporterDefinition {
                key: "chef".to_string(),
                fact_name_type: "chef".to_string(),
                authorized_features: vec![],
            },
        ]
    );
}

#[test]
fn test_malformed_config_is_error() {
    let result = TomlConfig::parse("[import\ndefault_importer = ");
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_missing_config_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("does-not-exist.toml");

    let config = TomlConfig::load_or_default(Some(&missing)).unwrap();
    assert_eq!(config.import.default_importer, "puppet");
}

#[test]
fn test_config_file_loaded_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[logging]\nlevel = \"warn\"\n").unwrap();

    let config = TomlConfig::load_or_default(Some(&path)).unwrap();
    assert_eq!(config.logging.level, "warn");
}

#[test]
fn test_database_path_priority() {
    let root = Path::new("/data/root");
    let mut config = TomlConfig::default();

    assert_eq!(config.database_path(None, root), PathBuf::from("/data/root/hostfacts.db"));

    config.database_path = Some(PathBuf::from("/configured.db"));
    assert_eq!(config.database_path(None, root), PathBuf::from("/configured.db"));

    assert_eq!(
        config.database_path(Some(Path::new("/cli.db")), root),
        PathBuf::from("/cli.db")
    );
}

#[test]
#[serial]
fn test_root_folder_cli_wins() {
    env::set_var(ROOT_FOLDER_ENV, "/from/env");
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/from/toml")),
        ..Default::default()
    };

    let resolved = resolve_root_folder(Some(Path::new("/from/cli")), &config);
    env::remove_var(ROOT_FOLDER_ENV);

    assert_eq!(resolved, PathBuf::from("/from/cli"));
}

#[test]
#[serial]
fn test_root_folder_env_beats_toml() {
    env::set_var(ROOT_FOLDER_ENV, "/from/env");
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/from/toml")),
        ..Default::default()
    };

    let resolved = resolve_root_folder(None, &config);
    env::remove_var(ROOT_FOLDER_ENV);

    assert_eq!(resolved, PathBuf::from("/from/env"));
}

#[test]
#[serial]
fn test_root_folder_toml_then_default() {
    env::remove_var(ROOT_FOLDER_ENV);

    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/from/toml")),
        ..Default::default()
    };
    assert_eq!(resolve_root_folder(None, &config), PathBuf::from("/from/toml"));

    let resolved = resolve_root_folder(None, &TomlConfig::default());
    assert_eq!(resolved, default_root_folder());
    assert!(!resolved.as_os_str().is_empty());
}
