//! Configuration loading and root folder resolution
//!
//! Bootstrap configuration only: where the database lives, logging, and the
//! importer table. Everything has a built-in default so a missing TOML file
//! never stops a run.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "HOSTFACTS_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "hostfacts.db";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Path to SQLite database file (optional, defaults to `<root>/hostfacts.db`)
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Root folder for hostfacts data (optional)
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Fact import configuration (optional)
    #[serde(default)]
    pub import: ImportConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Fact import configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ImportConfig {
    /// Registry key used when an unknown importer key is requested
    #[serde(default = "default_importer")]
    pub default_importer: String,

    /// Write a `fact_audits` row for every created, updated or destroyed fact value
    #[serde(default = "default_true")]
    pub audit_fact_changes: bool,

    /// Additional importers registered on top of the built-in ones
    #[serde(default)]
    pub importers: Vec<ImporterDefinition>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            default_importer: default_importer(),
            audit_fact_changes: true,
            importers: Vec::new(),
        }
    }
}

/// A fact importer declared in configuration
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ImporterDefinition {
    /// Registry key (e.g. "ansible")
    pub key: String,

    /// Taxonomy tag stored in `fact_names.fact_type`
    pub fact_name_type: String,

    /// Smart proxy features allowed to upload facts for this importer
    #[serde(default)]
    pub authorized_features: Vec<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_importer() -> String {
    "puppet".to_string()
}

fn default_true() -> bool {
    true
}

impl TomlConfig {
    /// Parse configuration from a TOML string
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Load configuration, falling back to defaults when no file is given or
    /// the file does not exist
    ///
    /// A file that exists but does not parse is still an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) if path.exists() => Self::load(path),
            Some(path) => {
                warn!("Config file {} not found, using defaults", path.display());
                Ok(Self::default())
            }
            None => match default_config_file() {
                Some(path) => Self::load(&path),
                None => Ok(Self::default()),
            },
        }
    }

    /// Resolve the database file path
    ///
    /// Priority: command-line argument, TOML `database_path`, `<root>/hostfacts.db`.
    pub fn database_path(&self, cli_arg: Option<&Path>, root_folder: &Path) -> PathBuf {
        if let Some(path) = cli_arg {
            return path.to_path_buf();
        }
        if let Some(path) = &self.database_path {
            return path.clone();
        }
        root_folder.join(DATABASE_FILE_NAME)
    }
}

/// Root folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = &config.root_folder {
        return path.clone();
    }

    // Priority 4: OS-dependent compiled default
    default_root_folder()
}

/// Get default configuration file path for the platform, if one exists
fn default_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("hostfacts").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/hostfacts/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Get OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/hostfacts (or /var/lib/hostfacts for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("hostfacts"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/hostfacts"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("hostfacts"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/hostfacts"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("hostfacts"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\hostfacts"))
    } else {
        PathBuf::from("./hostfacts_data")
    }
}
