//! hostfacts-import - command-line fact import
//!
//! Reads a JSON fact document for one host and reconciles it against the
//! hostfacts database, or lists the smart proxy features authorized to upload
//! facts.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hostfacts_common::config::{resolve_root_folder, TomlConfig, ROOT_FOLDER_ENV};
use hostfacts_import::{
    find_or_build_host, save_host, FactReconciler, ImporterRegistry, ReconcileOptions,
};

/// Command-line arguments for hostfacts-import
#[derive(Parser, Debug)]
#[command(name = "hostfacts-import")]
#[command(about = "Reconcile reported host facts against the hostfacts database")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "HOSTFACTS_CONFIG")]
    config: Option<PathBuf>,

    /// Root folder holding the database
    #[arg(short, long, env = ROOT_FOLDER_ENV)]
    root_folder: Option<PathBuf>,

    /// SQLite database file (overrides root folder and config)
    #[arg(short, long)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import a JSON object of facts for one host
    Import {
        /// Host name the facts belong to
        #[arg(long)]
        host: String,

        /// Importer key (defaults to the configured default importer)
        #[arg(short, long)]
        importer: Option<String>,

        /// Do not write fact audit rows
        #[arg(long)]
        no_audit: bool,

        /// Fact document, or "-" for stdin
        facts: PathBuf,
    },

    /// List smart proxy features authorized to upload facts
    Features,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = TomlConfig::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let registry = ImporterRegistry::from_config(&config.import)
        .context("Failed to build importer registry")?;

    match args.command {
        Command::Features => {
            for feature in registry.aggregated_authorized_features() {
                println!("{}", feature);
            }
            Ok(())
        }
        Command::Import {
            host,
            importer,
            no_audit,
            facts,
        } => {
            let root_folder = resolve_root_folder(args.root_folder.as_deref(), &config);
            let db_path = config.database_path(args.database.as_deref(), &root_folder);
            info!("Database: {}", db_path.display());

            let pool = hostfacts_common::db::init_database(&db_path)
                .await
                .with_context(|| format!("Failed to open database {}", db_path.display()))?;

            let document = read_fact_document(&facts)?;
            let raw = match document {
                serde_json::Value::Object(map) => map,
                _ => anyhow::bail!("Fact document {} is not a JSON object", facts.display()),
            };

            let mut options = ReconcileOptions::from_config(&config.import);
            if no_audit {
                options.audit = false;
            }
            let importer_key = importer.unwrap_or_else(|| registry.default_key());

            let mut host = find_or_build_host(&pool, &host).await?;
            let mut reconciler =
                FactReconciler::new(&pool, registry.resolve(&importer_key), &mut host, &raw)
                    .with_options(options);
            let counters = match reconciler.import().await {
                Ok(counters) => counters,
                Err(e) => {
                    let partial = reconciler.counters();
                    error!(
                        "Import with '{}' stopped after Added: {}, Updated: {}, Deleted {} facts",
                        importer_key, partial.added, partial.updated, partial.deleted
                    );
                    return Err(e).context("Fact import failed");
                }
            };

            if host.is_new_record() {
                save_host(&pool, &mut host, options.audit)
                    .await
                    .with_context(|| format!("Failed to save host {}", host.name))?;
                info!("Created host '{}'", host.name);
            }

            println!("{}", serde_json::to_string(&counters)?);
            pool.close().await;
            Ok(())
        }
    }
}

fn read_fact_document(path: &Path) -> Result<serde_json::Value> {
    let content = if path == Path::new("-") {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read facts from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?
    };

    serde_json::from_str(&content).context("Fact document is not valid JSON")
}
