///
/// This module implements the CLI interface for xbk-backup: command parsing,
/// argument defaults, and the async entrypoint shared by `main` and the tests.
///
/// All backup logic (selection, mirroring, archiving, retention, upload
/// scheduling) lives in the [`xbk-backup-core`] crate. This module only wires
/// the config file, the HTTP store and server discovery into it.
///
/// ## Commands
/// - `run`: one full backup pass.
/// - `list`: prints the backups a run would select, changing nothing.
/// - `find`: prints the servers found in the install folders.
/// - `init`: writes a starter config file.
///
/// [`xbk-backup-core`]: ../../xbk-backup-core/
use crate::init::write_default_config;
use crate::load_config::load_config;
use crate::upload::HttpArchiveStore;
use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use xbk_backup_core::contract::{ArchiveStore, ServerLocator};
use xbk_backup_core::locate::{discover_default_source_path, InstallDirLocator};
use xbk_backup_core::run::{run_backup, UploadOutcome};
use xbk_backup_core::select::select_latest;

/// Config file used when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "xbk-backup.yaml";

/// CLI for xbk-backup: keep the latest server backups mirrored, archived and off-site.
#[derive(Parser)]
#[clap(
    name = "xbk-backup",
    version,
    about = "Mirror the newest server backups, zip them and upload the archive on schedule"
)]
pub struct Cli {
    /// Append log output to this file instead of stderr
    #[clap(long, global = true)]
    pub log: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Mirror the latest backups, then archive and upload them as configured
    Run {
        /// Path to the YAML config file
        #[clap(long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
    },
    /// Print the latest backup of every database without changing anything
    List {
        /// Path to the YAML config file
        #[clap(long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
    },
    /// Print the installed servers and their backup folders
    Find,
    /// Write a default config file
    Init {
        /// Path of the config file to create
        #[clap(long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Run { config } => {
            let config = load_config(config)?;
            tracing::info!(command = "run", "Starting backup run");
            // Without a usable store the run still mirrors and archives; the
            // missing store only fails the run when an upload is due.
            let store = if config.upload.enabled {
                match HttpArchiveStore::from_config(&config.upload) {
                    Ok(store) => Some(store),
                    Err(e) => {
                        tracing::warn!(command = "run", error = %e, "Upload store unavailable");
                        None
                    }
                }
            } else {
                None
            };
            let today = Local::now().date_naive();
            let store_ref = store.as_ref().map(|s| s as &dyn ArchiveStore);
            match run_backup(&config, store_ref, today).await {
                Ok(report) => {
                    tracing::info!(command = "run", stages = ?report.stages, "Backup run complete");
                    println!(
                        "selected {}, copied {}, deleted {}, failed {}",
                        report.selected.len(),
                        report.mirror.copied.len(),
                        report.mirror.deleted.len(),
                        report.mirror.failed.len()
                    );
                    if let Some(archive) = &report.archive {
                        println!("archive {}", archive.path.display());
                    }
                    match &report.upload {
                        UploadOutcome::Disabled => {}
                        UploadOutcome::NotScheduled => println!("upload not scheduled today"),
                        UploadOutcome::Uploaded { name } => println!("uploaded {name}"),
                    }
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "run", error = %e, "Backup run failed");
                    Err(anyhow::Error::new(e).context("Backup run failed"))
                }
            }
        }
        Commands::List { config } => {
            let config = load_config(config)?;
            let selection = select_latest(&config.source_path).with_context(|| {
                format!("Failed to scan {}", config.source_path.display())
            })?;
            tracing::info!(command = "list", count = selection.len(), "Selection listed");
            for path in selection {
                println!("{}", path.display());
            }
            Ok(())
        }
        Commands::Find => {
            let locations = InstallDirLocator::from_env()
                .locate()
                .map_err(|e| anyhow::anyhow!("Server lookup failed: {e}"))?;
            tracing::info!(command = "find", count = locations.len(), "Server lookup complete");
            if locations.is_empty() {
                println!("no servers found");
            }
            for location in locations {
                println!("{}\t{}", location.name, location.backup_path.display());
            }
            Ok(())
        }
        Commands::Init { config } => {
            let source = discover_default_source_path(&InstallDirLocator::from_env());
            write_default_config(&config, source.as_deref())?;
            println!("wrote {}", config.display());
            Ok(())
        }
    }
}
