//! Finds where installed servers keep their backups.
//!
//! Every server install has an `etc/dbpath.properties` file whose
//! `server.paths.db` entry names the database folder. Backups are written to
//! the `db_backup` folder next to it.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::contract::{LocateError, ServerLocation, ServerLocator};

/// Environment variable listing install folders, in the platform's path-list
/// syntax.
pub const INSTALL_DIRS_ENV: &str = "XBK_INSTALL_DIRS";

const PROPERTIES_DIR: &str = "etc";
const PROPERTIES_FILE: &str = "dbpath.properties";
const DB_PATH_KEY: &str = "server.paths.db";
const BACKUP_FOLDER_NAME: &str = "db_backup";

/// Locates servers from a fixed list of install folders.
#[derive(Debug, Clone, Default)]
pub struct InstallDirLocator {
    install_dirs: Vec<PathBuf>,
}

impl InstallDirLocator {
    pub fn new(install_dirs: Vec<PathBuf>) -> Self {
        Self { install_dirs }
    }

    /// Reads the install folders from [`INSTALL_DIRS_ENV`]. Unset means none.
    pub fn from_env() -> Self {
        let install_dirs: Vec<PathBuf> = env::var_os(INSTALL_DIRS_ENV)
            .map(|raw| env::split_paths(&raw).filter(|p| !p.as_os_str().is_empty()).collect())
            .unwrap_or_default();
        debug!(count = install_dirs.len(), "Install folders read from environment");
        Self { install_dirs }
    }
}

impl ServerLocator for InstallDirLocator {
    fn locate(&self) -> Result<Vec<ServerLocation>, LocateError> {
        let mut locations = Vec::new();
        for install_dir in &self.install_dirs {
            match backup_path_for(install_dir) {
                Ok(Some(backup_path)) => {
                    let name = install_dir
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| install_dir.display().to_string());
                    info!(name = %name, backup_path = %backup_path.display(), "Found server install");
                    locations.push(ServerLocation {
                        name,
                        install_dir: install_dir.clone(),
                        backup_path,
                    });
                }
                Ok(None) => {
                    warn!(install_dir = %install_dir.display(), "No {} entry in {}", DB_PATH_KEY, PROPERTIES_FILE);
                }
                Err(e) => {
                    debug!(install_dir = %install_dir.display(), error = %e, "Skipping install folder");
                }
            }
        }
        Ok(locations)
    }
}

/// Backup folder of the newest located server, if any. Lookup failures are
/// logged and treated as "nothing found".
pub fn discover_default_source_path(locator: &dyn ServerLocator) -> Option<PathBuf> {
    match locator.locate() {
        Ok(mut locations) => locations.pop().map(|l| l.backup_path),
        Err(e) => {
            warn!(error = %e, "Server lookup failed");
            None
        }
    }
}

fn backup_path_for(install_dir: &Path) -> io::Result<Option<PathBuf>> {
    let properties = fs::read_to_string(install_dir.join(PROPERTIES_DIR).join(PROPERTIES_FILE))?;
    Ok(parse_db_path(&properties).map(|db| {
        db.parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
            .join(BACKUP_FOLDER_NAME)
    }))
}

/// Value of `server.paths.db` in a properties file. Lines with more or fewer
/// than one `=` are ignored.
pub fn parse_db_path(properties: &str) -> Option<PathBuf> {
    properties.lines().find_map(|line| {
        let parts: Vec<&str> = line.split('=').collect();
        if parts.len() != 2 || !parts[0].trim().eq_ignore_ascii_case(DB_PATH_KEY) {
            return None;
        }
        let value = trim_quotes(parts[1].trim());
        (!value.is_empty()).then(|| PathBuf::from(value))
    })
}

fn trim_quotes(s: &str) -> &str {
    let s = s.strip_prefix('"').unwrap_or(s);
    s.strip_suffix('"').unwrap_or(s)
}
