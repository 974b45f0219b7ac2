//! Writes a starter config file for a new installation.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::Path;
use tracing::{info, warn};

const DEFAULT_MIRROR_PATH: &str = "xbk-backup/mirror";
const DEFAULT_ARCHIVE_FOLDER: &str = "xbk-backup/archives";
const DEFAULT_ARCHIVE_NAME: &str = "my_site_backups";
const DEFAULT_ARCHIVE_KEEP: i64 = 5;

/// Commented default config. `source_path` is left empty when no server was
/// found.
pub fn default_config_yaml(source_path: Option<&Path>) -> String {
    let source = source_path
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    format!(
        "\
# Folder the server writes its backups into ('db_backup')
source_path: {source}
# Folder that receives a copy of the newest backup of every database
mirror_path: {mirror}

archive:
  enabled: true
  folder: {folder}
  name: {name}
  # Add the ISO week, the year and/or the month to the archive name
  iso_week: true
  add_year: false
  add_month: false
  # Number of archives to keep, 0 keeps all of them
  keep: {keep}

upload:
  enabled: false
  endpoint: ''
  user: ''
  # Day to upload the archive on (monday .. sunday), empty means every run.
  # The password is read from the XBK_UPLOAD_PASSWORD environment variable.
  weekday: ''
",
        source = yaml_quote(&source),
        mirror = yaml_quote(DEFAULT_MIRROR_PATH),
        folder = yaml_quote(DEFAULT_ARCHIVE_FOLDER),
        name = yaml_quote(DEFAULT_ARCHIVE_NAME),
        keep = DEFAULT_ARCHIVE_KEEP,
    )
}

/// Creates `path` with the default config. An existing file is never touched.
pub fn write_default_config(path: &Path, source_path: Option<&Path>) -> Result<()> {
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            warn!(config_path = %path.display(), "Config file already exists, not overwriting");
            anyhow::bail!("config file {} already exists", path.display());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to create config file {}", path.display()))
        }
    };
    file.write_all(default_config_yaml(source_path).as_bytes())
        .with_context(|| format!("Failed to write config file {}", path.display()))?;
    info!(
        config_path = %path.display(),
        source_found = source_path.is_some(),
        "Default config written"
    );
    Ok(())
}

// Single quotes: backslashes in Windows paths stay literal.
fn yaml_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
