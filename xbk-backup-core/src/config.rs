use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::naming::ArchiveNaming;

/// Settings for one backup run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    /// Folder the server writes its backups into. Read-only to us.
    pub source_path: PathBuf,
    /// Flat folder holding a copy of the newest backup of every database.
    pub mirror_path: PathBuf,
    #[serde(default)]
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub upload: UploadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub folder: Option<PathBuf>,
    #[serde(default = "default_archive_name")]
    pub name: String,
    #[serde(flatten)]
    pub naming: ArchiveNaming,
    /// Number of archives to keep; anything below 1 keeps everything.
    #[serde(default)]
    pub keep: i64,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            folder: None,
            name: default_archive_name(),
            naming: ArchiveNaming::default(),
            keep: 0,
        }
    }
}

fn default_archive_name() -> String {
    "backups".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub user: String,
    /// Never read from the config file; injected from the environment.
    #[serde(skip)]
    pub password: Option<String>,
    /// Weekday name; empty or missing means every day.
    #[serde(default)]
    pub weekday: Option<String>,
}

impl BackupConfig {
    pub fn trace_loaded(&self) {
        info!(
            source_path = %self.source_path.display(),
            mirror_path = %self.mirror_path.display(),
            archive = self.archive.enabled,
            upload = self.upload.enabled,
            "Loaded BackupConfig"
        );
        debug!(archive = ?self.archive, "Archive settings");
        debug!(
            endpoint = %self.upload.endpoint,
            user = %self.upload.user,
            password_set = self.upload.password.is_some(),
            weekday = self.upload.weekday.as_deref().unwrap_or(""),
            "Upload settings"
        );
    }
}
