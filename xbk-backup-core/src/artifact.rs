//! Recognising backup artifacts written by the server.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Extension of the backup files produced by the server, without the dot.
pub const BACKUP_EXTENSION: &str = "xbk";

/// True if `path` carries the backup extension, compared case-insensitively.
pub fn is_backup_artifact<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(BACKUP_EXTENSION))
        .unwrap_or(false)
}

/// A backup file found on disk during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupArtifact {
    pub path: PathBuf,
    pub modified: SystemTime,
}

impl BackupArtifact {
    /// Directory the artifact lives in.
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }
}

/// Base name of a path as an owned string, the identity used by the mirror and
/// the archive.
pub fn base_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}
