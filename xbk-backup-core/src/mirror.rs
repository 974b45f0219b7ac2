//! Keeps the flat mirror folder in step with the current selection.
//!
//! Identity is the base name only. A file already in the mirror under the same
//! name as a selected backup is never copied again, whatever its content, and
//! a mirrored backup whose name is no longer selected is deleted. Files in the
//! mirror that are not backups are left alone. Two selected backups with the
//! same name from different folders collide, and the later one in the
//! selection is what ends up in the mirror.
//!
//! Only structural problems (the mirror folder cannot be created or listed)
//! are errors. A single file that cannot be copied or deleted is logged,
//! recorded in the [`ReconcileReport`] and retried by the next run.

use serde::Serialize;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::artifact::{base_name, is_backup_artifact};
use crate::error::MirrorError;

/// What a reconciliation did, by base name.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub copied: Vec<String>,
    pub deleted: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<String>,
}

impl ReconcileReport {
    /// True when the run neither copied nor deleted anything.
    pub fn is_noop(&self) -> bool {
        self.copied.is_empty() && self.deleted.is_empty()
    }
}

/// Brings `mirror_dir` in line with `selection`.
pub fn reconcile<P: AsRef<Path>>(
    selection: &[PathBuf],
    mirror_dir: P,
) -> Result<ReconcileReport, MirrorError> {
    let mirror_dir = mirror_dir.as_ref();
    let mut report = ReconcileReport::default();

    fs::create_dir_all(mirror_dir).map_err(|source| {
        error!(path = %mirror_dir.display(), error = %source, "[MIRROR][ERROR] Cannot create mirror folder");
        MirrorError::CreateDir {
            path: mirror_dir.to_path_buf(),
            source,
        }
    })?;

    let mirrored = list_mirrored(mirror_dir)?;
    let selected: HashSet<String> = selection.iter().filter_map(|p| base_name(p)).collect();

    let mut present: HashSet<String> = HashSet::new();
    for name in mirrored {
        if selected.contains(&name) {
            present.insert(name);
            continue;
        }
        let stale = mirror_dir.join(&name);
        match fs::remove_file(&stale) {
            Ok(()) => {
                info!(file = %name, mirror = %mirror_dir.display(), "[MIRROR] Deleted old backup");
                report.deleted.push(name);
            }
            Err(e) => {
                warn!(path = %stale.display(), error = %e, "[MIRROR] Could not delete old backup, skipping");
                report.failed.push(name);
            }
        }
    }

    // Names written by this run. A later selected file with the same name
    // replaces the earlier copy; names found in the mirror are left alone.
    let mut written: HashSet<String> = HashSet::new();
    for source in selection {
        let Some(name) = base_name(source) else {
            warn!(path = %source.display(), "[MIRROR] Selected path has no file name, skipping");
            continue;
        };
        let replaces_own_copy = written.contains(&name);
        if present.contains(&name) && !replaces_own_copy {
            debug!(file = %name, "[MIRROR] Already mirrored");
            report.skipped.push(name);
            continue;
        }

        let target = mirror_dir.join(&name);
        match copy_preserving_mtime(source, &target) {
            Ok(()) => {
                if replaces_own_copy {
                    debug!(file = %name, source = %source.display(), "[MIRROR] Replaced copy with later backup of the same name");
                } else {
                    info!(file = %name, source = %source.display(), "[MIRROR] Copied backup");
                    present.insert(name.clone());
                    written.insert(name.clone());
                    report.copied.push(name);
                }
            }
            Err(e) => {
                warn!(source = %source.display(), error = %e, "[MIRROR] Copy failed, skipping");
                if target.exists() {
                    if let Err(e) = fs::remove_file(&target) {
                        warn!(path = %target.display(), error = %e, "[MIRROR] Could not remove partial copy");
                    }
                }
                if replaces_own_copy {
                    present.remove(&name);
                    written.remove(&name);
                    report.copied.retain(|copied| copied != &name);
                }
                report.failed.push(name);
            }
        }
    }

    info!(
        mirror = %mirror_dir.display(),
        copied = report.copied.len(),
        deleted = report.deleted.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        "[MIRROR] Reconciled"
    );
    Ok(report)
}

/// Base names of the backup files currently in the mirror.
fn list_mirrored(mirror_dir: &Path) -> Result<Vec<String>, MirrorError> {
    let list_err = |source: io::Error| MirrorError::ListDir {
        path: mirror_dir.to_path_buf(),
        source,
    };

    let mut names = Vec::new();
    for entry in fs::read_dir(mirror_dir).map_err(list_err)? {
        let entry = entry.map_err(list_err)?;
        let is_file = entry.file_type().map_err(list_err)?.is_file();
        let path = entry.path();
        if is_file && is_backup_artifact(&path) {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

fn copy_preserving_mtime(source: &Path, target: &Path) -> io::Result<()> {
    let mut input = File::open(source)?;
    let modified = input.metadata()?.modified()?;
    let mut output = File::create(target)?;
    io::copy(&mut input, &mut output)?;

    if let Err(e) = output.set_modified(modified) {
        warn!(path = %target.display(), error = %e, "[MIRROR] Could not copy modification time");
    }
    Ok(())
}
