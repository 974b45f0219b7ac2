//! Reduces a server backup tree to the newest backup file of every directory.
//!
//! The server writes one subdirectory per database and keeps several
//! generations of `.xbk` files in each. A run only cares about the newest
//! generation, so the tree is walked once and folded into one candidate per
//! directory.
//!
//! The walk visits the files of a directory before its subdirectories, both
//! groups sorted by name, so the artifacts of one directory always arrive as a
//! contiguous run. [`fold_latest`] relies on that: a change of parent directory
//! starts a new candidate, and within a directory a candidate is only replaced
//! by a strictly newer file. Equal timestamps keep the first file seen.

use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use walkdir::WalkDir;

use crate::artifact::{is_backup_artifact, BackupArtifact};
use crate::error::TraversalError;

/// The newest artifact path of every directory holding artifacts, in walk order.
pub type SelectionSet = Vec<PathBuf>;

/// Walks `root` and returns the newest backup file of each directory.
pub fn select_latest<P: AsRef<Path>>(root: P) -> Result<SelectionSet, TraversalError> {
    let root = root.as_ref();
    info!(root = %root.display(), "[SELECT] Scanning backup tree");

    let artifacts = scan_artifacts(root).map_err(|e| {
        error!(root = %root.display(), error = %e, "[SELECT][ERROR] Backup tree unreadable");
        e
    })?;
    let scanned = artifacts.len();

    let selection: SelectionSet = fold_latest(artifacts)
        .into_iter()
        .map(|artifact| artifact.path)
        .collect();

    info!(
        root = %root.display(),
        scanned,
        selected = selection.len(),
        "[SELECT] Latest backups selected"
    );
    Ok(selection)
}

/// Folds artifacts, already grouped by directory, into one newest entry per
/// directory. Ties keep the first-seen artifact.
pub fn fold_latest<I>(artifacts: I) -> Vec<BackupArtifact>
where
    I: IntoIterator<Item = BackupArtifact>,
{
    let mut selected: Vec<BackupArtifact> = Vec::new();
    for artifact in artifacts {
        match selected.last_mut() {
            Some(current) if current.directory() == artifact.directory() => {
                if artifact.modified > current.modified {
                    debug!(
                        replaced = %current.path.display(),
                        by = %artifact.path.display(),
                        "[SELECT] Newer backup in directory"
                    );
                    *current = artifact;
                }
            }
            _ => selected.push(artifact),
        }
    }
    selected
}

fn scan_artifacts(root: &Path) -> Result<Vec<BackupArtifact>, TraversalError> {
    let walker = WalkDir::new(root).sort_by(|a, b| {
        a.file_type()
            .is_dir()
            .cmp(&b.file_type().is_dir())
            .then_with(|| a.file_name().cmp(b.file_name()))
    });

    let mut artifacts = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|source| TraversalError::Walk {
            root: root.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_dir() || !is_backup_artifact(entry.path()) {
            continue;
        }

        let metadata = entry.metadata().map_err(|source| TraversalError::Walk {
            root: root.to_path_buf(),
            source,
        })?;
        let modified = metadata
            .modified()
            .map_err(|source| TraversalError::Metadata {
                path: entry.path().to_path_buf(),
                source,
            })?;

        debug!(path = %entry.path().display(), "[SELECT] Found backup file");
        artifacts.push(BackupArtifact {
            path: entry.into_path(),
            modified,
        });
    }
    Ok(artifacts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    fn artifact(path: &str, secs: u64) -> BackupArtifact {
        BackupArtifact {
            path: PathBuf::from(path),
            modified: SystemTime::UNIX_EPOCH + Duration::from_secs(secs),
        }
    }

    #[test]
    fn keeps_newest_per_directory() {
        let selected = fold_latest(vec![
            artifact("root/a/1.xbk", 10),
            artifact("root/a/2.xbk", 30),
            artifact("root/a/3.xbk", 20),
            artifact("root/b/1.xbk", 5),
        ]);
        let paths: Vec<_> = selected.iter().map(|a| a.path.clone()).collect();
        assert_eq!(
            paths,
            vec![PathBuf::from("root/a/2.xbk"), PathBuf::from("root/b/1.xbk")]
        );
    }

    #[test]
    fn equal_timestamps_keep_first_seen() {
        let selected = fold_latest(vec![
            artifact("root/a/first.xbk", 10),
            artifact("root/a/second.xbk", 10),
        ]);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].path, PathBuf::from("root/a/first.xbk"));
    }

    #[test]
    fn empty_input_selects_nothing() {
        assert!(fold_latest(Vec::new()).is_empty());
    }
}
