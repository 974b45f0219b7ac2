use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{info, warn};

/// Outcome of a retention pass.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct PruneReport {
    pub kept: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

/// Keeps the `keep` most recently modified files in `archive_dir` and deletes
/// the rest. `keep < 1` disables pruning.
///
/// A file that cannot be inspected or deleted is logged and skipped so one
/// locked archive does not block the others. Only a folder that cannot be
/// listed is an error.
pub fn prune_archives<P: AsRef<Path>>(archive_dir: P, keep: i64) -> io::Result<PruneReport> {
    let archive_dir = archive_dir.as_ref();
    let mut report = PruneReport::default();
    let keep = match usize::try_from(keep) {
        Ok(keep) if keep >= 1 => keep,
        _ => {
            info!(dir = %archive_dir.display(), keep, "[PRUNE] Retention disabled");
            return Ok(report);
        }
    };

    let mut archives: Vec<(PathBuf, SystemTime)> = Vec::new();
    for entry in fs::read_dir(archive_dir)? {
        let (path, metadata) = match entry.and_then(|e| Ok((e.path(), e.metadata()?))) {
            Ok((path, metadata)) if metadata.is_file() => (path, metadata),
            Ok(_) => continue,
            Err(e) => {
                warn!(dir = %archive_dir.display(), error = %e, "[PRUNE] Skipping unreadable entry");
                continue;
            }
        };
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        archives.push((path, modified));
    }

    // Newest first.
    archives.sort_by(|a, b| b.1.cmp(&a.1));

    let expired = if archives.len() > keep {
        archives.split_off(keep)
    } else {
        Vec::new()
    };
    report.kept = archives.into_iter().map(|(path, _)| path).collect();

    for (path, _) in expired {
        match fs::remove_file(&path) {
            Ok(()) => {
                info!(archive = %path.display(), "[PRUNE] Deleted old archive");
                report.removed.push(path);
            }
            Err(e) => {
                warn!(archive = %path.display(), error = %e, "[PRUNE] Could not delete old archive");
                report.failed.push(path);
            }
        }
    }

    info!(
        dir = %archive_dir.display(),
        keep,
        kept = report.kept.len(),
        removed = report.removed.len(),
        failed = report.failed.len(),
        "[PRUNE] Retention applied"
    );
    Ok(report)
}
