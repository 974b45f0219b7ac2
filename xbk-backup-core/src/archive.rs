//! Zip archive of the selected backups.
//!
//! Entries are stored flat under their base name with Deflate compression and
//! the source modification time. A failure on any file aborts the archive and
//! removes what was written so far; a half-written zip is never left looking
//! like a finished one.

use chrono::{DateTime, Datelike, Local, Timelike};
use serde::Serialize;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, error, info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::artifact::base_name;
use crate::error::ArchiveError;

/// A finished archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveSummary {
    pub path: PathBuf,
    pub entries: Vec<String>,
    /// Uncompressed bytes written.
    pub bytes: u64,
}

/// Writes `files` into a new zip at `archive_path`, replacing any file of the
/// same name.
pub fn build_archive<P: AsRef<Path>>(
    archive_path: P,
    files: &[PathBuf],
) -> Result<ArchiveSummary, ArchiveError> {
    let archive_path = archive_path.as_ref();
    info!(archive = %archive_path.display(), files = files.len(), "[ARCHIVE] Creating archive");

    let result = write_archive(archive_path, files);
    match &result {
        Ok(summary) => info!(
            archive = %archive_path.display(),
            entries = summary.entries.len(),
            bytes = summary.bytes,
            "[ARCHIVE] Archive complete"
        ),
        Err(e) => {
            error!(archive = %archive_path.display(), error = %e, "[ARCHIVE][ERROR] Archive failed");
            if let Err(rm) = fs::remove_file(archive_path) {
                if rm.kind() != io::ErrorKind::NotFound {
                    warn!(archive = %archive_path.display(), error = %rm, "[ARCHIVE] Could not remove incomplete archive");
                }
            }
        }
    }
    result
}

fn write_archive(archive_path: &Path, files: &[PathBuf]) -> Result<ArchiveSummary, ArchiveError> {
    let zip_err = |source| ArchiveError::Zip {
        path: archive_path.to_path_buf(),
        source,
    };

    let file = File::create(archive_path).map_err(|source| ArchiveError::Create {
        path: archive_path.to_path_buf(),
        source,
    })?;
    let mut zip = ZipWriter::new(BufWriter::new(file));

    let mut entries = Vec::with_capacity(files.len());
    let mut bytes = 0u64;

    for (name, path) in entry_sources(files)? {
        let read_err = |source| ArchiveError::ReadInput {
            path: path.clone(),
            source,
        };
        let mut input = File::open(path).map_err(read_err)?;
        let metadata = input.metadata().map_err(read_err)?;

        let mut options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .large_file(metadata.len() >= u64::from(u32::MAX));
        if let Some(stamp) = metadata.modified().ok().and_then(zip_timestamp) {
            options = options.last_modified_time(stamp);
        }

        debug!(entry = %name, size = metadata.len(), "[ARCHIVE] Adding entry");
        zip.start_file(name.clone(), options).map_err(zip_err)?;
        let written = io::copy(&mut input, &mut zip).map_err(|source| ArchiveError::WriteEntry {
            entry: name.clone(),
            source,
        })?;

        bytes += written;
        entries.push(name);
    }

    let mut writer = zip.finish().map_err(zip_err)?;
    writer.flush().map_err(|source| ArchiveError::Create {
        path: archive_path.to_path_buf(),
        source,
    })?;

    Ok(ArchiveSummary {
        path: archive_path.to_path_buf(),
        entries,
        bytes,
    })
}

/// Pairs each entry name with the file it is read from, in order of first
/// appearance. When names repeat, the last file listed under a name wins.
fn entry_sources(files: &[PathBuf]) -> Result<Vec<(String, &PathBuf)>, ArchiveError> {
    let mut sources: Vec<(String, &PathBuf)> = Vec::with_capacity(files.len());
    let mut index: HashMap<String, usize> = HashMap::new();
    for path in files {
        let name = base_name(path).ok_or_else(|| ArchiveError::InvalidName { path: path.clone() })?;
        match index.get(&name) {
            Some(&i) => {
                debug!(entry = %name, source = %path.display(), "[ARCHIVE] Later backup replaces entry of the same name");
                sources[i].1 = path;
            }
            None => {
                index.insert(name.clone(), sources.len());
                sources.push((name, path));
            }
        }
    }
    Ok(sources)
}

/// Zip stores local wall-clock time from 1980 on; anything else is left out.
fn zip_timestamp(modified: SystemTime) -> Option<zip::DateTime> {
    let local: DateTime<Local> = modified.into();
    zip::DateTime::from_date_and_time(
        u16::try_from(local.year()).ok()?,
        local.month() as u8,
        local.day() as u8,
        local.hour() as u8,
        local.minute() as u8,
        local.second() as u8,
    )
    .ok()
}
