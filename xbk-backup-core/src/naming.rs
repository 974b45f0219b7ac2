use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Extension used when the configured archive name has none.
pub const ARCHIVE_EXTENSION: &str = ".zip";

/// Date qualifiers appended to the archive base name.
///
/// `iso_week` wins over `add_year`/`add_month`; the latter two compose.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveNaming {
    #[serde(default)]
    pub iso_week: bool,
    #[serde(default)]
    pub add_year: bool,
    #[serde(default)]
    pub add_month: bool,
}

/// Archive file name for `base` on the day `today`.
///
/// `site` with year and month on 2024-03-15 gives `site_2024_03.zip`; with the
/// ISO week instead it gives `site_2024W11.zip`. An extension already present
/// on `base` is kept and moved to the end.
pub fn archive_file_name<D: Datelike>(base: &str, naming: &ArchiveNaming, today: &D) -> String {
    let (stem, ext) = match Path::new(base).extension().and_then(|e| e.to_str()) {
        Some(ext) => (&base[..base.len() - ext.len() - 1], format!(".{ext}")),
        None => (base, ARCHIVE_EXTENSION.to_string()),
    };

    if naming.iso_week {
        let week = today.iso_week();
        return format!("{stem}_{:04}W{:02}{ext}", week.year(), week.week());
    }

    let mut name = stem.to_string();
    if naming.add_year {
        name.push_str(&format!("_{:04}", today.year()));
    }
    if naming.add_month {
        name.push_str(&format!("_{:02}", today.month()));
    }
    name.push_str(&ext);
    name
}

/// Full archive path under `folder`.
pub fn archive_path<D: Datelike>(
    folder: &Path,
    base: &str,
    naming: &ArchiveNaming,
    today: &D,
) -> PathBuf {
    folder.join(archive_file_name(base, naming, today))
}
