//! Error types for the backup engine.
//!
//! Each component surfaces its own error enum; [`RunError`] folds them together
//! for the orchestrated run. Per-file failures that the engine tolerates are
//! not errors here: they are logged and reported in the component reports.

use std::path::PathBuf;
use thiserror::Error;

use crate::contract::StoreError;

/// The source tree could not be walked or stat'ed.
#[derive(Debug, Error)]
pub enum TraversalError {
    #[error("failed to walk backup tree under {root}: {source}")]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("failed to read metadata for {path}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Structural failures of the mirror directory itself.
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("failed to create mirror directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to list mirror directory {path}: {source}")]
    ListDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Any failure while writing an archive. The archive is never left behind as
/// if it were complete.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("failed to create archive {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {path} for archiving: {source}")]
    ReadInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} has no usable file name")]
    InvalidName { path: PathBuf },

    #[error("failed to write entry {entry} into archive: {source}")]
    WriteEntry {
        entry: String,
        #[source]
        source: std::io::Error,
    },

    #[error("zip error in {path}: {source}")]
    Zip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
}

/// Fatal outcome of a backup run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Traversal(#[from] TraversalError),

    #[error(transparent)]
    Mirror(#[from] MirrorError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to create archive folder {path}: {source}")]
    ArchiveFolder {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("upload of {name} failed: {source}")]
    Transfer {
        name: String,
        #[source]
        source: StoreError,
    },
}
