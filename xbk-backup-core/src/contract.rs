//! # contract: capabilities the backup engine depends on but does not implement
//!
//! The engine only touches the local filesystem. Two collaborators sit outside
//! it and are reached through the traits in this module:
//!
//! - [`ArchiveStore`] receives the finished archive for off-site storage.
//! - [`ServerLocator`] finds the backup folders of installed servers, so a
//!   first-time setup can suggest a source path.
//!
//! ## Mocking & Testing
//! - Both traits are annotated for `mockall`; with the `test-export-mocks`
//!   feature the generated `MockArchiveStore` and `MockServerLocator` are
//!   exported for downstream tests.
//!
//! ## Adding New Destinations
//! - Implement [`ArchiveStore`] for the destination and convert every
//!   transport failure into a [`StoreError`]. The engine never retries.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

#[allow(unused_imports)]
use mockall::{automock, predicate::*};

/// Error type for store implementations (simple boxed error).
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// Error type for locator implementations.
pub type LocateError = Box<dyn std::error::Error + Send + Sync>;

/// Remote (or otherwise off-site) destination for archives.
///
/// The trait is `Send` + `Sync` and intended for async/await usage.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ArchiveStore: Send + Sync {
    /// Store the file at `local_path` under `destination_name`, replacing any
    /// earlier upload of the same name.
    async fn store(&self, destination_name: &str, local_path: &Path) -> Result<(), StoreError>;
}

/// An installed server and where it writes its backups.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ServerLocation {
    /// Human-readable name of the installation.
    pub name: String,
    /// Root of the install folder.
    pub install_dir: PathBuf,
    /// Folder the server writes its `.xbk` backups into.
    pub backup_path: PathBuf,
}

/// Lookup of installed servers on this host.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait ServerLocator: Send + Sync {
    /// All servers that could be found, oldest installation first.
    fn locate(&self) -> Result<Vec<ServerLocation>, LocateError>;
}
