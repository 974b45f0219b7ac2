//! High-level pipeline: orchestrates select → mirror → archive → upload.
//!
//! One run walks through the stages
//! `Start → Selected → Reconciled → (Archived) → (Uploaded) → Done`:
//!   - Selects the newest backup of every folder under the source path
//!   - Reconciles the mirror folder against that selection
//!   - Optionally zips the selection into a date-named archive and prunes old archives
//!   - Optionally hands the archive to an [`ArchiveStore`] on the scheduled weekday
//!
//! # Error Handling
//! Structural failures (unreadable source, mirror folder cannot be created,
//! missing archive folder setting, archive build, upload) end the run with a
//! [`RunError`]. Per-file copy, delete and prune failures only show up in the
//! returned [`RunReport`]. Nothing is rolled back: a run that stops after the
//! mirror step is picked up again by the next scheduled run.
//!
//! # Navigation
//! - Main entrypoint: [`run_backup`]
//! - Supporting types: [`RunReport`], [`RunStage`], [`UploadOutcome`].

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

use crate::archive::{build_archive, ArchiveSummary};
use crate::artifact::base_name;
use crate::config::BackupConfig;
use crate::contract::ArchiveStore;
use crate::error::RunError;
use crate::mirror::{reconcile, ReconcileReport};
use crate::naming::archive_path;
use crate::retention::{prune_archives, PruneReport};
use crate::schedule::should_upload_today;
use crate::select::select_latest;

/// Stages a run passes through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunStage {
    Start,
    Selected,
    Reconciled,
    Archived,
    Uploaded,
    Done,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunStage::Start => "start",
            RunStage::Selected => "selected",
            RunStage::Reconciled => "reconciled",
            RunStage::Archived => "archived",
            RunStage::Uploaded => "uploaded",
            RunStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// What happened to the upload step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum UploadOutcome {
    Disabled,
    NotScheduled,
    Uploaded { name: String },
}

/// Everything a successful run did.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub stages: Vec<RunStage>,
    pub selected: Vec<PathBuf>,
    pub mirror: ReconcileReport,
    pub archive: Option<ArchiveSummary>,
    pub pruned: Option<PruneReport>,
    pub upload: UploadOutcome,
}

impl RunReport {
    fn enter(&mut self, stage: RunStage) {
        debug!(stage = %stage, "[RUN] Entering stage");
        self.stages.push(stage);
    }

    fn finish(mut self) -> Self {
        self.enter(RunStage::Done);
        match serde_json::to_string(&self) {
            Ok(json) => debug!(json = %json, "[RUN][DEBUG] Run report as JSON"),
            Err(e) => error!(error = ?e, "[RUN][DEBUG] Failed to serialize run report"),
        }
        info!(stages = self.stages.len(), "[RUN] Backup run completed");
        self
    }
}

/// Runs one backup pass according to `config`. `today` drives archive naming
/// and the upload weekday. `store` is only consulted when upload is enabled.
pub async fn run_backup(
    config: &BackupConfig,
    store: Option<&dyn ArchiveStore>,
    today: NaiveDate,
) -> Result<RunReport, RunError> {
    info!(source = %config.source_path.display(), "[RUN] Starting backup run");

    let mut report = RunReport {
        stages: vec![RunStage::Start],
        selected: Vec::new(),
        mirror: ReconcileReport::default(),
        archive: None,
        pruned: None,
        upload: UploadOutcome::Disabled,
    };

    // --- Select ---
    report.selected = select_latest(&config.source_path)?;
    info!(found = report.selected.len(), "[RUN] Found latest backups");
    report.enter(RunStage::Selected);

    // --- Mirror ---
    report.mirror = reconcile(&report.selected, &config.mirror_path)?;
    info!(
        copied = report.mirror.copied.len(),
        deleted = report.mirror.deleted.len(),
        failed = report.mirror.failed.len(),
        "[RUN] Mirror folder up to date"
    );
    report.enter(RunStage::Reconciled);

    if !config.archive.enabled {
        info!("[RUN] Archiving disabled");
        return Ok(report.finish());
    }

    // --- Archive ---
    let folder = config
        .archive
        .folder
        .as_ref()
        .filter(|f| !f.as_os_str().is_empty())
        .ok_or_else(|| {
            error!("[RUN][ERROR] Archiving enabled but no archive folder configured");
            RunError::Config("archiving is enabled but no archive folder is set".to_string())
        })?;

    fs::create_dir_all(folder).map_err(|source| {
        error!(folder = %folder.display(), error = %source, "[RUN][ERROR] Cannot create archive folder");
        RunError::ArchiveFolder {
            path: folder.clone(),
            source,
        }
    })?;

    let target = archive_path(folder, &config.archive.name, &config.archive.naming, &today);
    let summary = build_archive(&target, &report.selected)?;
    info!(archive = %summary.path.display(), entries = summary.entries.len(), "[RUN] Archive written");
    report.archive = Some(summary);

    report.pruned = match prune_archives(folder, config.archive.keep) {
        Ok(pruned) => Some(pruned),
        Err(e) => {
            warn!(folder = %folder.display(), error = %e, "[RUN] Retention skipped, archive folder unreadable");
            None
        }
    };
    report.enter(RunStage::Archived);

    // --- Upload ---
    if !config.upload.enabled {
        info!("[RUN] Upload disabled");
        return Ok(report.finish());
    }
    if !should_upload_today(config.upload.weekday.as_deref(), &today) {
        info!(
            weekday = config.upload.weekday.as_deref().unwrap_or(""),
            "[RUN] Upload not scheduled today"
        );
        report.upload = UploadOutcome::NotScheduled;
        return Ok(report.finish());
    }

    let store = store.ok_or_else(|| {
        error!("[RUN][ERROR] Upload enabled but no archive store available");
        RunError::Config("upload is enabled but no archive store is configured".to_string())
    })?;

    let name = base_name(&target).unwrap_or_default();
    info!(name = %name, "[RUN][UPLOAD] Uploading archive");
    store.store(&name, &target).await.map_err(|source| {
        error!(name = %name, error = %source, "[RUN][ERROR][UPLOAD] Upload failed");
        RunError::Transfer {
            name: name.clone(),
            source,
        }
    })?;
    info!(name = %name, "[RUN][UPLOAD] Upload succeeded");
    report.upload = UploadOutcome::Uploaded { name };
    report.enter(RunStage::Uploaded);

    Ok(report.finish())
}
