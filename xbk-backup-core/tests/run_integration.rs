use chrono::NaiveDate;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};
use tempfile::{tempdir, TempDir};
use zip::ZipArchive;

use xbk_backup_core::config::{ArchiveConfig, BackupConfig, UploadConfig};
use xbk_backup_core::contract::{ArchiveStore, MockArchiveStore};
use xbk_backup_core::error::RunError;
use xbk_backup_core::naming::ArchiveNaming;
use xbk_backup_core::run::{run_backup, RunStage, UploadOutcome};

fn write_backup(path: &Path, content: &[u8], age_secs: u64) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
    OpenOptions::new()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(SystemTime::now() - Duration::from_secs(age_secs))
        .unwrap();
}

/// 2024-03-14, a Thursday in ISO week 11.
fn thursday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 14).unwrap()
}

/// Two server folders with three generations each.
fn server_tree(tmp: &TempDir) -> PathBuf {
    let source = tmp.path().join("db_backup");
    for server in ["server_a", "server_b"] {
        for (generation, age) in [(1, 300), (2, 200), (3, 100)] {
            let path = source.join(server).join(format!("{server}_gen{generation}.xbk"));
            write_backup(&path, format!("{server} generation {generation}").as_bytes(), age);
        }
    }
    source
}

fn base_config(tmp: &TempDir) -> BackupConfig {
    BackupConfig {
        source_path: server_tree(tmp),
        mirror_path: tmp.path().join("mirror"),
        archive: ArchiveConfig::default(),
        upload: UploadConfig::default(),
    }
}

fn archiving(tmp: &TempDir, keep: i64) -> ArchiveConfig {
    ArchiveConfig {
        enabled: true,
        folder: Some(tmp.path().join("archives")),
        name: "site".to_string(),
        naming: ArchiveNaming {
            iso_week: true,
            ..Default::default()
        },
        keep,
    }
}

#[tokio::test]
async fn mirror_only_run_stops_after_reconcile() {
    let tmp = tempdir().unwrap();
    let config = base_config(&tmp);

    let report = run_backup(&config, None, thursday()).await.expect("run succeeds");

    assert_eq!(
        report.stages,
        vec![RunStage::Start, RunStage::Selected, RunStage::Reconciled, RunStage::Done]
    );
    assert_eq!(report.selected.len(), 2);
    assert_eq!(report.mirror.copied, vec!["server_a_gen3.xbk", "server_b_gen3.xbk"]);
    assert!(report.archive.is_none());
    assert_eq!(report.upload, UploadOutcome::Disabled);
    assert!(!tmp.path().join("archives").exists());
}

#[tokio::test]
async fn full_run_archives_and_uploads() {
    let tmp = tempdir().unwrap();
    let mut config = base_config(&tmp);
    config.archive = archiving(&tmp, 5);
    config.upload = UploadConfig {
        enabled: true,
        ..Default::default()
    };

    let uploaded = Arc::new(Mutex::new(Vec::<(String, bool)>::new()));
    let seen = uploaded.clone();
    let mut store = MockArchiveStore::new();
    store.expect_store().times(1).returning(move |name, path| {
        seen.lock().unwrap().push((name.to_string(), path.exists()));
        Ok(())
    });

    let report = run_backup(&config, Some(&store as &dyn ArchiveStore), thursday())
        .await
        .expect("run succeeds");

    assert_eq!(
        *uploaded.lock().unwrap(),
        vec![("site_2024W11.zip".to_string(), true)]
    );
    assert_eq!(
        report.upload,
        UploadOutcome::Uploaded {
            name: "site_2024W11.zip".to_string()
        }
    );
    assert!(report.stages.contains(&RunStage::Archived));
    assert!(report.stages.contains(&RunStage::Uploaded));

    let archive_path = tmp.path().join("archives/site_2024W11.zip");
    let mut zip = ZipArchive::new(File::open(&archive_path).unwrap()).unwrap();
    assert_eq!(zip.len(), 2);
    for name in ["server_a_gen3.xbk", "server_b_gen3.xbk"] {
        let mut entry = zip.by_name(name).unwrap();
        let mut content = Vec::new();
        std::io::Read::read_to_end(&mut entry, &mut content).unwrap();
        let server = &name[..8];
        let original = fs::read(config.source_path.join(server).join(name)).unwrap();
        assert_eq!(content, original, "entry {name} differs from source");
    }
}

#[tokio::test]
async fn upload_waits_for_scheduled_weekday() {
    let tmp = tempdir().unwrap();
    let mut config = base_config(&tmp);
    config.archive = archiving(&tmp, 0);
    config.upload = UploadConfig {
        enabled: true,
        weekday: Some("friday".to_string()),
        ..Default::default()
    };
    // No expectation: any call to the store fails the test.
    let store = MockArchiveStore::new();

    let report = run_backup(&config, Some(&store as &dyn ArchiveStore), thursday())
        .await
        .unwrap();

    assert_eq!(report.upload, UploadOutcome::NotScheduled);
    assert!(report.archive.is_some());
}

#[tokio::test]
async fn failed_upload_fails_the_run() {
    let tmp = tempdir().unwrap();
    let mut config = base_config(&tmp);
    config.archive = archiving(&tmp, 0);
    config.upload.enabled = true;

    let mut store = MockArchiveStore::new();
    store
        .expect_store()
        .times(1)
        .returning(|_, _| Err("connection refused".into()));

    let err = run_backup(&config, Some(&store as &dyn ArchiveStore), thursday())
        .await
        .unwrap_err();

    assert!(matches!(err, RunError::Transfer { .. }), "got {err:?}");
    assert!(tmp.path().join("archives/site_2024W11.zip").exists());
}

#[tokio::test]
async fn upload_without_store_is_a_config_error() {
    let tmp = tempdir().unwrap();
    let mut config = base_config(&tmp);
    config.archive = archiving(&tmp, 0);
    config.upload.enabled = true;

    let err = run_backup(&config, None, thursday()).await.unwrap_err();

    assert!(matches!(err, RunError::Config(_)), "got {err:?}");
}

#[tokio::test]
async fn archive_without_folder_fails_after_mirroring() {
    let tmp = tempdir().unwrap();
    let mut config = base_config(&tmp);
    config.archive = ArchiveConfig {
        enabled: true,
        folder: None,
        ..Default::default()
    };

    let err = run_backup(&config, None, thursday()).await.unwrap_err();

    assert!(matches!(err, RunError::Config(_)), "got {err:?}");
    assert!(config.mirror_path.join("server_a_gen3.xbk").exists());
}

#[tokio::test]
async fn unreadable_source_aborts_before_any_change() {
    let tmp = tempdir().unwrap();
    let config = BackupConfig {
        source_path: tmp.path().join("missing"),
        mirror_path: tmp.path().join("mirror"),
        archive: ArchiveConfig::default(),
        upload: UploadConfig::default(),
    };

    let err = run_backup(&config, None, thursday()).await.unwrap_err();

    assert!(matches!(err, RunError::Traversal(_)), "got {err:?}");
    assert!(!config.mirror_path.exists());
}

#[tokio::test]
async fn retention_keeps_new_archive_and_newest_old_one() {
    let tmp = tempdir().unwrap();
    let mut config = base_config(&tmp);
    config.archive = archiving(&tmp, 2);
    let archives = tmp.path().join("archives");
    write_backup(&archives.join("site_2024W08.zip"), b"old", 3 * 604_800);
    write_backup(&archives.join("site_2024W09.zip"), b"old", 2 * 604_800);
    write_backup(&archives.join("site_2024W10.zip"), b"old", 604_800);

    let report = run_backup(&config, None, thursday()).await.unwrap();

    let mut left: Vec<String> = fs::read_dir(&archives)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    left.sort();
    assert_eq!(left, vec!["site_2024W10.zip", "site_2024W11.zip"]);
    assert_eq!(report.pruned.unwrap().removed.len(), 2);
}

#[tokio::test]
async fn rerun_is_idempotent_for_the_mirror() {
    let tmp = tempdir().unwrap();
    let config = base_config(&tmp);

    run_backup(&config, None, thursday()).await.unwrap();
    let second = run_backup(&config, None, thursday()).await.unwrap();

    assert!(second.mirror.is_noop());
    assert_eq!(second.mirror.skipped.len(), 2);
}
