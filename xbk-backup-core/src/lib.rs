#![doc = "xbk-backup-core: selection, mirroring, archiving and retention engine for xbk-backup."]

//! This crate holds the backup engine and the capability traits it calls out
//! through. It never talks to the network itself; the CLI crate supplies the
//! concrete [`contract::ArchiveStore`].
//!
//! # Usage
//! Build a [`config::BackupConfig`] and call [`run::run_backup`], or use the
//! individual steps (`select`, `mirror`, `archive`, `retention`) directly.

pub mod archive;
pub mod artifact;
pub mod config;
pub mod contract;
pub mod error;
pub mod locate;
pub mod mirror;
pub mod naming;
pub mod retention;
pub mod run;
pub mod schedule;
pub mod select;
