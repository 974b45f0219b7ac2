#![doc = "HTTP archive store: bridges the core's `ArchiveStore` capability to a remote web server."]
//
//! # HTTP Archive Store (CLI <-> Core)
//!
//! The core engine only knows the [`ArchiveStore`] trait. This module provides
//! [`HttpArchiveStore`], which sends a finished archive to
//! `<endpoint>/<destination name>` with an HTTP `PUT`.
//!
//! - Construct it with [`HttpArchiveStore::from_config`] from the `upload`
//!   section of the config file. The password is injected by
//!   [`crate::load_config`] from the environment.
//! - Basic authentication is sent whenever a user name is configured.
//! - Any non-success status is reported as a [`StoreError`]; the engine does
//!   not retry.

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info};
use xbk_backup_core::config::UploadConfig;
use xbk_backup_core::contract::{ArchiveStore, StoreError};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct HttpArchiveStore {
    client: reqwest::Client,
    endpoint: String,
    user: String,
    password: Option<String>,
}

impl HttpArchiveStore {
    pub fn from_config(upload: &UploadConfig) -> Result<Self, StoreError> {
        let endpoint = upload.endpoint.trim().trim_end_matches('/');
        if endpoint.is_empty() {
            error!("Upload endpoint missing in config");
            return Err("upload is enabled but no endpoint is configured".into());
        }
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        info!(
            endpoint = %endpoint,
            user = %upload.user,
            password_set = upload.password.is_some(),
            "Initialized HttpArchiveStore from config"
        );
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            user: upload.user.clone(),
            password: upload.password.clone(),
        })
    }

    fn destination_url(&self, destination_name: &str) -> String {
        format!("{}/{}", self.endpoint, destination_name)
    }
}

#[async_trait]
impl ArchiveStore for HttpArchiveStore {
    async fn store(&self, destination_name: &str, local_path: &Path) -> Result<(), StoreError> {
        let body = tokio::fs::read(local_path).await.map_err(|e| {
            error!(error = ?e, path = %local_path.display(), "Failed to read archive for upload");
            e
        })?;
        let url = self.destination_url(destination_name);
        info!(url = %url, bytes = body.len(), "[UPLOAD] Sending archive");

        let mut request = self.client.put(&url).body(body);
        if !self.user.is_empty() {
            request = request.basic_auth(&self.user, self.password.as_ref());
        }

        let response = request.send().await.map_err(|e| {
            error!(error = ?e, url = %url, "[UPLOAD] Request failed");
            e
        })?;
        let status = response.status();
        if !status.is_success() {
            error!(status = %status, url = %url, "[UPLOAD] Server rejected archive");
            return Err(format!("upload of {destination_name} rejected with status {status}").into());
        }
        info!(status = %status, url = %url, "[UPLOAD] Archive stored");
        Ok(())
    }
}
