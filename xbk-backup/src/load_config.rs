/// `load_config` module: reads the YAML config file into the core's [`BackupConfig`]
/// and injects the upload secret from the environment.
///
/// This is the only place where user-supplied YAML is parsed. The file never
/// carries secrets: the upload password comes from [`UPLOAD_PASSWORD_ENV`]
/// (a `.env` file in the working directory is honoured by the binary).
///
/// # Errors
/// All errors use `anyhow::Error` and are surfaced at the CLI boundary with the
/// offending path in the message.
///
/// For the accepted YAML schema, see [`crate::init::default_config_yaml`].
use anyhow::Result;
use std::env;
use std::fs;
use std::path::Path;
use tracing::{error, info, warn};
use xbk_backup_core::config::BackupConfig;

/// Environment variable holding the upload password.
pub const UPLOAD_PASSWORD_ENV: &str = "XBK_UPLOAD_PASSWORD";

/// Loads a static YAML config file (no secrets) and injects the upload
/// password from the environment.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<BackupConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let mut config: BackupConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    config.upload.password = env::var(UPLOAD_PASSWORD_ENV).ok().filter(|p| !p.is_empty());
    if config.upload.enabled && config.upload.password.is_none() {
        warn!(
            env = UPLOAD_PASSWORD_ENV,
            "Upload enabled but no password set in environment"
        );
    }

    config.trace_loaded();
    Ok(config)
}
