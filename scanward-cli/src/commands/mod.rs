//! Subcommand handlers

pub mod config;
pub mod scan;
pub mod status;

use std::path::Path;

use scanward_core::config::ScanwardConfig;
use scanward_core::error::{ConfigError, ScanwardError};

use crate::error::CliError;

/// Load the config file, falling back to defaults when it does not exist.
///
/// Used only to derive daemon URLs; an explicit `--server` skips it.
pub(crate) async fn load_or_default(path: &Path) -> Result<ScanwardConfig, CliError> {
    match ScanwardConfig::load(path).await {
        Ok(config) => Ok(config),
        Err(ScanwardError::Config(ConfigError::FileNotFound { .. })) => {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Ok(ScanwardConfig::default())
        }
        Err(e) => Err(e.into()),
    }
}

/// Base URL for a listener configured at `bind_addr:port`.
///
/// Wildcard bind addresses are reached through loopback.
pub(crate) fn local_url(bind_addr: &str, port: u16) -> String {
    let host = match bind_addr {
        "" | "0.0.0.0" | "::" | "[::]" => "127.0.0.1",
        other => other,
    };
    format!("http://{host}:{port}")
}
