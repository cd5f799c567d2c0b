//! CLI-specific error types and exit code mapping

use scanward_core::error::ScanwardError;

/// CLI-specific error type.
///
/// `exit_code()` maps each variant to the process exit status.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// Cannot connect to the daemon.
    #[error("daemon not reachable: {0}")]
    DaemonUnavailable(String),

    /// The daemon answered with an error status.
    #[error("daemon answered {status}: {message}")]
    Server { status: u16, message: String },

    /// Matches at or above the `--fail-on` threshold.
    #[error("found {count} vulnerabilities at or above {threshold}")]
    VulnerabilitiesFound { count: usize, threshold: String },

    /// JSON (de)serialisation failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                                  |
    /// |------|------------------------------------------|
    /// | 0    | Success                                  |
    /// | 1    | General / command / server error         |
    /// | 2    | Configuration error                      |
    /// | 3    | Daemon unreachable                       |
    /// | 4    | Vulnerabilities at or above `--fail-on`  |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::DaemonUnavailable(_) => 3,
            Self::VulnerabilitiesFound { .. } => 4,
            Self::Command(_) | Self::Server { .. } | Self::Json(_) | Self::Io(_) => 1,
        }
    }
}

impl From<ScanwardError> for CliError {
    fn from(e: ScanwardError) -> Self {
        match e {
            ScanwardError::Config(_) => Self::Config(e.to_string()),
            other => Self::Command(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for CliError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            Self::DaemonUnavailable(e.to_string())
        } else {
            Self::Command(format!("request failed: {e}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanward_core::error::ConfigError;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::Config("x".into()).exit_code(), 2);
        assert_eq!(CliError::DaemonUnavailable("x".into()).exit_code(), 3);
        assert_eq!(
            CliError::VulnerabilitiesFound {
                count: 2,
                threshold: "high".into()
            }
            .exit_code(),
            4
        );
        assert_eq!(CliError::Command("x".into()).exit_code(), 1);
        assert_eq!(
            CliError::Server {
                status: 500,
                message: "boom".into()
            }
            .exit_code(),
            1
        );
    }

    #[test]
    fn test_core_config_error_maps_to_config() {
        let core = ScanwardError::Config(ConfigError::FileNotFound {
            path: "scanward.toml".into(),
        });
        let err: CliError = core.into();
        assert!(matches!(err, CliError::Config(_)));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_error_display() {
        let err = CliError::Server {
            status: 503,
            message: "vulnerability provider not ready".into(),
        };
        assert_eq!(
            err.to_string(),
            "daemon answered 503: vulnerability provider not ready"
        );
    }
}
