//! CLI argument definitions for scanward-daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Scanward vulnerability scanning daemon.
///
/// Loads the vulnerability database, keeps it fresh in the background
/// and serves SBOM scan requests over HTTP.
#[derive(Parser, Debug)]
#[command(name = "scanward-daemon")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to scanward.toml configuration file.
    #[arg(short, long, default_value = "/etc/scanward/scanward.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Validate configuration file and exit without starting the daemon.
    #[arg(long)]
    pub validate: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = DaemonCli::parse_from(["scanward-daemon"]);
        assert_eq!(cli.config, PathBuf::from("/etc/scanward/scanward.toml"));
        assert!(cli.log_level.is_none());
        assert!(!cli.validate);
    }

    #[test]
    fn test_overrides() {
        let cli = DaemonCli::parse_from([
            "scanward-daemon",
            "-c",
            "/tmp/scanward.toml",
            "--log-level",
            "debug",
            "--log-format",
            "pretty",
            "--validate",
        ]);
        assert_eq!(cli.config, PathBuf::from("/tmp/scanward.toml"));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.log_format.as_deref(), Some("pretty"));
        assert!(cli.validate);
    }
}
