//! CLI argument parsing using clap derive API
//!
//! Purely declarative: no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Scanward -- SBOM vulnerability scanning client.
///
/// Use `scanward <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "scanward", version, about, long_about = None)]
pub struct Cli {
    /// Path to the scanward.toml configuration file.
    #[arg(short, long, global = true, default_value = "scanward.toml")]
    pub config: PathBuf,

    /// Enable diagnostic logging to stderr at this level.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table / text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Submit an SBOM to the daemon and report matches.
    Scan(ScanArgs),

    /// Show daemon and database health.
    Status(StatusArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- scan ----

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// SBOM file (CycloneDX or SPDX JSON).
    pub file: PathBuf,

    /// Daemon scan endpoint base URL (default: derived from the config file).
    #[arg(long)]
    pub server: Option<String>,

    /// Exit with code 4 if any match is at or above this severity.
    #[arg(long)]
    pub fail_on: Option<String>,
}

// ---- status ----

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Daemon health endpoint base URL (default: derived from the config file).
    #[arg(long)]
    pub server: Option<String>,
}

// ---- config ----

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Load and validate the configuration file.
    Validate,
    /// Print the effective configuration (file + environment + defaults).
    Show {
        /// Only show this section (general, database, server, health, scan, metrics).
        #[arg(long)]
        section: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_scan_defaults() {
        let cli = Cli::parse_from(["scanward", "scan", "bom.json"]);
        assert_eq!(cli.config, PathBuf::from("scanward.toml"));
        assert_eq!(cli.output, OutputFormat::Text);
        match cli.command {
            Commands::Scan(args) => {
                assert_eq!(args.file, PathBuf::from("bom.json"));
                assert!(args.server.is_none());
                assert!(args.fail_on.is_none());
            }
            other => panic!("expected scan, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_scan_options() {
        let cli = Cli::parse_from([
            "scanward",
            "scan",
            "bom.json",
            "--server",
            "http://scanner:9991",
            "--fail-on",
            "high",
            "--output",
            "json",
        ]);
        assert_eq!(cli.output, OutputFormat::Json);
        match cli.command {
            Commands::Scan(args) => {
                assert_eq!(args.server.as_deref(), Some("http://scanner:9991"));
                assert_eq!(args.fail_on.as_deref(), Some("high"));
            }
            other => panic!("expected scan, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_config_show_section() {
        let cli = Cli::parse_from(["scanward", "config", "show", "--section", "database"]);
        match cli.command {
            Commands::Config(ConfigArgs {
                action: ConfigAction::Show { section },
            }) => assert_eq!(section.as_deref(), Some("database")),
            other => panic!("expected config show, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["scanward"]).is_err());
    }

    #[test]
    fn test_cli_rejects_unknown_output() {
        assert!(Cli::try_parse_from(["scanward", "--output", "xml", "status"]).is_err());
    }
}
