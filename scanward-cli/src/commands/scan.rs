//! `scanward scan` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use scanward_core::types::Severity;
use scanward_scanner::{ResultDocument, SeverityCounts};

use super::{load_or_default, local_url};
use crate::cli::ScanArgs;
use crate::client::DaemonClient;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `scan` command.
pub async fn execute(
    args: ScanArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let threshold = args.fail_on.as_deref().map(parse_severity).transpose()?;

    let server = match args.server {
        Some(server) => server,
        None => {
            let config = load_or_default(config_path).await?;
            local_url(&config.server.bind_addr, config.server.port)
        }
    };

    let sbom = tokio::fs::read(&args.file).await.map_err(|e| {
        CliError::Command(format!("failed to read {}: {}", args.file.display(), e))
    })?;

    info!(file = %args.file.display(), %server, "submitting sbom for scanning");
    let document = DaemonClient::new(server)?.scan(&sbom).await?;

    let report = ScanReport::new(args.file.display().to_string(), document);
    writer.render(&report)?;

    if let Some(threshold) = threshold {
        let count = report.count_at_least(threshold);
        if count > 0 {
            return Err(CliError::VulnerabilitiesFound {
                count,
                threshold: threshold.as_label().to_owned(),
            });
        }
    }

    Ok(())
}

pub(crate) fn parse_severity(s: &str) -> Result<Severity, CliError> {
    Severity::from_str_loose(s).ok_or_else(|| {
        CliError::Command(format!(
            "invalid severity: {s} (expected: info, low, medium, high, critical)"
        ))
    })
}

/// Scan output: the daemon's result document plus a severity summary.
#[derive(Serialize)]
pub struct ScanReport {
    pub file: String,
    pub summary: SeverityCounts,
    pub result: ResultDocument,
}

impl ScanReport {
    pub fn new(file: String, result: ResultDocument) -> Self {
        Self {
            file,
            summary: SeverityCounts::from_matches(&result.matches),
            result,
        }
    }

    /// Number of matches at or above `severity`.
    pub fn count_at_least(&self, severity: Severity) -> usize {
        self.result
            .matches
            .iter()
            .filter(|m| m.severity >= severity)
            .count()
    }
}

impl Render for ScanReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        let doc = &self.result;
        writeln!(w, "Scan: {}", self.file.bold())?;
        writeln!(
            w,
            "Source: {} ({}, {} packages)",
            doc.source.name, doc.source.format, doc.source.package_count
        )?;
        if let Some(distro) = &doc.distro {
            writeln!(w, "Distro: {} {}", distro.name, distro.version)?;
        }
        writeln!(
            w,
            "Database: built {} (version {}, schema {})",
            doc.db_status.built, doc.db_status.version, doc.db_status.schema_version
        )?;
        writeln!(w)?;

        let summary = format!(
            "{} total (C:{} H:{} M:{} L:{} I:{})",
            self.summary.total(),
            self.summary.critical,
            self.summary.high,
            self.summary.medium,
            self.summary.low,
            self.summary.info
        );
        if self.summary.total() > 0 {
            writeln!(w, "Vulnerabilities: {}", summary.red().bold())?;
        } else {
            writeln!(w, "Vulnerabilities: {}", summary.green().bold())?;
        }
        writeln!(w)?;

        if doc.matches.is_empty() {
            writeln!(w, "{}", "No vulnerabilities found.".green())?;
        } else {
            writeln!(
                w,
                "{:<22} {:<10} {:<28} {:<16} Fixed",
                "ID", "Severity", "Package", "Version"
            )?;
            writeln!(w, "{}", "-".repeat(90))?;

            for m in &doc.matches {
                let label = format!("{:<10}", m.severity.to_string());
                let severity = match m.severity {
                    Severity::Critical => label.red().bold(),
                    Severity::High => label.red(),
                    Severity::Medium => label.yellow(),
                    Severity::Low => label.normal(),
                    Severity::Info => label.dimmed(),
                };
                writeln!(
                    w,
                    "{:<22} {} {:<28} {:<16} {}",
                    m.vulnerability_id,
                    severity,
                    m.package.name,
                    m.package.version,
                    m.fixed_version.as_deref().unwrap_or("N/A")
                )?;
            }
        }

        if !doc.ignored_matches.is_empty() {
            writeln!(w)?;
            writeln!(w, "Ignored: {}", doc.ignored_matches.len())?;
            for ignored in &doc.ignored_matches {
                writeln!(
                    w,
                    "  {} {} ({})",
                    ignored.matched.vulnerability_id, ignored.matched.package.name, ignored.reason
                )?;
            }
        }

        for warning in &doc.warnings {
            writeln!(w, "{} {}", "warning:".yellow().bold(), warning)?;
        }

        Ok(())
    }
}
