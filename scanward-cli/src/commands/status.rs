//! `scanward status` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;

use scanward_core::pipeline::HealthStatus;
use scanward_daemon::health::DaemonHealth;

use super::{load_or_default, local_url};
use crate::cli::StatusArgs;
use crate::client::DaemonClient;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `status` command.
pub async fn execute(
    args: StatusArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let server = match args.server {
        Some(server) => server,
        None => {
            let config = load_or_default(config_path).await?;
            if !config.health.enabled {
                return Err(CliError::Command(
                    "health responder is disabled in config; pass --server".to_owned(),
                ));
            }
            local_url(&config.health.bind_addr, config.health.port)
        }
    };

    let health = DaemonClient::new(server.clone())?.health().await?;
    writer.render(&StatusReport { server, health })
}

/// Daemon status as reported by `/healthz`.
#[derive(Serialize)]
pub struct StatusReport {
    pub server: String,
    #[serde(flatten)]
    pub health: DaemonHealth,
}

fn colored_status(status: &HealthStatus) -> String {
    use colored::Colorize;

    match status {
        HealthStatus::Healthy => "healthy".green().to_string(),
        HealthStatus::Degraded(reason) => format!("{} ({})", "degraded".yellow(), reason),
        HealthStatus::Unhealthy(reason) => format!("{} ({})", "unhealthy".red(), reason),
    }
}

impl Render for StatusReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        let db = &self.health.database;
        writeln!(w, "scanward-daemon at {}", self.server.bold())?;
        writeln!(w, "  Status: {}", colored_status(&self.health.status))?;
        writeln!(w, "  Uptime: {}s", self.health.uptime_secs)?;
        writeln!(w)?;
        writeln!(w, "Vulnerability database")?;
        writeln!(w, "  Ready:   {}", if db.ready { "yes" } else { "no" })?;
        if let Some(schema) = db.schema_version {
            writeln!(w, "  Schema:  v{schema}")?;
        }
        if let Some(built) = &db.built {
            writeln!(w, "  Built:   {built}")?;
        }
        if let Some(version) = &db.version {
            writeln!(w, "  Version: {version}")?;
        }
        if let Some(err) = &db.last_refresh_error {
            writeln!(w, "  Last refresh error: {}", err.red())?;
        }
        Ok(())
    }
}
