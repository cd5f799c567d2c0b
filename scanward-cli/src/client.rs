//! HTTP client for the daemon's scan gateway and health responder.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::debug;

use scanward_daemon::health::DaemonHealth;
use scanward_daemon::rest::{SCAN_SBOM_PATH, ScanRequest, ScanResponse};
use scanward_scanner::{JsonPresenter, ResultDocument};

use crate::error::CliError;

/// Scans can wait out the daemon's full retry window.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Client bound to one daemon base URL.
pub struct DaemonClient {
    base_url: String,
    http: reqwest::Client,
}

impl DaemonClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, CliError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("scanward-cli/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CliError::Command(format!("failed to build http client: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            http,
        })
    }

    /// Submit raw SBOM bytes and decode the returned result document.
    pub async fn scan(&self, sbom: &[u8]) -> Result<ResultDocument, CliError> {
        let url = format!("{}{}", self.base_url, SCAN_SBOM_PATH);
        debug!(%url, bytes = sbom.len(), "submitting sbom");

        let response = self
            .http
            .post(&url)
            .json(&ScanRequest {
                sbom: STANDARD.encode(sbom),
            })
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.bytes().await?;
        if status != 200 {
            return Err(server_error(status, &body));
        }

        let envelope: ScanResponse = serde_json::from_slice(&body)?;
        let raw = STANDARD
            .decode(envelope.vulnerabilities)
            .map_err(|e| CliError::Command(format!("result is not valid base64: {e}")))?;
        JsonPresenter::decode(&raw)
            .map_err(|e| CliError::Command(format!("invalid result document: {e}")))
    }

    /// Fetch `/healthz`. An unhealthy daemon answers 503 with the same document.
    pub async fn health(&self) -> Result<DaemonHealth, CliError> {
        let url = format!("{}/healthz", self.base_url);
        let response = self.http.get(&url).send().await?;

        let status = response.status().as_u16();
        let body = response.bytes().await?;
        if status != 200 && status != 503 {
            return Err(server_error(status, &body));
        }
        Ok(serde_json::from_slice(&body)?)
    }
}

fn server_error(status: u16, body: &[u8]) -> CliError {
    let message = serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_owned))
        .unwrap_or_else(|| String::from_utf8_lossy(body).into_owned());
    CliError::Server { status, message }
}
