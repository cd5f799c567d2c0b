//! Scan gateway.
//!
//! `POST /api/v1/scan/sbom` with `{"sbom": "<base64>"}` answers
//! `{"vulnerabilities": "<base64 result document>"}`. Errors carry a
//! `{"message": ...}` body.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use scanward_core::pipeline::BoxFuture;
use scanward_scanner::{ScanService, ScannerError};

use crate::http::{Handler, Request, Response};

/// Scan route.
pub const SCAN_SBOM_PATH: &str = "/api/v1/scan/sbom";

/// Scan request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRequest {
    /// Base64-encoded SBOM document.
    pub sbom: String,
}

/// Scan response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResponse {
    /// Base64-encoded result document.
    pub vulnerabilities: String,
}

/// HTTP status for a scan failure.
pub fn status_for(err: &ScannerError) -> u16 {
    match err {
        ScannerError::DecodeFailed(_) => 400,
        ScannerError::ProviderNotReady => 503,
        ScannerError::MatchTransientFailure(_)
        | ScannerError::ScanFailedAfterRetries { .. }
        | ScannerError::Encode(_)
        | ScannerError::Config { .. } => 500,
    }
}

/// Gateway handler over a [`ScanService`].
pub struct ScanApi {
    service: ScanService,
}

impl ScanApi {
    pub fn new(service: ScanService) -> Self {
        Self { service }
    }

    async fn scan_sbom(&self, request: Request) -> Response {
        let body: ScanRequest = match serde_json::from_slice(&request.body) {
            Ok(body) => body,
            Err(e) => return Response::message(400, format!("invalid request body: {e}")),
        };

        let raw = match STANDARD.decode(body.sbom.trim()) {
            Ok(raw) => raw,
            Err(e) => return Response::message(400, format!("sbom is not valid base64: {e}")),
        };

        match self.service.scan(raw).await {
            Ok(document) => {
                info!(bytes = document.len(), "scan completed");
                Response::json(
                    200,
                    &ScanResponse {
                        vulnerabilities: STANDARD.encode(document),
                    },
                )
            }
            Err(e) => {
                let status = status_for(&e);
                if status >= 500 {
                    warn!(error = %e, status, "scan failed");
                }
                Response::message(status, e.to_string())
            }
        }
    }
}

impl Handler for ScanApi {
    fn handle(&self, request: Request) -> BoxFuture<'_, Response> {
        Box::pin(async move {
            if request.path != SCAN_SBOM_PATH {
                return Response::message(404, format!("no route for {}", request.path));
            }
            if request.method != "POST" {
                return Response::message(405, format!("method {} not allowed", request.method));
            }
            self.scan_sbom(request).await
        })
    }
}
