//! Health reporting and the health responder.
//!
//! The daemon is ready once the initial database load has installed a
//! handle and the scan gateway is accepting connections.
//!
//! # Status Rule
//!
//! - No database loaded -> Unhealthy
//! - Loaded, last refresh failed -> Degraded(reason)
//! - Loaded, last refresh fine -> Healthy

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use scanward_core::pipeline::{BoxFuture, HealthStatus};
use scanward_vuln_db::DatabaseManager;

use crate::http::{Handler, Request, Response};

/// Aggregated health report for the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonHealth {
    /// Overall daemon status.
    pub status: HealthStatus,
    /// Daemon uptime in seconds since start.
    pub uptime_secs: u64,
    /// Vulnerability database state.
    pub database: DatabaseHealth,
}

/// Health of the vulnerability database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseHealth {
    pub status: HealthStatus,
    pub ready: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub built: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_refresh_error: Option<String>,
}

impl DatabaseHealth {
    /// Snapshot the manager's current state.
    pub fn from_manager(manager: &DatabaseManager) -> Self {
        let db_status = manager.status();
        let last_refresh_error = manager.last_refresh_error();

        let status = match (&db_status, &last_refresh_error) {
            (None, _) => HealthStatus::Unhealthy("vulnerability database not loaded".to_owned()),
            (Some(_), Some(err)) => HealthStatus::Degraded(format!("last refresh failed: {err}")),
            (Some(_), None) => HealthStatus::Healthy,
        };

        Self {
            status,
            ready: db_status.is_some(),
            schema_version: db_status.as_ref().map(|s| s.schema_version),
            built: db_status.as_ref().map(|s| s.built.clone()),
            version: db_status.map(|s| s.version),
            last_refresh_error,
        }
    }
}

impl DaemonHealth {
    /// Build the report for a daemon started at `start_time`.
    pub fn collect(manager: &DatabaseManager, start_time: Instant) -> Self {
        let database = DatabaseHealth::from_manager(manager);
        Self {
            status: database.status.clone(),
            uptime_secs: start_time.elapsed().as_secs(),
            database,
        }
    }
}

/// `/healthz` responder.
///
/// - `GET /healthz/live` -> 200 while the process runs
/// - `GET /healthz/ready` -> 200 once the database is loaded and `serving`
///   is set, 503 before
/// - `GET /healthz` -> [`DaemonHealth`] document (503 when unhealthy)
pub struct HealthApi {
    manager: Arc<DatabaseManager>,
    start_time: Instant,
    serving: Arc<AtomicBool>,
}

impl HealthApi {
    /// `serving` is set by the owner once the scan gateway is bound.
    pub fn new(
        manager: Arc<DatabaseManager>,
        start_time: Instant,
        serving: Arc<AtomicBool>,
    ) -> Self {
        Self {
            manager,
            start_time,
            serving,
        }
    }

    fn is_ready(&self) -> bool {
        self.serving.load(Ordering::Acquire) && self.manager.is_ready()
    }

    fn respond(&self, request: &Request) -> Response {
        if request.method != "GET" {
            return Response::message(405, format!("method {} not allowed", request.method));
        }

        match request.path.as_str() {
            "/healthz/live" => Response::json(200, &serde_json::json!({ "status": "alive" })),
            "/healthz/ready" => {
                if self.is_ready() {
                    Response::json(200, &serde_json::json!({ "status": "ready" }))
                } else {
                    Response::json(503, &serde_json::json!({ "status": "not ready" }))
                }
            }
            "/healthz" => {
                let health = DaemonHealth::collect(&self.manager, self.start_time);
                let status = if health.status.is_unhealthy() { 503 } else { 200 };
                Response::json(status, &health)
            }
            other => Response::message(404, format!("no route for {other}")),
        }
    }
}

impl Handler for HealthApi {
    fn handle(&self, request: Request) -> BoxFuture<'_, Response> {
        Box::pin(async move { self.respond(&request) })
    }
}
