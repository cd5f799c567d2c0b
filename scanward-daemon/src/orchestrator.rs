//! Daemon assembly and lifecycle.
//!
//! The [`Orchestrator`] validates configuration and builds the database
//! manager. [`Orchestrator::start`] runs the startup sequence and returns a
//! [`RunningDaemon`] that owns the background tasks until shutdown.
//!
//! # Startup Order
//!
//! 1. Metrics exporter (when enabled)
//! 2. Clean the database directory (when `clean_on_start`)
//! 3. Health responder, reporting not-ready
//! 4. Initial database load (failure aborts startup)
//! 5. Background refresher
//! 6. Scan gateway
//!
//! `/healthz/ready` flips to 200 once step 6 has bound the gateway listener.
//!
//! # Shutdown
//!
//! A single [`CancellationToken`] stops the refresher and both servers.

use std::future::Future;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use anyhow::Result;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;

use scanward_core::config::ScanwardConfig;
use scanward_scanner::{ScanService, ScannerConfig};
use scanward_vuln_db::fetcher::clean_schema_dir;
use scanward_vuln_db::{DatabaseManager, DbConfig, Refresher, fetcher_for_url};

use crate::health::{DaemonHealth, HealthApi};
use crate::http::{HttpServer, ServerLimits};
use crate::metrics_server;
use crate::rest::ScanApi;

/// Connection cap for the health responder.
const HEALTH_MAX_CONNECTIONS: usize = 16;
/// Health requests carry no body.
const HEALTH_MAX_BODY: usize = 1024;

/// Daemon builder and startup driver.
pub struct Orchestrator {
    config: ScanwardConfig,
    db_config: DbConfig,
    scanner_config: ScannerConfig,
    manager: Arc<DatabaseManager>,
    serving: Arc<AtomicBool>,
    cancel: CancellationToken,
    start_time: Instant,
}

impl Orchestrator {
    /// Load `scanward.toml` (with environment overrides) and build.
    pub async fn build(config_path: &Path) -> Result<Self> {
        let config = ScanwardConfig::load(config_path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?;
        Self::build_from_config(config)
    }

    /// Build from an already-loaded configuration.
    pub fn build_from_config(config: ScanwardConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

        let db_config = DbConfig::from_core(&config.database);
        db_config
            .validate()
            .map_err(|e| anyhow::anyhow!("database config invalid: {}", e))?;

        let scanner_config = ScannerConfig::from_core(&config);
        scanner_config
            .validate()
            .map_err(|e| anyhow::anyhow!("scanner config invalid: {}", e))?;

        let fetcher = fetcher_for_url(&db_config)
            .map_err(|e| anyhow::anyhow!("failed to build database fetcher: {}", e))?;

        tracing::debug!(
            update_url = %db_config.update_url,
            root_dir = %db_config.root_dir.display(),
            "orchestrator initialized"
        );

        Ok(Self {
            config,
            db_config,
            scanner_config,
            manager: Arc::new(DatabaseManager::new(fetcher)),
            serving: Arc::new(AtomicBool::new(false)),
            cancel: CancellationToken::new(),
            start_time: Instant::now(),
        })
    }

    /// Run the startup sequence.
    ///
    /// # Errors
    ///
    /// Fails if a listener cannot be bound or the initial database load
    /// fails. Anything already started is cancelled before returning.
    pub async fn start(self) -> Result<RunningDaemon> {
        let mut servers = JoinSet::new();
        let mut background = Vec::new();

        let started = self.start_inner(&mut servers, &mut background).await;
        match started {
            Ok((rest_addr, health_addr)) => Ok(RunningDaemon {
                rest_addr,
                health_addr,
                manager: self.manager,
                cancel: self.cancel,
                start_time: self.start_time,
                servers,
                background,
            }),
            Err(e) => {
                self.cancel.cancel();
                while servers.join_next().await.is_some() {}
                for task in background {
                    let _ = task.await;
                }
                Err(e)
            }
        }
    }

    async fn start_inner(
        &self,
        servers: &mut JoinSet<Result<()>>,
        background: &mut Vec<JoinHandle<()>>,
    ) -> Result<(SocketAddr, Option<SocketAddr>)> {
        if self.config.metrics.enabled {
            metrics_server::install_metrics_recorder(&self.config.metrics)?;
            background.push(metrics_server::spawn_uptime_updater(
                self.start_time,
                self.cancel.clone(),
            ));
        }

        if self.db_config.clean_on_start {
            clean_schema_dir(&self.db_config.root_dir)
                .await
                .map_err(|e| anyhow::anyhow!("failed to clean database directory: {}", e))?;
        }

        let health_addr = if self.config.health.enabled {
            let server = HttpServer::bind(
                "health",
                &format!("{}:{}", self.config.health.bind_addr, self.config.health.port),
                ServerLimits {
                    max_connections: HEALTH_MAX_CONNECTIONS,
                    max_body: HEALTH_MAX_BODY,
                    read_timeout: std::time::Duration::from_secs(
                        self.config.server.read_timeout_secs,
                    ),
                },
                Arc::new(HealthApi::new(
                    Arc::clone(&self.manager),
                    self.start_time,
                    Arc::clone(&self.serving),
                )),
            )
            .await?;
            let addr = server.local_addr()?;
            servers.spawn(server.run(self.cancel.clone()));
            Some(addr)
        } else {
            None
        };

        let status = self
            .manager
            .load_initial(&self.db_config.root_dir, &self.db_config.update_url)
            .await
            .map_err(|e| anyhow::anyhow!("initial database load failed: {}", e))?;
        tracing::info!(%status, "vulnerability database loaded");

        let refresher = Refresher::new(Arc::clone(&self.manager), self.db_config.update_interval);
        background.push(refresher.spawn(self.cancel.clone()));

        let service = ScanService::from_config(Arc::clone(&self.manager), &self.scanner_config);
        let server = HttpServer::bind(
            "scan",
            &format!("{}:{}", self.config.server.bind_addr, self.config.server.port),
            ServerLimits {
                max_connections: self.config.server.max_connections,
                max_body: self.config.server.max_request_size,
                read_timeout: std::time::Duration::from_secs(self.config.server.read_timeout_secs),
            },
            Arc::new(ScanApi::new(service)),
        )
        .await?;
        let rest_addr = server.local_addr()?;
        servers.spawn(server.run(self.cancel.clone()));
        self.serving.store(true, Ordering::Release);

        tracing::info!(
            scan_addr = %rest_addr,
            health_addr = ?health_addr,
            "scanward-daemon ready"
        );
        Ok((rest_addr, health_addr))
    }

    /// Start, then block until SIGTERM/SIGINT or a server failure.
    pub async fn run(self) -> Result<()> {
        let running = self.start().await?;
        running.wait(wait_for_shutdown_signal()).await
    }

    pub fn config(&self) -> &ScanwardConfig {
        &self.config
    }

    pub fn manager(&self) -> &Arc<DatabaseManager> {
        &self.manager
    }
}

/// A started daemon.
pub struct RunningDaemon {
    rest_addr: SocketAddr,
    health_addr: Option<SocketAddr>,
    manager: Arc<DatabaseManager>,
    cancel: CancellationToken,
    start_time: Instant,
    servers: JoinSet<Result<()>>,
    background: Vec<JoinHandle<()>>,
}

impl RunningDaemon {
    /// Bound address of the scan gateway.
    pub fn rest_addr(&self) -> SocketAddr {
        self.rest_addr
    }

    /// Bound address of the health responder, when enabled.
    pub fn health_addr(&self) -> Option<SocketAddr> {
        self.health_addr
    }

    pub fn manager(&self) -> &Arc<DatabaseManager> {
        &self.manager
    }

    pub fn health(&self) -> DaemonHealth {
        DaemonHealth::collect(&self.manager, self.start_time)
    }

    /// Wait for `shutdown` to resolve or a server to exit, then stop everything.
    ///
    /// A server exiting on its own is reported as an error.
    pub async fn wait<F>(mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = Result<&'static str>>,
    {
        let outcome = tokio::select! {
            signal = shutdown => signal.map(|name| {
                tracing::info!(signal = name, "shutdown signal received");
            }),
            Some(joined) = self.servers.join_next() => match joined {
                Ok(Ok(())) => Err(anyhow::anyhow!("server exited unexpectedly")),
                Ok(Err(e)) => Err(e),
                Err(e) => Err(anyhow::anyhow!("server task failed: {}", e)),
            },
        };

        if let Err(e) = &outcome {
            tracing::error!(error = %e, "daemon stopping after fatal error");
        }
        self.shutdown().await;
        outcome
    }

    /// Cancel the refresher and servers and wait for them to finish.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        while let Some(joined) = self.servers.join_next().await {
            if let Ok(Err(e)) = joined {
                tracing::warn!(error = %e, "server stopped with error");
            }
        }
        for task in self.background {
            let _ = task.await;
        }
        tracing::info!("scanward-daemon stopped");
    }
}

/// Wait for SIGTERM or SIGINT and return the signal name.
///
/// # Errors
///
/// Returns an error if signal handlers cannot be installed.
pub async fn wait_for_shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}
