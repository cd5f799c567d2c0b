//! Health reporting tests.
//!
//! Readiness and status are derived from the database manager.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use bytes::Bytes;
use scanward_core::pipeline::HealthStatus;
use scanward_daemon::health::{DaemonHealth, DatabaseHealth, HealthApi};
use scanward_daemon::http::{Handler, Request};
use scanward_vuln_db::{DatabaseManager, DirectoryFetcher};

use common::{lodash_bundle, publish_bundle};

fn get(path: &str) -> Request {
    Request {
        method: "GET".to_owned(),
        path: path.to_owned(),
        headers: vec![],
        body: Bytes::new(),
    }
}

fn serving() -> Arc<AtomicBool> {
    Arc::new(AtomicBool::new(true))
}

fn manager() -> Arc<DatabaseManager> {
    Arc::new(DatabaseManager::new(Arc::new(DirectoryFetcher::new())))
}

#[tokio::test]
async fn test_not_ready_before_initial_load() {
    // Given: A manager that has not loaded anything
    let api = HealthApi::new(manager(), Instant::now(), serving());

    // Then: Liveness passes, readiness does not
    assert_eq!(api.handle(get("/healthz/live")).await.status, 200);
    assert_eq!(api.handle(get("/healthz/ready")).await.status, 503);

    let response = api.handle(get("/healthz")).await;
    assert_eq!(response.status, 503);
    let health: DaemonHealth = serde_json::from_slice(&response.body).unwrap();
    assert!(health.status.is_unhealthy());
    assert!(!health.database.ready);
    assert!(health.database.schema_version.is_none());
}

#[tokio::test]
async fn test_ready_after_initial_load() {
    let root = tempfile::tempdir().unwrap();
    let bundle = root.path().join("bundle.json");
    publish_bundle(&bundle, &lodash_bundle("2024-06-01T00:00:00Z"));

    let manager = manager();
    manager
        .load_initial(root.path(), &format!("file://{}", bundle.display()))
        .await
        .unwrap();
    let api = HealthApi::new(Arc::clone(&manager), Instant::now(), serving());

    assert_eq!(api.handle(get("/healthz/ready")).await.status, 200);

    let health = DatabaseHealth::from_manager(&manager);
    assert_eq!(health.status, HealthStatus::Healthy);
    assert!(health.ready);
    assert_eq!(health.version.as_deref(), Some("test-bundle"));
}

#[tokio::test]
async fn test_failed_refresh_degrades_but_stays_ready() {
    // Given: A loaded database
    let root = tempfile::tempdir().unwrap();
    let bundle = root.path().join("bundle.json");
    publish_bundle(&bundle, &lodash_bundle("2024-06-01T00:00:00Z"));
    let manager = manager();
    manager
        .load_initial(root.path(), &format!("file://{}", bundle.display()))
        .await
        .unwrap();

    // When: The source is corrupted and a refresh fails
    std::fs::write(&bundle, b"{ not json").unwrap();
    assert!(manager.refresh().await.is_err());

    // Then: Still ready, reported as degraded
    let api = HealthApi::new(Arc::clone(&manager), Instant::now(), serving());
    assert_eq!(api.handle(get("/healthz/ready")).await.status, 200);

    let response = api.handle(get("/healthz")).await;
    assert_eq!(response.status, 200);
    let health: DaemonHealth = serde_json::from_slice(&response.body).unwrap();
    assert!(matches!(health.status, HealthStatus::Degraded(_)));
    assert!(health.database.last_refresh_error.is_some());
}

#[tokio::test]
async fn test_unknown_routes_and_methods() {
    let api = HealthApi::new(manager(), Instant::now(), serving());

    assert_eq!(api.handle(get("/metrics")).await.status, 404);

    let mut post = get("/healthz");
    post.method = "POST".to_owned();
    assert_eq!(api.handle(post).await.status, 405);
}

#[tokio::test]
async fn test_not_ready_until_gateway_is_serving() {
    // Given: A loaded database but no bound scan gateway yet
    let root = tempfile::tempdir().unwrap();
    let bundle = root.path().join("bundle.json");
    publish_bundle(&bundle, &lodash_bundle("2024-06-01T00:00:00Z"));

    let manager = manager();
    manager
        .load_initial(root.path(), &format!("file://{}", bundle.display()))
        .await
        .unwrap();
    let gateway_bound = Arc::new(AtomicBool::new(false));
    let api = HealthApi::new(
        Arc::clone(&manager),
        Instant::now(),
        Arc::clone(&gateway_bound),
    );

    // Then: Readiness waits for the gateway
    assert_eq!(api.handle(get("/healthz/ready")).await.status, 503);
    assert_eq!(api.handle(get("/healthz/live")).await.status, 200);

    // When: The gateway listener is bound
    gateway_bound.store(true, Ordering::Release);

    // Then: Ready
    assert_eq!(api.handle(get("/healthz/ready")).await.status, 200);
}
