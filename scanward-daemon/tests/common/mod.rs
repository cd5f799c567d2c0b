//! Shared fixtures for daemon integration tests.

#![allow(dead_code)]

use std::path::Path;

use scanward_core::config::ScanwardConfig;
use scanward_core::types::Severity;
use scanward_vuln_db::store::DbArchive;
use scanward_vuln_db::{
    DbMetadata, Ecosystem, SCHEMA_VERSION, VersionRange, VulnMetadata, VulnRecord,
};

/// Bundle with one critical lodash advisory.
pub fn lodash_bundle(built: &str) -> DbArchive {
    DbArchive {
        metadata: DbMetadata {
            schema_version: SCHEMA_VERSION,
            built: built.to_owned(),
            version: Some("test-bundle".to_owned()),
            checksum: None,
        },
        vulnerabilities: vec![VulnRecord {
            id: "GHSA-35jh-r3h4-6jhm".to_owned(),
            package: "lodash".to_owned(),
            ecosystem: Ecosystem::Npm,
            namespace: None,
            affected_ranges: vec![VersionRange {
                introduced: None,
                fixed: Some("4.17.21".to_owned()),
            }],
            fixed_version: Some("4.17.21".to_owned()),
        }],
        vulnerability_metadata: vec![VulnMetadata {
            id: "GHSA-35jh-r3h4-6jhm".to_owned(),
            severity: Severity::Critical,
            description: "Command injection in lodash".to_owned(),
            urls: vec!["https://github.com/advisories/GHSA-35jh-r3h4-6jhm".to_owned()],
            published: None,
        }],
        exclusions: vec![],
    }
}

/// Write a bundle file atomically.
pub fn publish_bundle(path: &Path, archive: &DbArchive) {
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, serde_json::to_vec(archive).unwrap()).unwrap();
    std::fs::rename(&tmp, path).unwrap();
}

/// Config serving on ephemeral loopback ports from a local bundle.
pub fn test_config(root_dir: &Path, bundle: &Path, max_request_size: usize) -> ScanwardConfig {
    let toml = format!(
        r#"
[general]
log_level = "info"
log_format = "json"

[database]
root_dir = "{root}"
update_url = "file://{bundle}"
update_interval_secs = 3600

[server]
bind_addr = "127.0.0.1"
port = 0
max_request_size = {max_request_size}
read_timeout_secs = 5

[health]
enabled = true
bind_addr = "127.0.0.1"
port = 0

[scan]
retry_backoff_ms = 10
"#,
        root = root_dir.display(),
        bundle = bundle.display(),
    );
    ScanwardConfig::parse(&toml).expect("test config should parse")
}

pub const LODASH_SBOM: &str = r#"{
    "bomFormat": "CycloneDX",
    "specVersion": "1.5",
    "metadata": {"component": {"type": "application", "name": "storefront"}},
    "components": [
        {"type": "library", "name": "lodash", "version": "4.17.20", "purl": "pkg:npm/lodash@4.17.20"}
    ]
}"#;
