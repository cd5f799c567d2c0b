//! scanward.toml 통합 설정 테스트
//!
//! - scanward.toml.example 파싱 테스트
//! - 부분 설정 (일부 섹션만) 로딩 테스트
//! - 환경변수 우선순위 테스트
//! - 빈 파일 / 잘못된 형식 에러 테스트

use scanward_core::config::{DEFAULT_UPDATE_URL, ScanwardConfig};
use scanward_core::error::{ConfigError, ScanwardError};

const EXAMPLE: &str = include_str!("../../../scanward.toml.example");

/// 환경변수를 설정한 채로 `f`를 실행하고 원래 값으로 복원합니다.
fn with_env<R>(key: &str, value: &str, f: impl FnOnce() -> R) -> R {
    let original = std::env::var(key).ok();
    // SAFETY: #[serial] 테스트에서만 호출되어 환경변수 조작이 직렬화됩니다.
    unsafe {
        std::env::set_var(key, value);
    }
    let result = f();
    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var(key, val),
            None => std::env::remove_var(key),
        }
    }
    result
}

// =============================================================================
// scanward.toml.example 파싱 테스트
// =============================================================================

#[test]
fn example_config_parses_successfully() {
    let config = ScanwardConfig::parse(EXAMPLE).expect("example config should parse");

    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.general.log_format, "json");
    assert_eq!(config.database.root_dir, "/var/lib/scanward/db");
    assert_eq!(config.database.update_url, DEFAULT_UPDATE_URL);
}

#[test]
fn example_config_passes_validation() {
    let config = ScanwardConfig::parse(EXAMPLE).expect("should parse");
    config
        .validate()
        .expect("example config should pass validation");
}

#[test]
fn example_config_matches_code_defaults() {
    let from_file = ScanwardConfig::parse(EXAMPLE).expect("should parse");
    let from_code = ScanwardConfig::default();

    // root_dir만 운영 경로로 다릅니다
    assert_eq!(
        from_file.database.update_interval_secs,
        from_code.database.update_interval_secs
    );
    assert_eq!(
        from_file.database.max_download_size,
        from_code.database.max_download_size
    );
    assert_eq!(from_file.server.port, from_code.server.port);
    assert_eq!(
        from_file.server.max_request_size,
        from_code.server.max_request_size
    );
    assert_eq!(from_file.health.port, from_code.health.port);
    assert_eq!(from_file.scan.max_attempts, from_code.scan.max_attempts);
    assert_eq!(
        from_file.scan.retry_backoff_ms,
        from_code.scan.retry_backoff_ms
    );
    assert_eq!(from_file.scan.max_packages, from_code.scan.max_packages);
    assert_eq!(from_file.metrics.endpoint, from_code.metrics.endpoint);
}

// =============================================================================
// 부분 설정 테스트
// =============================================================================

#[test]
fn partial_config_only_database_section() {
    let toml = r#"
[database]
update_url = "file:///srv/vulndb"
update_interval_secs = 600
"#;
    let config = ScanwardConfig::parse(toml).expect("should parse");

    assert_eq!(config.database.update_url, "file:///srv/vulndb");
    assert_eq!(config.database.update_interval_secs, 600);
    // 다른 섹션은 기본값
    assert_eq!(config.server.port, 9991);
    assert_eq!(config.scan.max_attempts, 5);
    config.validate().expect("should validate");
}

#[test]
fn partial_config_only_scan_section() {
    let toml = r#"
[scan]
min_severity = "high"
max_matches = 500
"#;
    let config = ScanwardConfig::parse(toml).expect("should parse");

    assert_eq!(config.scan.min_severity, "high");
    assert_eq!(config.scan.max_matches, 500);
    assert_eq!(config.scan.retry_backoff_ms, 1000);
}

// =============================================================================
// 환경변수 우선순위 테스트
// =============================================================================

#[test]
#[serial_test::serial]
fn env_override_takes_precedence_over_toml() {
    let toml = r#"
[database]
update_url = "https://mirror.internal/listing.json"
"#;

    let result = with_env("SCANWARD_DATABASE_UPDATE_URL", "file:///srv/vulndb", || {
        let mut config = ScanwardConfig::parse(toml).expect("should parse");
        config.apply_env_overrides();
        config.database.update_url
    });

    assert_eq!(result, "file:///srv/vulndb");
}

#[test]
#[serial_test::serial]
fn env_override_takes_precedence_over_defaults() {
    let result = with_env("SCANWARD_SCAN_MAX_ATTEMPTS", "3", || {
        let mut config = ScanwardConfig::parse("").expect("should parse");
        config.apply_env_overrides();
        config.scan.max_attempts
    });

    assert_eq!(result, 3);
}

#[test]
#[serial_test::serial]
fn env_override_with_unparsable_value_is_ignored() {
    let result = with_env("SCANWARD_SERVER_PORT", "not-a-port", || {
        let mut config = ScanwardConfig::parse("").expect("should parse");
        config.apply_env_overrides();
        config.server.port
    });

    assert_eq!(result, 9991);
}

#[tokio::test]
#[serial_test::serial]
async fn load_applies_env_then_validates() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("scanward.toml");
    std::fs::write(&path, "[scan]\nmax_attempts = 5\n").expect("write config");

    let original = std::env::var("SCANWARD_SCAN_MAX_ATTEMPTS").ok();
    // SAFETY: #[serial] 테스트
    unsafe {
        std::env::set_var("SCANWARD_SCAN_MAX_ATTEMPTS", "0");
    }
    let result = ScanwardConfig::load(&path).await;
    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("SCANWARD_SCAN_MAX_ATTEMPTS", val),
            None => std::env::remove_var("SCANWARD_SCAN_MAX_ATTEMPTS"),
        }
    }

    let err = result.expect_err("zero attempts should fail validation");
    assert!(matches!(
        err,
        ScanwardError::Config(ConfigError::InvalidValue { ref field, .. })
            if field == "scan.max_attempts"
    ));
}

// =============================================================================
// 에러 케이스
// =============================================================================

#[test]
fn empty_and_whitespace_input_uses_defaults() {
    let config = ScanwardConfig::parse("").expect("empty string should parse");
    assert_eq!(config.general.log_level, "info");

    let config = ScanwardConfig::parse("   \n\n  \t  ").expect("whitespace should parse");
    assert_eq!(config.server.port, 9991);

    let config = ScanwardConfig::parse("# comment only\n").expect("comments-only should parse");
    assert!(config.health.enabled);
}

#[test]
fn malformed_toml_is_parse_error() {
    let err = ScanwardConfig::parse("[invalid toml").unwrap_err();
    assert!(matches!(
        err,
        ScanwardError::Config(ConfigError::ParseFailed { .. })
    ));
}

#[test]
fn wrong_value_type_is_parse_error() {
    let toml = r#"
[server]
port = "not-a-number"
"#;
    let err = ScanwardConfig::parse(toml).unwrap_err();
    assert!(matches!(
        err,
        ScanwardError::Config(ConfigError::ParseFailed { .. })
    ));
}

#[tokio::test]
async fn from_file_missing_is_file_not_found() {
    let dir = tempfile::tempdir().expect("temp dir");
    let result = ScanwardConfig::from_file(dir.path().join("absent.toml")).await;
    assert!(matches!(
        result,
        Err(ScanwardError::Config(ConfigError::FileNotFound { .. }))
    ));
}

#[test]
fn serialized_config_reparses_identically() {
    let original = ScanwardConfig::parse(EXAMPLE).expect("should parse");
    let serialized = toml::to_string_pretty(&original).expect("should serialize");
    let reparsed = ScanwardConfig::parse(&serialized).expect("should reparse");

    assert_eq!(reparsed.database.root_dir, original.database.root_dir);
    assert_eq!(reparsed.database.update_url, original.database.update_url);
    assert_eq!(reparsed.server.bind_addr, original.server.bind_addr);
    assert_eq!(reparsed.scan.min_severity, original.scan.min_severity);
    assert_eq!(reparsed.metrics.enabled, original.metrics.enabled);
}
