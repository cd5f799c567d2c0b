//! 설정 관리 -- scanward.toml 파싱 및 런타임 설정
//!
//! [`ScanwardConfig`]는 모든 컴포넌트의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`SCANWARD_SERVER_PORT=9991` 형식)
//! 3. 설정 파일 (`scanward.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), scanward_core::error::ScanwardError> {
//! use scanward_core::config::ScanwardConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = ScanwardConfig::load("scanward.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = ScanwardConfig::parse("[scan]\nmax_attempts = 3")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, ScanwardError};
use crate::types::Severity;

/// 기본 취약점 DB 목록(listing) URL
pub const DEFAULT_UPDATE_URL: &str =
    "https://toolbox-data.anchore.io/grype/databases/listing.json";

/// 갱신 주기 하한 (초)
pub const MIN_UPDATE_INTERVAL_SECS: u64 = 60;

/// Scanward 통합 설정
///
/// `scanward.toml` 파일의 최상위 구조를 나타냅니다.
/// 각 컴포넌트는 자기 섹션만 읽어 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanwardConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 취약점 데이터베이스 설정
    #[serde(default)]
    pub database: DatabaseConfig,
    /// REST 서버 설정
    #[serde(default)]
    pub server: ServerConfig,
    /// 헬스체크 서버 설정
    #[serde(default)]
    pub health: HealthConfig,
    /// 스캔 실행 설정
    #[serde(default)]
    pub scan: ScanConfig,
    /// 메트릭 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl ScanwardConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ScanwardError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ScanwardError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ScanwardError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                ScanwardError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, ScanwardError> {
        toml::from_str(toml_str).map_err(|e| {
            ScanwardError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `SCANWARD_{SECTION}_{FIELD}`
    /// 예: `SCANWARD_DATABASE_UPDATE_URL=file:///srv/vulndb`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "SCANWARD_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "SCANWARD_GENERAL_LOG_FORMAT");

        // Database
        override_string(&mut self.database.root_dir, "SCANWARD_DATABASE_ROOT_DIR");
        override_string(
            &mut self.database.update_url,
            "SCANWARD_DATABASE_UPDATE_URL",
        );
        override_u64(
            &mut self.database.update_interval_secs,
            "SCANWARD_DATABASE_UPDATE_INTERVAL_SECS",
        );
        override_bool(
            &mut self.database.clean_on_start,
            "SCANWARD_DATABASE_CLEAN_ON_START",
        );
        override_bool(
            &mut self.database.validate_by_hash,
            "SCANWARD_DATABASE_VALIDATE_BY_HASH",
        );
        override_u64(
            &mut self.database.max_download_size,
            "SCANWARD_DATABASE_MAX_DOWNLOAD_SIZE",
        );
        override_u64(
            &mut self.database.request_timeout_secs,
            "SCANWARD_DATABASE_REQUEST_TIMEOUT_SECS",
        );

        // Server
        override_string(&mut self.server.bind_addr, "SCANWARD_SERVER_BIND_ADDR");
        override_u16(&mut self.server.port, "SCANWARD_SERVER_PORT");
        override_usize(
            &mut self.server.max_request_size,
            "SCANWARD_SERVER_MAX_REQUEST_SIZE",
        );
        override_usize(
            &mut self.server.max_connections,
            "SCANWARD_SERVER_MAX_CONNECTIONS",
        );
        override_u64(
            &mut self.server.read_timeout_secs,
            "SCANWARD_SERVER_READ_TIMEOUT_SECS",
        );

        // Health
        override_bool(&mut self.health.enabled, "SCANWARD_HEALTH_ENABLED");
        override_string(&mut self.health.bind_addr, "SCANWARD_HEALTH_BIND_ADDR");
        override_u16(&mut self.health.port, "SCANWARD_HEALTH_PORT");

        // Scan
        override_u32(&mut self.scan.max_attempts, "SCANWARD_SCAN_MAX_ATTEMPTS");
        override_u64(
            &mut self.scan.retry_backoff_ms,
            "SCANWARD_SCAN_RETRY_BACKOFF_MS",
        );
        override_string(&mut self.scan.min_severity, "SCANWARD_SCAN_MIN_SEVERITY");
        override_usize(&mut self.scan.max_matches, "SCANWARD_SCAN_MAX_MATCHES");
        override_usize(&mut self.scan.max_packages, "SCANWARD_SCAN_MAX_PACKAGES");

        // Metrics
        override_bool(&mut self.metrics.enabled, "SCANWARD_METRICS_ENABLED");
        override_string(
            &mut self.metrics.listen_addr,
            "SCANWARD_METRICS_LISTEN_ADDR",
        );
        override_u16(&mut self.metrics.port, "SCANWARD_METRICS_PORT");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ScanwardError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        if self.database.root_dir.is_empty() {
            return Err(invalid("database.root_dir", "must not be empty".to_owned()));
        }

        let url = self.database.update_url.as_str();
        if !(url.starts_with("http://") || url.starts_with("https://") || url.starts_with("file://"))
        {
            return Err(invalid(
                "database.update_url",
                "must start with http://, https:// or file://".to_owned(),
            ));
        }

        if self.database.update_interval_secs < MIN_UPDATE_INTERVAL_SECS {
            return Err(invalid(
                "database.update_interval_secs",
                format!("must be at least {MIN_UPDATE_INTERVAL_SECS}"),
            ));
        }

        if self.database.max_download_size == 0 {
            return Err(invalid(
                "database.max_download_size",
                "must be greater than 0".to_owned(),
            ));
        }

        if self.server.max_request_size == 0 {
            return Err(invalid(
                "server.max_request_size",
                "must be greater than 0".to_owned(),
            ));
        }

        if self.server.max_connections == 0 {
            return Err(invalid(
                "server.max_connections",
                "must be greater than 0".to_owned(),
            ));
        }

        if self.health.enabled
            && self.health.port == self.server.port
            && self.health.bind_addr == self.server.bind_addr
            && self.server.port != 0
        {
            return Err(invalid(
                "health.port",
                "must differ from server.port".to_owned(),
            ));
        }

        if self.scan.max_attempts == 0 || self.scan.max_attempts > 20 {
            return Err(invalid(
                "scan.max_attempts",
                "must be between 1 and 20".to_owned(),
            ));
        }

        if Severity::from_str_loose(&self.scan.min_severity).is_none() {
            return Err(invalid(
                "scan.min_severity",
                "must be one of: info, low, medium, high, critical".to_owned(),
            ));
        }

        if self.scan.max_packages == 0 {
            return Err(invalid(
                "scan.max_packages",
                "must be greater than 0".to_owned(),
            ));
        }

        if self.metrics.enabled && !self.metrics.endpoint.starts_with('/') {
            return Err(invalid(
                "metrics.endpoint",
                "must start with '/'".to_owned(),
            ));
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: String) -> ScanwardError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason,
    }
    .into()
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// 취약점 데이터베이스 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// 데이터베이스 루트 디렉토리 (`<root>/<schema>/` 아래에 설치)
    pub root_dir: String,
    /// 목록(listing) URL. `file://` 이면 로컬 디렉토리에서 로드
    pub update_url: String,
    /// 백그라운드 갱신 주기 (초)
    pub update_interval_secs: u64,
    /// 시작 시 기존 스키마 디렉토리 삭제 여부
    pub clean_on_start: bool,
    /// 다운로드 아카이브 체크섬 검증 여부
    pub validate_by_hash: bool,
    /// 다운로드 최대 크기 (바이트)
    pub max_download_size: u64,
    /// HTTP 요청 타임아웃 (초)
    pub request_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            root_dir: "/tmp/scanward-db".to_owned(),
            update_url: DEFAULT_UPDATE_URL.to_owned(),
            update_interval_secs: 6 * 60 * 60,
            clean_on_start: true,
            validate_by_hash: true,
            max_download_size: 512 * 1024 * 1024, // 512MB
            request_timeout_secs: 120,
        }
    }
}

/// REST 서버 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 바인드 주소
    pub bind_addr: String,
    /// 포트
    pub port: u16,
    /// 요청 본문 최대 크기 (바이트)
    pub max_request_size: usize,
    /// 동시 연결 최대 수
    pub max_connections: usize,
    /// 요청 읽기 타임아웃 (초)
    pub read_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_owned(),
            port: 9991,
            max_request_size: 64 * 1024 * 1024, // 64MB
            max_connections: 64,
            read_timeout_secs: 30,
        }
    }
}

/// 헬스체크 서버 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 바인드 주소
    pub bind_addr: String,
    /// 포트
    pub port: u16,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_addr: "0.0.0.0".to_owned(),
            port: 8080,
        }
    }
}

/// 스캔 실행 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// 매칭 최대 시도 횟수
    pub max_attempts: u32,
    /// 재시도 간 고정 대기 시간 (밀리초)
    pub retry_backoff_ms: u64,
    /// 보고할 최소 심각도 (info, low, medium, high, critical)
    pub min_severity: String,
    /// 매치 수 상한 (0 = 무제한). 초과 시 결과를 잘라내고 경고를 남깁니다.
    pub max_matches: usize,
    /// SBOM당 최대 패키지 수
    pub max_packages: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            retry_backoff_ms: 1000,
            min_severity: "info".to_owned(),
            max_matches: 0,
            max_packages: 100_000,
        }
    }
}

/// 메트릭 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 수신 주소
    pub listen_addr: String,
    /// 포트
    pub port: u16,
    /// 스크레이프 엔드포인트
    pub endpoint: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9100,
            endpoint: "/metrics".to_owned(),
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_parsed<T: std::str::FromStr>(target: &mut T, env_key: &str, type_name: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<T>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                expected = type_name,
                "failed to parse env var, ignoring"
            ),
        }
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    override_parsed(target, env_key, "bool");
}

fn override_u16(target: &mut u16, env_key: &str) {
    override_parsed(target, env_key, "u16");
}

fn override_u32(target: &mut u32, env_key: &str) {
    override_parsed(target, env_key, "u32");
}

fn override_u64(target: &mut u64, env_key: &str) {
    override_parsed(target, env_key, "u64");
}

fn override_usize(target: &mut usize, env_key: &str) {
    override_parsed(target, env_key, "usize");
}
