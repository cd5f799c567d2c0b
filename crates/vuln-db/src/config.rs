//! 취약점 데이터베이스 설정
//!
//! [`DbConfig`]는 core의 [`DatabaseConfig`](scanward_core::config::DatabaseConfig)를
//! 타입이 있는 값(`PathBuf`, `Duration`)으로 옮기고 검증합니다.
//!
//! # 사용 예시
//!
//! ```
//! use scanward_vuln_db::DbConfigBuilder;
//!
//! let config = DbConfigBuilder::new()
//!     .root_dir("/var/lib/scanward/db")
//!     .update_interval_secs(3600)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.update_interval.as_secs(), 3600);
//! ```

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use scanward_core::config::MIN_UPDATE_INTERVAL_SECS;

use crate::error::VulnDbError;

/// 갱신 주기 상한 (7일)
const MAX_UPDATE_INTERVAL_SECS: u64 = 604_800;

/// 경로 길이 제한
const MAX_PATH_LEN: usize = 4096;

/// 취약점 데이터베이스 설정
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// 데이터베이스 루트 디렉토리
    pub root_dir: PathBuf,
    /// 목록(listing) URL 또는 `file://` 경로
    pub update_url: String,
    /// 백그라운드 갱신 주기
    pub update_interval: Duration,
    /// 시작 시 스키마 디렉토리 삭제 여부
    pub clean_on_start: bool,
    /// 체크섬 검증 여부
    pub validate_by_hash: bool,
    /// 다운로드 최대 크기 (바이트)
    pub max_download_size: u64,
    /// HTTP 요청 타임아웃
    pub request_timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self::from_core(&scanward_core::config::DatabaseConfig::default())
    }
}

impl DbConfig {
    /// core의 `DatabaseConfig`에서 설정을 생성합니다.
    pub fn from_core(core: &scanward_core::config::DatabaseConfig) -> Self {
        Self {
            root_dir: PathBuf::from(&core.root_dir),
            update_url: core.update_url.clone(),
            update_interval: Duration::from_secs(core.update_interval_secs),
            clean_on_start: core.clean_on_start,
            validate_by_hash: core.validate_by_hash,
            max_download_size: core.max_download_size,
            request_timeout: Duration::from_secs(core.request_timeout_secs),
        }
    }

    /// 설정 값의 유효성을 검증합니다.
    ///
    /// # 검증 규칙
    ///
    /// - `root_dir`: 비어있지 않고 `..` 컴포넌트 없음
    /// - `update_url`: `http://`, `https://`, `file://` 중 하나
    /// - `update_interval`: 60초-7일
    /// - `max_download_size`, `request_timeout`: 0보다 큼
    pub fn validate(&self) -> Result<(), VulnDbError> {
        let root = self.root_dir.as_os_str();
        if root.is_empty() || root.len() > MAX_PATH_LEN {
            return Err(config_err(
                "root_dir",
                format!("must be 1-{MAX_PATH_LEN} bytes"),
            ));
        }

        if self.root_dir.components().any(|c| c == Component::ParentDir) {
            return Err(config_err(
                "root_dir",
                "contains path traversal pattern '..'".to_owned(),
            ));
        }

        let url = self.update_url.as_str();
        if !(url.starts_with("http://") || url.starts_with("https://") || url.starts_with("file://"))
        {
            return Err(config_err(
                "update_url",
                "must start with http://, https:// or file://".to_owned(),
            ));
        }

        let secs = self.update_interval.as_secs();
        if !(MIN_UPDATE_INTERVAL_SECS..=MAX_UPDATE_INTERVAL_SECS).contains(&secs) {
            return Err(config_err(
                "update_interval",
                format!("must be {MIN_UPDATE_INTERVAL_SECS}-{MAX_UPDATE_INTERVAL_SECS} seconds"),
            ));
        }

        if self.max_download_size == 0 {
            return Err(config_err(
                "max_download_size",
                "must be greater than 0".to_owned(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(config_err(
                "request_timeout",
                "must be greater than 0".to_owned(),
            ));
        }

        Ok(())
    }

    /// `file://` URL이면 로컬 경로를 반환합니다.
    pub fn local_source(&self) -> Option<&Path> {
        self.update_url.strip_prefix("file://").map(Path::new)
    }
}

fn config_err(field: &str, reason: String) -> VulnDbError {
    VulnDbError::Config {
        field: field.to_owned(),
        reason,
    }
}

/// [`DbConfig`] 빌더
pub struct DbConfigBuilder {
    config: DbConfig,
}

impl Default for DbConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DbConfigBuilder {
    /// 기본값을 가진 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: DbConfig::default(),
        }
    }

    /// 루트 디렉토리를 설정합니다.
    pub fn root_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.root_dir = dir.into();
        self
    }

    /// 목록 URL을 설정합니다.
    pub fn update_url(mut self, url: impl Into<String>) -> Self {
        self.config.update_url = url.into();
        self
    }

    /// 갱신 주기(초)를 설정합니다.
    pub fn update_interval_secs(mut self, secs: u64) -> Self {
        self.config.update_interval = Duration::from_secs(secs);
        self
    }

    /// 시작 시 정리 여부를 설정합니다.
    pub fn clean_on_start(mut self, clean: bool) -> Self {
        self.config.clean_on_start = clean;
        self
    }

    /// 체크섬 검증 여부를 설정합니다.
    pub fn validate_by_hash(mut self, validate: bool) -> Self {
        self.config.validate_by_hash = validate;
        self
    }

    /// 다운로드 최대 크기를 설정합니다.
    pub fn max_download_size(mut self, size: u64) -> Self {
        self.config.max_download_size = size;
        self
    }

    /// HTTP 요청 타임아웃을 설정합니다.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// 설정을 검증하고 빌드합니다.
    ///
    /// # Errors
    ///
    /// 유효성 검증 실패 시 `VulnDbError::Config` 반환
    pub fn build(self) -> Result<DbConfig, VulnDbError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
