//! 스캐너 설정
//!
//! [`ScannerConfig`]는 core의 [`ScanConfig`](scanward_core::config::ScanConfig)와
//! 서버 요청 크기 제한을 타입이 있는 값으로 옮깁니다.
//!
//! # 사용 예시
//!
//! ```
//! use scanward_scanner::ScannerConfigBuilder;
//! use scanward_core::Severity;
//!
//! let config = ScannerConfigBuilder::new()
//!     .max_attempts(3)
//!     .min_severity(Severity::High)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.max_attempts, 3);
//! ```

use std::time::Duration;

use scanward_core::config::ScanwardConfig;
use scanward_core::types::Severity;

use crate::error::ScannerError;
use crate::retry::RetryPolicy;

/// 시도 횟수 상한
const MAX_ATTEMPTS_LIMIT: u32 = 20;
/// 패키지 수 상한
const MAX_PACKAGES_LIMIT: usize = 1_000_000;
/// 재시도 간격 상한 (1분)
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// 스캐너 설정
///
/// # 필드
///
/// - **max_attempts**: 매칭 최대 시도 횟수
/// - **retry_backoff**: 재시도 간 고정 대기 시간
/// - **min_severity**: 보고할 최소 심각도
/// - **max_matches**: 매치 수 상한 (0 = 무제한)
/// - **max_packages**: SBOM당 최대 패키지 수
/// - **max_sbom_size**: SBOM 최대 크기 (바이트)
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// 매칭 최대 시도 횟수
    pub max_attempts: u32,
    /// 재시도 간 고정 대기 시간
    pub retry_backoff: Duration,
    /// 보고할 최소 심각도
    pub min_severity: Severity,
    /// 매치 수 상한 (0 = 무제한)
    pub max_matches: usize,
    /// SBOM당 최대 패키지 수
    pub max_packages: usize,
    /// SBOM 최대 크기 (바이트)
    pub max_sbom_size: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self::from_core(&ScanwardConfig::default())
    }
}

impl ScannerConfig {
    /// core 설정에서 스캐너 설정을 생성합니다.
    ///
    /// 알 수 없는 `min_severity`는 `Info`로 취급합니다.
    /// (core 검증 단계에서 이미 거부됩니다.)
    pub fn from_core(core: &ScanwardConfig) -> Self {
        Self {
            max_attempts: core.scan.max_attempts,
            retry_backoff: Duration::from_millis(core.scan.retry_backoff_ms),
            min_severity: Severity::from_str_loose(&core.scan.min_severity)
                .unwrap_or(Severity::Info),
            max_matches: core.scan.max_matches,
            max_packages: core.scan.max_packages,
            max_sbom_size: core.server.max_request_size,
        }
    }

    /// 설정 값의 유효성을 검증합니다.
    ///
    /// # 검증 규칙
    ///
    /// - `max_attempts`: 1-20
    /// - `retry_backoff`: 최대 60초
    /// - `max_packages`: 1-1000000
    /// - `max_sbom_size`: 0보다 큼
    pub fn validate(&self) -> Result<(), ScannerError> {
        if self.max_attempts == 0 || self.max_attempts > MAX_ATTEMPTS_LIMIT {
            return Err(config_err(
                "max_attempts",
                format!(
                    "must be between 1 and {MAX_ATTEMPTS_LIMIT}, got {}",
                    self.max_attempts
                ),
            ));
        }

        if self.retry_backoff > MAX_BACKOFF {
            return Err(config_err(
                "retry_backoff",
                format!(
                    "must be at most {}s, got {}ms",
                    MAX_BACKOFF.as_secs(),
                    self.retry_backoff.as_millis()
                ),
            ));
        }

        if self.max_packages == 0 || self.max_packages > MAX_PACKAGES_LIMIT {
            return Err(config_err(
                "max_packages",
                format!(
                    "must be between 1 and {MAX_PACKAGES_LIMIT}, got {}",
                    self.max_packages
                ),
            ));
        }

        if self.max_sbom_size == 0 {
            return Err(config_err(
                "max_sbom_size",
                "must be greater than 0".to_owned(),
            ));
        }

        Ok(())
    }

    /// 재시도 정책을 반환합니다.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, self.retry_backoff)
    }
}

fn config_err(field: &str, reason: String) -> ScannerError {
    ScannerError::Config {
        field: field.to_owned(),
        reason,
    }
}

/// 스캐너 설정 빌더
#[derive(Debug, Clone, Default)]
pub struct ScannerConfigBuilder {
    config: ScannerConfig,
}

impl ScannerConfigBuilder {
    /// 기본값으로 빌더를 만듭니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 최대 시도 횟수를 설정합니다.
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.max_attempts = attempts;
        self
    }

    /// 재시도 간격을 설정합니다.
    pub fn retry_backoff(mut self, backoff: Duration) -> Self {
        self.config.retry_backoff = backoff;
        self
    }

    /// 최소 심각도를 설정합니다.
    pub fn min_severity(mut self, severity: Severity) -> Self {
        self.config.min_severity = severity;
        self
    }

    /// 매치 수 상한을 설정합니다.
    pub fn max_matches(mut self, max: usize) -> Self {
        self.config.max_matches = max;
        self
    }

    /// 최대 패키지 수를 설정합니다.
    pub fn max_packages(mut self, max: usize) -> Self {
        self.config.max_packages = max;
        self
    }

    /// SBOM 최대 크기를 설정합니다.
    pub fn max_sbom_size(mut self, size: usize) -> Self {
        self.config.max_sbom_size = size;
        self
    }

    /// 설정을 검증하고 반환합니다.
    pub fn build(self) -> Result<ScannerConfig, ScannerError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
