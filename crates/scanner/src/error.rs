//! 스캐너 에러 타입
//!
//! [`ScannerError`]는 디코딩, 매칭, 재시도, 인코딩 과정의 실패를 나타냅니다.
//! `From<ScannerError> for ScanwardError` 구현으로 상위 에러 타입으로 전파됩니다.
//!
//! # 재시도 분류
//!
//! - 즉시 반환: `ProviderNotReady`, `DecodeFailed`, `Encode`, `Config`
//! - 시도 단위 (호출자에게 노출되지 않음): `MatchTransientFailure`
//! - 최종: `ScanFailedAfterRetries`

use scanward_core::error::{ConfigError, ScanError, ScanwardError};

/// 스캐너 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum ScannerError {
    /// 초기 로드 전 스캔 요청
    #[error("vulnerability provider not ready")]
    ProviderNotReady,

    /// SBOM 디코딩 실패
    #[error("decode failed: {0}")]
    DecodeFailed(String),

    /// 단일 매칭 시도 실패
    #[error("match attempt failed: {0}")]
    MatchTransientFailure(String),

    /// 재시도 예산 소진
    #[error("scan failed after {attempts} attempts: {last_error}")]
    ScanFailedAfterRetries {
        /// 수행한 시도 횟수
        attempts: u32,
        /// 마지막 시도의 에러
        last_error: String,
    },

    /// 결과 인코딩 실패
    #[error("encode failed: {0}")]
    Encode(String),

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },
}

impl ScannerError {
    /// 요청 자체의 문제(클라이언트 측 에러)인지 여부
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::DecodeFailed(_))
    }
}

impl From<ScannerError> for ScanwardError {
    fn from(err: ScannerError) -> Self {
        match err {
            ScannerError::ProviderNotReady => ScanwardError::Scan(ScanError::NotReady),
            ScannerError::DecodeFailed(msg) => ScanwardError::Scan(ScanError::DecodeFailed(msg)),
            ScannerError::MatchTransientFailure(msg) => {
                ScanwardError::Scan(ScanError::Exhausted {
                    attempts: 1,
                    last_error: msg,
                })
            }
            ScannerError::ScanFailedAfterRetries {
                attempts,
                last_error,
            } => ScanwardError::Scan(ScanError::Exhausted {
                attempts,
                last_error,
            }),
            ScannerError::Encode(msg) => ScanwardError::Scan(ScanError::Encode(msg)),
            ScannerError::Config { field, reason } => {
                ScanwardError::Config(ConfigError::InvalidValue { field, reason })
            }
        }
    }
}
