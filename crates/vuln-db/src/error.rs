//! 취약점 데이터베이스 에러 타입
//!
//! [`VulnDbError`]는 로드, 다운로드, 검증, 갱신 과정의 모든 실패를 나타냅니다.
//! `From<VulnDbError> for ScanwardError` 구현으로 상위 에러 타입으로 전파됩니다.
//!
//! # 에러 카테고리
//!
//! - **수명주기**: `DatabaseUnavailable` (시작 시 치명적), `RefreshFailed` (로그 후 계속), `NotLoaded`
//! - **다운로드**: `Fetch`, `DownloadTooLarge`, `Checksum`, `NoCandidate`
//! - **검증/로딩**: `SchemaMismatch`, `Load`, `Parse`, `Io`
//! - **조회**: `Provider`
//! - **설정**: `Config`

use scanward_core::error::{DatabaseError, ScanwardError};

/// 취약점 데이터베이스 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum VulnDbError {
    /// 초기 로드에서 사용 가능한 핸들을 만들지 못함
    #[error("database unavailable: {0}")]
    DatabaseUnavailable(String),

    /// 주기적 갱신 실패 (이전 핸들은 유지됨)
    #[error("database refresh failed: {0}")]
    RefreshFailed(String),

    /// 초기 로드 전에 갱신이 요청됨
    #[error("database was not loaded")]
    NotLoaded,

    /// HTTP 요청 실패
    #[error("fetch error: {url}: {reason}")]
    Fetch {
        /// 요청 URL
        url: String,
        /// 실패 사유
        reason: String,
    },

    /// 다운로드 크기 초과
    #[error("download too large: {size} bytes (max: {max})")]
    DownloadTooLarge {
        /// 실제 크기
        size: u64,
        /// 허용 크기
        max: u64,
    },

    /// 체크섬 불일치
    #[error("checksum mismatch: expected {expected}, got {actual}")]
    Checksum {
        /// 목록에 기재된 체크섬
        expected: String,
        /// 계산된 체크섬
        actual: String,
    },

    /// 지원 스키마에 해당하는 데이터베이스가 목록에 없음
    #[error("no database available for schema {schema}")]
    NoCandidate {
        /// 지원 스키마 버전
        schema: u32,
    },

    /// 스키마 버전 불일치
    #[error("schema mismatch: expected {expected}, found {found}")]
    SchemaMismatch {
        /// 지원 스키마 버전
        expected: u32,
        /// 데이터베이스에 기록된 버전
        found: u32,
    },

    /// 데이터베이스 파일 로딩 실패
    #[error("database load error: {path}: {reason}")]
    Load {
        /// 파일 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// JSON 파싱 실패
    #[error("database parse error: {0}")]
    Parse(String),

    /// 파일 I/O 에러
    #[error("io error: {path}: {source}")]
    Io {
        /// 관련 경로
        path: String,
        /// 원본 I/O 에러
        source: std::io::Error,
    },

    /// 조회 실패
    #[error("provider error: {0}")]
    Provider(String),

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },
}

impl VulnDbError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

impl From<VulnDbError> for ScanwardError {
    fn from(err: VulnDbError) -> Self {
        match err {
            VulnDbError::DatabaseUnavailable(msg) => {
                ScanwardError::Database(DatabaseError::Unavailable(msg))
            }
            VulnDbError::RefreshFailed(msg) => {
                ScanwardError::Database(DatabaseError::RefreshFailed(msg))
            }
            VulnDbError::Config { field, reason } => {
                ScanwardError::Config(scanward_core::error::ConfigError::InvalidValue {
                    field,
                    reason,
                })
            }
            other => ScanwardError::Database(DatabaseError::Fetch(other.to_string())),
        }
    }
}
