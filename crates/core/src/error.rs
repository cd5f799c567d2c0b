//! 에러 타입 -- 도메인별 에러 정의

/// Scanward 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum ScanwardError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 취약점 데이터베이스 수명주기 에러
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// 스캔 실행 에러
    #[error("scan error: {0}")]
    Scan(#[from] ScanError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 취약점 데이터베이스 에러
///
/// 초기 로드 실패는 프로세스 시작을 중단시키고, 갱신 실패는 로그만 남깁니다.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// 초기 로드 실패 (시작 단계에서 치명적)
    #[error("database unavailable: {0}")]
    Unavailable(String),

    /// 주기적 갱신 실패 (이전 핸들 유지)
    #[error("database refresh failed: {0}")]
    RefreshFailed(String),

    /// 다운로드/검증 실패
    #[error("database fetch failed: {0}")]
    Fetch(String),
}

/// 스캔 실행 에러
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// 데이터베이스 핸들이 아직 설치되지 않음
    #[error("vulnerability provider not ready")]
    NotReady,

    /// SBOM 디코딩 실패
    #[error("decode failed: {0}")]
    DecodeFailed(String),

    /// 재시도 예산 소진
    #[error("scan failed after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: String },

    /// 결과 인코딩 실패
    #[error("encode failed: {0}")]
    Encode(String),
}
