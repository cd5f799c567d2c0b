//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 크레이트는 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`,
//! `metrics::histogram!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `scanward_`
//! - 영역: `scan_`, `db_`, `daemon_`
//! - 접미어: `_total` (counter), `_seconds` (histogram/latency), 없음 (gauge)

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 심각도 레이블 키 (info, low, medium, high, critical)
pub const LABEL_SEVERITY: &str = "severity";

/// 결과 레이블 키
pub const LABEL_RESULT: &str = "result";

/// 실패 종류 레이블 키 (not_ready, decode, exhausted, encode)
pub const LABEL_REASON: &str = "reason";

// ─── 갱신 결과 레이블 값 ───────────────────────────────────────────

/// 새 데이터베이스가 설치됨
pub const RESULT_UPDATED: &str = "updated";

/// 최신 상태 유지
pub const RESULT_UNCHANGED: &str = "unchanged";

/// 갱신 실패
pub const RESULT_FAILED: &str = "failed";

// ─── 스캔 메트릭 ───────────────────────────────────────────────────

/// 스캔: 수신된 스캔 요청 수 (counter)
pub const SCAN_REQUESTS_TOTAL: &str = "scanward_scan_requests_total";

/// 스캔: 매칭 시도 수 (counter)
pub const SCAN_ATTEMPTS_TOTAL: &str = "scanward_scan_attempts_total";

/// 스캔: 재시도 수 (counter)
pub const SCAN_RETRIES_TOTAL: &str = "scanward_scan_retries_total";

/// 스캔: 실패한 스캔 수 (counter, label: reason)
pub const SCAN_FAILURES_TOTAL: &str = "scanward_scan_failures_total";

/// 스캔: 스캔 소요 시간 (histogram, 초)
pub const SCAN_DURATION_SECONDS: &str = "scanward_scan_duration_seconds";

/// 스캔: 발견된 매치 수 (counter, label: severity)
pub const SCAN_MATCHES_TOTAL: &str = "scanward_scan_matches_total";

// ─── 데이터베이스 메트릭 ───────────────────────────────────────────

/// DB: 갱신 시도 수 (counter, label: result)
pub const DB_REFRESH_TOTAL: &str = "scanward_db_refresh_total";

/// DB: 현재 스키마 버전 (gauge)
pub const DB_SCHEMA_VERSION: &str = "scanward_db_schema_version";

/// DB: 준비 상태 (gauge, 0 또는 1)
pub const DB_READY: &str = "scanward_db_ready";

// ─── Daemon 메트릭 ──────────────────────────────────────────────────

/// Daemon: 가동 시간 (gauge, 초)
pub const DAEMON_UPTIME_SECONDS: &str = "scanward_uptime_seconds";

// ─── 히스토그램 버킷 정의 ────────────────────────────────────────────

/// 스캔 소요 시간 히스토그램 버킷 (초)
///
/// 재시도 백오프를 포함하므로 수 초 단위까지 확장합니다.
pub const SCAN_DURATION_BUCKETS: [f64; 9] = [0.01, 0.05, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0];

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출합니다.
/// 일반적으로 `scanward-daemon`의 시작 시점에서 호출합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge, describe_histogram};

    describe_counter!(SCAN_REQUESTS_TOTAL, "Total number of scan requests received");
    describe_counter!(
        SCAN_ATTEMPTS_TOTAL,
        "Total number of matching attempts, including retries"
    );
    describe_counter!(
        SCAN_RETRIES_TOTAL,
        "Total number of matching attempts that were retried after a hard failure"
    );
    describe_counter!(
        SCAN_FAILURES_TOTAL,
        "Total number of scans that returned an error, by reason"
    );
    describe_histogram!(
        SCAN_DURATION_SECONDS,
        "Time to complete a single scan in seconds"
    );
    describe_counter!(
        SCAN_MATCHES_TOTAL,
        "Total number of vulnerability matches reported, by severity"
    );

    describe_counter!(
        DB_REFRESH_TOTAL,
        "Total number of database refresh cycles, by result"
    );
    describe_gauge!(
        DB_SCHEMA_VERSION,
        "Schema version of the currently installed vulnerability database"
    );
    describe_gauge!(
        DB_READY,
        "Whether a vulnerability database is installed (1) or not (0)"
    );

    describe_gauge!(DAEMON_UPTIME_SECONDS, "Scanward daemon uptime in seconds");
}
