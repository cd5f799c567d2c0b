//! 스캔 결과
//!
//! [`ScanResult`]는 하나의 데이터베이스 핸들에서 계산된 매치와,
//! 그 핸들의 상태 기록을 함께 담습니다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use scanward_core::types::Severity;
use scanward_vuln_db::DbStatus;

use crate::matcher::{IgnoredMatch, Match};
use crate::types::ScanContext;

/// 스캔 결과
#[derive(Debug, Clone)]
pub struct ScanResult {
    /// 스캔 고유 ID (UUID v4)
    pub scan_id: String,
    /// 보고 대상 매치
    pub matches: Vec<Match>,
    /// 제외 규칙에 걸린 매치
    pub ignored: Vec<IgnoredMatch>,
    /// 매칭에 사용된 데이터베이스 상태
    pub db_status: DbStatus,
    /// 성공까지의 시도 횟수
    pub attempts: u32,
    /// 부분 결과 등 경고
    pub warnings: Vec<String>,
    /// 입력 패키지 수
    pub package_count: usize,
    /// 스캔 컨텍스트
    pub context: ScanContext,
    /// 스캔 완료 시각
    pub scanned_at: DateTime<Utc>,
}

impl ScanResult {
    /// 발견된 취약점 수를 반환합니다.
    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    /// 심각도별 매치 수를 반환합니다.
    pub fn severity_counts(&self) -> SeverityCounts {
        SeverityCounts::from_matches(&self.matches)
    }

    /// 주어진 심각도 이상의 매치가 있는지 확인합니다.
    pub fn has_at_least(&self, severity: Severity) -> bool {
        self.matches.iter().any(|m| m.severity >= severity)
    }
}

/// 심각도별 매치 개수
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub info: usize,
}

impl SeverityCounts {
    /// 매치 목록을 심각도별로 셉니다.
    pub fn from_matches(matches: &[Match]) -> Self {
        let mut counts = Self::default();
        for m in matches {
            match m.severity {
                Severity::Critical => counts.critical += 1,
                Severity::High => counts.high += 1,
                Severity::Medium => counts.medium += 1,
                Severity::Low => counts.low += 1,
                Severity::Info => counts.info += 1,
            }
        }
        counts
    }

    /// 전체 개수
    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium + self.low + self.info
    }
}
