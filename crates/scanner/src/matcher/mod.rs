//! 취약점 매칭 -- 패키지 목록을 데이터베이스 제공자와 대조
//!
//! [`Matcher`]는 실행기가 소비하는 매칭 경계입니다. 부작용 없이 `(packages, context, providers)`에서
//! [`MatchSet`]을 계산합니다. 기본 구현은 [`VulnMatcher`]입니다.
//!
//! # 실패 분류
//!
//! - [`MatchError::Provider`]: 조회 실패. 재시도 대상입니다.
//! - [`MatchError::Partial`]: 결과 수 상한에 걸려 잘린 결과. 재시도하지 않고 경고와 함께 사용합니다.

pub mod version;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use scanward_core::types::Severity;
use scanward_vuln_db::{Providers, VulnDbError};

use crate::config::ScannerConfig;
use crate::types::{Package, ScanContext};

/// 단일 취약점 매치
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    /// 취약점 ID
    pub vulnerability_id: String,
    /// 매칭된 패키지
    pub package: Package,
    /// 심각도 (메타데이터가 없으면 `Info`)
    pub severity: Severity,
    /// 수정 버전
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_version: Option<String>,
    /// 레코드 네임스페이스 (배포판 레코드)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// 설명
    #[serde(default)]
    pub description: String,
    /// 참조 URL
    #[serde(default)]
    pub urls: Vec<String>,
}

/// 제외 규칙에 걸린 매치
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoredMatch {
    /// 원래 매치
    #[serde(rename = "match")]
    pub matched: Match,
    /// 제외 사유
    pub reason: String,
}

/// 매칭 결과
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSet {
    /// 보고 대상 매치
    pub matches: Vec<Match>,
    /// 무시된 매치
    pub ignored: Vec<IgnoredMatch>,
}

/// 매칭 실패
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    /// 제공자 조회 실패
    #[error("provider error: {0}")]
    Provider(String),

    /// 결과가 잘린 부분 성공
    #[error("partial match result: {reason}")]
    Partial {
        /// 잘린 결과
        set: MatchSet,
        /// 사유
        reason: String,
    },
}

impl MatchError {
    /// 재시도할 수 있는 실패인지 여부
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Provider(_))
    }
}

impl From<VulnDbError> for MatchError {
    fn from(err: VulnDbError) -> Self {
        Self::Provider(err.to_string())
    }
}

/// 매칭 경계
pub trait Matcher: Send + Sync {
    /// 패키지 목록의 매치를 계산합니다.
    fn find_matches(
        &self,
        packages: &[Package],
        context: &ScanContext,
        providers: &Providers,
    ) -> Result<MatchSet, MatchError>;
}

/// 기본 취약점 매처
///
/// 이름과 생태계로 레코드를 조회한 뒤 버전 범위, 배포판 네임스페이스,
/// 제외 규칙, 최소 심각도를 차례로 적용합니다.
#[derive(Debug, Clone)]
pub struct VulnMatcher {
    min_severity: Severity,
    max_matches: usize,
}

impl Default for VulnMatcher {
    fn default() -> Self {
        Self::new(Severity::Info, 0)
    }
}

impl VulnMatcher {
    /// 최소 심각도와 매치 수 상한(0 = 무제한)으로 매처를 만듭니다.
    pub fn new(min_severity: Severity, max_matches: usize) -> Self {
        Self {
            min_severity,
            max_matches,
        }
    }

    /// 스캐너 설정에서 매처를 만듭니다.
    pub fn from_config(config: &ScannerConfig) -> Self {
        Self::new(config.min_severity, config.max_matches)
    }

    /// 최소 심각도
    pub fn min_severity(&self) -> Severity {
        self.min_severity
    }
}

impl Matcher for VulnMatcher {
    fn find_matches(
        &self,
        packages: &[Package],
        context: &ScanContext,
        providers: &Providers,
    ) -> Result<MatchSet, MatchError> {
        let distro_namespace = context.distro.as_ref().map(|d| d.namespace());
        let mut set = MatchSet::default();
        let mut seen = HashSet::new();

        for package in packages {
            let Some(ecosystem) = package.ecosystem else {
                continue;
            };

            for record in providers.vulnerabilities.by_package(&package.name, ecosystem)? {
                if ecosystem.is_distro()
                    && let Some(namespace) = record.namespace.as_deref()
                    && distro_namespace.as_deref() != Some(namespace)
                {
                    continue;
                }

                if !version::is_affected(&package.version, &record.affected_ranges) {
                    continue;
                }

                if !seen.insert((record.id.as_str(), package.name.as_str(), package.version.as_str())) {
                    continue;
                }

                let metadata = providers.metadata.metadata(&record.id)?;
                let severity = metadata.map(|m| m.severity).unwrap_or_default();
                if severity < self.min_severity {
                    continue;
                }

                let matched = Match {
                    vulnerability_id: record.id.clone(),
                    package: package.clone(),
                    severity,
                    fixed_version: record.fixed_version.clone(),
                    namespace: record.namespace.clone(),
                    description: metadata.map(|m| m.description.clone()).unwrap_or_default(),
                    urls: metadata.map(|m| m.urls.clone()).unwrap_or_default(),
                };

                let exclusion = providers
                    .exclusions
                    .exclusions_for(&record.id)?
                    .iter()
                    .find(|rule| rule.applies_to(&package.name, ecosystem));

                match exclusion {
                    Some(rule) => set.ignored.push(IgnoredMatch {
                        matched,
                        reason: rule.reason.clone(),
                    }),
                    None => set.matches.push(matched),
                }
            }
        }

        // 심각도 내림차순, 같은 심각도는 ID 순
        set.matches.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then_with(|| a.vulnerability_id.cmp(&b.vulnerability_id))
                .then_with(|| a.package.name.cmp(&b.package.name))
        });

        if self.max_matches > 0 && set.matches.len() > self.max_matches {
            let total = set.matches.len();
            set.matches.truncate(self.max_matches);
            return Err(MatchError::Partial {
                set,
                reason: format!(
                    "results truncated to {} of {} matches",
                    self.max_matches, total
                ),
            });
        }

        Ok(set)
    }
}
