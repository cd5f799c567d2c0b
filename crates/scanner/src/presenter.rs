//! 결과 문서 인코딩
//!
//! [`JsonPresenter`]는 [`ScanResult`]를 외부로 내보내는 JSON 문서로 변환합니다.
//!
//! ```json
//! {
//!   "descriptor": {"name": "scanward", "version": "0.1.0", "scan_id": "...", "timestamp": "...", "attempts": 1},
//!   "source": {"name": "my-app", "format": "CycloneDx", "package_count": 42},
//!   "distro": {"name": "debian", "version": "12"},
//!   "matches": [...],
//!   "ignored_matches": [...],
//!   "db_status": {"schema_version": 5, "built": "...", "location": "...", "version": "..."},
//!   "warnings": []
//! }
//! ```

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

use scanward_vuln_db::DbStatus;

use crate::error::ScannerError;
use crate::matcher::{IgnoredMatch, Match};
use crate::result::ScanResult;
use crate::types::{Distro, SbomFormat};

/// 문서 생성 도구 정보
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    /// 도구 이름
    pub name: String,
    /// 도구 버전
    pub version: String,
    /// 스캔 ID
    pub scan_id: String,
    /// 스캔 시각 (UTC RFC 3339)
    pub timestamp: String,
    /// 성공까지의 시도 횟수
    pub attempts: u32,
}

/// 스캔 원본 정보
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    /// 원본 이름
    pub name: String,
    /// 입력 형식
    pub format: SbomFormat,
    /// 패키지 수
    pub package_count: usize,
}

/// 결과 문서
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultDocument {
    pub descriptor: Descriptor,
    pub source: SourceInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distro: Option<Distro>,
    pub matches: Vec<Match>,
    pub ignored_matches: Vec<IgnoredMatch>,
    pub db_status: DbStatus,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// JSON 결과 인코더
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPresenter {
    pretty: bool,
}

impl JsonPresenter {
    /// 압축 JSON 인코더
    pub fn new() -> Self {
        Self::default()
    }

    /// 들여쓰기 JSON 인코더
    pub fn pretty() -> Self {
        Self { pretty: true }
    }

    /// 결과를 문서 구조로 변환합니다.
    pub fn present(&self, result: &ScanResult) -> ResultDocument {
        ResultDocument {
            descriptor: Descriptor {
                name: "scanward".to_owned(),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                scan_id: result.scan_id.clone(),
                timestamp: result
                    .scanned_at
                    .to_rfc3339_opts(SecondsFormat::Secs, true),
                attempts: result.attempts,
            },
            source: SourceInfo {
                name: result.context.source_name.clone(),
                format: result.context.format,
                package_count: result.package_count,
            },
            distro: result.context.distro.clone(),
            matches: result.matches.clone(),
            ignored_matches: result.ignored.clone(),
            db_status: result.db_status.clone(),
            warnings: result.warnings.clone(),
        }
    }

    /// 결과를 JSON 바이트로 인코딩합니다.
    pub fn encode(&self, result: &ScanResult) -> Result<Vec<u8>, ScannerError> {
        let doc = self.present(result);
        let encoded = if self.pretty {
            serde_json::to_vec_pretty(&doc)
        } else {
            serde_json::to_vec(&doc)
        };
        encoded.map_err(|e| ScannerError::Encode(e.to_string()))
    }

    /// JSON 바이트를 결과 문서로 해석합니다.
    pub fn decode(raw: &[u8]) -> Result<ResultDocument, ScannerError> {
        serde_json::from_slice(raw)
            .map_err(|e| ScannerError::DecodeFailed(format!("invalid result document: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use scanward_core::types::Severity;
    use scanward_vuln_db::Ecosystem;

    use super::*;
    use crate::types::{Package, ScanContext};

    fn sample_result() -> ScanResult {
        ScanResult {
            scan_id: "6f1c".to_owned(),
            matches: vec![Match {
                vulnerability_id: "CVE-2021-23337".to_owned(),
                package: Package::new("lodash", "4.17.20", Ecosystem::Npm),
                severity: Severity::High,
                fixed_version: Some("4.17.21".to_owned()),
                namespace: None,
                description: "Command injection".to_owned(),
                urls: vec![],
            }],
            ignored: vec![],
            db_status: DbStatus {
                schema_version: 5,
                built: "2024-06-01T00:00:00Z".to_owned(),
                location: "/var/lib/scanward/5/db".to_owned(),
                checksum: Some("blake3:abcd".to_owned()),
                version: "2024-06-01".to_owned(),
            },
            attempts: 2,
            warnings: vec!["results truncated to 1 of 2 matches".to_owned()],
            package_count: 12,
            context: ScanContext::new("web", SbomFormat::Spdx),
            scanned_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn timestamp_is_utc_with_whole_seconds() {
        let mut result = sample_result();
        result.scanned_at = Utc.with_ymd_and_hms(2024, 2, 29, 12, 34, 56).unwrap()
            + chrono::Duration::milliseconds(789);
        let doc = JsonPresenter::new().present(&result);
        assert_eq!(doc.descriptor.timestamp, "2024-02-29T12:34:56Z");
    }

    #[test]
    fn present_carries_result_fields() {
        let doc = JsonPresenter::new().present(&sample_result());
        assert_eq!(doc.descriptor.name, "scanward");
        assert_eq!(doc.descriptor.scan_id, "6f1c");
        assert_eq!(doc.descriptor.timestamp, "2024-01-01T00:00:00Z");
        assert_eq!(doc.descriptor.attempts, 2);
        assert_eq!(doc.source.package_count, 12);
        assert_eq!(doc.db_status.version, "2024-06-01");
        assert_eq!(doc.matches.len(), 1);
        assert_eq!(doc.warnings.len(), 1);
    }

    #[test]
    fn encoded_document_decodes_back() {
        let raw = JsonPresenter::pretty().encode(&sample_result()).unwrap();
        let doc = JsonPresenter::decode(&raw).unwrap();
        assert_eq!(doc.matches[0].vulnerability_id, "CVE-2021-23337");
        assert_eq!(doc.matches[0].severity, Severity::High);
        assert!(doc.distro.is_none());

        let json: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert!(json.get("ignored_matches").unwrap().as_array().unwrap().is_empty());
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(JsonPresenter::decode(b"[1, 2").is_err());
    }
}
