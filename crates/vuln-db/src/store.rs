//! 취약점 데이터베이스 저장소 -- 디스크 상의 JSON DB 로딩 및 조회
//!
//! [`VulnStore`]는 하나의 데이터베이스 디렉토리를 메모리로 읽어 인덱싱합니다.
//! 로드가 끝난 저장소는 불변이며 `Arc`로 공유됩니다.
//!
//! # DB 디렉토리 구조
//!
//! ```text
//! <root_dir>/5/<built>/
//!   metadata.json                # {schema_version, built, version?, checksum?}
//!   vulnerabilities.json         # VulnRecord 배열
//!   vulnerability_metadata.json  # VulnMetadata 배열 (선택)
//!   exclusions.json              # ExclusionRule 배열 (선택)
//! ```
//!
//! # 레코드 형식
//!
//! ```json
//! {
//!   "id": "CVE-2024-1234",
//!   "package": "openssl",
//!   "ecosystem": "Deb",
//!   "namespace": "debian:12",
//!   "affected_ranges": [{ "introduced": "3.0.0", "fixed": "3.0.13" }],
//!   "fixed_version": "3.0.13"
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use scanward_core::types::Severity;

use crate::error::VulnDbError;
use crate::types::Ecosystem;

/// 지원하는 데이터베이스 스키마 버전
pub const SCHEMA_VERSION: u32 = 5;

/// DB 파일 최대 크기 (512 MB)
const MAX_DB_FILE_SIZE: u64 = 512 * 1024 * 1024;

/// 취약점 레코드 최대 개수 (1,000,000개)
const MAX_DB_RECORDS: usize = 1_000_000;

pub(crate) const METADATA_FILE: &str = "metadata.json";
pub(crate) const VULNERABILITIES_FILE: &str = "vulnerabilities.json";
pub(crate) const VULN_METADATA_FILE: &str = "vulnerability_metadata.json";
pub(crate) const EXCLUSIONS_FILE: &str = "exclusions.json";

/// 데이터베이스 설명자 (`metadata.json`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbMetadata {
    /// 스키마 버전
    pub schema_version: u32,
    /// 빌드 시각 (RFC 3339)
    pub built: String,
    /// 배포 버전 표식 (없으면 `built` 사용)
    #[serde(default)]
    pub version: Option<String>,
    /// 아카이브 체크섬 (`blake3:<hex>`)
    #[serde(default)]
    pub checksum: Option<String>,
}

impl DbMetadata {
    /// 핸들을 구분하는 버전 표식을 반환합니다.
    pub fn version_marker(&self) -> &str {
        self.version.as_deref().unwrap_or(&self.built)
    }

    /// 빌드 시각을 해석합니다.
    pub fn built_at(&self) -> Result<DateTime<Utc>, VulnDbError> {
        parse_built(&self.built)
    }
}

/// RFC 3339 빌드 시각을 UTC로 해석합니다. 오프셋과 소수 초를 허용합니다.
pub fn parse_built(raw: &str) -> Result<DateTime<Utc>, VulnDbError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| VulnDbError::Parse(format!("invalid built timestamp {raw:?}: {e}")))
}

/// 영향받는 버전 범위
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRange {
    /// 도입 버전 (이 버전부터 영향)
    #[serde(default)]
    pub introduced: Option<String>,
    /// 수정 버전 (이 버전에서 수정됨, None이면 미수정)
    #[serde(default)]
    pub fixed: Option<String>,
}

/// 패키지별 취약점 레코드
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VulnRecord {
    /// 취약점 ID (예: CVE-2024-1234, GHSA-xxxx)
    pub id: String,
    /// 영향받는 패키지명
    pub package: String,
    /// 패키지 생태계
    pub ecosystem: Ecosystem,
    /// 배포판 네임스페이스 (예: `debian:12`)
    #[serde(default)]
    pub namespace: Option<String>,
    /// 영향받는 버전 범위
    #[serde(default)]
    pub affected_ranges: Vec<VersionRange>,
    /// 수정된 버전 (있을 경우)
    #[serde(default)]
    pub fixed_version: Option<String>,
}

/// 취약점 메타데이터 (심각도, 설명, 참조 링크)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VulnMetadata {
    /// 취약점 ID
    pub id: String,
    /// 심각도
    #[serde(default)]
    pub severity: Severity,
    /// 설명
    #[serde(default)]
    pub description: String,
    /// 참조 URL
    #[serde(default)]
    pub urls: Vec<String>,
    /// 공개 일자 (ISO 8601)
    #[serde(default)]
    pub published: Option<String>,
}

/// 제외 규칙 -- 매치를 무시 목록으로 옮깁니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExclusionRule {
    /// 대상 취약점 ID
    pub vulnerability_id: String,
    /// 특정 패키지로 한정 (None이면 모든 패키지)
    #[serde(default)]
    pub package: Option<String>,
    /// 특정 생태계로 한정 (None이면 모든 생태계)
    #[serde(default)]
    pub ecosystem: Option<Ecosystem>,
    /// 제외 사유
    pub reason: String,
}

impl ExclusionRule {
    /// 규칙이 주어진 패키지에 적용되는지 확인합니다.
    pub fn applies_to(&self, package: &str, ecosystem: Ecosystem) -> bool {
        self.package.as_deref().is_none_or(|p| p == package)
            && self.ecosystem.is_none_or(|e| e == ecosystem)
    }
}

/// 다운로드 아카이브 -- 하나의 JSON 번들에 DB 전체를 담습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbArchive {
    /// 설명자
    pub metadata: DbMetadata,
    /// 취약점 레코드
    pub vulnerabilities: Vec<VulnRecord>,
    /// 취약점 메타데이터
    #[serde(default)]
    pub vulnerability_metadata: Vec<VulnMetadata>,
    /// 제외 규칙
    #[serde(default)]
    pub exclusions: Vec<ExclusionRule>,
}

impl DbArchive {
    /// 아카이브를 DB 디렉토리 구조로 풀어 씁니다.
    ///
    /// 동기 I/O입니다. async 컨텍스트에서는 `spawn_blocking`으로 감싸세요.
    pub fn write_to_dir(&self, dir: &Path) -> Result<(), VulnDbError> {
        std::fs::create_dir_all(dir).map_err(|e| VulnDbError::io(dir, e))?;
        write_json_file(&dir.join(METADATA_FILE), &self.metadata)?;
        write_json_file(&dir.join(VULNERABILITIES_FILE), &self.vulnerabilities)?;
        write_json_file(&dir.join(VULN_METADATA_FILE), &self.vulnerability_metadata)?;
        write_json_file(&dir.join(EXCLUSIONS_FILE), &self.exclusions)?;
        Ok(())
    }
}

/// 취약점 데이터베이스 저장소
///
/// # 인덱싱
///
/// O(1) 조회를 위해 `(package_name, ecosystem)` 쌍으로 인덱싱된 HashMap을 사용합니다.
#[derive(Debug)]
pub struct VulnStore {
    metadata: DbMetadata,
    records: Vec<VulnRecord>,
    index: HashMap<(String, Ecosystem), Vec<usize>>,
    vuln_metadata: HashMap<String, VulnMetadata>,
    exclusions: HashMap<String, Vec<ExclusionRule>>,
}

impl VulnStore {
    /// 구성 요소로 저장소를 만들고 검증합니다.
    ///
    /// 스키마 버전이 다르거나 레코드 수 제한을 넘으면 실패합니다.
    pub fn from_parts(
        metadata: DbMetadata,
        records: Vec<VulnRecord>,
        vuln_metadata: Vec<VulnMetadata>,
        exclusions: Vec<ExclusionRule>,
    ) -> Result<Self, VulnDbError> {
        if metadata.schema_version != SCHEMA_VERSION {
            return Err(VulnDbError::SchemaMismatch {
                expected: SCHEMA_VERSION,
                found: metadata.schema_version,
            });
        }

        metadata.built_at()?;

        if records.len() > MAX_DB_RECORDS {
            return Err(VulnDbError::Parse(format!(
                "record count {} exceeds maximum {}",
                records.len(),
                MAX_DB_RECORDS
            )));
        }

        let mut index: HashMap<(String, Ecosystem), Vec<usize>> = HashMap::new();
        for (idx, record) in records.iter().enumerate() {
            index
                .entry((record.package.clone(), record.ecosystem))
                .or_default()
                .push(idx);
        }

        let vuln_metadata = vuln_metadata
            .into_iter()
            .map(|m| (m.id.clone(), m))
            .collect();

        let mut exclusion_index: HashMap<String, Vec<ExclusionRule>> = HashMap::new();
        for rule in exclusions {
            exclusion_index
                .entry(rule.vulnerability_id.clone())
                .or_default()
                .push(rule);
        }

        Ok(Self {
            metadata,
            records,
            index,
            vuln_metadata,
            exclusions: exclusion_index,
        })
    }

    /// 아카이브에서 저장소를 만듭니다.
    pub fn from_archive(archive: DbArchive) -> Result<Self, VulnDbError> {
        Self::from_parts(
            archive.metadata,
            archive.vulnerabilities,
            archive.vulnerability_metadata,
            archive.exclusions,
        )
    }

    /// 디렉토리에서 데이터베이스를 로드합니다.
    ///
    /// `metadata.json`과 `vulnerabilities.json`은 필수이며,
    /// 나머지 파일은 없으면 빈 목록으로 취급합니다.
    ///
    /// # Note
    ///
    /// 이 함수는 동기 I/O를 수행합니다. async 컨텍스트에서 호출할 때는
    /// `tokio::task::spawn_blocking`으로 감싸세요.
    pub fn load_from_dir(dir: &Path) -> Result<Self, VulnDbError> {
        let metadata = Self::read_metadata(dir)?;

        // 스키마를 먼저 확인해 큰 파일을 불필요하게 읽지 않도록 합니다.
        if metadata.schema_version != SCHEMA_VERSION {
            return Err(VulnDbError::SchemaMismatch {
                expected: SCHEMA_VERSION,
                found: metadata.schema_version,
            });
        }

        let records: Vec<VulnRecord> = read_json_file(&dir.join(VULNERABILITIES_FILE))?
            .ok_or_else(|| VulnDbError::Load {
                path: dir.join(VULNERABILITIES_FILE).display().to_string(),
                reason: "file not found".to_owned(),
            })?;
        let vuln_metadata: Vec<VulnMetadata> =
            read_json_file(&dir.join(VULN_METADATA_FILE))?.unwrap_or_default();
        let exclusions: Vec<ExclusionRule> =
            read_json_file(&dir.join(EXCLUSIONS_FILE))?.unwrap_or_default();

        tracing::info!(
            path = %dir.display(),
            built = %metadata.built,
            records = records.len(),
            exclusions = exclusions.len(),
            "loaded vulnerability database files"
        );

        Self::from_parts(metadata, records, vuln_metadata, exclusions)
    }

    /// 디렉토리의 `metadata.json`만 읽습니다.
    pub fn read_metadata(dir: &Path) -> Result<DbMetadata, VulnDbError> {
        let path = dir.join(METADATA_FILE);
        read_json_file(&path)?.ok_or_else(|| VulnDbError::Load {
            path: path.display().to_string(),
            reason: "file not found".to_owned(),
        })
    }

    /// 데이터베이스 설명자를 반환합니다.
    pub fn metadata(&self) -> &DbMetadata {
        &self.metadata
    }

    /// 전체 레코드 수를 반환합니다.
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// 패키지 이름과 생태계로 취약점 레코드를 조회합니다.
    pub fn lookup(&self, package: &str, ecosystem: Ecosystem) -> Vec<&VulnRecord> {
        let key = (package.to_owned(), ecosystem);
        match self.index.get(&key) {
            Some(indices) => indices
                .iter()
                .filter_map(|&idx| self.records.get(idx))
                .collect(),
            None => Vec::new(),
        }
    }

    /// 취약점 ID로 메타데이터를 조회합니다.
    pub fn vuln_metadata(&self, id: &str) -> Option<&VulnMetadata> {
        self.vuln_metadata.get(id)
    }

    /// 취약점 ID에 걸린 제외 규칙을 반환합니다.
    pub fn exclusions_for(&self, id: &str) -> &[ExclusionRule] {
        self.exclusions.get(id).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// JSON 파일을 읽습니다. 파일이 없으면 `Ok(None)`을 반환합니다.
pub(crate) fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, VulnDbError> {
    let metadata = match std::fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "database file not found");
            return Ok(None);
        }
        Err(e) => return Err(VulnDbError::io(path, e)),
    };

    if metadata.len() > MAX_DB_FILE_SIZE {
        return Err(VulnDbError::Load {
            path: path.display().to_string(),
            reason: format!(
                "file size {} bytes exceeds maximum {} bytes",
                metadata.len(),
                MAX_DB_FILE_SIZE
            ),
        });
    }

    let content = std::fs::read(path).map_err(|e| VulnDbError::io(path, e))?;
    serde_json::from_slice(&content)
        .map(Some)
        .map_err(|e| VulnDbError::Parse(format!("failed to parse {}: {e}", path.display())))
}

fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), VulnDbError> {
    let content = serde_json::to_vec(value)
        .map_err(|e| VulnDbError::Parse(format!("failed to serialize {}: {e}", path.display())))?;
    std::fs::write(path, content).map_err(|e| VulnDbError::io(path, e))
}
