//! 데이터베이스 핸들 -- 완전히 초기화된 하나의 데이터베이스 인스턴스
//!
//! [`DatabaseHandle`]은 성공적으로 로드·검증된 경우에만 만들어집니다.
//! 실패한 로드는 핸들이 아니라 에러로 표현되므로, 부분적으로 초기화된 핸들은
//! 존재할 수 없습니다. 핸들은 교체될 뿐 변경되지 않으며, 마지막 `Arc` 참조가
//! 사라질 때 해제됩니다.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::provider::{ExclusionProvider, MetadataProvider, StoreProvider, VulnerabilityProvider};
use crate::store::{DbMetadata, VulnStore};

/// 핸들의 상태 기록 -- 스캔 결과와 헬스 보고에 포함됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbStatus {
    /// 스키마 버전
    pub schema_version: u32,
    /// 빌드 시각
    pub built: String,
    /// 데이터베이스 디렉토리
    pub location: String,
    /// 아카이브 체크섬
    pub checksum: Option<String>,
    /// 핸들 구분 표식
    pub version: String,
}

impl DbStatus {
    /// 설명자와 위치로 상태를 만듭니다.
    pub fn from_metadata(metadata: &DbMetadata, location: &Path) -> Self {
        Self {
            schema_version: metadata.schema_version,
            built: metadata.built.clone(),
            location: location.display().to_string(),
            checksum: metadata.checksum.clone(),
            version: metadata.version_marker().to_owned(),
        }
    }
}

impl fmt::Display for DbStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "schema={} built={} version={}",
            self.schema_version, self.built, self.version
        )
    }
}

/// 핸들에서 파생된 읽기 전용 제공자 묶음
#[derive(Clone)]
pub struct Providers {
    /// 취약점 레코드 조회
    pub vulnerabilities: Arc<dyn VulnerabilityProvider>,
    /// 메타데이터 조회
    pub metadata: Arc<dyn MetadataProvider>,
    /// 제외 규칙 조회
    pub exclusions: Arc<dyn ExclusionProvider>,
}

impl Providers {
    /// 하나의 저장소로 세 제공자를 구성합니다.
    pub fn from_store(store: Arc<VulnStore>) -> Self {
        let provider = Arc::new(StoreProvider::new(store));
        Self {
            vulnerabilities: provider.clone(),
            metadata: provider.clone(),
            exclusions: provider,
        }
    }
}

impl fmt::Debug for Providers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Providers").finish_non_exhaustive()
    }
}

/// 로드된 취약점 데이터베이스 인스턴스
#[derive(Debug)]
pub struct DatabaseHandle {
    root_dir: PathBuf,
    status: DbStatus,
    providers: Providers,
}

impl DatabaseHandle {
    /// 상태와 제공자로 핸들을 만듭니다.
    pub fn new(root_dir: impl Into<PathBuf>, status: DbStatus, providers: Providers) -> Self {
        Self {
            root_dir: root_dir.into(),
            status,
            providers,
        }
    }

    /// 로드된 저장소로 핸들을 만듭니다.
    ///
    /// `location`은 저장소를 읽어 온 디렉토리입니다.
    pub fn from_store(root_dir: impl Into<PathBuf>, location: &Path, store: VulnStore) -> Self {
        let status = DbStatus::from_metadata(store.metadata(), location);
        Self::new(root_dir, status, Providers::from_store(Arc::new(store)))
    }

    /// 데이터베이스 루트 디렉토리
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// 스키마 버전
    pub fn schema_version(&self) -> u32 {
        self.status.schema_version
    }

    /// 상태 기록
    pub fn status(&self) -> &DbStatus {
        &self.status
    }

    /// 읽기 전용 제공자
    pub fn providers(&self) -> &Providers {
        &self.providers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SCHEMA_VERSION;
    use crate::types::Ecosystem;

    fn store(version: &str) -> VulnStore {
        VulnStore::from_parts(
            DbMetadata {
                schema_version: SCHEMA_VERSION,
                built: "2024-06-01T00:00:00Z".to_owned(),
                version: Some(version.to_owned()),
                checksum: Some("blake3:abcd".to_owned()),
            },
            vec![],
            vec![],
            vec![],
        )
        .unwrap()
    }

    #[test]
    fn handle_from_store_carries_status() {
        let handle = DatabaseHandle::from_store(
            "/tmp/db",
            Path::new("/tmp/db/5/2024-06-01"),
            store("marker-a"),
        );
        assert_eq!(handle.schema_version(), SCHEMA_VERSION);
        assert_eq!(handle.status().version, "marker-a");
        assert_eq!(handle.status().checksum.as_deref(), Some("blake3:abcd"));
        assert_eq!(handle.status().location, "/tmp/db/5/2024-06-01");
        assert_eq!(handle.root_dir(), Path::new("/tmp/db"));
        assert!(
            handle
                .providers()
                .vulnerabilities
                .by_package("x", Ecosystem::Cargo)
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn status_display() {
        let handle = DatabaseHandle::from_store("/tmp/db", Path::new("/tmp/db/5/x"), store("m1"));
        let text = handle.status().to_string();
        assert!(text.contains("schema=5"));
        assert!(text.contains("version=m1"));
    }
}
