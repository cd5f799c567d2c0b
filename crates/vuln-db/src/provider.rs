//! 조회 제공자 -- 핸들에서 파생되는 읽기 전용 조회 trait
//!
//! 매처는 구체 저장소 대신 이 trait들만 봅니다. 기본 구현인 [`StoreProvider`]는
//! 메모리에 로드된 [`VulnStore`]를 감싸며, 세 trait을 모두 구현합니다.

use std::sync::Arc;

use crate::error::VulnDbError;
use crate::store::{ExclusionRule, VulnMetadata, VulnRecord, VulnStore};
use crate::types::Ecosystem;

/// 패키지별 취약점 레코드 조회
pub trait VulnerabilityProvider: Send + Sync {
    /// 패키지 이름과 생태계에 해당하는 레코드를 반환합니다.
    fn by_package(&self, name: &str, ecosystem: Ecosystem)
    -> Result<Vec<&VulnRecord>, VulnDbError>;
}

/// 취약점 메타데이터 조회
pub trait MetadataProvider: Send + Sync {
    /// 취약점 ID의 메타데이터를 반환합니다. 없으면 `Ok(None)`.
    fn metadata(&self, id: &str) -> Result<Option<&VulnMetadata>, VulnDbError>;
}

/// 제외 규칙 조회
pub trait ExclusionProvider: Send + Sync {
    /// 취약점 ID에 걸린 제외 규칙을 반환합니다.
    fn exclusions_for(&self, vulnerability_id: &str) -> Result<&[ExclusionRule], VulnDbError>;
}

/// [`VulnStore`] 기반 제공자
#[derive(Debug, Clone)]
pub struct StoreProvider {
    store: Arc<VulnStore>,
}

impl StoreProvider {
    /// 저장소를 감싸는 제공자를 만듭니다.
    pub fn new(store: Arc<VulnStore>) -> Self {
        Self { store }
    }

    /// 내부 저장소 참조
    pub fn store(&self) -> &VulnStore {
        &self.store
    }
}

impl VulnerabilityProvider for StoreProvider {
    fn by_package(
        &self,
        name: &str,
        ecosystem: Ecosystem,
    ) -> Result<Vec<&VulnRecord>, VulnDbError> {
        Ok(self.store.lookup(name, ecosystem))
    }
}

impl MetadataProvider for StoreProvider {
    fn metadata(&self, id: &str) -> Result<Option<&VulnMetadata>, VulnDbError> {
        Ok(self.store.vuln_metadata(id))
    }
}

impl ExclusionProvider for StoreProvider {
    fn exclusions_for(&self, vulnerability_id: &str) -> Result<&[ExclusionRule], VulnDbError> {
        Ok(self.store.exclusions_for(vulnerability_id))
    }
}
