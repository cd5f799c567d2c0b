//! 데이터베이스 가져오기 -- 새 데이터베이스 확인, 다운로드, 검증, 설치
//!
//! [`DbFetcher`]는 매니저가 소비하는 외부 경계입니다. 구현체는 반복 호출에 안전해야 하며,
//! 부분적으로 쓰인 상태를 매니저에게 노출해서는 안 됩니다. 설치는 항상 새 스테이징
//! 디렉토리에 쓰고, 로드·검증이 끝난 뒤에만 최종 위치로 rename합니다.
//!
//! - [`ListingFetcher`] -- HTTP 목록(listing) 문서 기반
//! - [`DirectoryFetcher`] -- `file://` 로컬 디렉토리 또는 아카이브 파일 기반

mod directory;
mod listing;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use scanward_core::pipeline::BoxFuture;

use crate::config::DbConfig;
use crate::error::VulnDbError;
use crate::handle::{DatabaseHandle, DbStatus};
use crate::store::{DbArchive, SCHEMA_VERSION, VulnStore, parse_built};

pub use directory::DirectoryFetcher;
pub use listing::{Listing, ListingEntry, ListingFetcher};

/// 가져오기 결과
#[derive(Debug)]
pub enum FetchOutcome {
    /// 새 데이터베이스를 설치하고 핸들을 만들었음
    Installed(DatabaseHandle),
    /// 현재 데이터베이스가 최신임
    UpToDate,
}

/// 데이터베이스 가져오기 경계
///
/// `current`가 주어지면 그보다 새로운 데이터베이스가 있을 때만 설치합니다.
pub trait DbFetcher: Send + Sync {
    /// 새 데이터베이스를 확인하고, 있으면 다운로드·검증·설치합니다.
    fn check_and_fetch<'a>(
        &'a self,
        root_dir: &'a Path,
        listing_url: &'a str,
        current: Option<&'a DbStatus>,
    ) -> BoxFuture<'a, Result<FetchOutcome, VulnDbError>>;
}

/// 설정의 URL 스킴에 맞는 fetcher를 만듭니다.
pub fn fetcher_for_url(config: &DbConfig) -> Result<Arc<dyn DbFetcher>, VulnDbError> {
    if config.local_source().is_some() {
        Ok(Arc::new(DirectoryFetcher::new()))
    } else {
        Ok(Arc::new(ListingFetcher::new(config)?))
    }
}

/// 지원 스키마의 설치 디렉토리 (`<root>/<schema>`)
pub fn schema_dir(root_dir: &Path) -> PathBuf {
    root_dir.join(SCHEMA_VERSION.to_string())
}

/// 시작 시 스키마 디렉토리를 삭제합니다.
///
/// 이전 프로세스가 남긴 손상된 데이터베이스를 재사용하지 않기 위해 호출합니다.
pub async fn clean_schema_dir(root_dir: &Path) -> Result<(), VulnDbError> {
    let dir = schema_dir(root_dir);
    match tokio::fs::remove_dir_all(&dir).await {
        Ok(()) => {
            tracing::info!(path = %dir.display(), "removed existing database directory");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(VulnDbError::io(&dir, e)),
    }
}

/// 후보 빌드 시각이 현재 핸들보다 새로운지 판단합니다.
///
/// 두 시각 모두 해석된 순간으로 비교하므로 오프셋과 소수 초 표기에 영향받지 않습니다.
pub(crate) fn is_newer(
    candidate_built: &str,
    current: Option<&DbStatus>,
) -> Result<bool, VulnDbError> {
    let candidate = parse_built(candidate_built)?;
    match current {
        None => Ok(true),
        Some(status) => Ok(candidate > parse_built(&status.built)?),
    }
}

/// 아카이브를 스테이징 디렉토리에 풀고, 검증 후 최종 위치로 옮깁니다.
///
/// 동기 I/O입니다. async 컨텍스트에서는 `spawn_blocking`으로 감싸세요.
pub(crate) fn install_archive(
    root_dir: &Path,
    archive: &DbArchive,
) -> Result<DatabaseHandle, VulnDbError> {
    let schema = schema_dir(root_dir);
    std::fs::create_dir_all(&schema).map_err(|e| VulnDbError::io(&schema, e))?;

    let install_id = uuid::Uuid::new_v4().simple().to_string();
    let staging = schema.join(format!(".staging-{install_id}"));

    let store = match archive
        .write_to_dir(&staging)
        .and_then(|()| VulnStore::load_from_dir(&staging))
    {
        Ok(store) => store,
        Err(e) => {
            remove_quietly(&staging);
            return Err(e);
        }
    };

    let final_dir = schema.join(format!(
        "{}-{}",
        sanitize_component(&store.metadata().built),
        &install_id[..8]
    ));
    if let Err(e) = std::fs::rename(&staging, &final_dir) {
        remove_quietly(&staging);
        return Err(VulnDbError::io(&final_dir, e));
    }

    prune_siblings(&schema, &final_dir);

    tracing::info!(
        path = %final_dir.display(),
        built = %store.metadata().built,
        records = store.record_count(),
        "installed vulnerability database"
    );

    Ok(DatabaseHandle::from_store(root_dir, &final_dir, store))
}

/// 디렉토리 이름에 쓸 수 없는 문자를 치환합니다.
fn sanitize_component(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

/// 새로 설치한 디렉토리 외의 이전 설치본을 삭제합니다.
///
/// 이전 핸들의 데이터는 메모리에 있으므로 디렉토리 삭제와 무관하게 계속 사용됩니다.
fn prune_siblings(schema: &Path, keep: &Path) {
    let entries = match std::fs::read_dir(schema) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(path = %schema.display(), error = %e, "failed to list database directory");
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path == keep || !path.is_dir() {
            continue;
        }
        // 다른 설치가 진행 중인 스테이징 디렉토리는 건드리지 않습니다.
        if entry.file_name().to_string_lossy().starts_with(".staging-") {
            continue;
        }
        remove_quietly(&path);
    }
}

fn remove_quietly(path: &Path) {
    if let Err(e) = std::fs::remove_dir_all(path) {
        tracing::warn!(path = %path.display(), error = %e, "failed to remove directory");
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::store::{DbMetadata, VersionRange, VulnRecord};
    use crate::types::Ecosystem;

    pub(crate) fn archive(built: &str, version: &str) -> DbArchive {
        DbArchive {
            metadata: DbMetadata {
                schema_version: SCHEMA_VERSION,
                built: built.to_owned(),
                version: Some(version.to_owned()),
                checksum: None,
            },
            vulnerabilities: vec![VulnRecord {
                id: "CVE-2024-0001".to_owned(),
                package: "serde".to_owned(),
                ecosystem: Ecosystem::Cargo,
                namespace: None,
                affected_ranges: vec![VersionRange {
                    introduced: None,
                    fixed: Some("1.0.100".to_owned()),
                }],
                fixed_version: Some("1.0.100".to_owned()),
            }],
            vulnerability_metadata: vec![],
            exclusions: vec![],
        }
    }

    #[test]
    fn is_newer_without_current() {
        assert!(is_newer("2024-01-01T00:00:00Z", None).unwrap());
    }

    #[test]
    fn is_newer_compares_built_timestamps() {
        let status = DbStatus {
            schema_version: SCHEMA_VERSION,
            built: "2024-06-01T00:00:00Z".to_owned(),
            location: "/tmp".to_owned(),
            checksum: None,
            version: "a".to_owned(),
        };
        assert!(is_newer("2024-06-02T00:00:00Z", Some(&status)).unwrap());
        assert!(!is_newer("2024-06-01T00:00:00Z", Some(&status)).unwrap());
        assert!(!is_newer("2024-05-31T23:59:59Z", Some(&status)).unwrap());
    }

    #[test]
    fn is_newer_orders_by_instant_not_text() {
        let status = DbStatus {
            schema_version: SCHEMA_VERSION,
            built: "2024-06-01T05:00:00Z".to_owned(),
            location: "/tmp".to_owned(),
            checksum: None,
            version: "a".to_owned(),
        };
        // 03:00Z 빌드를 +09:00 으로 표기한 경우
        assert!(!is_newer("2024-06-01T12:00:00+09:00", Some(&status)).unwrap());
        assert!(is_newer("2024-06-01T05:00:00.500Z", Some(&status)).unwrap());
        assert!(is_newer("2024-06-01T06:00:00+01:00", Some(&status)).is_ok_and(|newer| !newer));
        assert!(is_newer("yesterday", Some(&status)).is_err());
    }

    #[test]
    fn install_archive_leaves_single_final_dir() {
        let root = tempfile::tempdir().unwrap();

        let first = install_archive(root.path(), &archive("2024-06-01T00:00:00Z", "a")).unwrap();
        let second = install_archive(root.path(), &archive("2024-06-02T00:00:00Z", "b")).unwrap();

        assert_eq!(first.status().version, "a");
        assert_eq!(second.status().version, "b");

        let dirs: Vec<_> = std::fs::read_dir(schema_dir(root.path()))
            .unwrap()
            .flatten()
            .map(|e| e.path())
            .collect();
        assert_eq!(dirs.len(), 1, "older install should be pruned: {dirs:?}");
        assert_eq!(dirs[0].display().to_string(), second.status().location);

        // 이전 핸들은 디렉토리가 지워져도 메모리에서 계속 조회됩니다.
        assert_eq!(
            first
                .providers()
                .vulnerabilities
                .by_package("serde", Ecosystem::Cargo)
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn install_archive_with_bad_schema_leaves_no_staging() {
        let root = tempfile::tempdir().unwrap();
        let mut bad = archive("2024-06-01T00:00:00Z", "a");
        bad.metadata.schema_version = 99;

        let err = install_archive(root.path(), &bad).unwrap_err();
        assert!(matches!(err, VulnDbError::SchemaMismatch { .. }));

        let leftovers = std::fs::read_dir(schema_dir(root.path())).unwrap().count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn clean_schema_dir_removes_existing_install() {
        let root = tempfile::tempdir().unwrap();
        install_archive(root.path(), &archive("2024-06-01T00:00:00Z", "a")).unwrap();
        assert!(schema_dir(root.path()).exists());

        clean_schema_dir(root.path()).await.unwrap();
        assert!(!schema_dir(root.path()).exists());

        // 없는 디렉토리 정리는 성공으로 취급
        clean_schema_dir(root.path()).await.unwrap();
    }

    #[test]
    fn sanitize_component_replaces_separators() {
        assert_eq!(
            sanitize_component("2024-06-01T00:00:00Z"),
            "2024-06-01T00_00_00Z"
        );
    }
}
