//! 로컬 fetcher -- `file://` 경로에서 데이터베이스를 읽습니다.
//!
//! 경로가 디렉토리면 그 자리에서 로드하고, 파일이면 [`DbArchive`] 번들로 보고
//! 루트 디렉토리 아래에 설치합니다. 오프라인 배포와 테스트에서 사용합니다.

use std::path::{Path, PathBuf};

use scanward_core::pipeline::BoxFuture;

use super::{DbFetcher, FetchOutcome, install_archive, is_newer};
use crate::error::VulnDbError;
use crate::handle::{DatabaseHandle, DbStatus};
use crate::store::{DbArchive, VulnStore, read_json_file};

/// 로컬 경로 기반 fetcher
#[derive(Debug, Clone, Default)]
pub struct DirectoryFetcher;

impl DirectoryFetcher {
    /// 새 fetcher를 만듭니다.
    pub fn new() -> Self {
        Self
    }
}

impl DbFetcher for DirectoryFetcher {
    fn check_and_fetch<'a>(
        &'a self,
        root_dir: &'a Path,
        listing_url: &'a str,
        current: Option<&'a DbStatus>,
    ) -> BoxFuture<'a, Result<FetchOutcome, VulnDbError>> {
        Box::pin(async move {
            let source = PathBuf::from(listing_url.strip_prefix("file://").unwrap_or(listing_url));
            let root = root_dir.to_path_buf();
            let current = current.cloned();

            tokio::task::spawn_blocking(move || fetch_local(&root, &source, current.as_ref()))
                .await
                .map_err(|e| VulnDbError::Load {
                    path: root_dir.display().to_string(),
                    reason: format!("local fetch task failed: {e}"),
                })?
        })
    }
}

fn fetch_local(
    root_dir: &Path,
    source: &Path,
    current: Option<&DbStatus>,
) -> Result<FetchOutcome, VulnDbError> {
    let meta = std::fs::metadata(source).map_err(|e| VulnDbError::io(source, e))?;

    if meta.is_file() {
        let archive: DbArchive = read_json_file(source)?.ok_or_else(|| VulnDbError::Load {
            path: source.display().to_string(),
            reason: "file not found".to_owned(),
        })?;
        if !is_newer(&archive.metadata.built, current)? {
            return Ok(FetchOutcome::UpToDate);
        }
        return install_archive(root_dir, &archive).map(FetchOutcome::Installed);
    }

    let metadata = VulnStore::read_metadata(source)?;
    if !is_newer(&metadata.built, current)? {
        tracing::debug!(
            path = %source.display(),
            built = %metadata.built,
            "local vulnerability database unchanged"
        );
        return Ok(FetchOutcome::UpToDate);
    }

    let store = VulnStore::load_from_dir(source)?;
    Ok(FetchOutcome::Installed(DatabaseHandle::from_store(
        root_dir, source, store,
    )))
}
