//! 통합 테스트 공용 헬퍼

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use scanward_core::pipeline::BoxFuture;
use scanward_core::types::Severity;
use scanward_scanner::{MatchError, MatchSet, Matcher, Package, ScanContext, VulnMatcher};
use scanward_vuln_db::store::DbArchive;
use scanward_vuln_db::{
    DatabaseHandle, DatabaseManager, DbFetcher, DbMetadata, DbStatus, Ecosystem, FetchOutcome,
    Providers, SCHEMA_VERSION, VersionRange, VulnDbError, VulnMetadata, VulnRecord, VulnStore,
};

/// `lodash` 취약점 `count`개를 담은 아카이브
pub fn lodash_archive(version: &str, count: usize) -> DbArchive {
    let ids: Vec<String> = (1..=count).map(|i| format!("CVE-2024-000{i}")).collect();
    DbArchive {
        metadata: DbMetadata {
            schema_version: SCHEMA_VERSION,
            built: format!("2024-06-0{count}T00:00:00Z"),
            version: Some(version.to_owned()),
            checksum: None,
        },
        vulnerabilities: ids
            .iter()
            .map(|id| VulnRecord {
                id: id.clone(),
                package: "lodash".to_owned(),
                ecosystem: Ecosystem::Npm,
                namespace: None,
                affected_ranges: vec![VersionRange {
                    introduced: None,
                    fixed: Some("4.17.21".to_owned()),
                }],
                fixed_version: Some("4.17.21".to_owned()),
            })
            .collect(),
        vulnerability_metadata: ids
            .iter()
            .map(|id| VulnMetadata {
                id: id.clone(),
                severity: Severity::High,
                description: format!("{id} in lodash"),
                urls: vec![],
                published: None,
            })
            .collect(),
        exclusions: vec![],
    }
}

/// 메모리 아카이브를 순서대로 설치하는 fetcher
pub struct SequenceFetcher {
    queue: Mutex<VecDeque<DbArchive>>,
}

impl SequenceFetcher {
    pub fn new(archives: Vec<DbArchive>) -> Self {
        Self {
            queue: Mutex::new(archives.into()),
        }
    }
}

impl DbFetcher for SequenceFetcher {
    fn check_and_fetch<'a>(
        &'a self,
        root_dir: &'a Path,
        _listing_url: &'a str,
        _current: Option<&'a DbStatus>,
    ) -> BoxFuture<'a, Result<FetchOutcome, VulnDbError>> {
        let next = self.queue.lock().unwrap().pop_front();
        Box::pin(async move {
            match next {
                Some(archive) => {
                    let store = VulnStore::from_archive(archive)?;
                    Ok(FetchOutcome::Installed(DatabaseHandle::from_store(
                        root_dir,
                        Path::new("memory"),
                        store,
                    )))
                }
                None => Ok(FetchOutcome::UpToDate),
            }
        })
    }
}

/// 아카이브 목록으로 매니저를 만들고 첫 번째를 로드합니다.
pub async fn loaded_manager(archives: Vec<DbArchive>) -> Arc<DatabaseManager> {
    let manager = Arc::new(DatabaseManager::new(Arc::new(SequenceFetcher::new(archives))));
    manager
        .load_initial(Path::new("/nonexistent/scanward"), "memory://")
        .await
        .unwrap();
    manager
}

/// 로드하지 않은 매니저
pub fn empty_manager() -> Arc<DatabaseManager> {
    Arc::new(DatabaseManager::new(Arc::new(SequenceFetcher::new(vec![]))))
}

pub fn vulnerable_lodash() -> Arc<Vec<Package>> {
    Arc::new(vec![Package::new("lodash", "4.17.20", Ecosystem::Npm)])
}

/// 호출 횟수를 세고, 처음 `failures`번은 제공자 에러를 내는 매처
pub struct FlakyMatcher {
    pub calls: AtomicU32,
    failures: u32,
    inner: VulnMatcher,
}

impl FlakyMatcher {
    pub fn new(failures: u32) -> Self {
        Self {
            calls: AtomicU32::new(0),
            failures,
            inner: VulnMatcher::default(),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Matcher for FlakyMatcher {
    fn find_matches(
        &self,
        packages: &[Package],
        context: &ScanContext,
        providers: &Providers,
    ) -> Result<MatchSet, MatchError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.failures {
            return Err(MatchError::Provider(format!("index unavailable (call {call})")));
        }
        self.inner.find_matches(packages, context, providers)
    }
}
