//! 데이터베이스 매니저 -- 현재 핸들 보관과 원자적 교체
//!
//! [`DatabaseManager`]는 프로세스 전체에서 공유되는 "현재 데이터베이스" 슬롯입니다.
//!
//! - 읽기(`current`)는 동기이며 잠금을 포인터 복제 동안만 잡습니다.
//! - 쓰기(`load_initial`, `refresh`)는 비동기 게이트로 직렬화되고,
//!   새 핸들이 완전히 준비된 뒤 포인터 교체 순간에만 쓰기 잠금을 잡습니다.
//! - 이미 `current()`로 핸들을 얻은 스캔은 교체 후에도 그 핸들을 끝까지 사용합니다.
//!
//! ```text
//! load_initial / refresh
//!        |
//!   write gate (tokio Mutex)
//!        |
//!   DbFetcher::check_and_fetch  (잠금 없이 다운로드/검증/설치)
//!        |
//!   slot.write() = Arc<DatabaseHandle>   <-- 짧은 임계 구역
//!        |
//! current() -> Arc clone                 <-- 읽기 측
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{info, warn};

use scanward_core::metrics as m;

use crate::error::VulnDbError;
use crate::fetcher::{DbFetcher, FetchOutcome};
use crate::handle::{DatabaseHandle, DbStatus};

/// 초기 로드 시 기록되는 데이터베이스 출처
#[derive(Debug, Clone)]
struct DbSource {
    root_dir: PathBuf,
    listing_url: String,
}

/// 현재 데이터베이스 핸들 관리자
pub struct DatabaseManager {
    fetcher: Arc<dyn DbFetcher>,
    slot: RwLock<Option<Arc<DatabaseHandle>>>,
    write_gate: tokio::sync::Mutex<()>,
    source: RwLock<Option<DbSource>>,
    last_refresh_error: RwLock<Option<String>>,
}

impl DatabaseManager {
    /// 빈 슬롯으로 매니저를 만듭니다.
    pub fn new(fetcher: Arc<dyn DbFetcher>) -> Self {
        Self {
            fetcher,
            slot: RwLock::new(None),
            write_gate: tokio::sync::Mutex::new(()),
            source: RwLock::new(None),
            last_refresh_error: RwLock::new(None),
        }
    }

    /// 최초 데이터베이스를 로드합니다.
    ///
    /// 사용 가능한 핸들을 만들지 못하면 [`VulnDbError::DatabaseUnavailable`]을 반환합니다.
    /// 호출자는 이를 치명적 시작 실패로 취급해야 합니다.
    pub async fn load_initial(
        &self,
        root_dir: &Path,
        listing_url: &str,
    ) -> Result<DbStatus, VulnDbError> {
        let _gate = self.write_gate.lock().await;

        *self
            .source
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(DbSource {
            root_dir: root_dir.to_path_buf(),
            listing_url: listing_url.to_owned(),
        });

        info!(
            root_dir = %root_dir.display(),
            url = listing_url,
            "loading vulnerability database"
        );

        let outcome = self
            .fetcher
            .check_and_fetch(root_dir, listing_url, None)
            .await
            .map_err(|e| VulnDbError::DatabaseUnavailable(e.to_string()))?;

        match outcome {
            FetchOutcome::Installed(handle) => {
                let status = handle.status().clone();
                self.install(handle);
                info!(%status, "vulnerability database ready");
                Ok(status)
            }
            FetchOutcome::UpToDate => Err(VulnDbError::DatabaseUnavailable(
                "fetcher reported up to date without an installed database".to_owned(),
            )),
        }
    }

    /// 새 데이터베이스를 확인하고 있으면 교체합니다.
    ///
    /// 교체했으면 `true`, 이미 최신이면 `false`를 반환합니다.
    /// 실패 시 이전 핸들은 그대로 유지됩니다.
    pub async fn refresh(&self) -> Result<bool, VulnDbError> {
        let _gate = self.write_gate.lock().await;

        let source = self
            .source
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let Some(source) = source else {
            return Err(VulnDbError::NotLoaded);
        };
        let current = self.status();

        let result = self
            .fetcher
            .check_and_fetch(&source.root_dir, &source.listing_url, current.as_ref())
            .await;

        match result {
            Ok(FetchOutcome::Installed(handle)) => {
                let status = handle.status().clone();
                self.install(handle);
                self.set_refresh_error(None);
                metrics::counter!(m::DB_REFRESH_TOTAL, m::LABEL_RESULT => m::RESULT_UPDATED)
                    .increment(1);
                info!(%status, "vulnerability database updated");
                Ok(true)
            }
            Ok(FetchOutcome::UpToDate) => {
                self.set_refresh_error(None);
                metrics::counter!(m::DB_REFRESH_TOTAL, m::LABEL_RESULT => m::RESULT_UNCHANGED)
                    .increment(1);
                Ok(false)
            }
            Err(e) => {
                let reason = e.to_string();
                self.set_refresh_error(Some(reason.clone()));
                metrics::counter!(m::DB_REFRESH_TOTAL, m::LABEL_RESULT => m::RESULT_FAILED)
                    .increment(1);
                warn!(error = %reason, "keeping previous vulnerability database");
                Err(VulnDbError::RefreshFailed(reason))
            }
        }
    }

    /// 현재 핸들을 반환합니다. 초기 로드 전에는 `None`입니다.
    pub fn current(&self) -> Option<Arc<DatabaseHandle>> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// 현재 핸들의 상태
    pub fn status(&self) -> Option<DbStatus> {
        self.current().map(|handle| handle.status().clone())
    }

    /// 스캔을 받을 수 있는지 여부
    pub fn is_ready(&self) -> bool {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// 가장 최근 갱신 실패 사유. 이후 갱신이 성공하면 지워집니다.
    pub fn last_refresh_error(&self) -> Option<String> {
        self.last_refresh_error
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn install(&self, handle: DatabaseHandle) {
        let schema = handle.schema_version();
        let handle = Arc::new(handle);
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(handle);

        metrics::gauge!(m::DB_READY).set(1.0);
        metrics::gauge!(m::DB_SCHEMA_VERSION).set(f64::from(schema));
    }

    fn set_refresh_error(&self, error: Option<String>) {
        *self
            .last_refresh_error
            .write()
            .unwrap_or_else(PoisonError::into_inner) = error;
    }
}

impl std::fmt::Debug for DatabaseManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseManager")
            .field("status", &self.status())
            .field("last_refresh_error", &self.last_refresh_error())
            .finish_non_exhaustive()
    }
}
