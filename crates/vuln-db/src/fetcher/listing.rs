//! HTTP 목록(listing) fetcher
//!
//! 목록 문서는 스키마별로 배포된 데이터베이스 아카이브를 나열합니다.
//!
//! ```json
//! {
//!   "available": {
//!     "5": [
//!       {
//!         "built": "2024-06-01T00:00:00Z",
//!         "version": 5,
//!         "url": "https://example.com/db/vulndb_v5_2024-06-01.json",
//!         "checksum": "blake3:9f86d0..."
//!       }
//!     ]
//!   }
//! }
//! ```
//!
//! 아카이브 URL은 목록 URL 기준 상대 경로도 허용합니다.

use std::collections::HashMap;
use std::path::Path;

use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use scanward_core::pipeline::BoxFuture;

use super::{DbFetcher, FetchOutcome, install_archive, is_newer};
use crate::config::DbConfig;
use crate::error::VulnDbError;
use crate::handle::DbStatus;
use crate::store::{DbArchive, SCHEMA_VERSION, parse_built};

/// 목록 문서 최대 크기 (16 MB)
const MAX_LISTING_SIZE: u64 = 16 * 1024 * 1024;

/// 목록 문서
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Listing {
    /// 스키마 버전(문자열 키)별 후보 목록
    pub available: HashMap<String, Vec<ListingEntry>>,
}

/// 목록의 단일 후보
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingEntry {
    /// 빌드 시각 (UTC RFC 3339)
    pub built: String,
    /// 스키마 버전
    pub version: u32,
    /// 아카이브 URL (절대 또는 목록 기준 상대)
    pub url: String,
    /// 아카이브 체크섬 (`blake3:<hex>`)
    pub checksum: String,
}

impl Listing {
    /// 주어진 스키마의 가장 최근 후보를 반환합니다.
    ///
    /// 빌드 시각을 해석할 수 없는 후보가 있으면 목록 전체를 거부합니다.
    pub fn latest(&self, schema: u32) -> Result<Option<&ListingEntry>, VulnDbError> {
        let Some(entries) = self.available.get(&schema.to_string()) else {
            return Ok(None);
        };

        let mut newest: Option<(DateTime<Utc>, &ListingEntry)> = None;
        for entry in entries.iter().filter(|entry| entry.version == schema) {
            let built = parse_built(&entry.built)?;
            if newest.is_none_or(|(best, _)| built > best) {
                newest = Some((built, entry));
            }
        }
        Ok(newest.map(|(_, entry)| entry))
    }
}

/// HTTP 목록 기반 fetcher
#[derive(Debug, Clone)]
pub struct ListingFetcher {
    client: reqwest::Client,
    validate_by_hash: bool,
    max_download_size: u64,
}

impl ListingFetcher {
    /// 설정으로 fetcher를 만듭니다.
    pub fn new(config: &DbConfig) -> Result<Self, VulnDbError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("scanward/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| VulnDbError::Fetch {
                url: config.update_url.clone(),
                reason: format!("failed to build http client: {e}"),
            })?;

        Ok(Self {
            client,
            validate_by_hash: config.validate_by_hash,
            max_download_size: config.max_download_size,
        })
    }

    async fn fetch(
        &self,
        root_dir: &Path,
        listing_url: &str,
        current: Option<&DbStatus>,
    ) -> Result<FetchOutcome, VulnDbError> {
        let listing_url = reqwest::Url::parse(listing_url).map_err(|e| VulnDbError::Fetch {
            url: listing_url.to_owned(),
            reason: format!("invalid url: {e}"),
        })?;

        let raw = self.get_limited(&listing_url, MAX_LISTING_SIZE).await?;
        let listing: Listing = serde_json::from_slice(&raw)
            .map_err(|e| VulnDbError::Parse(format!("invalid listing document: {e}")))?;

        let entry = listing
            .latest(SCHEMA_VERSION)?
            .ok_or(VulnDbError::NoCandidate {
                schema: SCHEMA_VERSION,
            })?
            .clone();

        if !is_newer(&entry.built, current)? {
            tracing::debug!(
                built = %entry.built,
                "vulnerability database is up to date"
            );
            return Ok(FetchOutcome::UpToDate);
        }

        let archive_url = listing_url
            .join(&entry.url)
            .map_err(|e| VulnDbError::Fetch {
                url: entry.url.clone(),
                reason: format!("invalid archive url: {e}"),
            })?;

        tracing::info!(
            url = %archive_url,
            built = %entry.built,
            "downloading vulnerability database"
        );

        let body = self
            .get_limited(&archive_url, self.max_download_size)
            .await?;

        if self.validate_by_hash {
            verify_checksum(&body, &entry.checksum)?;
        }

        let mut archive: DbArchive = serde_json::from_slice(&body)
            .map_err(|e| VulnDbError::Parse(format!("invalid database archive: {e}")))?;
        if archive.metadata.checksum.is_none() {
            archive.metadata.checksum = Some(entry.checksum.clone());
        }

        let root = root_dir.to_path_buf();
        let handle = tokio::task::spawn_blocking(move || install_archive(&root, &archive))
            .await
            .map_err(|e| VulnDbError::Load {
                path: root_dir.display().to_string(),
                reason: format!("install task failed: {e}"),
            })??;

        Ok(FetchOutcome::Installed(handle))
    }

    /// 본문 크기를 제한하며 GET 요청을 수행합니다.
    async fn get_limited(&self, url: &reqwest::Url, max: u64) -> Result<Bytes, VulnDbError> {
        let fetch_err = |reason: String| VulnDbError::Fetch {
            url: url.to_string(),
            reason,
        };

        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| fetch_err(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_err(format!("unexpected status {status}")));
        }

        if let Some(len) = response.content_length()
            && len > max
        {
            return Err(VulnDbError::DownloadTooLarge { size: len, max });
        }

        let mut body = BytesMut::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| fetch_err(e.to_string()))?
        {
            let size = (body.len() + chunk.len()) as u64;
            if size > max {
                return Err(VulnDbError::DownloadTooLarge { size, max });
            }
            body.extend_from_slice(&chunk);
        }

        Ok(body.freeze())
    }
}

impl DbFetcher for ListingFetcher {
    fn check_and_fetch<'a>(
        &'a self,
        root_dir: &'a Path,
        listing_url: &'a str,
        current: Option<&'a DbStatus>,
    ) -> BoxFuture<'a, Result<FetchOutcome, VulnDbError>> {
        Box::pin(self.fetch(root_dir, listing_url, current))
    }
}

/// 아카이브 체크섬을 검증합니다. 현재 `blake3:<hex>`만 지원합니다.
pub fn verify_checksum(data: &[u8], expected: &str) -> Result<(), VulnDbError> {
    let Some(("blake3", _)) = expected.split_once(':') else {
        return Err(VulnDbError::Checksum {
            expected: expected.to_owned(),
            actual: "unsupported checksum algorithm".to_owned(),
        });
    };

    let actual = format!("blake3:{}", blake3::hash(data).to_hex());
    if expected.eq_ignore_ascii_case(&actual) {
        Ok(())
    } else {
        Err(VulnDbError::Checksum {
            expected: expected.to_owned(),
            actual,
        })
    }
}
