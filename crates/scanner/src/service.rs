//! 서비스 파사드 -- decode -> execute -> encode
//!
//! [`ScanService::scan`]은 전송 계층이 호출하는 단일 진입점입니다.
//! 디코딩이 실패하면 매처는 호출되지 않습니다.

use std::sync::Arc;

use tracing::debug;

use scanward_core::metrics as m;
use scanward_vuln_db::DatabaseManager;

use crate::config::ScannerConfig;
use crate::decoder::{AutoDecoder, SbomDecoder};
use crate::error::ScannerError;
use crate::executor::ScanExecutor;
use crate::matcher::VulnMatcher;
use crate::presenter::JsonPresenter;
use crate::result::ScanResult;

/// 스캔 서비스
#[derive(Clone)]
pub struct ScanService {
    decoder: Arc<dyn SbomDecoder>,
    executor: ScanExecutor,
    presenter: JsonPresenter,
}

impl ScanService {
    /// 구성 요소로 서비스를 만듭니다.
    pub fn new(
        decoder: Arc<dyn SbomDecoder>,
        executor: ScanExecutor,
        presenter: JsonPresenter,
    ) -> Self {
        Self {
            decoder,
            executor,
            presenter,
        }
    }

    /// 기본 디코더, 매처, 인코더로 서비스를 만듭니다.
    pub fn from_config(manager: Arc<DatabaseManager>, config: &ScannerConfig) -> Self {
        let executor = ScanExecutor::new(
            manager,
            Arc::new(VulnMatcher::from_config(config)),
            config.retry_policy(),
        );
        Self::new(
            Arc::new(AutoDecoder::from_config(config)),
            executor,
            JsonPresenter::new(),
        )
    }

    /// 스캔을 받을 준비가 되었는지 여부
    pub fn is_ready(&self) -> bool {
        self.executor.manager().is_ready()
    }

    /// SBOM을 디코딩하고 스캔해 결과를 반환합니다.
    pub async fn scan_result(&self, raw: Vec<u8>) -> Result<ScanResult, ScannerError> {
        metrics::counter!(m::SCAN_REQUESTS_TOTAL).increment(1);

        let decoder = Arc::clone(&self.decoder);
        let decoded = tokio::task::spawn_blocking(move || decoder.decode(&raw))
            .await
            .map_err(|e| ScannerError::DecodeFailed(format!("decoder task failed: {e}")))
            .and_then(|result| result);

        let decoded = match decoded {
            Ok(decoded) => decoded,
            Err(e) => {
                metrics::counter!(m::SCAN_FAILURES_TOTAL, m::LABEL_REASON => "decode")
                    .increment(1);
                debug!(error = %e, "rejecting sbom");
                return Err(e);
            }
        };

        self.executor
            .execute(Arc::new(decoded.packages), decoded.context)
            .await
    }

    /// SBOM 바이트를 스캔해 결과 문서 바이트를 반환합니다.
    pub async fn scan(&self, raw: Vec<u8>) -> Result<Vec<u8>, ScannerError> {
        let result = self.scan_result(raw).await?;
        self.presenter.encode(&result)
    }
}
