//! 스캔 실행기 -- 재시도와 핸들 스냅샷
//!
//! [`ScanExecutor`]는 시도마다 [`DatabaseManager::current`]를 다시 읽고,
//! 그 핸들의 제공자로 매처를 실행합니다. 재시도 대기 중에는 어떤 잠금도, 핸들도 잡지 않습니다.
//!
//! ```text
//! execute(packages, ctx)
//!   |- current() == None --> ProviderNotReady (재시도 없음)
//!   |- attempt 1..=N
//!   |    |- handle = current()
//!   |    |- spawn_blocking(matcher.find_matches(packages, ctx, handle.providers()))
//!   |    |    Ok / Partial        --> ScanResult (handle.status() 포함)
//!   |    |    Provider / panic    --> backoff 후 재시도
//!   |- 소진 --> ScanFailedAfterRetries { attempts, last_error }
//! ```

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{info, warn};

use scanward_core::metrics as m;
use scanward_vuln_db::{DatabaseManager, DbStatus};

use crate::error::ScannerError;
use crate::matcher::{MatchError, MatchSet, Matcher};
use crate::result::ScanResult;
use crate::retry::{self, Attempt, RetryOutcome, RetryPolicy};
use crate::types::{Package, ScanContext};

/// 한 번의 성공한 시도 결과
struct AttemptOutput {
    set: MatchSet,
    status: DbStatus,
    warning: Option<String>,
}

/// 스캔 실행기
#[derive(Clone)]
pub struct ScanExecutor {
    manager: Arc<DatabaseManager>,
    matcher: Arc<dyn Matcher>,
    policy: RetryPolicy,
}

impl ScanExecutor {
    /// 실행기를 만듭니다.
    pub fn new(
        manager: Arc<DatabaseManager>,
        matcher: Arc<dyn Matcher>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            manager,
            matcher,
            policy,
        }
    }

    /// 재시도 정책
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// 데이터베이스 매니저
    pub fn manager(&self) -> &Arc<DatabaseManager> {
        &self.manager
    }

    /// 패키지 목록을 스캔합니다.
    pub async fn execute(
        &self,
        packages: Arc<Vec<Package>>,
        context: ScanContext,
    ) -> Result<ScanResult, ScannerError> {
        let started = Instant::now();

        if !self.manager.is_ready() {
            metrics::counter!(m::SCAN_FAILURES_TOTAL, m::LABEL_REASON => "not_ready").increment(1);
            return Err(ScannerError::ProviderNotReady);
        }

        let context = Arc::new(context);
        let outcome = retry::run(&self.policy, |attempt| {
            let manager = Arc::clone(&self.manager);
            let matcher = Arc::clone(&self.matcher);
            let packages = Arc::clone(&packages);
            let context = Arc::clone(&context);
            async move { run_attempt(attempt, manager, matcher, packages, context).await }
        })
        .await;

        match outcome {
            RetryOutcome::Succeeded { value, attempts } => {
                let result = ScanResult {
                    scan_id: uuid::Uuid::new_v4().to_string(),
                    matches: value.set.matches,
                    ignored: value.set.ignored,
                    db_status: value.status,
                    attempts,
                    warnings: value.warning.into_iter().collect(),
                    package_count: packages.len(),
                    context: Arc::unwrap_or_clone(context),
                    scanned_at: Utc::now(),
                };
                record_success(&result, started);
                info!(
                    scan_id = %result.scan_id,
                    source = %result.context.source_name,
                    packages = result.package_count,
                    matches = result.matches.len(),
                    ignored = result.ignored.len(),
                    attempts,
                    db = %result.db_status,
                    "scan completed"
                );
                Ok(result)
            }
            RetryOutcome::Stopped { error, .. } => {
                metrics::counter!(m::SCAN_FAILURES_TOTAL, m::LABEL_REASON => "not_ready")
                    .increment(1);
                Err(error)
            }
            RetryOutcome::Exhausted {
                last_error,
                attempts,
            } => {
                metrics::counter!(m::SCAN_FAILURES_TOTAL, m::LABEL_REASON => "exhausted")
                    .increment(1);
                warn!(attempts, error = %last_error, "scan failed after retries");
                Err(ScannerError::ScanFailedAfterRetries {
                    attempts,
                    last_error: last_error.to_string(),
                })
            }
        }
    }
}

async fn run_attempt(
    attempt: u32,
    manager: Arc<DatabaseManager>,
    matcher: Arc<dyn Matcher>,
    packages: Arc<Vec<Package>>,
    context: Arc<ScanContext>,
) -> Result<AttemptOutput, Attempt<ScannerError>> {
    metrics::counter!(m::SCAN_ATTEMPTS_TOTAL).increment(1);
    if attempt > 1 {
        metrics::counter!(m::SCAN_RETRIES_TOTAL).increment(1);
    }

    let Some(handle) = manager.current() else {
        return Err(Attempt::Stop(ScannerError::ProviderNotReady));
    };
    let status = handle.status().clone();

    let joined = tokio::task::spawn_blocking(move || {
        matcher.find_matches(&packages, &context, handle.providers())
    })
    .await;

    let failure = match joined {
        Ok(Ok(set)) => {
            return Ok(AttemptOutput {
                set,
                status,
                warning: None,
            });
        }
        Ok(Err(MatchError::Partial { set, reason })) => {
            warn!(attempt, reason = %reason, "returning partial match result");
            return Ok(AttemptOutput {
                set,
                status,
                warning: Some(reason),
            });
        }
        Ok(Err(e)) if e.is_retryable() => e.to_string(),
        Ok(Err(e)) => return Err(Attempt::Stop(ScannerError::MatchTransientFailure(e.to_string()))),
        Err(e) if e.is_panic() => format!("matcher panicked: {e}"),
        Err(e) => format!("matcher task failed: {e}"),
    };

    warn!(attempt, db = %status, error = %failure, "match attempt failed");
    Err(Attempt::Retry(ScannerError::MatchTransientFailure(failure)))
}

fn record_success(result: &ScanResult, started: Instant) {
    metrics::histogram!(m::SCAN_DURATION_SECONDS).record(started.elapsed().as_secs_f64());
    for found in &result.matches {
        metrics::counter!(m::SCAN_MATCHES_TOTAL, m::LABEL_SEVERITY => found.severity.as_label())
            .increment(1);
    }
}
