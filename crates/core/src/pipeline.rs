//! 컴포넌트 상태 보고 -- 헬스 상태와 비동기 trait 보조 타입

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

/// dyn 호환 trait에서 사용하는 boxed future 별칭
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// 컴포넌트 헬스 상태
///
/// `Degraded`는 서비스는 계속되지만 주의가 필요한 상태입니다
/// (예: 마지막 데이터베이스 갱신 실패).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "lowercase")]
pub enum HealthStatus {
    /// 정상
    Healthy,
    /// 부분 저하 -- 사유 포함
    Degraded(String),
    /// 비정상 -- 사유 포함
    Unhealthy(String),
}

impl HealthStatus {
    /// 정상 상태인지 확인합니다.
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// 비정상 상태인지 확인합니다.
    pub fn is_unhealthy(&self) -> bool {
        matches!(self, Self::Unhealthy(_))
    }
}
