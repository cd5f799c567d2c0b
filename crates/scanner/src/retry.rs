//! 재시도 루프 -- 고정 간격, 제한된 횟수
//!
//! [`run`]은 시도마다 연산을 호출하고 결과를 [`RetryOutcome`]으로 태그해 반환합니다.
//! 연산은 실패를 [`Attempt::Retry`] 또는 [`Attempt::Stop`]으로 분류합니다.
//! 대기는 시도 사이에만 하며 마지막 실패 뒤에는 대기하지 않습니다.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tracing::debug;

/// 기본 최대 시도 횟수
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
/// 기본 재시도 간격
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);

/// 재시도 정책
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_BACKOFF)
    }
}

impl RetryPolicy {
    /// 정책을 만듭니다. 시도 횟수는 최소 1입니다.
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// 최대 시도 횟수
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// 시도 간 대기 시간
    pub fn backoff(&self) -> Duration {
        self.backoff
    }
}

/// 단일 시도의 실패 분류
#[derive(Debug)]
pub enum Attempt<E> {
    /// 다시 시도할 가치가 있는 실패
    Retry(E),
    /// 재시도해도 소용없는 실패
    Stop(E),
}

/// 재시도 루프의 최종 결과
#[derive(Debug)]
pub enum RetryOutcome<T, E> {
    /// 성공
    Succeeded {
        /// 결과 값
        value: T,
        /// 성공까지의 시도 횟수
        attempts: u32,
    },
    /// 재시도 불가 실패로 중단
    Stopped {
        /// 중단 원인
        error: E,
        /// 중단까지의 시도 횟수
        attempts: u32,
    },
    /// 시도 예산 소진
    Exhausted {
        /// 마지막 시도의 에러
        last_error: E,
        /// 전체 시도 횟수
        attempts: u32,
    },
}

impl<T, E> RetryOutcome<T, E> {
    /// 수행한 시도 횟수
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Succeeded { attempts, .. }
            | Self::Stopped { attempts, .. }
            | Self::Exhausted { attempts, .. } => *attempts,
        }
    }
}

/// 정책에 따라 `op`를 반복 호출합니다.
///
/// `op`에는 1부터 시작하는 시도 번호가 전달됩니다.
pub async fn run<T, E, F, Fut>(policy: &RetryPolicy, mut op: F) -> RetryOutcome<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, Attempt<E>>>,
    E: fmt::Display,
{
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => {
                return RetryOutcome::Succeeded {
                    value,
                    attempts: attempt,
                };
            }
            Err(Attempt::Stop(error)) => {
                return RetryOutcome::Stopped {
                    error,
                    attempts: attempt,
                };
            }
            Err(Attempt::Retry(error)) => {
                if attempt >= policy.max_attempts {
                    return RetryOutcome::Exhausted {
                        last_error: error,
                        attempts: attempt,
                    };
                }
                debug!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    backoff_ms = policy.backoff.as_millis() as u64,
                    error = %error,
                    "attempt failed, retrying"
                );
                tokio::time::sleep(policy.backoff).await;
                attempt += 1;
            }
        }
    }
}
