//! 주기적 갱신기 -- 일정 간격으로 [`DatabaseManager::refresh`] 호출
//!
//! 첫 갱신은 시작 후 한 간격이 지난 뒤 실행됩니다. 갱신 실패는 경고로 기록하고 계속 진행합니다.
//! 취소 신호는 틱 대기 중에만 확인하므로 진행 중인 갱신은 중간에 끊기지 않습니다.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::manager::DatabaseManager;

/// 갱신기 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefresherState {
    /// 다음 틱 대기 중
    Idle,
    /// 갱신 진행 중
    Refreshing,
    /// 종료됨
    Stopped,
}

/// 주기적 데이터베이스 갱신기
pub struct Refresher {
    manager: Arc<DatabaseManager>,
    interval: Duration,
    state_tx: watch::Sender<RefresherState>,
}

impl Refresher {
    /// 갱신기를 만듭니다. `interval`이 0이면 1초로 올림합니다.
    pub fn new(manager: Arc<DatabaseManager>, interval: Duration) -> Self {
        let (state_tx, _) = watch::channel(RefresherState::Idle);
        Self {
            manager,
            interval: interval.max(Duration::from_secs(1)),
            state_tx,
        }
    }

    /// 상태 변화를 구독합니다.
    pub fn state(&self) -> watch::Receiver<RefresherState> {
        self.state_tx.subscribe()
    }

    /// 취소될 때까지 갱신 루프를 실행합니다.
    pub async fn run(self, cancel: CancellationToken) {
        let period = self.interval;
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(interval_secs = period.as_secs(), "database refresher started");

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            self.state_tx.send_replace(RefresherState::Refreshing);
            match self.manager.refresh().await {
                Ok(true) => debug!("refresh installed a newer database"),
                Ok(false) => debug!("database already up to date"),
                Err(e) => warn!(error = %e, "database refresh failed"),
            }
            self.state_tx.send_replace(RefresherState::Idle);
        }

        self.state_tx.send_replace(RefresherState::Stopped);
        info!("database refresher stopped");
    }

    /// 갱신 루프를 백그라운드 태스크로 실행합니다.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }
}
