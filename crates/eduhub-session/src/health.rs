//! 백엔드 헬스 폴링 + 상태 배너.
//!
//! 주기적으로 `HealthProbe`를 호출해 `BannerState`를 발행한다.
//! 배너는 오프라인일 때만 보이며, 사용자가 닫거나 즉시 재확인을 요청할 수 있다.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use eduhub_core::config::HealthConfig;
use eduhub_core::deadline::with_deadline;
use eduhub_core::error::CoreError;
use eduhub_core::models::health::{BannerState, HealthStatus};
use eduhub_core::ports::health_probe::HealthProbe;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::timer::{join_in_flight, sleep_until_opt};

const COMMAND_CAPACITY: usize = 16;

/// 배너 명령
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerCommand {
    /// 배너 숨기기 (다음 온라인 전환까지)
    Dismiss,
    /// 즉시 재확인
    Retry,
}

/// 헬스 배너 핸들 (복제 가능)
#[derive(Clone)]
pub struct HealthBannerHandle {
    cmd_tx: mpsc::Sender<BannerCommand>,
    state_rx: watch::Receiver<BannerState>,
}

impl HealthBannerHandle {
    pub async fn dismiss(&self) -> Result<(), CoreError> {
        self.send(BannerCommand::Dismiss).await
    }

    pub async fn retry(&self) -> Result<(), CoreError> {
        self.send(BannerCommand::Retry).await
    }

    pub fn state(&self) -> BannerState {
        self.state_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<BannerState> {
        self.state_rx.clone()
    }

    async fn send(&self, command: BannerCommand) -> Result<(), CoreError> {
        self.cmd_tx
            .send(command)
            .await
            .map_err(|_| CoreError::ChannelClosed("헬스체크 태스크 종료됨".to_string()))
    }
}

/// 백엔드 헬스 폴러
pub struct BackendHealth {
    probe: Arc<dyn HealthProbe>,
    poll_interval: Duration,
    check_timeout: Duration,
    cmd_rx: mpsc::Receiver<BannerCommand>,
    state_tx: watch::Sender<BannerState>,
    state: BannerState,
    check: Option<JoinHandle<Result<Duration, CoreError>>>,
    next_check: Option<Instant>,
}

impl BackendHealth {
    pub fn new(config: &HealthConfig, probe: Arc<dyn HealthProbe>) -> (Self, HealthBannerHandle) {
        let state = BannerState::default();
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (state_tx, state_rx) = watch::channel(state.clone());

        let poller = Self {
            probe,
            poll_interval: config.poll_interval(),
            check_timeout: config.check_timeout(),
            cmd_rx,
            state_tx,
            state,
            check: None,
            next_check: None,
        };
        (poller, HealthBannerHandle { cmd_tx, state_rx })
    }

    /// 폴링 루프. 시작 즉시 첫 체크를 수행한다
    pub async fn run(mut self, mut shutdown_rx: watch::Receiver<bool>) {
        info!(
            "백엔드 헬스체크 시작 ({}초 간격)",
            self.poll_interval.as_secs()
        );
        self.next_check = Some(Instant::now());

        loop {
            tokio::select! {
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(BannerCommand::Dismiss) => self.dismiss(),
                    Some(BannerCommand::Retry) => {
                        debug!("헬스체크 수동 재시도");
                        self.start_check();
                    }
                    None => break,
                },
                result = join_in_flight(&mut self.check) => {
                    self.check = None;
                    self.apply(result);
                }
                _ = sleep_until_opt(self.next_check) => {
                    self.next_check = None;
                    self.start_check();
                }
                _ = shutdown_rx.changed() => {
                    info!("백엔드 헬스체크 종료");
                    break;
                }
            }
        }

        if let Some(check) = self.check.take() {
            check.abort();
        }
    }

    fn dismiss(&mut self) {
        if self.state.snapshot.status != HealthStatus::Offline || self.state.dismissed {
            return;
        }
        debug!("헬스 배너 닫힘");
        self.state.dismissed = true;
        self.publish();
    }

    fn start_check(&mut self) {
        if self.check.is_some() {
            debug!("헬스체크 진행 중 - 요청 병합");
            return;
        }

        let probe = Arc::clone(&self.probe);
        let timeout = self.check_timeout;
        self.check = Some(tokio::spawn(async move {
            with_deadline(timeout, probe.check()).await
        }));
        self.state.checking = true;
        self.publish();
    }

    fn apply(&mut self, result: Result<Duration, CoreError>) {
        let previous = self.state.snapshot.status;
        let snapshot = &mut self.state.snapshot;
        snapshot.last_checked = Some(Utc::now());

        match result {
            Ok(rtt) => {
                snapshot.status = HealthStatus::Online;
                snapshot.response_time_ms = Some(rtt.as_millis() as u64);
                snapshot.last_error = None;
                if previous != HealthStatus::Online {
                    info!("백엔드 온라인 ({}ms)", rtt.as_millis());
                    self.state.dismissed = false;
                }
            }
            Err(e) => {
                snapshot.status = HealthStatus::Offline;
                snapshot.response_time_ms = None;
                snapshot.last_error = Some(e.user_message());
                if previous != HealthStatus::Offline {
                    warn!("백엔드 오프라인: {e}");
                }
            }
        }

        self.state.checking = false;
        self.next_check = Some(Instant::now() + self.poll_interval);
        self.publish();
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.state.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// 결과를 순서대로 돌려주는 프로브 (`true` = 정상). 소진되면 마지막 결과 반복
    struct MockProbe {
        script: Mutex<VecDeque<bool>>,
        last: Mutex<bool>,
        delay: Duration,
        calls: AtomicU32,
    }

    impl MockProbe {
        fn new(script: &[bool]) -> Self {
            Self {
                script: Mutex::new(script.iter().copied().collect()),
                last: Mutex::new(true),
                delay: Duration::ZERO,
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HealthProbe for MockProbe {
        async fn check(&self) -> Result<Duration, CoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let healthy = {
                let next = self.script.lock().pop_front();
                let mut last = self.last.lock();
                if let Some(value) = next {
                    *last = value;
                }
                *last
            };
            if healthy {
                Ok(Duration::from_millis(12))
            } else {
                Err(CoreError::ServiceUnavailable("헬스체크 응답 503".to_string()))
            }
        }
    }

    fn spawn(
        probe: Arc<MockProbe>,
    ) -> (HealthBannerHandle, watch::Sender<bool>, JoinHandle<()>) {
        let (poller, handle) = BackendHealth::new(&HealthConfig::default(), probe);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(poller.run(shutdown_rx));
        (handle, shutdown_tx, task)
    }

    #[tokio::test(start_paused = true)]
    async fn starts_checking_then_reports_online() {
        let probe = Arc::new(MockProbe::new(&[true]));
        let (poller, handle) = BackendHealth::new(&HealthConfig::default(), probe.clone());
        assert_eq!(handle.state().snapshot.status, HealthStatus::Checking);

        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(poller.run(shutdown_rx));

        let mut rx = handle.subscribe();
        let state = rx
            .wait_for(|s| s.snapshot.status == HealthStatus::Online)
            .await
            .unwrap()
            .clone();
        assert_eq!(state.snapshot.response_time_ms, Some(12));
        assert!(state.snapshot.last_checked.is_some());
        assert!(!state.checking);
        assert!(!state.is_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn polls_every_interval() {
        let probe = Arc::new(MockProbe::new(&[true]));
        let (_handle, _shutdown_tx, _task) = spawn(probe.clone());

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(probe.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn offline_banner_can_be_dismissed_until_back_online() {
        let probe = Arc::new(MockProbe::new(&[false, false, true, false]));
        let (handle, _shutdown_tx, _task) = spawn(probe.clone());
        let mut rx = handle.subscribe();

        let offline = rx
            .wait_for(|s| s.snapshot.status == HealthStatus::Offline)
            .await
            .unwrap()
            .clone();
        assert!(offline.is_visible());
        assert_eq!(
            offline.snapshot.last_error.as_deref(),
            Some("헬스체크 응답 503")
        );

        handle.dismiss().await.unwrap();
        rx.wait_for(|s| s.dismissed).await.unwrap();

        // 다음 폴링에서도 여전히 오프라인 - 닫힌 상태 유지
        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(probe.calls(), 2);
        assert!(!handle.state().is_visible());

        // 온라인 전환 시 dismissed 초기화
        rx.wait_for(|s| s.snapshot.status == HealthStatus::Online)
            .await
            .unwrap();
        assert!(!handle.state().dismissed);

        // 다시 오프라인이 되면 배너가 보임
        let again = rx
            .wait_for(|s| s.snapshot.status == HealthStatus::Offline)
            .await
            .unwrap()
            .clone();
        assert!(again.is_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn dismiss_while_online_is_ignored() {
        let probe = Arc::new(MockProbe::new(&[true]));
        let (handle, _shutdown_tx, _task) = spawn(probe.clone());
        let mut rx = handle.subscribe();
        rx.wait_for(|s| s.snapshot.status == HealthStatus::Online)
            .await
            .unwrap();

        handle.dismiss().await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!handle.state().dismissed);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_runs_out_of_cycle_and_coalesces() {
        let probe = Arc::new(MockProbe {
            delay: Duration::from_secs(1),
            ..MockProbe::new(&[false, true])
        });
        let (handle, _shutdown_tx, _task) = spawn(probe.clone());
        let mut rx = handle.subscribe();

        rx.wait_for(|s| s.snapshot.status == HealthStatus::Offline)
            .await
            .unwrap();
        assert_eq!(probe.calls(), 1);

        // 두 번 연속 요청해도 한 번만 체크
        handle.retry().await.unwrap();
        handle.retry().await.unwrap();
        let checking = rx.wait_for(|s| s.checking).await.unwrap().clone();
        assert!(checking.is_visible());

        rx.wait_for(|s| s.snapshot.status == HealthStatus::Online)
            .await
            .unwrap();
        assert_eq!(probe.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_with_pending_poll_publishes_nothing() {
        let probe = Arc::new(MockProbe::new(&[true]));
        let (handle, shutdown_tx, task) = spawn(probe.clone());
        let mut rx = handle.subscribe();
        rx.wait_for(|s| s.snapshot.status == HealthStatus::Online)
            .await
            .unwrap();

        shutdown_tx.send(true).unwrap();
        task.await.unwrap();

        let last = rx.borrow_and_update().clone();
        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(probe.calls(), 1);
        assert_eq!(*rx.borrow(), last);
        assert!(handle.retry().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn hung_probe_times_out_as_offline() {
        struct HangingProbe;

        #[async_trait]
        impl HealthProbe for HangingProbe {
            async fn check(&self) -> Result<Duration, CoreError> {
                std::future::pending().await
            }
        }

        let (poller, handle) = BackendHealth::new(&HealthConfig::default(), Arc::new(HangingProbe));
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(poller.run(shutdown_rx));

        let started = Instant::now();
        let mut rx = handle.subscribe();
        let state = rx
            .wait_for(|s| s.snapshot.status == HealthStatus::Offline)
            .await
            .unwrap()
            .clone();
        assert_eq!(started.elapsed(), Duration::from_millis(5000));
        assert_eq!(
            state.snapshot.last_error.as_deref(),
            Some("요청 시간 초과: 5000ms")
        );
    }
}
