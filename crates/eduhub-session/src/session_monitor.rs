//! 세션 비활동 모니터.
//!
//! 주기적으로 세션 정보를 조회하여 비활동 시간이 경고 구간
//! `[warning_after, expiry_after)`에 들어오면 복구 다이얼로그를 연다.
//! 같은 구간(= 같은 `last_activity`)에서는 한 번만 트리거한다.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use eduhub_core::config::SessionConfig;
use eduhub_core::models::recovery::RecoveryReason;
use eduhub_core::models::session::SessionInfo;
use eduhub_core::ports::auth_sync::AuthSync;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::recovery::RecoveryHandle;

/// 단일 점검 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCheck {
    /// 세션 없음
    NoSession,
    /// 비활성 세션 (로그아웃됨)
    Inactive,
    /// 경고 구간 이전
    Active,
    /// 경고 구간 진입 - 다이얼로그 트리거
    Warning,
    /// 이번 구간에서 이미 트리거함
    AlreadyTriggered,
    /// 만료 시점 경과 - 아무것도 하지 않음
    Expired,
}

/// 세션 모니터
pub struct SessionMonitor {
    auth: Arc<dyn AuthSync>,
    recovery: RecoveryHandle,
    poll_interval: Duration,
    warning_after: chrono::Duration,
    expiry_after: chrono::Duration,
    /// 마지막으로 트리거한 구간의 `last_activity`
    last_triggered: Option<DateTime<Utc>>,
}

impl SessionMonitor {
    pub fn new(config: &SessionConfig, auth: Arc<dyn AuthSync>, recovery: RecoveryHandle) -> Self {
        Self {
            auth,
            recovery,
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            warning_after: config.warning_after(),
            expiry_after: config.expiry_after(),
            last_triggered: None,
        }
    }

    /// 세션 상태 판정 (부수효과 없음)
    pub fn evaluate(&self, info: Option<&SessionInfo>, now: DateTime<Utc>) -> SessionCheck {
        let Some(info) = info else {
            return SessionCheck::NoSession;
        };
        if !info.is_active {
            return SessionCheck::Inactive;
        }

        let idle = info.inactivity(now);
        if idle < self.warning_after {
            SessionCheck::Active
        } else if idle >= self.expiry_after {
            SessionCheck::Expired
        } else if self.last_triggered == Some(info.last_activity) {
            SessionCheck::AlreadyTriggered
        } else {
            SessionCheck::Warning
        }
    }

    /// 한 번 점검하고 경고 구간 진입 시 복구 다이얼로그를 연다
    pub async fn tick(&mut self, now: DateTime<Utc>) -> SessionCheck {
        let info = self.auth.get_session_info();
        let check = self.evaluate(info.as_ref(), now);

        if let (SessionCheck::Warning, Some(info)) = (check, info.as_ref()) {
            self.last_triggered = Some(info.last_activity);
            info!(
                "세션 만료 임박: {}분 비활동 (세션 {})",
                info.inactivity(now).num_minutes(),
                info.session_id
            );
            if let Err(e) = self.recovery.open(RecoveryReason::TokenExpiring).await {
                warn!("복구 다이얼로그 열기 실패: {e}");
            }
        } else {
            debug!("세션 점검: {:?}", check);
        }
        check
    }

    /// 폴링 루프 (종료 신호까지)
    pub async fn run(mut self, mut shutdown_rx: watch::Receiver<bool>) {
        info!("세션 모니터 시작 ({}초 간격)", self.poll_interval.as_secs());
        let mut interval = tokio::time::interval(self.poll_interval);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.tick(Utc::now()).await;
                }
                _ = shutdown_rx.changed() => {
                    info!("세션 모니터 종료");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recovery::AuthRecovery;
    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;
    use eduhub_core::config::RecoveryConfig;
    use eduhub_core::error::CoreError;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// 세션 정보를 직접 조작할 수 있는 Mock. 갱신은 끝나지 않는다.
    #[derive(Default)]
    struct MockSession {
        info: Mutex<Option<SessionInfo>>,
        refresh_calls: AtomicU32,
        polls: AtomicU32,
    }

    impl MockSession {
        fn with_session(info: SessionInfo) -> Self {
            Self {
                info: Mutex::new(Some(info)),
                ..Default::default()
            }
        }

        fn touch(&self, at: DateTime<Utc>) {
            if let Some(info) = self.info.lock().as_mut() {
                info.last_activity = at;
            }
        }
    }

    #[async_trait]
    impl AuthSync for MockSession {
        async fn refresh_token(&self) -> Result<(), CoreError> {
            self.refresh_calls.fetch_add(1, Ordering::SeqCst);
            std::future::pending().await
        }

        fn extend_session(&self) {}

        async fn logout(&self) -> Result<(), CoreError> {
            Ok(())
        }

        fn get_session_info(&self) -> Option<SessionInfo> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            self.info.lock().clone()
        }
    }

    fn start() -> DateTime<Utc> {
        "2026-03-02T09:00:00Z".parse().unwrap()
    }

    fn monitor_for(auth: Arc<MockSession>) -> (SessionMonitor, RecoveryHandle, watch::Sender<bool>) {
        let (actor, handle) = AuthRecovery::new(RecoveryConfig::default(), auth.clone());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(actor.run(shutdown_rx));
        let monitor = SessionMonitor::new(&SessionConfig::default(), auth, handle.clone());
        (monitor, handle, shutdown_tx)
    }

    #[test]
    fn evaluate_classifies_inactivity() {
        let (recovery_actor, handle) =
            AuthRecovery::new(RecoveryConfig::default(), Arc::new(MockSession::default()));
        drop(recovery_actor);
        let monitor = SessionMonitor::new(
            &SessionConfig::default(),
            Arc::new(MockSession::default()),
            handle,
        );
        let info = SessionInfo::start("sess_1", start());

        assert_eq!(monitor.evaluate(None, start()), SessionCheck::NoSession);
        assert_eq!(
            monitor.evaluate(Some(&info), start() + ChronoDuration::minutes(24)),
            SessionCheck::Active
        );
        assert_eq!(
            monitor.evaluate(Some(&info), start() + ChronoDuration::minutes(25)),
            SessionCheck::Warning
        );
        assert_eq!(
            monitor.evaluate(
                Some(&info),
                start() + ChronoDuration::minutes(29) + ChronoDuration::seconds(59)
            ),
            SessionCheck::Warning
        );
        assert_eq!(
            monitor.evaluate(Some(&info), start() + ChronoDuration::minutes(30)),
            SessionCheck::Expired
        );

        let mut ended = info.clone();
        ended.is_active = false;
        assert_eq!(
            monitor.evaluate(Some(&ended), start() + ChronoDuration::minutes(26)),
            SessionCheck::Inactive
        );
    }

    #[tokio::test]
    async fn triggers_once_per_window() {
        let auth = Arc::new(MockSession::with_session(SessionInfo::start("sess_1", start())));
        let (mut monitor, handle, _shutdown) = monitor_for(auth.clone());
        let mut rx = handle.subscribe();

        assert_eq!(
            monitor.tick(start() + ChronoDuration::minutes(20)).await,
            SessionCheck::Active
        );
        assert_eq!(
            monitor.tick(start() + ChronoDuration::minutes(25)).await,
            SessionCheck::Warning
        );
        let opened = rx.wait_for(|s| s.open).await.unwrap().clone();
        assert_eq!(opened.reason, Some(RecoveryReason::TokenExpiring));

        assert_eq!(
            monitor.tick(start() + ChronoDuration::minutes(27)).await,
            SessionCheck::AlreadyTriggered
        );

        // 다이얼로그를 닫아도 같은 구간에서는 다시 열리지 않음
        handle.close().await.unwrap();
        rx.wait_for(|s| !s.open).await.unwrap();
        assert_eq!(
            monitor.tick(start() + ChronoDuration::minutes(28)).await,
            SessionCheck::AlreadyTriggered
        );

        // 30분 경과 후에는 아무것도 하지 않음
        assert_eq!(
            monitor.tick(start() + ChronoDuration::minutes(31)).await,
            SessionCheck::Expired
        );
        assert_eq!(
            monitor.tick(start() + ChronoDuration::minutes(45)).await,
            SessionCheck::Expired
        );
        tokio::task::yield_now().await;
        assert!(!handle.state().open);
    }

    #[tokio::test]
    async fn new_activity_opens_new_window() {
        let auth = Arc::new(MockSession::with_session(SessionInfo::start("sess_1", start())));
        let (mut monitor, handle, _shutdown) = monitor_for(auth.clone());

        assert_eq!(
            monitor.tick(start() + ChronoDuration::minutes(25)).await,
            SessionCheck::Warning
        );
        handle.close().await.unwrap();

        let resumed = start() + ChronoDuration::minutes(26);
        auth.touch(resumed);
        assert_eq!(
            monitor.tick(resumed + ChronoDuration::minutes(10)).await,
            SessionCheck::Active
        );
        assert_eq!(
            monitor.tick(resumed + ChronoDuration::minutes(25)).await,
            SessionCheck::Warning
        );
    }

    #[tokio::test]
    async fn no_session_never_triggers() {
        let auth = Arc::new(MockSession::default());
        let (mut monitor, handle, _shutdown) = monitor_for(auth.clone());

        assert_eq!(
            monitor.tick(start() + ChronoDuration::minutes(26)).await,
            SessionCheck::NoSession
        );
        tokio::task::yield_now().await;
        assert!(!handle.state().open);
        assert_eq!(auth.refresh_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_polling() {
        let auth = Arc::new(MockSession::with_session(SessionInfo::start("sess_1", Utc::now())));
        let (monitor, _handle, _recovery_shutdown) = monitor_for(auth.clone());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(monitor.run(shutdown_rx));

        tokio::time::sleep(Duration::from_secs(121)).await;
        let polls = auth.polls.load(Ordering::SeqCst);
        assert_eq!(polls, 3);

        shutdown_tx.send(true).unwrap();
        task.await.unwrap();

        // 대기 중이던 폴링 타이머가 더 이상 동작하지 않음
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(auth.polls.load(Ordering::SeqCst), polls);
    }
}
