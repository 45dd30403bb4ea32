//! 인증 복구 상태 머신.
//!
//! 토큰 갱신이 필요할 때 열리는 복구 다이얼로그의 상태를 소유하는 액터.
//! 명령은 `mpsc`로 받고 상태는 `watch`로 발행한다.
//!
//! ```text
//! Idle ─▶ Recovering ─┬─▶ Success ─(2초)─▶ 닫힘
//!                     └─▶ Failed ─(카운트다운)─▶ Recovering
//!                               └─(재시도 소진)─▶ 로그아웃만 가능
//! ```

use std::sync::Arc;
use std::time::Duration;

use eduhub_core::config::RecoveryConfig;
use eduhub_core::deadline::with_deadline;
use eduhub_core::error::CoreError;
use eduhub_core::models::notification::{Notification, NotificationLevel};
use eduhub_core::models::recovery::{
    RecoveryReason, RecoveryState, RecoveryStatus, PROGRESS_CAP,
};
use eduhub_core::ports::auth_sync::AuthSync;
use eduhub_core::ports::notifier::ToastNotifier;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::timer::{join_in_flight, sleep_until_opt};

/// 명령 채널 버퍼 크기
const COMMAND_CAPACITY: usize = 32;

/// 카운트다운 틱 주기
const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

/// 복구 다이얼로그 명령
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryCommand {
    /// 다이얼로그 열기 (이미 열려 있으면 무시)
    Open(RecoveryReason),
    /// 수동 재시도
    Retry,
    /// 세션 연장 후 닫기
    ExtendSession,
    /// 로그아웃 후 닫기
    Logout,
    /// 닫기 (상태 초기화)
    Close,
}

/// 복구 액터 핸들 (복제 가능)
#[derive(Clone)]
pub struct RecoveryHandle {
    cmd_tx: mpsc::Sender<RecoveryCommand>,
    state_rx: watch::Receiver<RecoveryState>,
}

impl RecoveryHandle {
    /// 명령 전송
    pub async fn send(&self, command: RecoveryCommand) -> Result<(), CoreError> {
        self.cmd_tx
            .send(command)
            .await
            .map_err(|_| CoreError::ChannelClosed("인증 복구 태스크 종료됨".to_string()))
    }

    pub async fn open(&self, reason: RecoveryReason) -> Result<(), CoreError> {
        self.send(RecoveryCommand::Open(reason)).await
    }

    pub async fn retry(&self) -> Result<(), CoreError> {
        self.send(RecoveryCommand::Retry).await
    }

    pub async fn extend_session(&self) -> Result<(), CoreError> {
        self.send(RecoveryCommand::ExtendSession).await
    }

    pub async fn logout(&self) -> Result<(), CoreError> {
        self.send(RecoveryCommand::Logout).await
    }

    pub async fn close(&self) -> Result<(), CoreError> {
        self.send(RecoveryCommand::Close).await
    }

    /// 현재 상태 (복제본)
    pub fn state(&self) -> RecoveryState {
        self.state_rx.borrow().clone()
    }

    /// 상태 변경 구독
    pub fn subscribe(&self) -> watch::Receiver<RecoveryState> {
        self.state_rx.clone()
    }
}

/// 인증 복구 액터
pub struct AuthRecovery {
    config: RecoveryConfig,
    auth: Arc<dyn AuthSync>,
    notifier: Option<Arc<dyn ToastNotifier>>,
    cmd_rx: mpsc::Receiver<RecoveryCommand>,
    state_tx: watch::Sender<RecoveryState>,
    state: RecoveryState,
    /// 진행 중인 토큰 갱신 (최대 1개)
    attempt: Option<JoinHandle<Result<(), CoreError>>>,
    /// 진행 중인 로그아웃 요청
    logout_call: Option<JoinHandle<Result<(), CoreError>>>,
    next_progress: Option<Instant>,
    next_countdown_tick: Option<Instant>,
    close_at: Option<Instant>,
}

impl AuthRecovery {
    /// 새 복구 액터와 핸들 생성
    pub fn new(config: RecoveryConfig, auth: Arc<dyn AuthSync>) -> (Self, RecoveryHandle) {
        let state = RecoveryState::closed(config.max_retries);
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (state_tx, state_rx) = watch::channel(state.clone());

        let actor = Self {
            config,
            auth,
            notifier: None,
            cmd_rx,
            state_tx,
            state,
            attempt: None,
            logout_call: None,
            next_progress: None,
            next_countdown_tick: None,
            close_at: None,
        };
        (actor, RecoveryHandle { cmd_tx, state_rx })
    }

    /// 토스트 알림기 연결
    pub fn with_notifier(mut self, notifier: Arc<dyn ToastNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// 액터 루프 실행
    ///
    /// 종료 신호를 받거나 모든 핸들이 drop되면 진행 중인 갱신/로그아웃을 중단하고 반환한다.
    /// 반환 이후에는 상태가 발행되지 않는다.
    pub async fn run(mut self, mut shutdown_rx: watch::Receiver<bool>) {
        info!("인증 복구 태스크 시작 (최대 재시도 {}회)", self.config.max_retries);

        loop {
            tokio::select! {
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd),
                    None => {
                        debug!("모든 복구 핸들 drop - 태스크 종료");
                        break;
                    }
                },
                result = join_in_flight(&mut self.attempt) => {
                    self.attempt = None;
                    self.finish_attempt(result).await;
                }
                result = join_in_flight(&mut self.logout_call) => {
                    self.logout_call = None;
                    self.finish_logout(result);
                }
                _ = sleep_until_opt(self.next_progress) => self.advance_progress(),
                _ = sleep_until_opt(self.next_countdown_tick) => self.tick_countdown(),
                _ = sleep_until_opt(self.close_at) => {
                    debug!("성공 후 다이얼로그 자동 닫힘");
                    self.reset();
                }
                _ = shutdown_rx.changed() => {
                    info!("인증 복구 태스크 종료");
                    break;
                }
            }
        }

        self.cancel_pending();
    }

    fn handle_command(&mut self, cmd: RecoveryCommand) {
        debug!("복구 명령 수신: {:?}", cmd);
        if self.logout_call.is_some() {
            debug!("로그아웃 진행 중 - 명령 무시 ({:?})", cmd);
            return;
        }
        match cmd {
            RecoveryCommand::Open(reason) => self.open(reason),
            RecoveryCommand::Retry => self.manual_retry(),
            RecoveryCommand::ExtendSession => self.extend_session(),
            RecoveryCommand::Logout => self.logout(),
            RecoveryCommand::Close => {
                self.cancel_pending();
                self.reset();
            }
        }
    }

    fn open(&mut self, reason: RecoveryReason) {
        if self.state.open {
            debug!("복구 다이얼로그 이미 열림 - 무시 ({:?})", reason);
            return;
        }

        info!("복구 다이얼로그 열림: {:?}", reason);
        self.cancel_pending();
        self.state = RecoveryState::opened(reason, self.config.max_retries);
        self.publish();

        if reason.auto_starts() {
            self.start_attempt();
        }
    }

    fn manual_retry(&mut self) {
        if !self.state.open {
            debug!("다이얼로그 닫힘 상태 - 재시도 무시");
            return;
        }
        if self.state.status == RecoveryStatus::Success {
            debug!("이미 복구 완료 - 재시도 무시");
            return;
        }
        if self.state.is_exhausted() {
            warn!(
                "재시도 횟수 소진 ({}/{}) - 로그아웃만 가능",
                self.state.retry_count, self.state.max_retries
            );
            return;
        }
        self.start_attempt();
    }

    fn start_attempt(&mut self) {
        if self.attempt.is_some() {
            debug!("토큰 갱신 진행 중 - 중복 시도 무시");
            return;
        }

        self.next_countdown_tick = None;
        self.state.status = RecoveryStatus::Recovering;
        self.state.progress = 0;
        self.state.countdown_secs = 0;
        self.state.error = None;

        let auth = Arc::clone(&self.auth);
        let timeout = self.config.refresh_timeout();
        self.attempt = Some(tokio::spawn(async move {
            with_deadline(timeout, auth.refresh_token()).await
        }));
        self.next_progress = Some(Instant::now() + self.config.progress_interval());

        info!(
            "토큰 갱신 시도 (실패 누적 {}/{})",
            self.state.retry_count, self.state.max_retries
        );
        self.publish();
    }

    fn advance_progress(&mut self) {
        let next = self
            .state
            .progress
            .saturating_add(self.config.progress_step)
            .min(PROGRESS_CAP);
        self.state.progress = next;
        self.next_progress = if next < PROGRESS_CAP {
            Some(Instant::now() + self.config.progress_interval())
        } else {
            None
        };
        self.publish();
    }

    async fn finish_attempt(&mut self, result: Result<(), CoreError>) {
        self.next_progress = None;

        match result {
            Ok(()) => {
                info!("토큰 갱신 성공");
                self.state.status = RecoveryStatus::Success;
                self.state.progress = 100;
                self.state.retry_count = 0;
                self.state.countdown_secs = 0;
                self.state.error = None;
                self.close_at = Some(Instant::now() + self.config.success_close_delay());
                self.publish();

                self.toast(
                    NotificationLevel::Success,
                    "세션 복구 완료",
                    "인증이 갱신되었습니다.",
                )
                .await;
            }
            Err(e) => {
                let message = e.user_message();
                self.state.status = RecoveryStatus::Failed;
                self.state.progress = 0;
                self.state.retry_count = (self.state.retry_count + 1).min(self.state.max_retries);
                self.state.error = Some(message.clone());

                if self.state.is_exhausted() {
                    error!(
                        "토큰 갱신 실패 - 재시도 소진 ({}/{}): {}",
                        self.state.retry_count, self.state.max_retries, message
                    );
                    self.state.countdown_secs = 0;
                    self.next_countdown_tick = None;
                    self.publish();

                    self.toast(
                        NotificationLevel::Error,
                        "세션 복구 실패",
                        format!("{message} 다시 로그인해 주세요."),
                    )
                    .await;
                } else {
                    let countdown = self.config.countdown_for(self.state.retry_count);
                    warn!(
                        "토큰 갱신 실패 ({}/{}), {}초 후 재시도: {}",
                        self.state.retry_count, self.state.max_retries, countdown, message
                    );
                    self.state.countdown_secs = countdown;
                    self.next_countdown_tick = Some(Instant::now() + COUNTDOWN_TICK);
                    self.publish();
                }
            }
        }
    }

    fn tick_countdown(&mut self) {
        self.state.countdown_secs = self.state.countdown_secs.saturating_sub(1);

        if self.state.countdown_secs == 0 {
            self.next_countdown_tick = None;
            if self.state.status == RecoveryStatus::Failed && !self.state.is_exhausted() {
                self.start_attempt();
                return;
            }
        } else {
            self.next_countdown_tick = Some(Instant::now() + COUNTDOWN_TICK);
        }
        self.publish();
    }

    fn extend_session(&mut self) {
        if !self.state.open {
            debug!("다이얼로그 닫힘 상태 - 세션 연장 무시");
            return;
        }
        if self.state.is_recovering() || self.state.is_exhausted() {
            debug!("세션 연장 불가 상태: {:?}", self.state.status);
            return;
        }

        self.auth.extend_session();
        info!("세션 연장 - 다이얼로그 닫힘");
        self.cancel_pending();
        self.reset();
    }

    fn logout(&mut self) {
        self.cancel_pending();

        let auth = Arc::clone(&self.auth);
        let timeout = self.config.refresh_timeout();
        self.logout_call = Some(tokio::spawn(async move {
            with_deadline(timeout, auth.logout()).await
        }));
        info!("로그아웃 요청");
    }

    fn finish_logout(&mut self, result: Result<(), CoreError>) {
        match result {
            Ok(()) => info!("로그아웃 완료"),
            Err(e) => warn!("로그아웃 요청 실패 (로컬 세션은 종료): {e}"),
        }
        self.reset();
    }

    /// 타이머와 진행 중인 갱신 모두 취소
    fn cancel_pending(&mut self) {
        if let Some(attempt) = self.attempt.take() {
            debug!("진행 중인 토큰 갱신 중단");
            attempt.abort();
        }
        if let Some(call) = self.logout_call.take() {
            debug!("진행 중인 로그아웃 중단");
            call.abort();
        }
        self.next_progress = None;
        self.next_countdown_tick = None;
        self.close_at = None;
    }

    fn reset(&mut self) {
        self.close_at = None;
        self.state = RecoveryState::closed(self.config.max_retries);
        self.publish();
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.state.clone());
    }

    async fn toast(&self, level: NotificationLevel, title: &str, body: impl Into<String>) {
        let Some(notifier) = &self.notifier else {
            return;
        };
        let notification = Notification::new(level, title, body);
        if let Err(e) = notifier.show(&notification).await {
            debug!("복구 알림 실패: {e}");
        }
    }
}
