//! 터미널 콘솔.
//!
//! 표준 입력 명령 처리와 상태 변경 출력. 모든 명령은 사용자 활동으로 기록된다.

use std::io::BufRead;
use std::sync::Arc;

use eduhub_core::error::CoreError;
use eduhub_core::models::health::BannerState;
use eduhub_core::models::recovery::{RecoveryAction, RecoveryState};
use eduhub_network::auth::TokenManager;
use eduhub_network::connectivity::ConnectivityManager;
use eduhub_session::health::HealthBannerHandle;
use eduhub_session::presenter::{
    health_summary, present_banner, present_recovery, BannerView, RecoveryView,
};
use eduhub_session::recovery::RecoveryHandle;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

const HELP: &str = "\
명령:
  retry    토큰 갱신 다시 시도
  extend   세션 연장
  logout   로그아웃
  close    복구 다이얼로그 닫기
  dismiss  서버 상태 배너 닫기
  check    서버 상태 즉시 확인
  status   현재 상태 출력
  help     도움말";

/// 콘솔 명령
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    Retry,
    Extend,
    Logout,
    Close,
    Dismiss,
    Check,
    Status,
    Help,
}

impl ConsoleCommand {
    /// 입력 한 줄 해석 (대소문자 무시, 앞뒤 공백 무시)
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "retry" => Some(Self::Retry),
            "extend" => Some(Self::Extend),
            "logout" => Some(Self::Logout),
            "close" => Some(Self::Close),
            "dismiss" => Some(Self::Dismiss),
            "check" => Some(Self::Check),
            "status" => Some(Self::Status),
            "help" | "?" => Some(Self::Help),
            _ => None,
        }
    }
}

/// 복구 동작 → 콘솔 명령어
fn action_keyword(action: RecoveryAction) -> &'static str {
    match action {
        RecoveryAction::Retry => "retry",
        RecoveryAction::ExtendSession => "extend",
        RecoveryAction::Logout => "logout",
    }
}

/// 복구 다이얼로그 출력 텍스트
pub fn render_recovery(view: &RecoveryView) -> String {
    if !view.visible {
        return "🔒 세션 복구 다이얼로그 닫힘".to_string();
    }

    let mut lines = vec![
        format!("🔐 [{}] {}", view.title, view.message),
        format!("   {}  (재시도 {})", view.progress_bar, view.attempts_text),
    ];
    if let Some(error) = &view.error_text {
        lines.push(format!("   오류: {error}"));
    }
    if let Some(countdown) = &view.countdown_text {
        lines.push(format!("   {countdown}"));
    }
    let actions: Vec<String> = view
        .actions
        .iter()
        .map(|(action, label)| format!("{}({})", action_keyword(*action), label))
        .collect();
    lines.push(format!("   가능한 동작: {}", actions.join(" | ")));
    lines.join("\n")
}

/// 헬스 배너 출력 텍스트
pub fn render_banner(view: Option<&BannerView>) -> String {
    match view {
        None => "🌐 서버 상태 배너 숨김".to_string(),
        Some(view) => {
            let mut text = format!("🚧 {}", view.message);
            if let Some(detail) = &view.detail {
                text.push_str(&format!("\n   {detail}"));
            }
            text.push_str("\n   (dismiss: 닫기, check: 다시 확인)");
            text
        }
    }
}

/// 콘솔 명령 처리기
pub struct Console {
    recovery: RecoveryHandle,
    banner: Option<HealthBannerHandle>,
    token_manager: Arc<TokenManager>,
    connectivity: Arc<ConnectivityManager>,
}

impl Console {
    pub fn new(
        recovery: RecoveryHandle,
        banner: Option<HealthBannerHandle>,
        token_manager: Arc<TokenManager>,
        connectivity: Arc<ConnectivityManager>,
    ) -> Self {
        Self {
            recovery,
            banner,
            token_manager,
            connectivity,
        }
    }

    /// 명령 실행. 출력할 텍스트가 있으면 반환
    pub async fn execute(&self, command: ConsoleCommand) -> Result<Option<String>, CoreError> {
        self.token_manager.record_activity();

        match command {
            ConsoleCommand::Retry => self.recovery.retry().await?,
            ConsoleCommand::Extend => self.recovery.extend_session().await?,
            ConsoleCommand::Logout => self.recovery.logout().await?,
            ConsoleCommand::Close => self.recovery.close().await?,
            ConsoleCommand::Dismiss => match &self.banner {
                Some(banner) => banner.dismiss().await?,
                None => return Ok(Some("서버 상태 확인이 비활성화되어 있습니다".to_string())),
            },
            ConsoleCommand::Check => match &self.banner {
                Some(banner) => banner.retry().await?,
                None => return Ok(Some("서버 상태 확인이 비활성화되어 있습니다".to_string())),
            },
            ConsoleCommand::Status => return Ok(Some(self.status_text().await)),
            ConsoleCommand::Help => return Ok(Some(HELP.to_string())),
        }
        Ok(None)
    }

    async fn status_text(&self) -> String {
        let auth = if self.token_manager.is_authenticated().await {
            "유효"
        } else {
            "없음"
        };
        let session = match self.token_manager.session_info() {
            Some(info) if info.is_active => format!(
                "{} (마지막 활동 {})",
                info.session_id,
                info.last_activity.format("%H:%M:%S")
            ),
            Some(_) => "종료됨".to_string(),
            None => "없음".to_string(),
        };
        let server = match &self.banner {
            Some(banner) => health_summary(&banner.state()),
            None => "확인 안 함".to_string(),
        };

        format!(
            "세션: {session}\n인증 토큰: {auth}\n네트워크: {}\n서버: {server}\n{}",
            self.connectivity.status(),
            render_recovery(&present_recovery(&self.recovery.state()))
        )
    }

    /// 입력 루프 (종료 신호 또는 입력 종료까지)
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        let mut lines = spawn_stdin_reader();
        println!("'help'를 입력하면 명령 목록을 볼 수 있습니다.");

        loop {
            tokio::select! {
                line = lines.recv() => {
                    let Some(line) = line else {
                        debug!("표준 입력 종료");
                        break;
                    };
                    if line.trim().is_empty() {
                        continue;
                    }
                    match ConsoleCommand::parse(&line) {
                        Some(command) => match self.execute(command).await {
                            Ok(Some(text)) => println!("{text}"),
                            Ok(None) => {}
                            Err(e) => warn!("명령 처리 실패: {e}"),
                        },
                        None => println!("알 수 없는 명령: {} ('help' 참고)", line.trim()),
                    }
                }
                _ = shutdown_rx.changed() => break,
            }
        }
        info!("콘솔 종료");
    }
}

/// 표준 입력을 분리된 스레드에서 줄 단위로 읽는다 (런타임 종료 시 대기하지 않음)
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

async fn banner_changed(rx: &mut Option<watch::Receiver<BannerState>>) -> bool {
    match rx {
        Some(rx) => rx.changed().await.is_ok(),
        None => std::future::pending().await,
    }
}

/// 상태 변경 출력 루프
///
/// 표시 내용이 실제로 바뀐 경우에만 출력한다.
pub async fn render_loop(
    mut recovery_rx: watch::Receiver<RecoveryState>,
    mut banner_rx: Option<watch::Receiver<BannerState>>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut last_recovery = present_recovery(&recovery_rx.borrow_and_update());
    let mut last_banner: Option<BannerView> = None;

    loop {
        tokio::select! {
            changed = recovery_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = present_recovery(&recovery_rx.borrow_and_update());
                if view != last_recovery {
                    println!("{}", render_recovery(&view));
                    last_recovery = view;
                }
            }
            alive = banner_changed(&mut banner_rx) => {
                if !alive {
                    banner_rx = None;
                    continue;
                }
                let view = banner_rx
                    .as_mut()
                    .and_then(|rx| present_banner(&rx.borrow_and_update()));
                if view != last_banner {
                    println!("{}", render_banner(view.as_ref()));
                    last_banner = view;
                }
            }
            _ = shutdown_rx.changed() => break,
        }
    }
}
