//! # eduhub-app
//!
//! EduHub 세션 클라이언트 바이너리 진입점.
//! 설정 로드, 어댑터/상태 머신 와이어링, 라이프사이클 관리.

mod console;
mod lifecycle;
mod notifier;
mod settings;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::Parser;
use eduhub_core::ports::auth_sync::AuthSync;
use eduhub_core::ports::notifier::ToastNotifier;
use eduhub_network::auth::TokenManager;
use eduhub_network::connectivity::{ConnectivityManager, ReachabilityProbe};
use eduhub_network::health::HttpHealthProbe;
use eduhub_session::health::BackendHealth;
use eduhub_session::network_status::NetworkStatus;
use eduhub_session::recovery::AuthRecovery;
use eduhub_session::session_monitor::SessionMonitor;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::console::Console;
use crate::lifecycle::LifecycleManager;
use crate::notifier::TerminalNotifier;
use crate::settings::CliOverrides;

/// EduHub 세션 클라이언트
///
/// 세션 만료 감시, 인증 복구, 네트워크/서버 상태 알림
#[derive(Parser, Debug)]
#[command(name = "eduhub")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 서버 URL 지정 (기본: 설정 파일 값)
    #[arg(long, short = 's')]
    server: Option<String>,

    /// 설정 파일 경로 (기본: 플랫폼 설정 디렉토리의 config.json)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,

    /// 오프라인 모드로 실행 (로그인/서버 확인 없음)
    #[arg(long, short = 'o')]
    offline: bool,

    /// 백엔드 헬스체크 비활성화
    #[arg(long)]
    no_health: bool,
}

/// 환경변수 자격증명으로 로그인 (없으면 생략)
async fn login_from_env(token_manager: &TokenManager) {
    let (Ok(email), Ok(password)) = (
        std::env::var("EDUHUB_EMAIL"),
        std::env::var("EDUHUB_PASSWORD"),
    ) else {
        info!("EDUHUB_EMAIL/EDUHUB_PASSWORD 미설정 - 로그인 생략");
        return;
    };

    match token_manager.login(&email, &password).await {
        Ok(()) => info!("로그인 성공: {email}"),
        Err(e) => warn!("로그인 실패: {e}"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_filter = format!(
        "eduhub={0},eduhub_app={0},eduhub_core={0},eduhub_network={0},eduhub_session={0}",
        args.log_level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .init();

    info!("EduHub 세션 클라이언트 시작");

    let config = settings::load(
        args.config.clone(),
        &CliOverrides {
            server: args.server.clone(),
            offline: args.offline,
            no_health: args.no_health,
        },
    )
    .map_err(|e| anyhow!("설정 로드 실패: {e}"))?;

    if args.offline {
        info!("오프라인 모드: 로그인/서버 확인 생략");
    } else {
        info!("서버: {}", config.server.base_url);
    }

    let mut lifecycle = LifecycleManager::new();

    // ── 어댑터 생성 (DI 와이어링) ──

    // 1. 알림
    let notifier: Arc<dyn ToastNotifier> =
        Arc::new(TerminalNotifier::new(config.notification.enabled));

    // 2. 인증
    let token_manager = Arc::new(TokenManager::new(
        &config.server.base_url,
        config.request_timeout(),
    )?);
    if !args.offline {
        login_from_env(&token_manager).await;
    }
    let auth: Arc<dyn AuthSync> = token_manager.clone();

    // 3. 연결 상태
    let connectivity = Arc::new(ConnectivityManager::new(
        config.connectivity.offline_threshold,
    ));
    if args.offline {
        connectivity.set_force_offline(true);
    }

    // ── 상태 머신 ──

    let (recovery, recovery_handle) = AuthRecovery::new(config.recovery.clone(), auth.clone());
    lifecycle.track(
        "인증 복구",
        tokio::spawn(
            recovery
                .with_notifier(notifier.clone())
                .run(lifecycle.subscribe()),
        ),
    );

    let monitor = SessionMonitor::new(&config.session, auth.clone(), recovery_handle.clone());
    lifecycle.track("세션 모니터", tokio::spawn(monitor.run(lifecycle.subscribe())));

    let network_status = NetworkStatus::new(connectivity.subscribe_events(), notifier.clone());
    lifecycle.track(
        "네트워크 상태",
        tokio::spawn(network_status.run(lifecycle.subscribe())),
    );

    if config.connectivity.probe_enabled {
        let target = match &config.connectivity.probe_target {
            Some(target) => target.clone(),
            None => ReachabilityProbe::target_from_url(&config.server.base_url)?,
        };
        let probe = ReachabilityProbe::new(
            connectivity.clone(),
            target,
            Duration::from_secs(config.connectivity.probe_interval_secs),
            Duration::from_millis(config.connectivity.probe_timeout_ms),
        );
        lifecycle.track("도달성 프로브", tokio::spawn(probe.run(lifecycle.subscribe())));
    }

    let banner = if config.health.enabled {
        let probe = Arc::new(HttpHealthProbe::new(
            &config.server.base_url,
            &config.health.endpoint_path,
            config.health.check_timeout(),
        )?);
        let (poller, handle) = BackendHealth::new(&config.health, probe);
        lifecycle.track("헬스체크", tokio::spawn(poller.run(lifecycle.subscribe())));
        Some(handle)
    } else {
        info!("백엔드 헬스체크 비활성화");
        None
    };

    // ── 콘솔 ──

    lifecycle.track(
        "화면 출력",
        tokio::spawn(console::render_loop(
            recovery_handle.subscribe(),
            banner.as_ref().map(|b| b.subscribe()),
            lifecycle.subscribe(),
        )),
    );

    let console = Console::new(
        recovery_handle,
        banner,
        token_manager.clone(),
        connectivity.clone(),
    );
    lifecycle.track("콘솔", tokio::spawn(console.run(lifecycle.subscribe())));

    info!("모든 컴포넌트 시작 완료");

    if let Err(e) = lifecycle.wait_for_signal().await {
        error!("시그널 핸들러 등록 실패: {e}");
        lifecycle.shutdown();
    }
    lifecycle.drain().await;

    info!("EduHub 세션 클라이언트 종료");
    Ok(())
}
