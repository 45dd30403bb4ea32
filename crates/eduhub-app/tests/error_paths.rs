//! 에러 경로 통합 테스트.
//!
//! 서버 장애/인증 실패가 크래시 없이 UI 상태(에러 문자열, 배너)로 변환되는지 검증.

use std::sync::Arc;
use std::time::Duration;

use eduhub_core::config::{HealthConfig, RecoveryConfig};
use eduhub_core::models::health::{BannerState, HealthStatus};
use eduhub_core::models::recovery::{RecoveryReason, RecoveryState, RecoveryStatus};
use eduhub_network::auth::TokenManager;
use eduhub_network::health::HttpHealthProbe;
use eduhub_session::health::BackendHealth;
use eduhub_session::presenter::{present_banner, present_recovery};
use eduhub_session::recovery::AuthRecovery;
use tokio::sync::watch;

const WAIT: Duration = Duration::from_secs(10);

async fn wait_banner(
    rx: &mut watch::Receiver<BannerState>,
    pred: impl FnMut(&BannerState) -> bool,
) -> BannerState {
    tokio::time::timeout(WAIT, rx.wait_for(pred))
        .await
        .expect("배너 대기 시간 초과")
        .expect("헬스체크 태스크 종료됨")
        .clone()
}

async fn wait_recovery(
    rx: &mut watch::Receiver<RecoveryState>,
    pred: impl FnMut(&RecoveryState) -> bool,
) -> RecoveryState {
    tokio::time::timeout(WAIT, rx.wait_for(pred))
        .await
        .expect("상태 대기 시간 초과")
        .expect("복구 태스크 종료됨")
        .clone()
}

#[tokio::test]
async fn backend_outage_shows_banner_until_retry_succeeds() {
    let mut server = mockito::Server::new_async().await;
    let outage = server
        .mock("GET", "/health")
        .with_status(503)
        .create_async()
        .await;

    let probe = Arc::new(
        HttpHealthProbe::new(&server.url(), "/health", Duration::from_secs(2)).unwrap(),
    );
    let (poller, banner) = BackendHealth::new(&HealthConfig::default(), probe);
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(poller.run(shutdown_rx));
    let mut rx = banner.subscribe();

    let offline = wait_banner(&mut rx, |s| s.snapshot.status == HealthStatus::Offline).await;
    let view = present_banner(&offline).expect("오프라인이면 배너 표시");
    assert!(view.detail.unwrap().contains("503"));

    outage.remove_async().await;
    let _healthy = server
        .mock("GET", "/health")
        .with_status(200)
        .with_body("ok")
        .create_async()
        .await;

    banner.retry().await.unwrap();
    let online = wait_banner(&mut rx, |s| s.snapshot.status == HealthStatus::Online).await;
    assert!(online.snapshot.response_time_ms.is_some());
    assert_eq!(present_banner(&online), None);
}

#[tokio::test]
async fn unreachable_backend_is_reported_offline() {
    let probe = Arc::new(
        HttpHealthProbe::new("http://127.0.0.1:1", "/health", Duration::from_secs(2)).unwrap(),
    );
    let (poller, banner) = BackendHealth::new(&HealthConfig::default(), probe);
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(poller.run(shutdown_rx));
    let mut rx = banner.subscribe();

    let offline = wait_banner(&mut rx, |s| s.snapshot.status == HealthStatus::Offline).await;
    assert!(offline
        .snapshot
        .last_error
        .unwrap()
        .contains("헬스체크 요청 실패"));
}

#[tokio::test]
async fn refresh_without_login_fails_with_auth_message() {
    let tm = Arc::new(TokenManager::new("http://127.0.0.1:1", Duration::from_secs(2)).unwrap());
    let (actor, handle) = AuthRecovery::new(RecoveryConfig::default(), tm);
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(actor.run(shutdown_rx));
    let mut rx = handle.subscribe();

    handle.open(RecoveryReason::TokenExpiring).await.unwrap();
    let failed = wait_recovery(&mut rx, |s| s.status == RecoveryStatus::Failed).await;
    assert_eq!(failed.error.as_deref(), Some("인증되지 않음"));
    assert_eq!(failed.retry_count, 1);
    assert_eq!(failed.countdown_secs, 5);

    let view = present_recovery(&failed);
    assert_eq!(view.error_text.as_deref(), Some("인증되지 않음"));
}

#[tokio::test]
async fn server_error_during_refresh_is_surfaced_verbatim() {
    let mut server = mockito::Server::new_async().await;
    let _login = server
        .mock("POST", "/api/v1/auth/login")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token":"jwt_1","refresh_token":"ref_1","expires_in":3600}"#)
        .create_async()
        .await;
    let _refresh = server
        .mock("POST", "/api/v1/auth/refresh")
        .with_status(503)
        .with_body(r#"{"message":"점검 중입니다"}"#)
        .create_async()
        .await;

    let tm = Arc::new(TokenManager::new(&server.url(), Duration::from_secs(5)).unwrap());
    tm.login("teacher@school.test", "pass").await.unwrap();

    let (actor, handle) = AuthRecovery::new(RecoveryConfig::default(), tm);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(actor.run(shutdown_rx));
    let mut rx = handle.subscribe();

    handle.open(RecoveryReason::RefreshFailed).await.unwrap();
    handle.retry().await.unwrap();

    let failed = wait_recovery(&mut rx, |s| s.status == RecoveryStatus::Failed).await;
    assert_eq!(failed.error.as_deref(), Some("점검 중입니다"));

    // 카운트다운이 남아 있는 상태에서 종료해도 패닉 없이 끝남
    shutdown_tx.send(true).unwrap();
    task.await.unwrap();
}
