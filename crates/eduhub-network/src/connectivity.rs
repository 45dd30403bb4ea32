//! 연결 상태 관리.
//!
//! 네트워크 온라인/오프라인 상태를 추적하고 전환마다 이벤트를 브로드캐스트한다.
//! 상태 값은 `watch`로, 개별 전환 이벤트는 `broadcast`로 전달하므로
//! 짧은 시간 안에 연속으로 바뀌어도 구독자는 모든 전환을 받는다.

use eduhub_core::error::CoreError;
use eduhub_core::models::network::NetworkEvent;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

/// 이벤트 브로드캐스트 버퍼 크기
const EVENT_CAPACITY: usize = 64;

/// 연결 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// 연결됨
    Connected,
    /// 연결 끊김
    Disconnected,
    /// 실패 누적 중 (아직 온라인)
    Reconnecting,
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionStatus::Connected => write!(f, "Connected"),
            ConnectionStatus::Disconnected => write!(f, "Disconnected"),
            ConnectionStatus::Reconnecting => write!(f, "Reconnecting"),
        }
    }
}

/// 연결 상태 관리자
///
/// 프로브 결과(`record_success`/`record_failure`)나 플랫폼 신호(`set_online`)로
/// 온라인/오프라인을 전환한다.
pub struct ConnectivityManager {
    /// 현재 온라인 상태 (atomic for lock-free access)
    is_online: AtomicBool,
    /// 연속 실패 횟수
    failure_count: AtomicU64,
    /// 상태 변경 브로드캐스트
    status_tx: watch::Sender<ConnectionStatus>,
    /// 현재 상태 조회용 수신기
    status_rx: watch::Receiver<ConnectionStatus>,
    /// 온라인/오프라인 전환 이벤트
    event_tx: broadcast::Sender<NetworkEvent>,
    /// 오프라인 전환 임계값 (연속 실패 횟수)
    offline_threshold: u64,
    /// 강제 오프라인 모드
    force_offline: AtomicBool,
}

impl ConnectivityManager {
    /// 새 연결 관리자 생성
    ///
    /// `offline_threshold`: 이 횟수만큼 연속 실패하면 오프라인 전환
    pub fn new(offline_threshold: u64) -> Self {
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::Connected);
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            is_online: AtomicBool::new(true),
            failure_count: AtomicU64::new(0),
            status_tx,
            status_rx,
            event_tx,
            offline_threshold: offline_threshold.max(1),
            force_offline: AtomicBool::new(false),
        }
    }

    /// 강제 오프라인 모드 설정
    ///
    /// 해제하면 실패 카운터를 비우고 즉시 온라인으로 복귀한다.
    /// 실제로 끊겨 있다면 다음 프로브 실패들이 다시 오프라인으로 전환한다.
    pub fn set_force_offline(&self, force: bool) {
        let was_forced = self.force_offline.swap(force, Ordering::Relaxed);
        if force {
            self.transition(false);
            info!("강제 오프라인 모드 활성화");
        } else if was_forced {
            self.failure_count.store(0, Ordering::Relaxed);
            self.transition(true);
            info!("강제 오프라인 모드 해제");
        }
    }

    /// 강제 오프라인 모드 여부
    pub fn is_force_offline(&self) -> bool {
        self.force_offline.load(Ordering::Relaxed)
    }

    /// 현재 온라인 상태
    pub fn is_online(&self) -> bool {
        !self.is_force_offline() && self.is_online.load(Ordering::Relaxed)
    }

    /// 현재 연결 상태
    pub fn status(&self) -> ConnectionStatus {
        *self.status_rx.borrow()
    }

    /// 온라인/오프라인 전환 이벤트 구독
    pub fn subscribe_events(&self) -> broadcast::Receiver<NetworkEvent> {
        self.event_tx.subscribe()
    }

    /// 플랫폼 신호로 직접 전환 (임계값 무시)
    pub fn set_online(&self, online: bool) {
        if self.is_force_offline() {
            return;
        }
        if online {
            self.failure_count.store(0, Ordering::Relaxed);
        }
        self.transition(online);
    }

    /// 연결 성공 기록
    ///
    /// 온라인 상태로 전환하고 실패 카운터 리셋.
    pub fn record_success(&self) {
        if self.is_force_offline() {
            return;
        }

        self.failure_count.store(0, Ordering::Relaxed);

        if !self.transition(true) && self.status() == ConnectionStatus::Reconnecting {
            let _ = self.status_tx.send(ConnectionStatus::Connected);
        }
    }

    /// 연결 실패 기록
    ///
    /// 임계값 도달 시 오프라인 전환.
    pub fn record_failure(&self) {
        if self.is_force_offline() {
            return;
        }

        let count = self.failure_count.fetch_add(1, Ordering::Relaxed) + 1;
        debug!("연결 실패 기록 (연속 {}회)", count);

        if count >= self.offline_threshold {
            if self.transition(false) {
                warn!("연속 {}회 실패 - 오프라인 전환", count);
            }
        } else if self.is_online.load(Ordering::Relaxed) {
            let _ = self.status_tx.send(ConnectionStatus::Reconnecting);
        }
    }

    /// 연속 실패 횟수
    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    /// 상태 전환. 실제로 바뀌었으면 true
    fn transition(&self, online: bool) -> bool {
        let was_online = self.is_online.swap(online, Ordering::Relaxed);
        if was_online == online {
            return false;
        }

        let (status, event) = if online {
            (ConnectionStatus::Connected, NetworkEvent::Online)
        } else {
            (ConnectionStatus::Disconnected, NetworkEvent::Offline)
        };
        info!("네트워크 상태 전환: {event}");
        let _ = self.status_tx.send(status);
        // 구독자가 없으면 send 실패 — 무시
        let _ = self.event_tx.send(event);
        true
    }
}

impl Default for ConnectivityManager {
    fn default() -> Self {
        Self::new(2)
    }
}

/// Arc로 감싼 ConnectivityManager
pub type SharedConnectivityManager = Arc<ConnectivityManager>;

/// 네트워크 도달성 프로브
///
/// 주기적으로 대상 호스트에 TCP 연결을 시도하여 결과를 `ConnectivityManager`에 기록한다.
pub struct ReachabilityProbe {
    manager: SharedConnectivityManager,
    target: String,
    interval: Duration,
    timeout: Duration,
}

impl ReachabilityProbe {
    /// 새 프로브 생성
    pub fn new(
        manager: SharedConnectivityManager,
        target: impl Into<String>,
        interval: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            manager,
            target: target.into(),
            interval,
            timeout,
        }
    }

    /// 서버 URL에서 `host:port` 추출
    pub fn target_from_url(base_url: &str) -> Result<String, CoreError> {
        let parsed = url::Url::parse(base_url)
            .map_err(|e| CoreError::Config(format!("서버 URL 파싱 실패: {base_url}: {e}")))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| CoreError::Config(format!("서버 URL에 호스트 없음: {base_url}")))?;
        let port = parsed
            .port_or_known_default()
            .ok_or_else(|| CoreError::Config(format!("서버 URL 포트 결정 불가: {base_url}")))?;
        Ok(format!("{host}:{port}"))
    }

    /// 단일 연결 시도. 도달 가능하면 true
    pub async fn probe_once(&self) -> bool {
        match tokio::time::timeout(self.timeout, TcpStream::connect(&self.target)).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                debug!("도달성 프로브 실패: {} ({e})", self.target);
                false
            }
            Err(_) => {
                debug!("도달성 프로브 타임아웃: {}", self.target);
                false
            }
        }
    }

    /// 프로브 루프 (종료 신호까지)
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        info!(
            "도달성 프로브 시작: {} ({}초 간격)",
            self.target,
            self.interval.as_secs()
        );
        let mut interval = tokio::time::interval(self.interval);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if self.probe_once().await {
                        self.manager.record_success();
                    } else {
                        self.manager.record_failure();
                    }
                }
                _ = shutdown_rx.changed() => {
                    info!("도달성 프로브 종료");
                    break;
                }
            }
        }
    }
}
