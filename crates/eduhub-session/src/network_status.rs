//! 네트워크 상태 알림.
//!
//! 온라인/오프라인 전환 이벤트마다 토스트를 하나씩 띄운다.
//! 디바운스나 재연결 시도는 하지 않는다.

use std::sync::Arc;

use eduhub_core::models::network::NetworkEvent;
use eduhub_core::models::notification::{Notification, NotificationLevel};
use eduhub_core::ports::notifier::ToastNotifier;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

/// 이벤트 → 토스트 변환
pub fn toast_for(event: NetworkEvent) -> Notification {
    match event {
        NetworkEvent::Online => Notification::new(
            NotificationLevel::Success,
            "온라인",
            "네트워크 연결이 복구되었습니다.",
        ),
        NetworkEvent::Offline => Notification::new(
            NotificationLevel::Warning,
            "오프라인",
            "네트워크 연결이 끊어졌습니다. 일부 기능이 제한될 수 있습니다.",
        ),
    }
}

/// 네트워크 상태 관찰자
pub struct NetworkStatus {
    events: broadcast::Receiver<NetworkEvent>,
    notifier: Arc<dyn ToastNotifier>,
}

impl NetworkStatus {
    pub fn new(events: broadcast::Receiver<NetworkEvent>, notifier: Arc<dyn ToastNotifier>) -> Self {
        Self { events, notifier }
    }

    /// 이벤트 수신 루프
    ///
    /// 채널이 닫히거나 종료 신호를 받으면 반환한다.
    pub async fn run(mut self, mut shutdown_rx: watch::Receiver<bool>) {
        info!("네트워크 상태 관찰 시작");

        loop {
            tokio::select! {
                received = self.events.recv() => match received {
                    Ok(event) => self.notify(event).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("네트워크 이벤트 {}개 누락", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("네트워크 이벤트 채널 닫힘");
                        break;
                    }
                },
                _ = shutdown_rx.changed() => {
                    info!("네트워크 상태 관찰 종료");
                    break;
                }
            }
        }
    }

    async fn notify(&self, event: NetworkEvent) {
        info!("네트워크 {event}");
        if let Err(e) = self.notifier.show(&toast_for(event)).await {
            debug!("네트워크 알림 실패: {e}");
        }
    }
}
