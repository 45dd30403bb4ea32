//! 터미널 토스트 알림기.
//!
//! `ToastNotifier` 구현체. 알림을 표준 출력에 한 줄로 표시하고 로그로도 남긴다.

use async_trait::async_trait;
use eduhub_core::error::CoreError;
use eduhub_core::models::notification::{Notification, NotificationLevel};
use eduhub_core::ports::notifier::ToastNotifier;
use tracing::{debug, info, warn};

/// 터미널 알림기
pub struct TerminalNotifier {
    enabled: bool,
}

impl TerminalNotifier {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

/// 알림 한 줄 포맷
pub fn format_toast(notification: &Notification) -> String {
    let icon = match notification.level {
        NotificationLevel::Info => "ℹ️",
        NotificationLevel::Success => "✅",
        NotificationLevel::Warning => "⚠️",
        NotificationLevel::Error => "❌",
    };
    format!("{icon} {}: {}", notification.title, notification.body)
}

#[async_trait]
impl ToastNotifier for TerminalNotifier {
    async fn show(&self, notification: &Notification) -> Result<(), CoreError> {
        if !self.enabled {
            debug!("알림 비활성화 - 생략: {}", notification.title);
            return Ok(());
        }

        println!("{}", format_toast(notification));
        match notification.level {
            NotificationLevel::Warning | NotificationLevel::Error => {
                warn!("토스트: {} - {}", notification.title, notification.body)
            }
            _ => info!("토스트: {}", notification.title),
        }
        Ok(())
    }
}
