//! 토스트 알림 포트.
//!
//! 구현: `eduhub-app` 터미널 알림기

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::notification::Notification;

/// 일시적 알림(토스트) 표시 인터페이스
#[async_trait]
pub trait ToastNotifier: Send + Sync {
    /// 알림 표시
    async fn show(&self, notification: &Notification) -> Result<(), CoreError>;
}
