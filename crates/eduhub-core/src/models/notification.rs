//! 토스트 알림 모델.

use serde::{Deserialize, Serialize};

/// 알림 수준
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// 일시적으로 표시되는 토스트 알림
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// 알림 수준 (색상/아이콘 결정)
    pub level: NotificationLevel,
    /// 제목
    pub title: String,
    /// 본문
    pub body: String,
}

impl Notification {
    /// 새 알림 생성
    pub fn new(level: NotificationLevel, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            body: body.into(),
        }
    }
}
