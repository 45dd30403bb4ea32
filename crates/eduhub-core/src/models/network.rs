//! 네트워크 연결 이벤트 모델.

use serde::{Deserialize, Serialize};

/// 온라인/오프라인 전환 이벤트
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkEvent {
    /// 네트워크 연결 복구
    Online,
    /// 네트워크 연결 끊김
    Offline,
}

impl std::fmt::Display for NetworkEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkEvent::Online => write!(f, "online"),
            NetworkEvent::Offline => write!(f, "offline"),
        }
    }
}
