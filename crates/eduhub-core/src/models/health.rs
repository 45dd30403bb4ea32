//! 백엔드 헬스 모델.
//!
//! 헬스 폴러가 소유하고 배너가 읽기 전용으로 소비한다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 백엔드 도달 가능 상태
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Online,
    Offline,
    /// 첫 결과가 나오기 전
    #[default]
    Checking,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Online => write!(f, "online"),
            HealthStatus::Offline => write!(f, "offline"),
            HealthStatus::Checking => write!(f, "checking"),
        }
    }
}

/// 마지막 헬스체크 결과
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    /// 현재 상태
    pub status: HealthStatus,
    /// 마지막 측정 응답 시간 (밀리초)
    pub response_time_ms: Option<u64>,
    /// 마지막 에러 메시지
    pub last_error: Option<String>,
    /// 마지막 체크 완료 시각
    pub last_checked: Option<DateTime<Utc>>,
}

/// 헬스 배너 상태
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BannerState {
    /// 헬스체크 결과
    pub snapshot: HealthSnapshot,
    /// 사용자가 배너를 닫았는지 (온라인 복귀 시 초기화)
    pub dismissed: bool,
    /// 체크 진행 중 여부
    pub checking: bool,
}

impl BannerState {
    /// 배너 표시 여부 — 오프라인이고 닫지 않았을 때만
    pub fn is_visible(&self) -> bool {
        self.snapshot.status == HealthStatus::Offline && !self.dismissed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banner_visible_only_when_offline_and_not_dismissed() {
        let mut banner = BannerState::default();
        assert!(!banner.is_visible());

        banner.snapshot.status = HealthStatus::Offline;
        assert!(banner.is_visible());

        banner.dismissed = true;
        assert!(!banner.is_visible());

        banner.dismissed = false;
        banner.snapshot.status = HealthStatus::Online;
        assert!(!banner.is_visible());
    }
}
