//! 세션 모델.
//!
//! 외부 세션 추적기가 소유하는 로그인 세션 메타데이터.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// 로그인 세션 정보
///
/// 세션 추적기가 사용자 활동마다 갱신한다. 모니터는 읽기만 한다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    /// 세션 고유 ID
    pub session_id: String,
    /// 세션 활성 여부 (로그아웃 시 false)
    pub is_active: bool,
    /// 세션 시작 시각
    pub start_time: DateTime<Utc>,
    /// 마지막 사용자 활동 시각
    pub last_activity: DateTime<Utc>,
}

impl SessionInfo {
    /// 새 활성 세션 생성
    pub fn start(session_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            session_id: session_id.into(),
            is_active: true,
            start_time: now,
            last_activity: now,
        }
    }

    /// 마지막 활동 이후 경과 시간 (음수는 0으로 보정)
    pub fn inactivity(&self, now: DateTime<Utc>) -> Duration {
        let elapsed = now - self.last_activity;
        if elapsed < Duration::zero() {
            Duration::zero()
        } else {
            elapsed
        }
    }
}
