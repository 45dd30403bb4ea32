//! 인증 복구 모델.
//!
//! 복구 다이얼로그가 열릴 때 생성되고, 닫히거나 성공하면 Idle로 초기화되는 상태.

use serde::{Deserialize, Serialize};

/// 진행률 상한 (갱신 호출이 끝나기 전까지)
pub const PROGRESS_CAP: u8 = 90;

/// 복구 다이얼로그를 연 사유
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryReason {
    /// 토큰 만료 임박 (열리는 즉시 자동 복구)
    TokenExpiring,
    /// 토큰 만료됨
    TokenExpired,
    /// 토큰 갱신 실패
    RefreshFailed,
    /// 네트워크 에러
    NetworkError,
}

impl RecoveryReason {
    /// 다이얼로그가 열리자마자 복구를 시작해야 하는지
    pub fn auto_starts(&self) -> bool {
        matches!(self, RecoveryReason::TokenExpiring)
    }
}

/// 복구 상태 머신의 상태
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryStatus {
    #[default]
    Idle,
    Recovering,
    Success,
    Failed,
}

/// 다이얼로그에서 사용자가 선택할 수 있는 동작
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryAction {
    /// 수동 재시도
    Retry,
    /// 세션 연장
    ExtendSession,
    /// 로그아웃
    Logout,
}

/// 복구 다이얼로그 상태
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryState {
    /// 다이얼로그 표시 여부
    pub open: bool,
    /// 다이얼로그를 연 사유
    pub reason: Option<RecoveryReason>,
    /// 현재 상태
    pub status: RecoveryStatus,
    /// 시뮬레이션 진행률 (0-100)
    pub progress: u8,
    /// 연속 실패 횟수 (0..=max_retries)
    pub retry_count: u32,
    /// 자동 재시도 상한
    pub max_retries: u32,
    /// 자동 재시도까지 남은 초 (0이면 미예약)
    pub countdown_secs: u32,
    /// 마지막 실패 메시지 (원문 그대로)
    pub error: Option<String>,
}

impl RecoveryState {
    /// 닫힌 상태 (Idle)
    pub fn closed(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// 새로 열린 다이얼로그 상태
    pub fn opened(reason: RecoveryReason, max_retries: u32) -> Self {
        Self {
            open: true,
            reason: Some(reason),
            max_retries,
            ..Default::default()
        }
    }

    /// 자동 재시도 한도 소진 여부
    pub fn is_exhausted(&self) -> bool {
        self.retry_count >= self.max_retries
    }

    /// 갱신 호출 진행 중 여부
    pub fn is_recovering(&self) -> bool {
        self.status == RecoveryStatus::Recovering
    }

    /// 현재 상태에서 노출할 동작 목록
    ///
    /// 로그아웃은 항상 가능하다. 재시도 한도를 소진하면 로그아웃만 남는다.
    pub fn available_actions(&self) -> Vec<RecoveryAction> {
        let mut actions = Vec::with_capacity(3);
        if self.open && !self.is_exhausted() {
            if self.status == RecoveryStatus::Failed {
                actions.push(RecoveryAction::Retry);
            }
            if matches!(self.status, RecoveryStatus::Idle | RecoveryStatus::Failed) {
                actions.push(RecoveryAction::ExtendSession);
            }
        }
        actions.push(RecoveryAction::Logout);
        actions
    }
}
