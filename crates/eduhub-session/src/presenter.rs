//! 상태 프레젠터.
//!
//! RecoveryState / BannerState → 표시용 텍스트 변환.

use eduhub_core::models::health::{BannerState, HealthStatus};
use eduhub_core::models::recovery::{
    RecoveryAction, RecoveryReason, RecoveryState, RecoveryStatus,
};

/// 진행률 막대 칸 수
const BAR_WIDTH: usize = 20;

/// 복구 다이얼로그 표시 데이터
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryView {
    /// 다이얼로그 표시 여부
    pub visible: bool,
    /// 제목 (사유 기반)
    pub title: String,
    /// 상태 설명
    pub message: String,
    /// 진행률 막대 (`[#####.....] 50%`)
    pub progress_bar: String,
    /// 자동 재시도 카운트다운 안내
    pub countdown_text: Option<String>,
    /// 에러 메시지 (원문)
    pub error_text: Option<String>,
    /// 재시도 횟수 (`1/3`)
    pub attempts_text: String,
    /// 가능한 동작과 라벨
    pub actions: Vec<(RecoveryAction, String)>,
}

/// 헬스 배너 표시 데이터
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BannerView {
    pub message: String,
    pub detail: Option<String>,
    pub checking: bool,
}

/// RecoveryState → RecoveryView 변환
pub fn present_recovery(state: &RecoveryState) -> RecoveryView {
    RecoveryView {
        visible: state.open,
        title: state.reason.map(reason_to_title).unwrap_or_default(),
        message: status_to_message(state),
        progress_bar: progress_bar(state.progress),
        countdown_text: (state.status == RecoveryStatus::Failed && state.countdown_secs > 0)
            .then(|| format!("{}초 후 자동으로 다시 시도합니다", state.countdown_secs)),
        error_text: state.error.clone(),
        attempts_text: format!("{}/{}", state.retry_count, state.max_retries),
        actions: state
            .available_actions()
            .into_iter()
            .map(|a| (a, action_to_label(a).to_string()))
            .collect(),
    }
}

/// BannerState → BannerView 변환 (숨김 상태면 None)
pub fn present_banner(state: &BannerState) -> Option<BannerView> {
    if !state.is_visible() {
        return None;
    }

    let detail = match (&state.snapshot.last_error, state.snapshot.last_checked) {
        (Some(err), Some(at)) => Some(format!("{} (마지막 확인 {})", err, at.format("%H:%M:%S"))),
        (Some(err), None) => Some(err.clone()),
        (None, _) => None,
    };

    Some(BannerView {
        message: if state.checking {
            "서버 연결을 다시 확인하는 중...".to_string()
        } else {
            "서버에 연결할 수 없습니다. 일부 기능이 제한될 수 있습니다.".to_string()
        },
        detail,
        checking: state.checking,
    })
}

/// 헬스 상태 한 줄 요약
pub fn health_summary(state: &BannerState) -> String {
    match state.snapshot.status {
        HealthStatus::Checking => "확인 중".to_string(),
        HealthStatus::Online => match state.snapshot.response_time_ms {
            Some(ms) => format!("온라인 ({ms}ms)"),
            None => "온라인".to_string(),
        },
        HealthStatus::Offline => "오프라인".to_string(),
    }
}

fn reason_to_title(reason: RecoveryReason) -> String {
    match reason {
        RecoveryReason::TokenExpiring => "세션 만료 임박".to_string(),
        RecoveryReason::TokenExpired => "세션 만료".to_string(),
        RecoveryReason::RefreshFailed => "인증 갱신 실패".to_string(),
        RecoveryReason::NetworkError => "네트워크 오류".to_string(),
    }
}

fn status_to_message(state: &RecoveryState) -> String {
    match state.status {
        RecoveryStatus::Idle => "세션을 연장하거나 다시 시도해 주세요.".to_string(),
        RecoveryStatus::Recovering => "인증을 갱신하는 중...".to_string(),
        RecoveryStatus::Success => "세션이 복구되었습니다.".to_string(),
        RecoveryStatus::Failed if state.is_exhausted() => {
            "재시도 횟수를 모두 사용했습니다. 다시 로그인해 주세요.".to_string()
        }
        RecoveryStatus::Failed => "인증 갱신에 실패했습니다.".to_string(),
    }
}

fn action_to_label(action: RecoveryAction) -> &'static str {
    match action {
        RecoveryAction::Retry => "다시 시도",
        RecoveryAction::ExtendSession => "세션 연장",
        RecoveryAction::Logout => "로그아웃",
    }
}

fn progress_bar(progress: u8) -> String {
    let progress = progress.min(100) as usize;
    let filled = progress * BAR_WIDTH / 100;
    format!(
        "[{}{}] {}%",
        "#".repeat(filled),
        ".".repeat(BAR_WIDTH - filled),
        progress
    )
}
