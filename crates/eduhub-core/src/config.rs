//! 애플리케이션 설정 구조체.
//!
//! 서버 URL, 세션 감시 주기, 복구 재시도 정책, 헬스체크/연결 감지 주기 등
//! 런타임 설정을 정의한다. 파일은 `config_manager`가, 환경변수 오버라이드는
//! `eduhub-app`이 `config` crate로 처리한다.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::CoreError;

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// 서버 연결 설정
    pub server: ServerConfig,
    /// 세션 감시 설정
    #[serde(default)]
    pub session: SessionConfig,
    /// 인증 복구 설정
    #[serde(default)]
    pub recovery: RecoveryConfig,
    /// 백엔드 헬스체크 설정
    #[serde(default)]
    pub health: HealthConfig,
    /// 네트워크 연결 감지 설정
    #[serde(default)]
    pub connectivity: ConnectivityConfig,
    /// 알림 설정
    #[serde(default)]
    pub notification: NotificationConfig,
}

// ============================================================
// 서버 설정
// ============================================================

/// 서버 연결 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// API 서버 기본 URL (예: "https://api.eduhub.example")
    pub base_url: String,
    /// 요청 타임아웃 (밀리초)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

// ============================================================
// 세션 감시 설정
// ============================================================

/// 세션 비활동 구간 상한 (분, 7일)
pub const MAX_SESSION_WINDOW_MINS: u64 = 7 * 24 * 60;

/// 세션 감시 설정 — 비활동 경고 구간 [warning_after, expiry_after)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// 세션 메타데이터 폴링 주기 (초)
    #[serde(default = "default_session_poll_secs")]
    pub poll_interval_secs: u64,
    /// 이 시간(분) 이상 비활동이면 만료 임박 복구를 띄움
    #[serde(default = "default_warning_after_mins")]
    pub warning_after_mins: u64,
    /// 이 시간(분) 이상 비활동이면 세션 만료로 간주
    #[serde(default = "default_expiry_after_mins")]
    pub expiry_after_mins: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_session_poll_secs(),
            warning_after_mins: default_warning_after_mins(),
            expiry_after_mins: default_expiry_after_mins(),
        }
    }
}

impl SessionConfig {
    /// 경고 시작 시점 (상한으로 잘림)
    pub fn warning_after(&self) -> chrono::Duration {
        window_minutes(self.warning_after_mins)
    }

    /// 만료 시점 (상한으로 잘림)
    pub fn expiry_after(&self) -> chrono::Duration {
        window_minutes(self.expiry_after_mins)
    }
}

fn window_minutes(mins: u64) -> chrono::Duration {
    chrono::Duration::minutes(mins.min(MAX_SESSION_WINDOW_MINS) as i64)
}

// ============================================================
// 인증 복구 설정
// ============================================================

/// 인증 복구 설정 — 재시도 상한, 선형 백오프, 진행률 시뮬레이션
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryConfig {
    /// 자동 재시도 상한
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// 카운트다운 단위 (초) — 카운트다운 = 단위 × 실패 횟수
    #[serde(default = "default_backoff_step_secs")]
    pub backoff_step_secs: u32,
    /// 성공 후 다이얼로그 자동 닫힘 지연 (밀리초)
    #[serde(default = "default_success_close_delay_ms")]
    pub success_close_delay_ms: u64,
    /// 토큰 갱신 호출 타임아웃 (밀리초)
    #[serde(default = "default_refresh_timeout_ms")]
    pub refresh_timeout_ms: u64,
    /// 진행률 증가 폭 (%)
    #[serde(default = "default_progress_step")]
    pub progress_step: u8,
    /// 진행률 증가 주기 (밀리초)
    #[serde(default = "default_progress_interval_ms")]
    pub progress_interval_ms: u64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            backoff_step_secs: default_backoff_step_secs(),
            success_close_delay_ms: default_success_close_delay_ms(),
            refresh_timeout_ms: default_refresh_timeout_ms(),
            progress_step: default_progress_step(),
            progress_interval_ms: default_progress_interval_ms(),
        }
    }
}

impl RecoveryConfig {
    /// 성공 후 닫힘 지연
    pub fn success_close_delay(&self) -> Duration {
        Duration::from_millis(self.success_close_delay_ms)
    }

    /// 토큰 갱신 타임아웃
    pub fn refresh_timeout(&self) -> Duration {
        Duration::from_millis(self.refresh_timeout_ms)
    }

    /// 진행률 증가 주기
    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }

    /// `retry_count`회 실패 후 카운트다운 (초)
    pub fn countdown_for(&self, retry_count: u32) -> u32 {
        self.backoff_step_secs.saturating_mul(retry_count)
    }
}

// ============================================================
// 헬스체크 설정
// ============================================================

/// 백엔드 헬스체크 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthConfig {
    /// 헬스체크 활성화 여부
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// 폴링 주기 (초)
    #[serde(default = "default_health_poll_secs")]
    pub poll_interval_secs: u64,
    /// 단일 체크 타임아웃 (밀리초)
    #[serde(default = "default_health_timeout_ms")]
    pub check_timeout_ms: u64,
    /// 헬스 엔드포인트 경로
    #[serde(default = "default_health_path")]
    pub endpoint_path: String,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_secs: default_health_poll_secs(),
            check_timeout_ms: default_health_timeout_ms(),
            endpoint_path: default_health_path(),
        }
    }
}

impl HealthConfig {
    /// 폴링 주기
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// 체크 타임아웃
    pub fn check_timeout(&self) -> Duration {
        Duration::from_millis(self.check_timeout_ms)
    }
}

// ============================================================
// 연결 감지 설정
// ============================================================

/// 네트워크 연결 감지 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectivityConfig {
    /// 도달성 프로브 활성화 여부
    #[serde(default = "default_true")]
    pub probe_enabled: bool,
    /// 프로브 대상 (host:port). None이면 서버 URL에서 추출
    #[serde(default)]
    pub probe_target: Option<String>,
    /// 프로브 주기 (초)
    #[serde(default = "default_probe_interval_secs")]
    pub probe_interval_secs: u64,
    /// 프로브 연결 타임아웃 (밀리초)
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
    /// 오프라인 전환 임계값 (연속 실패 횟수)
    #[serde(default = "default_offline_threshold")]
    pub offline_threshold: u64,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            probe_enabled: true,
            probe_target: None,
            probe_interval_secs: default_probe_interval_secs(),
            probe_timeout_ms: default_probe_timeout_ms(),
            offline_threshold: default_offline_threshold(),
        }
    }
}

// ============================================================
// 알림 설정
// ============================================================

/// 알림 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// 토스트 알림 활성화 여부
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

// ============================================================
// AppConfig impl
// ============================================================

impl AppConfig {
    /// 기본 설정값 반환
    pub fn default_config() -> Self {
        Self {
            server: ServerConfig {
                base_url: "http://localhost:8000".to_string(),
                request_timeout_ms: default_request_timeout_ms(),
            },
            session: SessionConfig::default(),
            recovery: RecoveryConfig::default(),
            health: HealthConfig::default(),
            connectivity: ConnectivityConfig::default(),
            notification: NotificationConfig::default(),
        }
    }

    /// 서버 요청 타임아웃을 Duration으로 반환
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.server.request_timeout_ms)
    }

    /// 설정 일관성 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.server.base_url.trim().is_empty() {
            return Err(invalid("server.base_url", "비어 있을 수 없습니다"));
        }
        if self.server.request_timeout_ms == 0 {
            return Err(invalid("server.request_timeout_ms", "0보다 커야 합니다"));
        }
        if self.session.poll_interval_secs == 0 {
            return Err(invalid("session.poll_interval_secs", "0보다 커야 합니다"));
        }
        if self.session.warning_after_mins >= self.session.expiry_after_mins {
            return Err(invalid(
                "session.warning_after_mins",
                "expiry_after_mins보다 작아야 합니다",
            ));
        }
        if self.session.expiry_after_mins > MAX_SESSION_WINDOW_MINS {
            return Err(invalid(
                "session.expiry_after_mins",
                "7일(10080분)을 넘을 수 없습니다",
            ));
        }
        if self.recovery.max_retries == 0 {
            return Err(invalid("recovery.max_retries", "1 이상이어야 합니다"));
        }
        if self.recovery.progress_step == 0 || self.recovery.progress_interval_ms == 0 {
            return Err(invalid("recovery.progress_step", "0보다 커야 합니다"));
        }
        if self.recovery.refresh_timeout_ms == 0 {
            return Err(invalid("recovery.refresh_timeout_ms", "0보다 커야 합니다"));
        }
        if self.health.poll_interval_secs == 0 {
            return Err(invalid("health.poll_interval_secs", "0보다 커야 합니다"));
        }
        if self.health.check_timeout_ms == 0 {
            return Err(invalid("health.check_timeout_ms", "0보다 커야 합니다"));
        }
        if self.connectivity.probe_interval_secs == 0 {
            return Err(invalid("connectivity.probe_interval_secs", "0보다 커야 합니다"));
        }
        if self.connectivity.probe_timeout_ms == 0 {
            return Err(invalid("connectivity.probe_timeout_ms", "0보다 커야 합니다"));
        }
        if self.connectivity.offline_threshold == 0 {
            return Err(invalid("connectivity.offline_threshold", "1 이상이어야 합니다"));
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

fn invalid(field: &str, message: &str) -> CoreError {
    CoreError::Validation {
        field: field.to_string(),
        message: message.to_string(),
    }
}

// ============================================================
// 기본값 함수
// ============================================================

fn default_true() -> bool {
    true
}

fn default_request_timeout_ms() -> u64 {
    30_000
}
fn default_session_poll_secs() -> u64 {
    60
}
fn default_warning_after_mins() -> u64 {
    25
}
fn default_expiry_after_mins() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    3
}
fn default_backoff_step_secs() -> u32 {
    5
}
fn default_success_close_delay_ms() -> u64 {
    2_000
}
fn default_refresh_timeout_ms() -> u64 {
    15_000
}
fn default_progress_step() -> u8 {
    10
}
fn default_progress_interval_ms() -> u64 {
    200
}
fn default_health_poll_secs() -> u64 {
    30
}
fn default_health_timeout_ms() -> u64 {
    5_000
}
fn default_health_path() -> String {
    "/health".to_string()
}
fn default_probe_interval_secs() -> u64 {
    10
}
fn default_probe_timeout_ms() -> u64 {
    3_000
}
fn default_offline_threshold() -> u64 {
    2
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn default_config_is_valid() {
        assert!(AppConfig::default_config().validate().is_ok());
    }

    #[test]
    fn countdown_is_linear() {
        let recovery = RecoveryConfig::default();
        assert_eq!(recovery.countdown_for(1), 5);
        assert_eq!(recovery.countdown_for(2), 10);
        assert_eq!(recovery.countdown_for(3), 15);
    }

    #[test]
    fn inverted_session_window_rejected() {
        let mut config = AppConfig::default_config();
        config.session.warning_after_mins = 30;
        config.session.expiry_after_mins = 25;
        assert_matches!(
            config.validate(),
            Err(CoreError::Validation { field, .. }) if field == "session.warning_after_mins"
        );
    }

    fn rejected_field(config: &AppConfig) -> String {
        match config.validate() {
            Err(CoreError::Validation { field, .. }) => field,
            other => panic!("검증 실패 예상: {other:?}"),
        }
    }

    #[test]
    fn zero_probe_interval_rejected() {
        let mut config = AppConfig::default_config();
        config.connectivity.probe_interval_secs = 0;
        assert_eq!(rejected_field(&config), "connectivity.probe_interval_secs");
    }

    #[test]
    fn zero_timeouts_rejected() {
        let mut config = AppConfig::default_config();
        config.health.check_timeout_ms = 0;
        assert_eq!(rejected_field(&config), "health.check_timeout_ms");

        let mut config = AppConfig::default_config();
        config.connectivity.probe_timeout_ms = 0;
        assert_eq!(rejected_field(&config), "connectivity.probe_timeout_ms");

        let mut config = AppConfig::default_config();
        config.recovery.refresh_timeout_ms = 0;
        assert_eq!(rejected_field(&config), "recovery.refresh_timeout_ms");

        let mut config = AppConfig::default_config();
        config.server.request_timeout_ms = 0;
        assert_eq!(rejected_field(&config), "server.request_timeout_ms");
    }

    #[test]
    fn oversized_session_window_rejected() {
        let mut config = AppConfig::default_config();
        config.session.warning_after_mins = u64::MAX - 1;
        config.session.expiry_after_mins = u64::MAX;
        assert_eq!(rejected_field(&config), "session.expiry_after_mins");

        config.session.warning_after_mins = 25;
        config.session.expiry_after_mins = MAX_SESSION_WINDOW_MINS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn session_window_durations_are_clamped() {
        let session = SessionConfig {
            warning_after_mins: u64::MAX - 1,
            expiry_after_mins: u64::MAX,
            ..SessionConfig::default()
        };
        let cap = chrono::Duration::minutes(MAX_SESSION_WINDOW_MINS as i64);
        assert_eq!(session.warning_after(), cap);
        assert_eq!(session.expiry_after(), cap);
        assert_eq!(SessionConfig::default().warning_after(), chrono::Duration::minutes(25));
    }

    #[test]
    fn zero_retries_rejected() {
        let mut config = AppConfig::default_config();
        config.recovery.max_retries = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let json = r#"{"server":{"base_url":"https://api.eduhub.test"}}"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.server.request_timeout_ms, 30_000);
        assert_eq!(config.session, SessionConfig::default());
        assert_eq!(config.health.endpoint_path, "/health");
        assert!(config.notification.enabled);
    }
}
