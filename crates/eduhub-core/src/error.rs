//! EduHub 핵심 에러 타입.
//!
//! 모든 어댑터 crate는 이 타입을 그대로 반환하거나 `#[from] CoreError`로 래핑한다.

use thiserror::Error;

/// 코어 레이어 에러.
/// 인증, 네트워크, 설정, 유효성 검증 등 도메인 공통 에러를 정의한다.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 설정값 오류
    #[error("설정 에러: {0}")]
    Config(String),

    /// 필드 유효성 검증 실패
    #[error("유효성 검증 실패 — {field}: {message}")]
    Validation {
        /// 검증 실패한 필드명
        field: String,
        /// 실패 사유
        message: String,
    },

    /// 인증 실패 (토큰 만료, 자격증명 오류 등)
    #[error("인증 에러: {0}")]
    Auth(String),

    /// 네트워크 에러 (연결 실패, DNS 등)
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 호출 타임아웃
    #[error("요청 시간 초과: {timeout_ms}ms")]
    Timeout {
        /// 초과된 타임아웃 시간 (밀리초)
        timeout_ms: u64,
    },

    /// 서비스 일시 불가 (5xx, 헬스체크 실패)
    #[error("서비스 일시 불가: {0}")]
    ServiceUnavailable(String),

    /// 액터 태스크가 종료되어 명령을 전달할 수 없음
    #[error("채널 닫힘: {0}")]
    ChannelClosed(String),

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),
}

impl CoreError {
    /// 사용자에게 그대로 노출할 메시지.
    ///
    /// 문자열 페이로드가 있는 변형은 접두어 없이 원문을 반환한다.
    pub fn user_message(&self) -> String {
        match self {
            CoreError::Auth(msg)
            | CoreError::Network(msg)
            | CoreError::ServiceUnavailable(msg)
            | CoreError::Config(msg)
            | CoreError::Internal(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}
