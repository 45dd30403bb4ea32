//! 인증 동기화 포트.
//!
//! 구현: `eduhub-network::auth::TokenManager`

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::session::SessionInfo;

/// 토큰 갱신/세션 연장/로그아웃을 담당하는 협력자
#[async_trait]
pub trait AuthSync: Send + Sync {
    /// 인증 토큰 갱신. 실패 시 에러 메시지가 사용자에게 그대로 노출된다.
    async fn refresh_token(&self) -> Result<(), CoreError>;

    /// 세션 연장 (마지막 활동 시각 갱신)
    fn extend_session(&self);

    /// 로그아웃
    async fn logout(&self) -> Result<(), CoreError>;

    /// 현재 세션 메타데이터 (세션이 없으면 None)
    fn get_session_info(&self) -> Option<SessionInfo>;
}
