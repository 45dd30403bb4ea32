//! 백엔드 헬스체크 포트.
//!
//! 구현: `eduhub-network::health::HttpHealthProbe`

use async_trait::async_trait;
use std::time::Duration;

use crate::error::CoreError;

/// 백엔드 liveness 엔드포인트 확인
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// 도달 가능하면 왕복 시간 반환
    async fn check(&self) -> Result<Duration, CoreError>;
}
