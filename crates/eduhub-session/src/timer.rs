//! 액터 루프 공용 헬퍼.
//!
//! `tokio::select!` 분기에서 "없으면 영원히 대기"하는 타이머/태스크를 표현한다.

use eduhub_core::error::CoreError;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// 데드라인까지 대기. `None`이면 완료되지 않음
pub(crate) async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

/// 진행 중인 태스크 결과 대기. 태스크가 없으면 완료되지 않음
pub(crate) async fn join_in_flight<T>(
    task: &mut Option<JoinHandle<Result<T, CoreError>>>,
) -> Result<T, CoreError> {
    match task.as_mut() {
        Some(handle) => match handle.await {
            Ok(result) => result,
            Err(e) => Err(CoreError::Internal(format!("백그라운드 태스크 실패: {e}"))),
        },
        None => std::future::pending().await,
    }
}
