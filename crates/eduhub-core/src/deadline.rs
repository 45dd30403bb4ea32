//! 네트워크 호출 데드라인.
//!
//! 토큰 갱신, 헬스체크처럼 응답이 멈출 수 있는 호출을 감싸
//! 지정 시간 안에 끝나지 않으면 `CoreError::Timeout`으로 변환한다.

use std::future::Future;
use std::time::Duration;

use crate::error::CoreError;

/// `fut`을 `timeout` 안에 완료하지 못하면 `CoreError::Timeout` 반환
pub async fn with_deadline<T, F>(timeout: Duration, fut: F) -> Result<T, CoreError>
where
    F: Future<Output = Result<T, CoreError>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(CoreError::Timeout {
            timeout_ms: timeout.as_millis() as u64,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test(start_paused = true)]
    async fn completes_within_deadline() {
        let result = with_deadline(Duration::from_secs(1), async { Ok::<_, CoreError>(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_call_times_out() {
        let result: Result<(), CoreError> =
            with_deadline(Duration::from_millis(250), std::future::pending()).await;
        assert_matches!(result, Err(CoreError::Timeout { timeout_ms: 250 }));
    }

    #[tokio::test(start_paused = true)]
    async fn inner_error_passes_through() {
        let result: Result<(), CoreError> = with_deadline(Duration::from_secs(1), async {
            Err(CoreError::Auth("rejected".to_string()))
        })
        .await;
        assert_matches!(result, Err(CoreError::Auth(msg)) if msg == "rejected");
    }
}
