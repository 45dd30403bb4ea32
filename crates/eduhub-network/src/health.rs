//! HTTP 백엔드 헬스체크.
//!
//! `GET {base_url}{endpoint_path}` 응답으로 서버 도달 여부와 왕복 시간을 측정한다.
//! `HealthProbe` 포트 구현체.

use async_trait::async_trait;
use eduhub_core::error::CoreError;
use eduhub_core::ports::health_probe::HealthProbe;
use std::time::{Duration, Instant};
use tracing::debug;

/// HTTP 헬스체크 프로브
pub struct HttpHealthProbe {
    client: reqwest::Client,
    url: String,
}

impl HttpHealthProbe {
    /// 새 프로브 생성
    ///
    /// `timeout`은 reqwest 레벨 타임아웃이며, 호출 측 데드라인과 별개로 적용된다.
    pub fn new(base_url: &str, endpoint_path: &str, timeout: Duration) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::Internal(format!("HTTP 클라이언트 생성 실패: {e}")))?;

        let path = if endpoint_path.starts_with('/') {
            endpoint_path.to_string()
        } else {
            format!("/{endpoint_path}")
        };

        Ok(Self {
            client,
            url: format!("{}{}", base_url.trim_end_matches('/'), path),
        })
    }

    /// 체크 대상 URL
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl HealthProbe for HttpHealthProbe {
    async fn check(&self) -> Result<Duration, CoreError> {
        let started = Instant::now();

        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| CoreError::Network(format!("헬스체크 요청 실패: {e}")))?;

        let elapsed = started.elapsed();
        let status = resp.status();
        if !status.is_success() {
            return Err(CoreError::ServiceUnavailable(format!(
                "헬스체크 응답 {status}"
            )));
        }

        debug!("헬스체크 성공: {} ({}ms)", self.url, elapsed.as_millis());
        Ok(elapsed)
    }
}
