//! JWT 인증 토큰 관리.
//!
//! 서버 로그인, 토큰 갱신, 로그아웃과 로그인 세션 메타데이터 추적을 담당한다.
//! `AuthSync` 포트 구현체.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use eduhub_core::error::CoreError;
use eduhub_core::models::session::SessionInfo;
use eduhub_core::ports::auth_sync::AuthSync;
use reqwest::StatusCode;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// 서버가 만료 시간을 주지 않을 때 기본 토큰 수명 (초)
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// 서버 응답 — 로그인/리프레시
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}

/// 내부 토큰 상태
#[derive(Debug, Clone)]
struct TokenState {
    access_token: String,
    refresh_token: Option<String>,
    expires_at: DateTime<Utc>,
}

/// JWT 토큰 매니저 — 로그인/갱신/만료 관리 + 세션 추적
#[derive(Clone)]
pub struct TokenManager {
    base_url: String,
    client: reqwest::Client,
    state: Arc<RwLock<Option<TokenState>>>,
    session: Arc<parking_lot::RwLock<Option<SessionInfo>>>,
}

impl TokenManager {
    /// 새 토큰 매니저 생성
    pub fn new(base_url: &str, request_timeout: std::time::Duration) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| CoreError::Internal(format!("HTTP 클라이언트 생성 실패: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            state: Arc::new(RwLock::new(None)),
            session: Arc::new(parking_lot::RwLock::new(None)),
        })
    }

    /// 이메일/비밀번호 로그인 → JWT 토큰 획득 + 세션 시작
    pub async fn login(&self, email: &str, password: &str) -> Result<(), CoreError> {
        let url = format!("{}/api/v1/auth/login", self.base_url);
        let body = serde_json::json!({
            "email": email,
            "password": password,
        });

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| CoreError::Network(format!("로그인 요청 실패: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(response_error(status, &text));
        }

        let token_resp: TokenResponse = resp
            .json()
            .await
            .map_err(|e| CoreError::Auth(format!("토큰 파싱 실패: {e}")))?;

        let expires_at = expiry_from(Utc::now(), token_resp.expires_in)?;
        {
            let mut state = self.state.write().await;
            *state = Some(TokenState {
                access_token: token_resp.access_token,
                refresh_token: token_resp.refresh_token,
                expires_at,
            });
        }

        let session_id = format!("sess_{}", uuid::Uuid::new_v4().simple());
        *self.session.write() = Some(SessionInfo::start(session_id.clone(), Utc::now()));

        info!("로그인 성공: 세션={session_id}, 토큰 만료={expires_at}");
        Ok(())
    }

    /// 토큰 갱신 (refresh_token 사용)
    pub async fn refresh(&self) -> Result<(), CoreError> {
        let current = {
            let state = self.state.read().await;
            state.clone()
        };

        let current = current.ok_or_else(|| CoreError::Auth("인증되지 않음".to_string()))?;
        let refresh_token = current
            .refresh_token
            .ok_or_else(|| CoreError::Auth("리프레시 토큰 없음".to_string()))?;

        let url = format!("{}/api/v1/auth/refresh", self.base_url);
        let body = serde_json::json!({
            "refresh_token": refresh_token,
        });

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| CoreError::Network(format!("토큰 갱신 요청 실패: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            let err = response_error(status, &text);
            warn!("토큰 갱신 실패 ({status}): {err}");
            return Err(err);
        }

        let token_resp: TokenResponse = resp
            .json()
            .await
            .map_err(|e| CoreError::Auth(format!("갱신 토큰 파싱 실패: {e}")))?;

        let expires_at = expiry_from(Utc::now(), token_resp.expires_in)?;

        let mut state = self.state.write().await;
        *state = Some(TokenState {
            access_token: token_resp.access_token,
            refresh_token: token_resp.refresh_token.or(Some(refresh_token)),
            expires_at,
        });

        debug!("토큰 갱신 성공, 새 만료: {expires_at}");
        Ok(())
    }

    /// 로그아웃 — 서버 호출은 best effort, 로컬 상태는 항상 정리
    pub async fn logout(&self) -> Result<(), CoreError> {
        let token = {
            let state = self.state.read().await;
            state.as_ref().map(|s| s.access_token.clone())
        };

        if let Some(token) = token {
            let url = format!("{}/api/v1/auth/logout", self.base_url);
            if let Err(e) = self.client.post(&url).bearer_auth(&token).send().await {
                debug!("로그아웃 요청 실패 (무시): {e}");
            }
        }

        {
            let mut state = self.state.write().await;
            *state = None;
        }
        if let Some(session) = self.session.write().as_mut() {
            session.is_active = false;
        }

        info!("로그아웃 완료");
        Ok(())
    }

    /// 현재 인증 상태 확인
    pub async fn is_authenticated(&self) -> bool {
        let state = self.state.read().await;
        state.as_ref().is_some_and(|s| Utc::now() < s.expires_at)
    }

    /// 사용자 활동 기록 (세션의 마지막 활동 시각 갱신)
    pub fn record_activity(&self) {
        if let Some(session) = self.session.write().as_mut() {
            if session.is_active {
                session.last_activity = Utc::now();
            }
        }
    }

    /// 현재 세션 메타데이터
    pub fn session_info(&self) -> Option<SessionInfo> {
        self.session.read().clone()
    }
}

#[async_trait]
impl AuthSync for TokenManager {
    async fn refresh_token(&self) -> Result<(), CoreError> {
        self.refresh().await
    }

    fn extend_session(&self) {
        self.record_activity();
        debug!("세션 연장");
    }

    async fn logout(&self) -> Result<(), CoreError> {
        TokenManager::logout(self).await
    }

    fn get_session_info(&self) -> Option<SessionInfo> {
        self.session_info()
    }
}

/// 토큰 만료 시각 계산. 표현 범위를 벗어나는 수명은 인증 에러
fn expiry_from(now: DateTime<Utc>, expires_in: Option<i64>) -> Result<DateTime<Utc>, CoreError> {
    let secs = expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
    Duration::try_seconds(secs)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .ok_or_else(|| CoreError::Auth(format!("토큰 만료 시간이 올바르지 않음: {secs}초")))
}

/// HTTP 에러 응답 → CoreError 변환
///
/// 본문이 JSON이면 `detail`/`message`/`error` 필드를 사용자 메시지로 사용한다.
fn response_error(status: StatusCode, body: &str) -> CoreError {
    let message = extract_error_message(body).unwrap_or_else(|| format!("HTTP {status}"));
    if status.is_server_error() {
        CoreError::ServiceUnavailable(message)
    } else {
        CoreError::Auth(message)
    }
}

fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["detail", "message", "error"]
        .iter()
        .find_map(|key| value.get(key).and_then(|v| v.as_str()))
        .map(str::to_string)
}
