//! # eduhub-network
//!
//! EduHub 네트워크 어댑터.
//! 서버 REST 인증(JWT 로그인/갱신/로그아웃)과 세션 추적, 백엔드 헬스체크,
//! 네트워크 도달성 감지를 담당하며 `eduhub-core` 포트를 구현한다.
//!
//! ## 사용 예시
//!
//! ```rust,ignore
//! use eduhub_network::auth::TokenManager;
//! use eduhub_network::health::HttpHealthProbe;
//!
//! let tokens = TokenManager::new("https://api.eduhub.example", timeout)?;
//! let probe = HttpHealthProbe::new("https://api.eduhub.example", "/health", timeout)?;
//! ```

pub mod auth;
pub mod connectivity;
pub mod health;
