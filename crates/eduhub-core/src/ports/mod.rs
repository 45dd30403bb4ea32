//! 포트 인터페이스 (trait).
//!
//! Hexagonal Architecture의 포트 레이어.
//! `eduhub-network`가 이 trait들을 구현하며,
//! `eduhub-app`에서 `Arc<dyn T>`로 와이어링한다.
//! 각 컴포넌트는 전역 싱글턴 대신 생성자로 포트를 주입받는다.
//!
//! 모든 async trait은 `async_trait` 매크로를 사용하여
//! object safety를 보장한다.

pub mod auth_sync;
pub mod health_probe;
pub mod notifier;
