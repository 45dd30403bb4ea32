//! EduHub 도메인 모델.
//!
//! 세션 추적, 인증 복구, 백엔드 헬스, 네트워크 이벤트, 알림 데이터 구조체를 정의한다.
//! 모든 모델은 `serde` Serialize/Deserialize를 구현한다.

pub mod health;
pub mod network;
pub mod notification;
pub mod recovery;
pub mod session;
