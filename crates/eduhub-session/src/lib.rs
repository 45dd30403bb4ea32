//! # eduhub-session
//!
//! 세션 상태 머신. 코어 포트(`AuthSync`, `HealthProbe`, `ToastNotifier`)에만 의존하며
//! 각 컴포넌트는 `run(shutdown_rx)`로 구동되는 독립 태스크다.
//!
//! - [`recovery`] — 토큰 갱신 재시도 다이얼로그 상태 머신
//! - [`session_monitor`] — 비활동 경고 감지
//! - [`network_status`] — 온라인/오프라인 토스트
//! - [`health`] — 백엔드 헬스 폴링 및 배너
//! - [`presenter`] — 상태 → 표시용 텍스트 변환

pub mod health;
pub mod network_status;
pub mod presenter;
pub mod recovery;
pub mod session_monitor;

mod timer;
