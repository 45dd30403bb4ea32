//! 설정 레이어링.
//!
//! 우선순위 (낮음 → 높음): 설정 파일(JSON) → `EDUHUB__SECTION__KEY` 환경변수 → CLI 인자.

use std::path::PathBuf;

use config::{Config, Environment};
use eduhub_core::config::AppConfig;
use eduhub_core::config_manager::ConfigManager;
use eduhub_core::error::CoreError;
use tracing::{debug, info};

/// 환경변수 접두어
const ENV_PREFIX: &str = "EDUHUB";

/// CLI에서 넘어온 설정 오버라이드
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub server: Option<String>,
    pub offline: bool,
    pub no_health: bool,
}

/// 환경변수 소스 (`EDUHUB__HEALTH__POLL_INTERVAL_SECS=15` → `health.poll_interval_secs`)
pub fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// 기본 설정 위에 환경변수 레이어 적용
pub fn apply_env(base: &AppConfig, env: Environment) -> Result<AppConfig, CoreError> {
    let layered = Config::builder()
        .add_source(
            Config::try_from(base)
                .map_err(|e| CoreError::Config(format!("기본 설정 변환 실패: {e}")))?,
        )
        .add_source(env)
        .build()
        .map_err(|e| CoreError::Config(format!("환경변수 설정 병합 실패: {e}")))?;

    layered
        .try_deserialize()
        .map_err(|e| CoreError::Config(format!("환경변수 설정 해석 실패: {e}")))
}

/// CLI 오버라이드 적용
pub fn apply_cli(config: &mut AppConfig, cli: &CliOverrides) {
    if let Some(server) = &cli.server {
        config.server.base_url = server.clone();
    }
    if cli.no_health || cli.offline {
        config.health.enabled = false;
    }
    if cli.offline {
        config.connectivity.probe_enabled = false;
    }
}

/// 파일 → 환경변수 → CLI 순으로 최종 설정 구성
pub fn load(config_path: Option<PathBuf>, cli: &CliOverrides) -> Result<AppConfig, CoreError> {
    let manager = match config_path {
        Some(path) => ConfigManager::with_path(path)?,
        None => ConfigManager::new()?,
    };
    info!("설정 파일: {}", manager.config_path().display());

    let mut config = apply_env(&manager.get(), env_source())?;
    apply_cli(&mut config, cli);
    config.validate()?;

    debug!("최종 설정: {:?}", config);
    Ok(config)
}
