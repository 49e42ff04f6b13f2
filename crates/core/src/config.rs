//! 설정 관리 — pagewarden.toml 파싱 및 런타임 설정
//!
//! [`PagewardenConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`PAGEWARDEN_GUARD_CHECK_INTERVAL_SECS=600` 형식)
//! 3. 설정 파일 (`pagewarden.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), pagewarden_core::error::PagewardenError> {
//! use pagewarden_core::config::PagewardenConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = PagewardenConfig::load("pagewarden.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = PagewardenConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, PagewardenError};

/// Pagewarden 통합 설정
///
/// `pagewarden.toml` 파일의 최상위 구조를 나타냅니다.
/// 각 모듈은 자기 섹션만 읽어 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PagewardenConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 페이지 가드 설정
    #[serde(default)]
    pub guard: GuardConfig,
    /// 원격 플랫폼 API 설정
    #[serde(default)]
    pub platform: PlatformConfig,
    /// 콘텐츠 생성기 설정
    #[serde(default)]
    pub content: ContentConfig,
    /// 메트릭 엔드포인트 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
    /// 모니터링 대상 페이지 목록
    #[serde(default)]
    pub pages: Vec<PageEntry>,
}

impl PagewardenConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    ///
    /// 설정 로딩 순서:
    /// 1. TOML 파일 파싱
    /// 2. 환경변수 오버라이드 적용
    /// 3. 유효성 검증
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, PagewardenError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, PagewardenError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PagewardenError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                PagewardenError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, PagewardenError> {
        toml::from_str(toml_str).map_err(|e| {
            PagewardenError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `PAGEWARDEN_{SECTION}_{FIELD}`
    /// 예: `PAGEWARDEN_GUARD_CHECK_INTERVAL_SECS=600`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "PAGEWARDEN_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "PAGEWARDEN_GENERAL_LOG_FORMAT");
        override_string(&mut self.general.pid_file, "PAGEWARDEN_GENERAL_PID_FILE");

        // Guard
        override_bool(&mut self.guard.enabled, "PAGEWARDEN_GUARD_ENABLED");
        override_u64(
            &mut self.guard.check_interval_secs,
            "PAGEWARDEN_GUARD_CHECK_INTERVAL_SECS",
        );
        override_usize(
            &mut self.guard.max_concurrent_checks,
            "PAGEWARDEN_GUARD_MAX_CONCURRENT_CHECKS",
        );
        override_f64(
            &mut self.guard.confidence_threshold,
            "PAGEWARDEN_GUARD_CONFIDENCE_THRESHOLD",
        );
        override_u32(
            &mut self.guard.max_fix_attempts,
            "PAGEWARDEN_GUARD_MAX_FIX_ATTEMPTS",
        );
        override_bool(&mut self.guard.auto_fix, "PAGEWARDEN_GUARD_AUTO_FIX");

        // Platform
        override_string(&mut self.platform.api_base, "PAGEWARDEN_PLATFORM_API_BASE");
        override_u64(
            &mut self.platform.request_timeout_secs,
            "PAGEWARDEN_PLATFORM_REQUEST_TIMEOUT_SECS",
        );

        // Content
        override_string(&mut self.content.api_base, "PAGEWARDEN_CONTENT_API_BASE");
        override_string(&mut self.content.model, "PAGEWARDEN_CONTENT_MODEL");
        override_string(&mut self.content.api_key_env, "PAGEWARDEN_CONTENT_API_KEY_ENV");
        override_u64(
            &mut self.content.request_timeout_secs,
            "PAGEWARDEN_CONTENT_REQUEST_TIMEOUT_SECS",
        );

        // Metrics
        override_bool(&mut self.metrics.enabled, "PAGEWARDEN_METRICS_ENABLED");
        override_string(&mut self.metrics.listen_addr, "PAGEWARDEN_METRICS_LISTEN_ADDR");
        override_u16(&mut self.metrics.port, "PAGEWARDEN_METRICS_PORT");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), PagewardenError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        self.guard.validate()?;

        if self.guard.enabled {
            if self.platform.api_base.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "platform.api_base".to_owned(),
                    reason: "must not be empty when guard is enabled".to_owned(),
                }
                .into());
            }

            // 페이지 ID 중복/공백 검증
            let mut seen = std::collections::HashSet::new();
            for page in &self.pages {
                if page.id.is_empty() {
                    return Err(ConfigError::InvalidValue {
                        field: "pages.id".to_owned(),
                        reason: "page id must not be empty".to_owned(),
                    }
                    .into());
                }
                if !seen.insert(page.id.as_str()) {
                    return Err(ConfigError::InvalidValue {
                        field: "pages.id".to_owned(),
                        reason: format!("duplicate page id '{}'", page.id),
                    }
                    .into());
                }
            }
        }

        if self.metrics.enabled {
            if self.metrics.port == 0 {
                return Err(ConfigError::InvalidValue {
                    field: "metrics.port".to_owned(),
                    reason: "must not be 0 when metrics are enabled".to_owned(),
                }
                .into());
            }
            if self.metrics.endpoint != "/metrics" {
                return Err(ConfigError::InvalidValue {
                    field: "metrics.endpoint".to_owned(),
                    reason: "only '/metrics' is currently supported".to_owned(),
                }
                .into());
            }
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
    /// PID 파일 경로
    pub pid_file: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
            pid_file: "/var/run/pagewarden/pagewarden.pid".to_owned(),
        }
    }
}

/// 페이지 가드 설정 상한값 상수
const MIN_CHECK_INTERVAL_SECS: u64 = 30;
const MAX_CHECK_INTERVAL_SECS: u64 = 3600;
const MAX_CONCURRENT_CHECKS: usize = 64;
const MAX_FIX_ATTEMPTS_LIMIT: u32 = 10;

/// 페이지 가드 설정 (core 섹션)
///
/// 가드 크레이트는 이 섹션을 기반으로 자체 확장 설정을 구성합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 헬스 체크 사이클 주기 (초)
    pub check_interval_secs: u64,
    /// 동시에 평가할 최대 페이지 수 (워커 풀 크기 상한)
    pub max_concurrent_checks: usize,
    /// 자동 수정 신뢰도 게이트 (0-1)
    pub confidence_threshold: f64,
    /// 이슈당 최대 수정 시도 횟수
    pub max_fix_attempts: u32,
    /// 자동 수정 활성화 (false면 탐지/이관만 수행)
    pub auto_fix: bool,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            check_interval_secs: 300,
            max_concurrent_checks: 8,
            confidence_threshold: 0.8,
            max_fix_attempts: 3,
            auto_fix: false,
        }
    }
}

impl GuardConfig {
    /// 가드 섹션의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.check_interval_secs < MIN_CHECK_INTERVAL_SECS
            || self.check_interval_secs > MAX_CHECK_INTERVAL_SECS
        {
            return Err(ConfigError::InvalidValue {
                field: "guard.check_interval_secs".to_owned(),
                reason: format!("must be {MIN_CHECK_INTERVAL_SECS}-{MAX_CHECK_INTERVAL_SECS}"),
            });
        }

        if self.max_concurrent_checks == 0 || self.max_concurrent_checks > MAX_CONCURRENT_CHECKS {
            return Err(ConfigError::InvalidValue {
                field: "guard.max_concurrent_checks".to_owned(),
                reason: format!("must be 1-{MAX_CONCURRENT_CHECKS}"),
            });
        }

        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ConfigError::InvalidValue {
                field: "guard.confidence_threshold".to_owned(),
                reason: "must be within 0.0-1.0".to_owned(),
            });
        }

        if self.max_fix_attempts == 0 || self.max_fix_attempts > MAX_FIX_ATTEMPTS_LIMIT {
            return Err(ConfigError::InvalidValue {
                field: "guard.max_fix_attempts".to_owned(),
                reason: format!("must be 1-{MAX_FIX_ATTEMPTS_LIMIT}"),
            });
        }

        Ok(())
    }
}

/// 원격 플랫폼 API 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// API base URL
    pub api_base: String,
    /// 요청 타임아웃 (초)
    pub request_timeout_secs: u64,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            api_base: "https://graph.facebook.com/v23.0".to_owned(),
            request_timeout_secs: 30,
        }
    }
}

/// 콘텐츠 생성기 설정
///
/// API 키는 파일이 아닌 환경변수에서 읽습니다 (`api_key_env`가 변수명).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// API base URL (chat-completions 호환 엔드포인트)
    pub api_base: String,
    /// 사용할 모델명
    pub model: String,
    /// API 키를 담은 환경변수 이름
    pub api_key_env: String,
    /// 요청 타임아웃 (초)
    pub request_timeout_secs: u64,
    /// 사이클당 요청할 최대 제안 수
    pub max_suggestions: usize,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_owned(),
            model: "gpt-4o-mini".to_owned(),
            api_key_env: "PAGEWARDEN_CONTENT_API_KEY".to_owned(),
            request_timeout_secs: 60,
            max_suggestions: 3,
        }
    }
}

/// 메트릭 엔드포인트 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 수신 주소
    pub listen_addr: String,
    /// 수신 포트
    pub port: u16,
    /// 스크레이프 엔드포인트 경로
    pub endpoint: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9600,
            endpoint: "/metrics".to_owned(),
        }
    }
}

/// 모니터링 대상 페이지 항목
///
/// `[[pages]]` 테이블 배열로 선언합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageEntry {
    /// 페이지 ID
    pub id: String,
    /// 표시 이름
    #[serde(default)]
    pub name: String,
    /// 플랫폼 자격증명 핸들
    #[serde(default)]
    pub access_token: String,
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

fn override_u32(target: &mut u32, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u32>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u32 from env var, ignoring"
            ),
        }
    }
}

fn override_u16(target: &mut u16, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u16>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u16 from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_f64(target: &mut f64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<f64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse f64 from env var, ignoring"
            ),
        }
    }
}
