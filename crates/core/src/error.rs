//! 에러 타입 — 도메인별 에러 정의

/// Pagewarden 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum PagewardenError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 파이프라인 생명주기 에러
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// 원격 플랫폼 API 에러
    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),

    /// 페이지 가드 도메인 에러
    #[error("guard error: {0}")]
    Guard(#[from] GuardError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 페이지 가드 도메인 에러 (core 표현)
///
/// 가드 크레이트의 세부 에러는 상위 레이어로 전파될 때 이 형태로 변환됩니다.
#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    /// 헬스 평가 실패 (메트릭 이상 등)
    #[error("evaluation failed for page '{page_id}': {reason}")]
    Evaluation { page_id: String, reason: String },

    /// 수정 실행 실패
    #[error("remediation failed for issue '{issue_id}': {reason}")]
    Remediation { issue_id: String, reason: String },

    /// 콘텐츠 생성 실패
    #[error("content generation failed: {0}")]
    ContentGeneration(String),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 파이프라인 생명주기 에러
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// 이미 실행 중인 모듈에 start()를 호출함
    #[error("pipeline already running")]
    AlreadyRunning,

    /// 실행 중이 아닌 모듈에 stop()을 호출함
    #[error("pipeline not running")]
    NotRunning,

    /// 파이프라인 초기화 실패
    #[error("pipeline init failed: {0}")]
    InitFailed(String),

    /// 채널 전송 실패
    #[error("channel send failed: {0}")]
    ChannelSend(String),
}

/// 원격 플랫폼 API 에러
///
/// 플랫폼 클라이언트의 모든 호출은 이 네 가지 분류 중 하나로 실패합니다.
/// `Auth`는 `technical_access` 이슈 탐지의 트리거 조건입니다.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// 인증/권한 실패 — 토큰 만료, 권한 회수 등
    #[error("platform auth error: {0}")]
    Auth(String),

    /// API 레이트 리밋 초과
    #[error("platform rate limited (retry after {retry_after_secs:?} secs)")]
    RateLimited {
        /// 재시도 가능 시각까지 남은 시간 (플랫폼이 알려준 경우)
        retry_after_secs: Option<u64>,
    },

    /// 대상 리소스를 찾을 수 없음
    #[error("platform resource not found: {0}")]
    NotFound(String),

    /// 그 외 일시적/네트워크 에러
    #[error("platform error: {0}")]
    Other(String),
}

impl PlatformError {
    /// 인증 에러 여부를 반환합니다.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    /// 재시도로 해소될 가능성이 있는 에러인지 여부를 반환합니다.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Other(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::InvalidValue {
            field: "guard.check_interval_secs".to_owned(),
            reason: "must be 30-3600".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("guard.check_interval_secs"));
        assert!(msg.contains("must be 30-3600"));
    }

    #[test]
    fn pipeline_error_display() {
        assert!(
            PipelineError::AlreadyRunning
                .to_string()
                .contains("already running")
        );
        assert!(PipelineError::NotRunning.to_string().contains("not running"));
    }

    #[test]
    fn platform_error_is_auth() {
        assert!(PlatformError::Auth("token expired".to_owned()).is_auth());
        assert!(!PlatformError::NotFound("page-1".to_owned()).is_auth());
    }

    #[test]
    fn platform_error_is_transient() {
        assert!(
            PlatformError::RateLimited {
                retry_after_secs: Some(60)
            }
            .is_transient()
        );
        assert!(PlatformError::Other("timeout".to_owned()).is_transient());
        assert!(!PlatformError::Auth("expired".to_owned()).is_transient());
    }

    #[test]
    fn converts_into_pagewarden_error() {
        let err: PagewardenError = ConfigError::ParseFailed {
            reason: "bad toml".to_owned(),
        }
        .into();
        assert!(matches!(err, PagewardenError::Config(_)));

        let err: PagewardenError = PlatformError::Auth("expired".to_owned()).into();
        assert!(matches!(err, PagewardenError::Platform(_)));
    }
}
