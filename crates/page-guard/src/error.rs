//! 페이지 가드 에러 타입
//!
//! [`PageGuardError`]는 페이지 가드 내부에서 발생하는 모든 에러를 표현합니다.
//! `From<PageGuardError> for PagewardenError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use pagewarden_core::error::{GuardError, PagewardenError, PlatformError};
use pagewarden_core::types::IssueType;

/// 페이지 가드 도메인 에러
///
/// 플랫폼 API 호출, 헬스 평가, 수정 실행, 설정 에러 등
/// 페이지 가드 내부의 모든 에러 상황을 포괄합니다.
#[derive(Debug, thiserror::Error)]
pub enum PageGuardError {
    /// 원격 플랫폼 API 에러
    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),

    /// 헬스 평가 실패 — 메트릭 값 이상 (NaN, 범위 초과 등)
    #[error("invalid metrics for page '{page_id}': {reason}")]
    InvalidMetrics {
        /// 대상 페이지 ID
        page_id: String,
        /// 실패 사유
        reason: String,
    },

    /// 콘텐츠 생성 실패
    #[error("content generation failed: {0}")]
    ContentGeneration(String),

    /// 수정 전략이 등록되지 않은 이슈 타입
    #[error("no fix strategy registered for issue type '{0}'")]
    StrategyMissing(IssueType),

    /// 사이클이 이미 진행 중 (일회성 실행 요청 거부)
    #[error("a reconciliation cycle is already in progress")]
    CycleInProgress,

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 채널 통신 에러
    #[error("channel error: {0}")]
    Channel(String),
}

impl From<PageGuardError> for PagewardenError {
    fn from(err: PageGuardError) -> Self {
        match err {
            PageGuardError::Platform(e) => PagewardenError::Platform(e),
            PageGuardError::InvalidMetrics { page_id, reason } => {
                PagewardenError::Guard(GuardError::Evaluation { page_id, reason })
            }
            PageGuardError::ContentGeneration(msg) => {
                PagewardenError::Guard(GuardError::ContentGeneration(msg))
            }
            PageGuardError::StrategyMissing(issue_type) => {
                PagewardenError::Guard(GuardError::Remediation {
                    issue_id: "(unassigned)".to_owned(),
                    reason: format!("no strategy for issue type '{issue_type}'"),
                })
            }
            PageGuardError::Config { field, reason } => {
                PagewardenError::Config(pagewarden_core::error::ConfigError::InvalidValue {
                    field,
                    reason,
                })
            }
            PageGuardError::CycleInProgress => PagewardenError::Pipeline(
                pagewarden_core::error::PipelineError::InitFailed(
                    "cycle already in progress".to_owned(),
                ),
            ),
            PageGuardError::Channel(msg) => PagewardenError::Pipeline(
                pagewarden_core::error::PipelineError::ChannelSend(msg),
            ),
        }
    }
}
