//! 페이지 가드 설정
//!
//! [`PageGuardConfig`]는 core의 [`GuardConfig`](pagewarden_core::config::GuardConfig)를
//! 기반으로 페이지 가드 전용 설정을 제공합니다.
//!
//! # 사용 예시
//! ```ignore
//! use pagewarden_core::config::PagewardenConfig;
//! use pagewarden_page_guard::config::PageGuardConfig;
//!
//! let core_config = PagewardenConfig::default();
//! let config = PageGuardConfig::from_core(&core_config.guard);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::PageGuardError;

/// 설정 상한값 상수
const MIN_CHECK_INTERVAL_SECS: u64 = 30;
const MAX_CHECK_INTERVAL_SECS: u64 = 3600;
const MAX_CONCURRENT_CHECKS: usize = 64;
const MAX_ACTION_TIMEOUT_SECS: u64 = 300;
const MAX_FIX_ATTEMPTS_LIMIT: u32 = 10;
const MAX_EVENT_CHANNEL_CAPACITY: usize = 65_536;
const MAX_HISTORY_CAP: usize = 100_000;

/// 페이지 가드 설정
///
/// core의 `GuardConfig`에서 파생되며, 가드 내부에서
/// 사용하는 추가 설정을 포함합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageGuardConfig {
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

    // --- 확장 설정 (core에 없는 추가 필드) ---
    /// 수정 전략 1회 실행 타임아웃 (초)
    pub action_timeout_secs: u64,
    /// engagement 전략이 한 시도에서 게시하는 최대 제안 수
    pub suggestions_per_fix: usize,
    /// 이벤트 채널 용량 (외부 채널 미사용 시)
    pub event_channel_capacity: usize,
    /// 종결 이슈 감사 이력 보관 개수 상한
    pub resolved_history_cap: usize,
    /// 이슈 탐지 임계값
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

impl Default for PageGuardConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            check_interval_secs: 300,
            max_concurrent_checks: 8,
            confidence_threshold: 0.8,
            max_fix_attempts: 3,
            auto_fix: false,
            action_timeout_secs: 30,
            suggestions_per_fix: 3,
            event_channel_capacity: 256,
            resolved_history_cap: 256,
            classifier: ClassifierConfig::default(),
        }
    }
}

impl PageGuardConfig {
    /// core의 `GuardConfig`에서 가드 설정을 생성합니다.
    ///
    /// core 설정에 없는 확장 필드는 기본값이 적용됩니다.
    pub fn from_core(core: &pagewarden_core::config::GuardConfig) -> Self {
        Self {
            enabled: core.enabled,
            check_interval_secs: core.check_interval_secs,
            max_concurrent_checks: core.max_concurrent_checks,
            confidence_threshold: core.confidence_threshold,
            max_fix_attempts: core.max_fix_attempts,
            auto_fix: core.auto_fix,
            ..Self::default()
        }
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), PageGuardError> {
        if self.check_interval_secs < MIN_CHECK_INTERVAL_SECS
            || self.check_interval_secs > MAX_CHECK_INTERVAL_SECS
        {
            return Err(PageGuardError::Config {
                field: "check_interval_secs".to_owned(),
                reason: format!("must be {MIN_CHECK_INTERVAL_SECS}-{MAX_CHECK_INTERVAL_SECS}"),
            });
        }

        if self.max_concurrent_checks == 0 || self.max_concurrent_checks > MAX_CONCURRENT_CHECKS {
            return Err(PageGuardError::Config {
                field: "max_concurrent_checks".to_owned(),
                reason: format!("must be 1-{MAX_CONCURRENT_CHECKS}"),
            });
        }

        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(PageGuardError::Config {
                field: "confidence_threshold".to_owned(),
                reason: "must be within 0.0-1.0".to_owned(),
            });
        }

        if self.max_fix_attempts == 0 || self.max_fix_attempts > MAX_FIX_ATTEMPTS_LIMIT {
            return Err(PageGuardError::Config {
                field: "max_fix_attempts".to_owned(),
                reason: format!("must be 1-{MAX_FIX_ATTEMPTS_LIMIT}"),
            });
        }

        if self.action_timeout_secs == 0 || self.action_timeout_secs > MAX_ACTION_TIMEOUT_SECS {
            return Err(PageGuardError::Config {
                field: "action_timeout_secs".to_owned(),
                reason: format!("must be 1-{MAX_ACTION_TIMEOUT_SECS}"),
            });
        }

        if self.suggestions_per_fix == 0 || self.suggestions_per_fix > 10 {
            return Err(PageGuardError::Config {
                field: "suggestions_per_fix".to_owned(),
                reason: "must be 1-10".to_owned(),
            });
        }

        if self.event_channel_capacity == 0
            || self.event_channel_capacity > MAX_EVENT_CHANNEL_CAPACITY
        {
            return Err(PageGuardError::Config {
                field: "event_channel_capacity".to_owned(),
                reason: format!("must be 1-{MAX_EVENT_CHANNEL_CAPACITY}"),
            });
        }

        if self.resolved_history_cap == 0 || self.resolved_history_cap > MAX_HISTORY_CAP {
            return Err(PageGuardError::Config {
                field: "resolved_history_cap".to_owned(),
                reason: format!("must be 1-{MAX_HISTORY_CAP}"),
            });
        }

        self.classifier.validate()
    }
}

/// 이슈 탐지 임계값 설정
///
/// 모든 탐지기는 순수 함수이며 이 임계값만을 입력으로 사용합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// 참여율 하한 (퍼센트) — 미만이면 engagement_drop
    pub engagement_floor: f64,
    /// 참여율 심각 하한 — 미만이면 severity high
    pub engagement_severe_floor: f64,
    /// 콘텐츠 품질 하한 (0-100) — 미만이면 content_quality
    pub quality_floor: f64,
    /// 정책 준수 하한 (0-100) — 미만이면 policy_compliance
    pub compliance_floor: f64,
    /// 정책 준수 치명 하한 — 미만이면 severity critical
    pub compliance_critical_floor: f64,
    /// performance_decline 판정에 필요한 하락 서브 메트릭 최소 개수
    pub declining_submetric_min: usize,

    // --- 타입별 자동화 신뢰도 상수 ---
    /// engagement_drop 신뢰도 (직접 측정 신호)
    pub engagement_confidence: f64,
    /// content_quality 신뢰도 (2차 휴리스틱에서 유도된 신호)
    pub quality_confidence: f64,
    /// technical_access 신뢰도 (결정적 수정 경로)
    pub access_confidence: f64,
    /// performance_decline 신뢰도
    pub performance_confidence: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            engagement_floor: 2.0,
            engagement_severe_floor: 1.5,
            quality_floor: 60.0,
            compliance_floor: 80.0,
            compliance_critical_floor: 60.0,
            declining_submetric_min: 2,
            engagement_confidence: 0.9,
            quality_confidence: 0.7,
            access_confidence: 0.95,
            performance_confidence: 0.85,
        }
    }
}

impl ClassifierConfig {
    /// 임계값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), PageGuardError> {
        if self.engagement_severe_floor > self.engagement_floor {
            return Err(PageGuardError::Config {
                field: "classifier.engagement_severe_floor".to_owned(),
                reason: "must not exceed engagement_floor".to_owned(),
            });
        }

        if self.compliance_critical_floor > self.compliance_floor {
            return Err(PageGuardError::Config {
                field: "classifier.compliance_critical_floor".to_owned(),
                reason: "must not exceed compliance_floor".to_owned(),
            });
        }

        if self.declining_submetric_min == 0 || self.declining_submetric_min > 4 {
            return Err(PageGuardError::Config {
                field: "classifier.declining_submetric_min".to_owned(),
                reason: "must be 1-4".to_owned(),
            });
        }

        for (field, value) in [
            ("classifier.engagement_confidence", self.engagement_confidence),
            ("classifier.quality_confidence", self.quality_confidence),
            ("classifier.access_confidence", self.access_confidence),
            ("classifier.performance_confidence", self.performance_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(PageGuardError::Config {
                    field: field.to_owned(),
                    reason: "must be within 0.0-1.0".to_owned(),
                });
            }
        }

        Ok(())
    }
}

/// 런타임 설정 변경 요청
///
/// `None` 필드는 기존 값을 유지합니다. 실행 중에도 적용 가능하며,
/// 주기 변경은 다음 틱부터 반영됩니다.
#[derive(Debug, Clone, Default)]
pub struct GuardConfigUpdate {
    /// 헬스 체크 사이클 주기 (초)
    pub check_interval_secs: Option<u64>,
    /// 자동 수정 신뢰도 게이트
    pub confidence_threshold: Option<f64>,
    /// 이슈당 최대 수정 시도 횟수
    pub max_fix_attempts: Option<u32>,
    /// 자동 수정 활성화
    pub auto_fix: Option<bool>,
}

impl GuardConfigUpdate {
    /// 변경 요청이 비어 있는지 여부
    pub fn is_empty(&self) -> bool {
        self.check_interval_secs.is_none()
            && self.confidence_threshold.is_none()
            && self.max_fix_attempts.is_none()
            && self.auto_fix.is_none()
    }
}
