//! 도메인 타입 — 시스템 전역에서 사용되는 공통 타입
//!
//! 모든 모듈이 공유하는 데이터 구조를 정의합니다.
//! 페이지(모니터링 대상), 헬스 스냅샷, 이슈, 수정 시도 기록이 여기에 속합니다.

use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// 모니터링 대상 페이지
///
/// 외부 플랫폼이 소유한 리소스이며, 컨트롤러는 사이클마다 읽기 참조만 유지합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageInfo {
    /// 페이지 고유 ID
    pub id: String,
    /// 표시 이름
    pub name: String,
    /// 플랫폼 API 호출에 사용하는 불투명 자격증명 핸들
    pub access_token: String,
}

impl fmt::Display for PageInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // access_token은 로그에 노출하지 않음
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// 플랫폼에서 가져온 원시 메트릭
///
/// 헬스 평가기의 입력이 되는 사이클당 측정값입니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMetrics {
    /// 참여율 (퍼센트)
    pub engagement_rate: f64,
    /// 평균 응답 지연 (초)
    pub response_latency_secs: u64,
    /// 콘텐츠 품질 점수 (0-100)
    pub content_quality: f64,
    /// 정책 준수 점수 (0-100)
    pub compliance: f64,
    /// 팔로워 수
    pub followers: u64,
    /// 측정 시각
    pub fetched_at: SystemTime,
}

/// 서브 메트릭 추세
///
/// 직전 스냅샷과 비교하여 계산됩니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    /// 개선 중
    Improving,
    /// 안정 (변화가 허용 범위 이내)
    #[default]
    Stable,
    /// 하락 중
    Declining,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Improving => write!(f, "improving"),
            Self::Stable => write!(f, "stable"),
            Self::Declining => write!(f, "declining"),
        }
    }
}

/// 서브 메트릭별 추세 묶음
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MetricTrends {
    /// 참여율 추세
    pub engagement: Trend,
    /// 응답성 추세
    pub responsiveness: Trend,
    /// 콘텐츠 품질 추세
    pub content_quality: Trend,
    /// 정책 준수 추세
    pub compliance: Trend,
}

impl MetricTrends {
    /// 하락 중인 서브 메트릭 개수를 반환합니다.
    pub fn declining_count(&self) -> usize {
        [
            self.engagement,
            self.responsiveness,
            self.content_quality,
            self.compliance,
        ]
        .iter()
        .filter(|t| **t == Trend::Declining)
        .count()
    }
}

/// 헬스 스냅샷 — 한 사이클에 대한 페이지의 계산된 건강 상태
///
/// 매 사이클 새로 생성되며, 직전 스냅샷은 추세 계산에만 사용되고 폐기됩니다
/// (페이지당 최신 스냅샷 하나만 유지 — 무한 히스토리 없음).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthSnapshot {
    /// 대상 페이지 ID
    pub page_id: String,
    /// 종합 점수 (0-100, 높을수록 건강)
    pub overall: f64,
    /// 참여율 (퍼센트, 원시값)
    pub engagement_rate: f64,
    /// 응답성 점수 (0-100, 지연에서 정규화)
    pub responsiveness: f64,
    /// 콘텐츠 품질 점수 (0-100)
    pub content_quality: f64,
    /// 정책 준수 점수 (0-100)
    pub compliance: f64,
    /// 서브 메트릭별 추세 (직전 스냅샷 대비)
    pub trends: MetricTrends,
    /// 계산 시각
    pub computed_at: SystemTime,
}

impl fmt::Display for HealthSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "page={} overall={:.1} engagement={:.2} quality={:.1} compliance={:.1}",
            self.page_id, self.overall, self.engagement_rate, self.content_quality, self.compliance,
        )
    }
}

/// 심각도 레벨
///
/// `Ord` 구현으로 심각도 비교가 가능합니다 (`Low < Medium < High < Critical`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// 낮은 심각도
    #[default]
    Low,
    /// 중간 심각도
    Medium,
    /// 높은 심각도
    High,
    /// 치명적 — 즉시 대응 필요
    Critical,
}

impl Severity {
    /// 문자열에서 심각도를 파싱합니다.
    ///
    /// 대소문자를 구분하지 않습니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" | "med" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" | "crit" => Some(Self::Critical),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// 이슈 타입 — 닫힌 분류 체계
///
/// 탐지기와 수정 전략은 모두 이 타입을 키로 동작합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    /// 참여율이 설정된 하한 아래로 하락
    EngagementDrop,
    /// 콘텐츠 품질 점수 저하
    ContentQuality,
    /// 정책 준수 점수 저하 — 자동 수정 불가, 항상 에스컬레이션
    PolicyCompliance,
    /// 메트릭 수집 중 인증/권한 실패
    TechnicalAccess,
    /// 복수 메트릭의 지속적 하락 추세
    PerformanceDecline,
}

impl IssueType {
    /// 자동 수정 가능 여부 (타입 레벨 플래그)
    ///
    /// `PolicyCompliance`는 사람의 판단이 필요하므로 항상 false입니다.
    pub fn is_auto_fixable(&self) -> bool {
        !matches!(self, Self::PolicyCompliance)
    }

    /// 메트릭 태그용 고정된 타입명을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EngagementDrop => "engagement_drop",
            Self::ContentQuality => "content_quality",
            Self::PolicyCompliance => "policy_compliance",
            Self::TechnicalAccess => "technical_access",
            Self::PerformanceDecline => "performance_decline",
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 이슈 상태 기계의 상태
///
/// 전이 규칙:
/// - `Detected` → `Fixing` (자동 수정 게이트 통과 시)
/// - `Fixing` → `Resolved` | `Detected`(재시도 대기) | `Escalated`
/// - `Detected` → `Escalated` (자동 수정 불가 + critical, 또는 policy_compliance)
/// - `Resolved` / `Escalated` / `Failed`는 종결 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    /// 탐지됨 — 큐에서 수정 대기
    Detected,
    /// 수정 전략 실행 중
    Fixing,
    /// 해결됨 (종결)
    Resolved,
    /// 사람에게 이관됨 (종결)
    Escalated,
    /// 수정 불가 (종결) — 전략 미등록 등
    Failed,
}

impl IssueStatus {
    /// 종결 상태 여부
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved | Self::Escalated | Self::Failed)
    }

    /// 활성 큐에 존재해야 하는 상태 여부
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Detected | Self::Fixing)
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Detected => write!(f, "detected"),
            Self::Fixing => write!(f, "fixing"),
            Self::Resolved => write!(f, "resolved"),
            Self::Escalated => write!(f, "escalated"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// 수정 전략 실행 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixOutcome {
    /// 성공 — 이슈 해결
    Success,
    /// 부분 성공 — 일부 액션만 완료, 재시도 대상
    Partial,
    /// 실패 — 재시도 대상
    Failed,
}

impl fmt::Display for FixOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Partial => write!(f, "partial"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// 수정 시도 기록 — 한 번의 전략 실행
///
/// 전략 실행 전에 `Failed` 결과로 선등록되고, 정상 반환 시 실제 결과로
/// 갱신됩니다. 전략 실행 중 크래시가 나도 시도 횟수는 유실되지 않습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixAttempt {
    /// 시도 시작 시각
    pub started_at: SystemTime,
    /// 사용한 전략 이름
    pub strategy: String,
    /// 수행한 액션 목록 (사람이 읽는 문자열)
    pub actions: Vec<String>,
    /// 실행 결과
    pub outcome: FixOutcome,
    /// 추정 효과 (메트릭 변화 등)
    pub estimated_impact: Option<String>,
}

impl FixAttempt {
    /// 선등록용 시도 기록을 생성합니다 (결과는 `Failed`로 시작).
    pub fn pending(strategy: impl Into<String>) -> Self {
        Self {
            started_at: SystemTime::now(),
            strategy: strategy.into(),
            actions: Vec::new(),
            outcome: FixOutcome::Failed,
            estimated_impact: None,
        }
    }
}

/// 탐지된 이슈
///
/// 분류기가 생성하고, 수정 실행기만이 상태를 변경합니다.
/// 시도 횟수는 `attempts` 벡터 길이에서 유도되므로
/// "횟수 == 기록 개수" 불변식이 구조적으로 보장됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    /// 이슈 고유 ID (UUID v4)
    pub id: String,
    /// 대상 페이지 ID
    pub page_id: String,
    /// 이슈 타입
    pub issue_type: IssueType,
    /// 심각도
    pub severity: Severity,
    /// 제목
    pub title: String,
    /// 상세 설명
    pub description: String,
    /// 자동화 신뢰도 (0-1)
    pub confidence: f64,
    /// 현재 상태
    pub status: IssueStatus,
    /// 탐지 시각
    pub detected_at: SystemTime,
    /// 수정 시도 이력 (순서 보존)
    pub attempts: Vec<FixAttempt>,
}

impl Issue {
    /// 새 이슈를 `Detected` 상태로 생성합니다.
    pub fn new(
        page_id: impl Into<String>,
        issue_type: IssueType,
        severity: Severity,
        title: impl Into<String>,
        description: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            page_id: page_id.into(),
            issue_type,
            severity,
            title: title.into(),
            description: description.into(),
            confidence: confidence.clamp(0.0, 1.0),
            status: IssueStatus::Detected,
            detected_at: SystemTime::now(),
            attempts: Vec::new(),
        }
    }

    /// 지금까지의 수정 시도 횟수
    pub fn attempt_count(&self) -> u32 {
        u32::try_from(self.attempts.len()).unwrap_or(u32::MAX)
    }

    /// 자동 수정 가능 타입 여부
    pub fn auto_fixable(&self) -> bool {
        self.issue_type.is_auto_fixable()
    }

    /// 활성(열린) 이슈 여부
    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} page={} severity={} status={} attempts={}",
            &self.id[..8.min(self.id.len())],
            self.issue_type,
            self.page_id,
            self.severity,
            self.status,
            self.attempt_count(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_issue() -> Issue {
        Issue::new(
            "page-1",
            IssueType::EngagementDrop,
            Severity::High,
            "Engagement drop",
            "engagement 1.0% below floor 2.0%",
            0.9,
        )
    }

    #[test]
    fn severity_ordering() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn severity_from_str_loose() {
        assert_eq!(Severity::from_str_loose("HIGH"), Some(Severity::High));
        assert_eq!(Severity::from_str_loose("crit"), Some(Severity::Critical));
        assert_eq!(Severity::from_str_loose("unknown"), None);
    }

    #[test]
    fn issue_type_auto_fixable_flags() {
        assert!(IssueType::EngagementDrop.is_auto_fixable());
        assert!(IssueType::ContentQuality.is_auto_fixable());
        assert!(IssueType::TechnicalAccess.is_auto_fixable());
        assert!(IssueType::PerformanceDecline.is_auto_fixable());
        // policy_compliance는 절대 자동 수정하지 않음
        assert!(!IssueType::PolicyCompliance.is_auto_fixable());
    }

    #[test]
    fn issue_type_as_str_is_fixed() {
        assert_eq!(IssueType::EngagementDrop.as_str(), "engagement_drop");
        assert_eq!(IssueType::PolicyCompliance.as_str(), "policy_compliance");
    }

    #[test]
    fn issue_status_terminal_and_open_are_disjoint() {
        for status in [
            IssueStatus::Detected,
            IssueStatus::Fixing,
            IssueStatus::Resolved,
            IssueStatus::Escalated,
            IssueStatus::Failed,
        ] {
            assert_ne!(status.is_terminal(), status.is_open());
        }
    }

    #[test]
    fn new_issue_starts_detected_with_no_attempts() {
        let issue = sample_issue();
        assert_eq!(issue.status, IssueStatus::Detected);
        assert_eq!(issue.attempt_count(), 0);
        assert!(issue.attempts.is_empty());
        assert!(issue.is_open());
    }

    #[test]
    fn issue_confidence_clamped() {
        let issue = Issue::new(
            "page-1",
            IssueType::TechnicalAccess,
            Severity::High,
            "t",
            "d",
            1.7,
        );
        assert!((issue.confidence - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn attempt_count_tracks_history_len() {
        let mut issue = sample_issue();
        issue.attempts.push(FixAttempt::pending("engagement-refresh"));
        issue.attempts.push(FixAttempt::pending("engagement-refresh"));
        assert_eq!(issue.attempt_count() as usize, issue.attempts.len());
    }

    #[test]
    fn pending_attempt_starts_failed() {
        // 크래시 시에도 시도 기록이 '실패'로 남도록 선등록 결과는 Failed
        let attempt = FixAttempt::pending("credential-refresh");
        assert_eq!(attempt.outcome, FixOutcome::Failed);
        assert!(attempt.actions.is_empty());
    }

    #[test]
    fn trends_declining_count() {
        let trends = MetricTrends {
            engagement: Trend::Declining,
            responsiveness: Trend::Stable,
            content_quality: Trend::Declining,
            compliance: Trend::Improving,
        };
        assert_eq!(trends.declining_count(), 2);
    }

    #[test]
    fn page_display_hides_token() {
        let page = PageInfo {
            id: "page-1".to_owned(),
            name: "Acme Coffee".to_owned(),
            access_token: "secret-token".to_owned(),
        };
        let shown = page.to_string();
        assert!(shown.contains("Acme Coffee"));
        assert!(!shown.contains("secret-token"));
    }

    #[test]
    fn issue_serialize_roundtrip() {
        let issue = sample_issue();
        let json = serde_json::to_string(&issue).unwrap();
        let back: Issue = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, issue.id);
        assert_eq!(back.issue_type, IssueType::EngagementDrop);
        assert_eq!(back.status, IssueStatus::Detected);
    }
}
