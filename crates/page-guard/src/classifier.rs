//! 이슈 분류 -- 헬스 스냅샷에서 타입별 이슈 탐지
//!
//! [`IssueClassifier`]는 스냅샷(및 메트릭 수집 에러)을 입력으로 받아
//! 0개 이상의 [`Issue`]를 생성하는 순수 탐지기 모음입니다.
//! 각 탐지기는 임계값 술어 + 심각도/신뢰도 공식으로 구성됩니다.
//!
//! 중복 억제(같은 타입의 열린 이슈가 있으면 무시)는 분류기가 아니라
//! [`RemediationQueue::merge`](crate::queue::RemediationQueue::merge)가
//! 담당합니다 — 분류기는 매 사이클 후보를 그대로 냅니다.

use tracing::debug;

use pagewarden_core::error::PlatformError;
use pagewarden_core::types::{HealthSnapshot, Issue, IssueType, Severity};

use crate::config::ClassifierConfig;

/// 이슈 분류기
///
/// 임계값은 [`ClassifierConfig`]에서만 읽으며 내부 상태를 갖지 않습니다.
#[derive(Debug, Clone)]
pub struct IssueClassifier {
    config: ClassifierConfig,
}

impl IssueClassifier {
    /// 주어진 임계값 설정으로 분류기를 생성합니다.
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// 스냅샷에서 이슈 후보를 탐지합니다.
    ///
    /// `previous`는 직전 사이클 스냅샷입니다. `performance_decline`은
    /// 두 사이클 연속 하락을 요구하므로, 첫 사이클(previous 없음)에는
    /// 절대 생성되지 않습니다.
    pub fn classify(
        &self,
        snapshot: &HealthSnapshot,
        previous: Option<&HealthSnapshot>,
    ) -> Vec<Issue> {
        let mut issues = Vec::new();

        if let Some(issue) = self.detect_engagement_drop(snapshot) {
            issues.push(issue);
        }
        if let Some(issue) = self.detect_content_quality(snapshot) {
            issues.push(issue);
        }
        if let Some(issue) = self.detect_policy_compliance(snapshot) {
            issues.push(issue);
        }
        if let Some(issue) = self.detect_performance_decline(snapshot, previous) {
            issues.push(issue);
        }

        if !issues.is_empty() {
            debug!(
                page_id = %snapshot.page_id,
                count = issues.len(),
                "issue candidates detected"
            );
        }
        issues
    }

    /// 메트릭 수집 실패에서 이슈 후보를 탐지합니다.
    ///
    /// 인증 에러만 `technical_access` 이슈가 됩니다.
    /// 레이트 리밋/일시 에러는 다음 사이클에 자연히 재시도되므로
    /// 이슈를 만들지 않습니다.
    pub fn classify_fetch_failure(&self, page_id: &str, error: &PlatformError) -> Option<Issue> {
        if !error.is_auth() {
            return None;
        }

        Some(Issue::new(
            page_id,
            IssueType::TechnicalAccess,
            Severity::High,
            "Platform access failure",
            format!("metric fetch rejected by platform: {error}"),
            self.config.access_confidence,
        ))
    }

    /// 참여율 하락 탐지
    ///
    /// 신뢰도는 고정 상수입니다 — 직접 측정된 신호이므로 추정이 아닙니다.
    fn detect_engagement_drop(&self, snapshot: &HealthSnapshot) -> Option<Issue> {
        if snapshot.engagement_rate >= self.config.engagement_floor {
            return None;
        }

        let severity = if snapshot.engagement_rate < self.config.engagement_severe_floor {
            Severity::High
        } else {
            Severity::Medium
        };

        Some(Issue::new(
            &snapshot.page_id,
            IssueType::EngagementDrop,
            severity,
            "Engagement below floor",
            format!(
                "engagement rate {:.2}% is below the floor of {:.2}%",
                snapshot.engagement_rate, self.config.engagement_floor,
            ),
            self.config.engagement_confidence,
        ))
    }

    /// 콘텐츠 품질 저하 탐지
    ///
    /// 품질 점수 자체가 2차 휴리스틱의 산출물이므로 신뢰도가
    /// engagement보다 낮게 설정되어 있습니다.
    fn detect_content_quality(&self, snapshot: &HealthSnapshot) -> Option<Issue> {
        if snapshot.content_quality >= self.config.quality_floor {
            return None;
        }

        let severity = if snapshot.content_quality < self.config.quality_floor / 2.0 {
            Severity::High
        } else {
            Severity::Medium
        };

        Some(Issue::new(
            &snapshot.page_id,
            IssueType::ContentQuality,
            severity,
            "Content quality below floor",
            format!(
                "content quality score {:.1} is below the floor of {:.1}",
                snapshot.content_quality, self.config.quality_floor,
            ),
            self.config.quality_confidence,
        ))
    }

    /// 정책 준수 저하 탐지
    ///
    /// 자동 수정 대상이 아니므로 신뢰도는 0으로 둡니다 — 이 타입은
    /// 실행기의 자동 경로에서 제외되고 즉시 이관됩니다.
    fn detect_policy_compliance(&self, snapshot: &HealthSnapshot) -> Option<Issue> {
        if snapshot.compliance >= self.config.compliance_floor {
            return None;
        }

        let severity = if snapshot.compliance < self.config.compliance_critical_floor {
            Severity::Critical
        } else {
            Severity::High
        };

        Some(Issue::new(
            &snapshot.page_id,
            IssueType::PolicyCompliance,
            severity,
            "Policy compliance below floor",
            format!(
                "compliance score {:.1} is below the floor of {:.1}; requires human review",
                snapshot.compliance, self.config.compliance_floor,
            ),
            0.0,
        ))
    }

    /// 지속적 성능 하락 탐지
    ///
    /// 현재와 직전 스냅샷 모두에서 `declining_submetric_min`개 이상의
    /// 서브 메트릭이 하락 중이어야 합니다.
    fn detect_performance_decline(
        &self,
        snapshot: &HealthSnapshot,
        previous: Option<&HealthSnapshot>,
    ) -> Option<Issue> {
        let prev = previous?;

        let current_declining = snapshot.trends.declining_count();
        let previous_declining = prev.trends.declining_count();
        if current_declining < self.config.declining_submetric_min
            || previous_declining < self.config.declining_submetric_min
        {
            return None;
        }

        Some(Issue::new(
            &snapshot.page_id,
            IssueType::PerformanceDecline,
            Severity::Medium,
            "Sustained performance decline",
            format!(
                "{current_declining} sub-metrics declining for two consecutive cycles (previous cycle: {previous_declining})",
            ),
            self.config.performance_confidence,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    use pagewarden_core::types::{MetricTrends, Trend};

    fn snapshot(engagement: f64, quality: f64, compliance: f64) -> HealthSnapshot {
        HealthSnapshot {
            page_id: "page-1".to_owned(),
            overall: 70.0,
            engagement_rate: engagement,
            responsiveness: 80.0,
            content_quality: quality,
            compliance,
            trends: MetricTrends::default(),
            computed_at: SystemTime::now(),
        }
    }

    fn declining_snapshot(count: usize) -> HealthSnapshot {
        let mut s = snapshot(5.0, 80.0, 95.0);
        let mut trends = MetricTrends::default();
        if count >= 1 {
            trends.engagement = Trend::Declining;
        }
        if count >= 2 {
            trends.content_quality = Trend::Declining;
        }
        if count >= 3 {
            trends.responsiveness = Trend::Declining;
        }
        s.trends = trends;
        s
    }

    fn classifier() -> IssueClassifier {
        IssueClassifier::new(ClassifierConfig::default())
    }

    #[test]
    fn healthy_snapshot_yields_no_issues() {
        let issues = classifier().classify(&snapshot(5.0, 85.0, 95.0), None);
        assert!(issues.is_empty());
    }

    #[test]
    fn engagement_below_floor_is_medium() {
        let issues = classifier().classify(&snapshot(1.8, 85.0, 95.0), None);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].issue_type, IssueType::EngagementDrop);
        assert_eq!(issues[0].severity, Severity::Medium);
        assert!((issues[0].confidence - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn engagement_below_severe_floor_is_high() {
        // 시나리오 E1: 참여율 1.0 (< 하한 2.0) -> high 심각도, 신뢰도는 게이트(0.8) 이상
        let issues = classifier().classify(&snapshot(1.0, 85.0, 95.0), None);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].issue_type, IssueType::EngagementDrop);
        assert_eq!(issues[0].severity, Severity::High);
        assert!(issues[0].confidence >= 0.8);
    }

    #[test]
    fn engagement_at_floor_does_not_trigger() {
        let issues = classifier().classify(&snapshot(2.0, 85.0, 95.0), None);
        assert!(issues.is_empty());
    }

    #[test]
    fn quality_below_floor_triggers_with_lower_confidence() {
        let issues = classifier().classify(&snapshot(5.0, 55.0, 95.0), None);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].issue_type, IssueType::ContentQuality);
        assert_eq!(issues[0].severity, Severity::Medium);
        // 2차 휴리스틱 신호이므로 engagement보다 낮은 신뢰도
        assert!(issues[0].confidence < 0.9);
    }

    #[test]
    fn very_low_quality_is_high_severity() {
        let issues = classifier().classify(&snapshot(5.0, 25.0, 95.0), None);
        assert_eq!(issues[0].severity, Severity::High);
    }

    #[test]
    fn compliance_below_floor_is_high() {
        let issues = classifier().classify(&snapshot(5.0, 85.0, 75.0), None);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].issue_type, IssueType::PolicyCompliance);
        assert_eq!(issues[0].severity, Severity::High);
        assert!(!issues[0].auto_fixable());
    }

    #[test]
    fn compliance_below_critical_floor_is_critical() {
        // 시나리오 E2: 준수 점수 55 -> critical
        let issues = classifier().classify(&snapshot(5.0, 85.0, 55.0), None);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].issue_type, IssueType::PolicyCompliance);
        assert_eq!(issues[0].severity, Severity::Critical);
    }

    #[test]
    fn performance_decline_requires_previous_snapshot() {
        // 첫 사이클에는 previous가 없으므로 절대 생성 불가
        let issues = classifier().classify(&declining_snapshot(3), None);
        assert!(issues.is_empty());
    }

    #[test]
    fn performance_decline_requires_two_consecutive_cycles() {
        let current = declining_snapshot(2);

        // 직전 사이클은 하락 1개뿐 -> 미발동
        let prev_one = declining_snapshot(1);
        let issues = classifier().classify(&current, Some(&prev_one));
        assert!(issues.is_empty());

        // 직전 사이클도 2개 이상 하락 -> 발동
        let prev_two = declining_snapshot(2);
        let issues = classifier().classify(&current, Some(&prev_two));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].issue_type, IssueType::PerformanceDecline);
        assert_eq!(issues[0].severity, Severity::Medium);
    }

    #[test]
    fn fetch_auth_failure_produces_technical_access() {
        let issue = classifier()
            .classify_fetch_failure("page-1", &PlatformError::Auth("token expired".to_owned()))
            .expect("auth failure should produce an issue");
        assert_eq!(issue.issue_type, IssueType::TechnicalAccess);
        assert_eq!(issue.severity, Severity::High);
        // 결정적 수정 경로이므로 높은 신뢰도
        assert!(issue.confidence >= 0.9);
    }

    #[test]
    fn fetch_transient_failure_produces_nothing() {
        let c = classifier();
        assert!(c
            .classify_fetch_failure(
                "page-1",
                &PlatformError::RateLimited {
                    retry_after_secs: Some(60)
                }
            )
            .is_none());
        assert!(c
            .classify_fetch_failure("page-1", &PlatformError::Other("timeout".to_owned()))
            .is_none());
        assert!(c
            .classify_fetch_failure("page-1", &PlatformError::NotFound("page-1".to_owned()))
            .is_none());
    }

    #[test]
    fn multiple_detectors_can_fire_together() {
        // 참여율/품질/준수 모두 하한 미만
        let issues = classifier().classify(&snapshot(1.0, 40.0, 70.0), None);
        let types: Vec<IssueType> = issues.iter().map(|i| i.issue_type).collect();
        assert!(types.contains(&IssueType::EngagementDrop));
        assert!(types.contains(&IssueType::ContentQuality));
        assert!(types.contains(&IssueType::PolicyCompliance));
        assert_eq!(issues.len(), 3);
    }

    #[test]
    fn classify_is_deterministic_for_same_snapshot() {
        // 같은 스냅샷을 두 번 분류해도 같은 후보 집합 (ID 제외)
        let s = snapshot(1.0, 85.0, 95.0);
        let c = classifier();
        let a = c.classify(&s, None);
        let b = c.classify(&s, None);
        assert_eq!(a.len(), b.len());
        assert_eq!(a[0].issue_type, b[0].issue_type);
        assert_eq!(a[0].severity, b[0].severity);
    }
}
