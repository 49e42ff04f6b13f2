//! 지속적 성능 하락 수정 전략
//!
//! 게시 구성 조언을 생성기에서 받고 (best-effort), 플랫폼의 게시 일정을
//! 조정합니다. 조언 생성 실패는 전략 실패가 아닙니다 — 일정 조정이
//! 핵심 액션입니다.

use std::sync::Arc;

use tracing::warn;

use pagewarden_core::pipeline::BoxFuture;
use pagewarden_core::types::{Issue, IssueType, PageInfo};

use crate::content::{ContentGenerator, ContentPurpose, ContentRequest};
use crate::platform::PlatformClient;
use crate::strategy::{FixStrategy, StrategyReport};

/// 하락 추세 대응 시 적용할 게시 빈도
const BOOSTED_POSTS_PER_DAY: u8 = 2;

/// 성능 하락 전략 -- 구성 조언 + 일정 조정
pub struct PerformanceStrategy<P: PlatformClient, G: ContentGenerator> {
    platform: Arc<P>,
    generator: Arc<G>,
}

impl<P: PlatformClient, G: ContentGenerator> PerformanceStrategy<P, G> {
    /// 새 전략을 생성합니다.
    pub fn new(platform: Arc<P>, generator: Arc<G>) -> Self {
        Self { platform, generator }
    }

    async fn run(&self, issue: &Issue, page: &PageInfo) -> StrategyReport {
        let mut actions = Vec::new();

        let request = ContentRequest {
            page_name: page.name.clone(),
            purpose: ContentPurpose::ScheduleAdvice,
            context: issue.description.clone(),
        };
        match self.generator.generate(&request).await {
            Ok(advice) => {
                actions.push(format!(
                    "collected posting-mix advice (generator confidence {:.2})",
                    advice.confidence,
                ));
            }
            Err(e) => {
                // 조언은 부가 정보 -> 실패해도 일정 조정은 진행
                warn!(page_id = %page.id, error = %e, "schedule advice generation failed");
                actions.push(format!("posting-mix advice unavailable: {e}"));
            }
        }

        match self
            .platform
            .adjust_schedule(page, BOOSTED_POSTS_PER_DAY)
            .await
        {
            Ok(()) => {
                actions.push(format!(
                    "adjusted posting schedule to {BOOSTED_POSTS_PER_DAY} posts/day"
                ));
                StrategyReport::success(
                    actions,
                    Some("posting cadence raised to counter the decline".to_owned()),
                )
            }
            Err(e) => {
                warn!(page_id = %page.id, error = %e, "schedule adjustment failed");
                actions.push(format!("schedule adjustment failed: {e}"));
                StrategyReport::failed(actions)
            }
        }
    }
}

impl<P: PlatformClient, G: ContentGenerator> FixStrategy for PerformanceStrategy<P, G> {
    fn name(&self) -> &'static str {
        "performance-schedule-tune"
    }

    fn issue_type(&self) -> IssueType {
        IssueType::PerformanceDecline
    }

    fn apply<'a>(&'a self, issue: &'a Issue, page: &'a PageInfo) -> BoxFuture<'a, StrategyReport> {
        Box::pin(self.run(issue, page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pagewarden_core::types::FixOutcome;

    use crate::content::MockContentGenerator;
    use crate::platform::MockPlatformClient;
    use crate::strategy::test_support::{open_issue, page};

    #[tokio::test]
    async fn advice_and_adjust_is_success() {
        let strategy = PerformanceStrategy::new(
            Arc::new(MockPlatformClient::new()),
            Arc::new(MockContentGenerator::with_response(
                "Post more short-form video in the evenings.",
            )),
        );
        let issue = open_issue("page-1", IssueType::PerformanceDecline, 0.85);

        let report = strategy.apply(&issue, &page("page-1")).await;
        assert_eq!(report.outcome, FixOutcome::Success);
        assert_eq!(report.actions.len(), 2);
    }

    #[tokio::test]
    async fn advice_failure_still_succeeds_if_adjustment_works() {
        let strategy = PerformanceStrategy::new(
            Arc::new(MockPlatformClient::new()),
            Arc::new(MockContentGenerator::failing()),
        );
        let issue = open_issue("page-1", IssueType::PerformanceDecline, 0.85);

        let report = strategy.apply(&issue, &page("page-1")).await;
        assert_eq!(report.outcome, FixOutcome::Success);
        assert!(report.actions.iter().any(|a| a.contains("unavailable")));
    }

    #[tokio::test]
    async fn adjustment_failure_is_failed() {
        let strategy = PerformanceStrategy::new(
            Arc::new(MockPlatformClient::new().with_failing_actions()),
            Arc::new(MockContentGenerator::with_response("Advice text here.")),
        );
        let issue = open_issue("page-1", IssueType::PerformanceDecline, 0.85);

        let report = strategy.apply(&issue, &page("page-1")).await;
        assert_eq!(report.outcome, FixOutcome::Failed);
    }

    #[test]
    fn strategy_metadata() {
        let strategy = PerformanceStrategy::new(
            Arc::new(MockPlatformClient::new()),
            Arc::new(MockContentGenerator::default()),
        );
        assert_eq!(strategy.issue_type(), IssueType::PerformanceDecline);
        assert_eq!(strategy.name(), "performance-schedule-tune");
    }
}
