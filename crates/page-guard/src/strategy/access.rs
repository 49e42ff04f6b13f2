//! 기술적 접근 장애 수정 전략
//!
//! 자격증명을 갱신한 뒤 플랫폼 연결을 확인합니다.
//! 결정적 경로이므로 이 타입의 이슈는 높은 신뢰도로 큐잉됩니다.

use std::sync::Arc;

use tracing::warn;

use pagewarden_core::pipeline::BoxFuture;
use pagewarden_core::types::{Issue, IssueType, PageInfo};

use crate::platform::PlatformClient;
use crate::strategy::{FixStrategy, StrategyReport};

/// 접근 장애 전략 -- 자격증명 갱신 + 확인
pub struct AccessStrategy<P: PlatformClient> {
    platform: Arc<P>,
}

impl<P: PlatformClient> AccessStrategy<P> {
    /// 새 전략을 생성합니다.
    pub fn new(platform: Arc<P>) -> Self {
        Self { platform }
    }

    async fn run(&self, _issue: &Issue, page: &PageInfo) -> StrategyReport {
        let mut actions = Vec::new();

        if let Err(e) = self.platform.refresh_credentials(page).await {
            warn!(page_id = %page.id, error = %e, "credential refresh failed");
            actions.push(format!("credential refresh failed: {e}"));
            return StrategyReport::failed(actions);
        }
        actions.push("refreshed page access credentials".to_owned());

        match self.platform.ping().await {
            Ok(()) => {
                actions.push("verified platform connectivity".to_owned());
                StrategyReport::success(actions, Some("page access restored".to_owned()))
            }
            Err(e) => {
                warn!(page_id = %page.id, error = %e, "post-refresh verification failed");
                actions.push(format!("connectivity verification failed: {e}"));
                // 갱신은 됐지만 검증 불가 -> 다음 사이클에 재확인
                StrategyReport::partial(actions)
            }
        }
    }
}

impl<P: PlatformClient> FixStrategy for AccessStrategy<P> {
    fn name(&self) -> &'static str {
        "credential-refresh"
    }

    fn issue_type(&self) -> IssueType {
        IssueType::TechnicalAccess
    }

    fn apply<'a>(&'a self, issue: &'a Issue, page: &'a PageInfo) -> BoxFuture<'a, StrategyReport> {
        Box::pin(self.run(issue, page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pagewarden_core::types::FixOutcome;

    use crate::platform::MockPlatformClient;
    use crate::strategy::test_support::{open_issue, page};

    #[tokio::test]
    async fn refresh_and_verify_is_success() {
        let strategy = AccessStrategy::new(Arc::new(MockPlatformClient::new()));
        let issue = open_issue("page-1", IssueType::TechnicalAccess, 0.95);

        let report = strategy.apply(&issue, &page("page-1")).await;
        assert_eq!(report.outcome, FixOutcome::Success);
        assert_eq!(report.actions.len(), 2);
    }

    #[tokio::test]
    async fn refresh_failure_is_failed() {
        let strategy = AccessStrategy::new(Arc::new(
            MockPlatformClient::new().with_failing_actions(),
        ));
        let issue = open_issue("page-1", IssueType::TechnicalAccess, 0.95);

        let report = strategy.apply(&issue, &page("page-1")).await;
        assert_eq!(report.outcome, FixOutcome::Failed);
        assert!(report.actions.iter().any(|a| a.contains("refresh failed")));
    }

    #[tokio::test]
    async fn verification_failure_is_partial() {
        let client = MockPlatformClient {
            fail_ping: true,
            ..Default::default()
        };
        let strategy = AccessStrategy::new(Arc::new(client));
        let issue = open_issue("page-1", IssueType::TechnicalAccess, 0.95);

        let report = strategy.apply(&issue, &page("page-1")).await;
        assert_eq!(report.outcome, FixOutcome::Partial);
    }

    #[test]
    fn strategy_metadata() {
        let strategy = AccessStrategy::new(Arc::new(MockPlatformClient::new()));
        assert_eq!(strategy.issue_type(), IssueType::TechnicalAccess);
        assert_eq!(strategy.name(), "credential-refresh");
    }
}
