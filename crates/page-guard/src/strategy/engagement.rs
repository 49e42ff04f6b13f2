//! 참여율 하락 수정 전략
//!
//! 콘텐츠 생성기에서 새 게시물 제안을 받아 플랫폼에 게시합니다.
//! 생성 실패는 `failed`, 게시가 일부만 성공하면 `partial`입니다.

use std::sync::Arc;

use tracing::{debug, warn};

use pagewarden_core::pipeline::BoxFuture;
use pagewarden_core::types::{Issue, IssueType, PageInfo};

use crate::content::{ContentGenerator, ContentPurpose, ContentRequest};
use crate::platform::PlatformClient;
use crate::strategy::{FixStrategy, StrategyReport};

/// 참여율 하락 전략 -- 제안 생성 + 게시
pub struct EngagementStrategy<P: PlatformClient, G: ContentGenerator> {
    platform: Arc<P>,
    generator: Arc<G>,
    /// 한 번의 시도에서 게시할 최대 제안 수 (외부 액션 수 제한)
    max_suggestions: usize,
}

impl<P: PlatformClient, G: ContentGenerator> EngagementStrategy<P, G> {
    /// 새 전략을 생성합니다.
    pub fn new(platform: Arc<P>, generator: Arc<G>, max_suggestions: usize) -> Self {
        Self {
            platform,
            generator,
            max_suggestions: max_suggestions.clamp(1, 10),
        }
    }

    async fn run(&self, issue: &Issue, page: &PageInfo) -> StrategyReport {
        let mut actions = Vec::new();
        let mut published = 0usize;

        for n in 0..self.max_suggestions {
            let request = ContentRequest {
                page_name: page.name.clone(),
                purpose: ContentPurpose::PostSuggestion,
                context: issue.description.clone(),
            };

            let generated = match self.generator.generate(&request).await {
                Ok(content) => content,
                Err(e) => {
                    warn!(page_id = %page.id, error = %e, "content generation failed");
                    actions.push(format!("content generation failed: {e}"));
                    // 생성 자체가 안 되면 첫 제안 전이라도 전략 실패
                    if published == 0 {
                        return StrategyReport::failed(actions);
                    }
                    break;
                }
            };

            debug!(
                page_id = %page.id,
                suggestion = n + 1,
                confidence = generated.confidence,
                "publishing suggested post"
            );
            actions.push(format!(
                "generated post suggestion {} (generator confidence {:.2})",
                n + 1,
                generated.confidence,
            ));

            match self.platform.publish_post(page, &generated.text).await {
                Ok(()) => {
                    published += 1;
                    actions.push(format!("published suggested post {}", n + 1));
                }
                Err(e) => {
                    warn!(page_id = %page.id, error = %e, "publish failed");
                    actions.push(format!("publish failed: {e}"));
                }
            }
        }

        if published == self.max_suggestions {
            StrategyReport::success(
                actions,
                Some(format!("published {published} fresh posts to lift engagement")),
            )
        } else {
            // 초안은 만들었지만 게시가 다 되지는 않음 -> 재시도 가치 있음
            StrategyReport::partial(actions)
        }
    }
}

impl<P: PlatformClient, G: ContentGenerator> FixStrategy for EngagementStrategy<P, G> {
    fn name(&self) -> &'static str {
        "engagement-content-refresh"
    }

    fn issue_type(&self) -> IssueType {
        IssueType::EngagementDrop
    }

    fn apply<'a>(&'a self, issue: &'a Issue, page: &'a PageInfo) -> BoxFuture<'a, StrategyReport> {
        Box::pin(self.run(issue, page))
    }
}
