//! 콘텐츠 품질 수정 전략
//!
//! 저품질 콘텐츠의 재작성본을 생성기에서 받아 재게시합니다.

use std::sync::Arc;

use tracing::warn;

use pagewarden_core::pipeline::BoxFuture;
use pagewarden_core::types::{Issue, IssueType, PageInfo};

use crate::content::{ContentGenerator, ContentPurpose, ContentRequest};
use crate::platform::PlatformClient;
use crate::strategy::{FixStrategy, StrategyReport};

/// 콘텐츠 품질 전략 -- 재작성 + 재게시
pub struct QualityStrategy<P: PlatformClient, G: ContentGenerator> {
    platform: Arc<P>,
    generator: Arc<G>,
}

impl<P: PlatformClient, G: ContentGenerator> QualityStrategy<P, G> {
    /// 새 전략을 생성합니다.
    pub fn new(platform: Arc<P>, generator: Arc<G>) -> Self {
        Self { platform, generator }
    }

    async fn run(&self, issue: &Issue, page: &PageInfo) -> StrategyReport {
        let mut actions = Vec::new();

        let request = ContentRequest {
            page_name: page.name.clone(),
            purpose: ContentPurpose::Rewrite,
            context: issue.description.clone(),
        };

        let rewritten = match self.generator.generate(&request).await {
            Ok(content) => content,
            Err(e) => {
                warn!(page_id = %page.id, error = %e, "rewrite generation failed");
                actions.push(format!("rewrite generation failed: {e}"));
                return StrategyReport::failed(actions);
            }
        };
        actions.push(format!(
            "generated rewritten post (generator confidence {:.2})",
            rewritten.confidence,
        ));

        match self.platform.publish_post(page, &rewritten.text).await {
            Ok(()) => {
                actions.push("republished rewritten post".to_owned());
                StrategyReport::success(
                    actions,
                    Some("replaced low-scoring content with rewritten version".to_owned()),
                )
            }
            Err(e) => {
                warn!(page_id = %page.id, error = %e, "republish failed");
                actions.push(format!("republish failed: {e}"));
                // 재작성본은 확보 -> 다음 사이클에 재시도
                StrategyReport::partial(actions)
            }
        }
    }
}

impl<P: PlatformClient, G: ContentGenerator> FixStrategy for QualityStrategy<P, G> {
    fn name(&self) -> &'static str {
        "quality-rewrite"
    }

    fn issue_type(&self) -> IssueType {
        IssueType::ContentQuality
    }

    fn apply<'a>(&'a self, issue: &'a Issue, page: &'a PageInfo) -> BoxFuture<'a, StrategyReport> {
        Box::pin(self.run(issue, page))
    }
}
