//! 수정 전략 -- 이슈 타입별 자동 수정 루틴
//!
//! [`FixStrategy`]는 이슈 타입 하나를 담당하는 수정 루틴 trait이며,
//! [`StrategyRegistry`]가 타입 → 전략 매핑을 보관합니다.
//!
//! 전략은 외부 협력자(플랫폼 클라이언트, 콘텐츠 생성기)만 호출하고
//! [`StrategyReport`]를 반환합니다. 이슈 상태와 큐는 절대 직접 건드리지
//! 않습니다 — 상태 전이는 전부 실행기 한 곳에 있습니다. 덕분에 전략은
//! 네트워크 없이 mock으로 검증할 수 있습니다.
//!
//! # 전략 목록
//! - [`EngagementStrategy`]: 콘텐츠 제안 생성 + 게시
//! - [`QualityStrategy`]: 저품질 콘텐츠 재작성 + 재게시
//! - [`AccessStrategy`]: 자격증명 갱신 + 연결 확인
//! - [`PerformanceStrategy`]: 게시 구성 조언 + 일정 조정
//!
//! `policy_compliance`는 자동 수정 대상이 아니므로 전략이 없습니다.

pub mod access;
pub mod engagement;
pub mod performance;
pub mod quality;

pub use access::AccessStrategy;
pub use engagement::EngagementStrategy;
pub use performance::PerformanceStrategy;
pub use quality::QualityStrategy;

use std::collections::HashMap;
use std::sync::Arc;

use pagewarden_core::pipeline::BoxFuture;
use pagewarden_core::types::{FixOutcome, Issue, IssueType, PageInfo};

use crate::content::ContentGenerator;
use crate::platform::PlatformClient;

/// 전략 실행 보고
///
/// 실행기는 이 보고만 보고 상태 전이를 결정합니다.
#[derive(Debug, Clone)]
pub struct StrategyReport {
    /// 실행 결과
    pub outcome: FixOutcome,
    /// 수행한 액션 목록 (사람이 읽는 문자열)
    pub actions: Vec<String>,
    /// 추정 효과
    pub estimated_impact: Option<String>,
}

impl StrategyReport {
    /// 성공 보고를 생성합니다.
    pub fn success(actions: Vec<String>, estimated_impact: Option<String>) -> Self {
        Self {
            outcome: FixOutcome::Success,
            actions,
            estimated_impact,
        }
    }

    /// 부분 성공 보고를 생성합니다.
    pub fn partial(actions: Vec<String>) -> Self {
        Self {
            outcome: FixOutcome::Partial,
            actions,
            estimated_impact: None,
        }
    }

    /// 실패 보고를 생성합니다.
    pub fn failed(actions: Vec<String>) -> Self {
        Self {
            outcome: FixOutcome::Failed,
            actions,
            estimated_impact: None,
        }
    }
}

/// 이슈 타입별 수정 루틴 trait
///
/// dyn-compatible하도록 `BoxFuture`를 반환합니다
/// ([`DynPipeline`](pagewarden_core::pipeline::DynPipeline)과 같은 패턴).
pub trait FixStrategy: Send + Sync {
    /// 전략 이름 (시도 기록과 로그에 사용)
    fn name(&self) -> &'static str;

    /// 담당하는 이슈 타입
    fn issue_type(&self) -> IssueType;

    /// 이슈에 대해 수정을 시도합니다.
    ///
    /// 실패는 반환 보고의 `outcome`으로만 표현합니다 — 전략은 에러를
    /// 밖으로 던지지 않습니다.
    fn apply<'a>(&'a self, issue: &'a Issue, page: &'a PageInfo) -> BoxFuture<'a, StrategyReport>;
}

/// 전략 레지스트리 -- 이슈 타입 → 수정 루틴 매핑
pub struct StrategyRegistry {
    strategies: HashMap<IssueType, Box<dyn FixStrategy>>,
}

impl StrategyRegistry {
    /// 빈 레지스트리를 생성합니다.
    pub fn new() -> Self {
        Self {
            strategies: HashMap::new(),
        }
    }

    /// 기본 전략 세트로 레지스트리를 생성합니다.
    pub fn with_defaults<P, G>(platform: Arc<P>, generator: Arc<G>, max_suggestions: usize) -> Self
    where
        P: PlatformClient,
        G: ContentGenerator,
    {
        let mut registry = Self::new();
        registry.register(Box::new(EngagementStrategy::new(
            Arc::clone(&platform),
            Arc::clone(&generator),
            max_suggestions,
        )));
        registry.register(Box::new(QualityStrategy::new(
            Arc::clone(&platform),
            Arc::clone(&generator),
        )));
        registry.register(Box::new(AccessStrategy::new(Arc::clone(&platform))));
        registry.register(Box::new(PerformanceStrategy::new(platform, generator)));
        registry
    }

    /// 전략을 등록합니다.
    ///
    /// 같은 이슈 타입에 이미 전략이 있으면 교체됩니다 (테스트 주입용).
    pub fn register(&mut self, strategy: Box<dyn FixStrategy>) {
        self.strategies.insert(strategy.issue_type(), strategy);
    }

    /// 이슈 타입의 전략을 조회합니다.
    pub fn get(&self, issue_type: IssueType) -> Option<&dyn FixStrategy> {
        self.strategies.get(&issue_type).map(Box::as_ref)
    }

    /// 등록된 전략 수
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// 레지스트리가 비어 있는지 여부
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! 전략/실행기 테스트 공용 헬퍼

    use super::*;
    use pagewarden_core::types::Severity;

    /// 고정 결과를 반환하는 테스트 전략
    pub struct ScriptedStrategy {
        pub target: IssueType,
        pub outcomes: std::sync::Mutex<Vec<FixOutcome>>,
        pub calls: std::sync::atomic::AtomicU32,
    }

    impl ScriptedStrategy {
        /// 호출 순서대로 결과를 소모하는 전략을 생성합니다.
        /// 목록이 소진되면 마지막 결과를 반복합니다.
        pub fn new(target: IssueType, outcomes: Vec<FixOutcome>) -> Self {
            Self {
                target,
                outcomes: std::sync::Mutex::new(outcomes),
                calls: std::sync::atomic::AtomicU32::new(0),
            }
        }

        pub fn call_count(&self) -> u32 {
            self.calls.load(std::sync::atomic::Ordering::SeqCst)
        }
    }

    impl FixStrategy for ScriptedStrategy {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn issue_type(&self) -> IssueType {
            self.target
        }

        fn apply<'a>(
            &'a self,
            _issue: &'a Issue,
            _page: &'a PageInfo,
        ) -> BoxFuture<'a, StrategyReport> {
            Box::pin(async move {
                self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                let mut outcomes = self.outcomes.lock().unwrap();
                let outcome = if outcomes.len() > 1 {
                    outcomes.remove(0)
                } else {
                    outcomes.first().copied().unwrap_or(FixOutcome::Failed)
                };
                match outcome {
                    FixOutcome::Success => {
                        StrategyReport::success(vec!["scripted action".to_owned()], None)
                    }
                    FixOutcome::Partial => {
                        StrategyReport::partial(vec!["scripted action".to_owned()])
                    }
                    FixOutcome::Failed => {
                        StrategyReport::failed(vec!["scripted action".to_owned()])
                    }
                }
            })
        }
    }

    /// 테스트용 이슈 생성 헬퍼
    pub fn open_issue(page_id: &str, issue_type: IssueType, confidence: f64) -> Issue {
        Issue::new(
            page_id,
            issue_type,
            Severity::Medium,
            "test issue",
            "test description",
            confidence,
        )
    }

    /// 테스트용 페이지 생성 헬퍼
    pub fn page(id: &str) -> PageInfo {
        PageInfo {
            id: id.to_owned(),
            name: format!("Page {id}"),
            access_token: "tok".to_owned(),
        }
    }
}
