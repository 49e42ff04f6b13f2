//! 수정 실행기 -- 이슈 상태 기계 구동
//!
//! [`FixExecutor`]는 큐에 있는 이슈를 하나씩 상태 기계에 태웁니다:
//! `Detected → Fixing → {Resolved | Escalated | Failed}` 또는
//! `Fixing → Detected` (다음 사이클 재시도). "analyzing" 단계는 dequeue
//! 직후의 전이 결정 그 자체이며 별도 상태로 저장되지 않습니다.
//!
//! # 전이 규칙
//! - `Detected → Escalated` 즉시: `policy_compliance`, 또는 자동 수정 불가
//!   타입의 `critical` 이슈
//! - `Detected → Fixing`: 자동 수정 허용 + 신뢰도 게이트 통과 + 시도 횟수 미소진
//! - 전략 `success` → `Resolved`; `failed`/`partial`은 횟수가 남았으면
//!   `Detected`로 복귀 (같은 사이클 내 재시도 없음), 소진이면 `Escalated`
//! - 회복 감지: 수집이 성공한 사이클에서 해당 타입이 더 이상 탐지되지
//!   않으면 열린 이슈를 시도 없이 `Resolved` 처리
//!
//! 각 `Fixing` 진입은 전략 실행 *전에* `Failed` 결과의 [`FixAttempt`]를
//! 선등록합니다 — 전략 도중 크래시가 나도 시도 횟수는 유실되지 않습니다.
//!
//! 이벤트는 전이당 정확히 한 번 발행되며, 큐 락을 잡은 채로 채널을
//! 기다리지 않습니다 (락 해제 후 전송).

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, error, info, warn};

use pagewarden_core::event::{GuardEvent, IssueEvent, IssueEventKind};
use pagewarden_core::metrics as m;
use pagewarden_core::types::{
    FixAttempt, FixOutcome, Issue, IssueStatus, IssueType, PageInfo, Severity,
};

use crate::queue::RemediationQueue;
use crate::strategy::{StrategyRegistry, StrategyReport};

/// 실행기 런타임 설정 (사이클 시작 시점의 스냅샷)
#[derive(Debug, Clone, Copy)]
pub struct ExecutorSettings {
    /// 자동 수정 신뢰도 게이트 (0-1)
    pub confidence_threshold: f64,
    /// 이슈당 최대 수정 시도 횟수
    pub max_fix_attempts: u32,
    /// 자동 수정 활성화 여부
    pub auto_fix: bool,
}

/// 페이지 한 장에 대한 실행 통계
#[derive(Debug, Default, Clone, Copy)]
pub struct PageFixStats {
    /// 해결된 이슈 수 (회복 감지 포함)
    pub resolved: usize,
    /// 이관된 이슈 수
    pub escalated: usize,
    /// 실행된 수정 시도 수
    pub attempts: usize,
}

/// dequeue 시점의 전이 결정
enum Decision {
    /// 게이트 미통과 -- 큐에 그대로 남김
    Leave,
    /// 회복 감지로 해결됨
    Recovered(IssueEvent),
    /// 즉시 이관
    EscalatedNow(IssueEvent),
    /// 전략 미등록으로 수정 불가 종결
    FailedNoStrategy,
    /// 수정 시도 진행 (이슈 스냅샷 + 전략 이름)
    Attempt(Box<Issue>),
}

/// 수정 실행기
pub struct FixExecutor {
    registry: Arc<StrategyRegistry>,
    event_tx: mpsc::Sender<GuardEvent>,
    action_timeout: Duration,
}

impl FixExecutor {
    /// 새 실행기를 생성합니다.
    pub fn new(
        registry: Arc<StrategyRegistry>,
        event_tx: mpsc::Sender<GuardEvent>,
        action_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            event_tx,
            action_timeout,
        }
    }

    /// 한 페이지의 큐잉된 이슈들을 순차 처리합니다.
    ///
    /// 이슈별 수정은 엄격히 순차적입니다 (같은 이슈에 대한 동시 `Fixing` 금지).
    /// 각 이슈는 사이클당 최대 한 번만 시도됩니다.
    ///
    /// # Arguments
    /// - `current_types`: 이번 사이클 분류기가 탐지한 타입 집합 (회복 판정용)
    /// - `fetch_ok`: 이번 사이클 메트릭 수집 성공 여부 — 실패 사이클에는
    ///   회복 판정을 하지 않습니다 (페이지 상태를 모르므로)
    pub async fn process_page(
        &self,
        page: &PageInfo,
        queue: &Mutex<RemediationQueue>,
        settings: &ExecutorSettings,
        current_types: &HashSet<IssueType>,
        fetch_ok: bool,
    ) -> PageFixStats {
        let mut stats = PageFixStats::default();
        let issue_ids = queue.lock().await.open_ids_for_page(&page.id);

        for issue_id in issue_ids {
            let decision = self
                .decide(&issue_id, queue, settings, current_types, fetch_ok)
                .await;

            match decision {
                Decision::Leave => {}
                Decision::Recovered(event) => {
                    stats.resolved += 1;
                    counter!(m::PAGE_GUARD_ISSUES_RESOLVED_TOTAL, m::LABEL_ISSUE_TYPE => event.issue_type.as_str())
                        .increment(1);
                    self.emit(GuardEvent::Issue(event)).await;
                }
                Decision::EscalatedNow(event) => {
                    stats.escalated += 1;
                    counter!(m::PAGE_GUARD_ISSUES_ESCALATED_TOTAL, m::LABEL_ISSUE_TYPE => event.issue_type.as_str())
                        .increment(1);
                    self.emit(GuardEvent::Issue(event)).await;
                }
                Decision::FailedNoStrategy => {}
                Decision::Attempt(issue) => {
                    let attempt_stats = self.attempt(&issue, page, queue, settings).await;
                    stats.resolved += attempt_stats.resolved;
                    stats.escalated += attempt_stats.escalated;
                    stats.attempts += attempt_stats.attempts;
                }
            }
        }

        stats
    }

    /// dequeue 단계: 큐 락 안에서 전이를 결정합니다.
    async fn decide(
        &self,
        issue_id: &str,
        queue: &Mutex<RemediationQueue>,
        settings: &ExecutorSettings,
        current_types: &HashSet<IssueType>,
        fetch_ok: bool,
    ) -> Decision {
        let mut q = queue.lock().await;
        let Some(issue) = q.get_mut(issue_id) else {
            return Decision::Leave;
        };

        // 정상 흐름에서 사이클 경계의 Fixing 상태는 없지만, 남아 있으면
        // 재시도 후보로 되돌린다
        if issue.status == IssueStatus::Fixing {
            debug!(issue_id, "normalizing leftover fixing status");
            issue.status = IssueStatus::Detected;
        }

        // 회복 감지: 수집 성공 사이클에서 트리거 조건이 사라졌으면 종결
        if fetch_ok && !current_types.contains(&issue.issue_type) {
            issue.status = IssueStatus::Resolved;
            info!(
                issue_id,
                page_id = %issue.page_id,
                issue_type = %issue.issue_type,
                "issue no longer reproduced, resolving as recovered"
            );
            let event = IssueEvent::new(
                IssueEventKind::Resolved,
                issue.page_id.clone(),
                issue.id.clone(),
                issue.issue_type,
                issue.severity,
                issue.title.clone(),
            );
            q.retire(issue_id);
            return Decision::Recovered(event);
        }

        // 즉시 이관: policy_compliance, 또는 자동 수정 불가 critical
        let escalate_now = issue.issue_type == IssueType::PolicyCompliance
            || (issue.severity == Severity::Critical && !issue.auto_fixable());
        if escalate_now {
            issue.status = IssueStatus::Escalated;
            info!(
                issue_id,
                page_id = %issue.page_id,
                issue_type = %issue.issue_type,
                severity = %issue.severity,
                "escalating without automatic remediation"
            );
            let event = IssueEvent::new(
                IssueEventKind::Escalated,
                issue.page_id.clone(),
                issue.id.clone(),
                issue.issue_type,
                issue.severity,
                issue.title.clone(),
            );
            q.retire(issue_id);
            return Decision::EscalatedNow(event);
        }

        // 자동 수정 게이트
        if !settings.auto_fix
            || !issue.auto_fixable()
            || issue.confidence < settings.confidence_threshold
            || issue.attempt_count() >= settings.max_fix_attempts
        {
            debug!(
                issue_id,
                confidence = issue.confidence,
                attempts = issue.attempt_count(),
                "issue does not clear the automatic fix gate, leaving queued"
            );
            return Decision::Leave;
        }

        // 전략 확보 (미등록 타입은 수정 불가 종결)
        let Some(strategy) = self.registry.get(issue.issue_type) else {
            error!(
                issue_id,
                issue_type = %issue.issue_type,
                "auto-fixable issue has no registered strategy, marking failed"
            );
            issue.status = IssueStatus::Failed;
            q.retire(issue_id);
            return Decision::FailedNoStrategy;
        };

        // Fixing 진입: 전략 실행 전에 시도 기록을 선등록
        issue.status = IssueStatus::Fixing;
        issue.attempts.push(FixAttempt::pending(strategy.name()));
        Decision::Attempt(Box::new(issue.clone()))
    }

    /// Fixing 단계: 전략을 실행하고 결과를 반영합니다.
    ///
    /// 전략 호출 동안에는 큐 락을 잡지 않습니다.
    async fn attempt(
        &self,
        issue: &Issue,
        page: &PageInfo,
        queue: &Mutex<RemediationQueue>,
        settings: &ExecutorSettings,
    ) -> PageFixStats {
        let mut stats = PageFixStats {
            attempts: 1,
            ..Default::default()
        };

        let Some(strategy) = self.registry.get(issue.issue_type) else {
            return stats;
        };

        debug!(
            issue_id = %issue.id,
            page_id = %page.id,
            strategy = strategy.name(),
            attempt = issue.attempt_count(),
            "executing fix strategy"
        );

        let report = match tokio::time::timeout(self.action_timeout, strategy.apply(issue, page))
            .await
        {
            Ok(report) => report,
            Err(_elapsed) => {
                warn!(
                    issue_id = %issue.id,
                    strategy = strategy.name(),
                    timeout_secs = self.action_timeout.as_secs(),
                    "fix strategy timed out"
                );
                StrategyReport::failed(vec!["strategy timed out".to_owned()])
            }
        };

        counter!(
            m::PAGE_GUARD_FIX_ATTEMPTS_TOTAL,
            m::LABEL_ISSUE_TYPE => issue.issue_type.as_str(),
            m::LABEL_RESULT => match report.outcome {
                FixOutcome::Success => "success",
                FixOutcome::Partial => "partial",
                FixOutcome::Failed => "failed",
            }
        )
        .increment(1);

        // 결과 반영 (짧은 임계 구역)
        let mut event = None;
        {
            let mut q = queue.lock().await;
            let Some(stored) = q.get_mut(&issue.id) else {
                return stats;
            };

            if let Some(last) = stored.attempts.last_mut() {
                last.outcome = report.outcome;
                last.actions = report.actions;
                last.estimated_impact = report.estimated_impact;
            }

            match report.outcome {
                FixOutcome::Success => {
                    stored.status = IssueStatus::Resolved;
                    info!(
                        issue_id = %stored.id,
                        page_id = %stored.page_id,
                        attempts = stored.attempt_count(),
                        "issue resolved"
                    );
                    stats.resolved += 1;
                    counter!(m::PAGE_GUARD_ISSUES_RESOLVED_TOTAL, m::LABEL_ISSUE_TYPE => stored.issue_type.as_str())
                        .increment(1);
                    event = Some(IssueEvent::new(
                        IssueEventKind::Resolved,
                        stored.page_id.clone(),
                        stored.id.clone(),
                        stored.issue_type,
                        stored.severity,
                        stored.title.clone(),
                    ));
                    q.retire(&issue.id);
                }
                FixOutcome::Partial | FixOutcome::Failed => {
                    if stored.attempt_count() >= settings.max_fix_attempts {
                        // 소진: 성공 없이 최대 횟수 도달
                        stored.status = IssueStatus::Escalated;
                        warn!(
                            issue_id = %stored.id,
                            page_id = %stored.page_id,
                            attempts = stored.attempt_count(),
                            "automation exhausted, escalating to a human"
                        );
                        stats.escalated += 1;
                        counter!(m::PAGE_GUARD_ISSUES_ESCALATED_TOTAL, m::LABEL_ISSUE_TYPE => stored.issue_type.as_str())
                            .increment(1);
                        event = Some(IssueEvent::new(
                            IssueEventKind::Escalated,
                            stored.page_id.clone(),
                            stored.id.clone(),
                            stored.issue_type,
                            stored.severity,
                            stored.title.clone(),
                        ));
                        q.retire(&issue.id);
                    } else {
                        // 다음 사이클 재시도 (같은 사이클 내 재시도 없음)
                        stored.status = IssueStatus::Detected;
                        debug!(
                            issue_id = %stored.id,
                            attempts = stored.attempt_count(),
                            outcome = %report.outcome,
                            "fix incomplete, requeued for next cycle"
                        );
                    }
                }
            }
        }

        if let Some(event) = event {
            self.emit(GuardEvent::Issue(event)).await;
        }

        stats
    }

    /// 이벤트를 fire-and-forget으로 전송합니다.
    ///
    /// 싱크 측 실패는 로그만 남기고 루프에 전파하지 않습니다.
    async fn emit(&self, event: GuardEvent) {
        if let Err(e) = self.event_tx.send(event).await {
            error!(error = %e, "failed to send guard event");
        }
    }
}
