//! 페이지 가드 -- 사이클 스케줄링과 전체 흐름 관리
//!
//! [`PageGuard`]는 core의 [`Pipeline`] trait을 구현하여
//! `pagewarden-daemon`에서 다른 모듈과 동일한 생명주기로 관리됩니다.
//!
//! # 사이클 구조
//! ```text
//! timer tick (check_interval_secs)
//!     |
//!     +-- 이전 사이클 진행 중이면 틱 드롭 (큐잉 없음)
//!     |
//!     +-- PageSource.list_pages()  -- 실패 시 사이클 전체 스킵
//!     |
//!     +-- 페이지별 병렬 처리 (세마포어로 제한된 워커 풀)
//!     |       fetch -> evaluate -> classify -> queue.merge -> executor
//!     |
//!     +-- CycleEvent 발행 (정확히 1회)
//! ```
//!
//! `stop()`은 타이머를 즉시 취소하고, 진행 중인 사이클은 현재 전략 호출을
//! 마칠 때까지 기다립니다 (외부 side effect를 중간에 끊지 않음).

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use metrics::{counter, gauge, histogram};
use tokio::sync::{Mutex, RwLock, Semaphore, mpsc};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use pagewarden_core::error::{PagewardenError, PlatformError};
use pagewarden_core::event::{CycleEvent, GuardEvent, IssueEvent, IssueEventKind};
use pagewarden_core::metrics as m;
use pagewarden_core::pipeline::{HealthStatus, Pipeline};
use pagewarden_core::types::{IssueType, PageInfo};

use crate::classifier::IssueClassifier;
use crate::config::{GuardConfigUpdate, PageGuardConfig};
use crate::content::ContentGenerator;
use crate::error::PageGuardError;
use crate::executor::{ExecutorSettings, FixExecutor};
use crate::health::{HealthEvaluator, SnapshotStore};
use crate::platform::PlatformClient;
use crate::queue::RemediationQueue;
use crate::source::PageSource;
use crate::strategy::StrategyRegistry;

/// 가드 실행 상태
#[derive(Debug, Clone, PartialEq, Eq)]
enum GuardState {
    /// 초기화됨, 아직 시작하지 않음
    Initialized,
    /// 실행 중
    Running,
    /// 정지됨
    Stopped,
}

/// 런타임에 변경 가능한 설정 (타이머/게이트)
#[derive(Debug, Clone, Copy)]
struct RuntimeSettings {
    check_interval_secs: u64,
    confidence_threshold: f64,
    max_fix_attempts: u32,
    auto_fix: bool,
}

impl RuntimeSettings {
    fn executor_settings(&self) -> ExecutorSettings {
        ExecutorSettings {
            confidence_threshold: self.confidence_threshold,
            max_fix_attempts: self.max_fix_attempts,
            auto_fix: self.auto_fix,
        }
    }
}

/// 가드 카운터 묶음 (사이클 태스크와 공유)
#[derive(Clone, Default)]
struct GuardCounters {
    cycles_completed: Arc<AtomicU64>,
    ticks_dropped: Arc<AtomicU64>,
    issues_detected: Arc<AtomicU64>,
    issues_resolved: Arc<AtomicU64>,
    issues_escalated: Arc<AtomicU64>,
    fix_attempts: Arc<AtomicU64>,
    pages_monitored: Arc<AtomicU64>,
    last_cycle_failures: Arc<AtomicU64>,
}

/// 한 사이클의 요약 결과
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleSummary {
    /// 평가를 마친 페이지 수
    pub pages_checked: usize,
    /// 평가에 실패한 페이지 수
    pub pages_failed: usize,
    /// 취소로 건너뛴 페이지 수
    pub pages_skipped: usize,
    /// 새로 큐에 수용된 이슈 수
    pub issues_detected: usize,
    /// 해결된 이슈 수
    pub issues_resolved: usize,
    /// 이관된 이슈 수
    pub issues_escalated: usize,
    /// 실행된 수정 시도 수
    pub fix_attempts: usize,
    /// 사이클 종료 시점의 열린 이슈 수
    pub open_issues: usize,
    /// 소요 시간 (밀리초)
    pub duration_ms: u64,
}

/// `getStatus` 응답
#[derive(Debug, Clone, serde::Serialize)]
pub struct GuardStatus {
    /// 실행 중 여부
    pub running: bool,
    /// 마지막 사이클 기준 모니터링 페이지 수
    pub pages_monitored: u64,
    /// 현재 열린 이슈 수
    pub active_issues: usize,
}

/// 사이클 실행 결과 (내부)
enum CycleRun {
    /// 이전 사이클이 아직 진행 중
    InProgress,
    /// 페이지 목록 조회 실패 -- 사이클 스킵
    ListFailed(PlatformError),
    /// 정상 완료
    Completed(CycleSummary),
}

/// 페이지 하나의 처리 결과 (내부)
#[derive(Debug, Default, Clone, Copy)]
struct PageOutcome {
    skipped: bool,
    failed: bool,
    detected: usize,
    resolved: usize,
    escalated: usize,
    attempts: usize,
}

/// 사이클 태스크에 넘기는 공유 컨텍스트 (내부)
struct CycleContext<P: PlatformClient, S: PageSource> {
    platform: Arc<P>,
    source: Arc<S>,
    evaluator: Arc<HealthEvaluator>,
    classifier: Arc<IssueClassifier>,
    store: Arc<Mutex<SnapshotStore>>,
    queue: Arc<Mutex<RemediationQueue>>,
    executor: Arc<FixExecutor>,
    event_tx: mpsc::Sender<GuardEvent>,
    settings: Arc<RwLock<RuntimeSettings>>,
    counters: GuardCounters,
    cycle_in_flight: Arc<AtomicBool>,
    cancel: CancellationToken,
    max_concurrent_checks: usize,
}

impl<P: PlatformClient, S: PageSource> Clone for CycleContext<P, S> {
    fn clone(&self) -> Self {
        Self {
            platform: Arc::clone(&self.platform),
            source: Arc::clone(&self.source),
            evaluator: Arc::clone(&self.evaluator),
            classifier: Arc::clone(&self.classifier),
            store: Arc::clone(&self.store),
            queue: Arc::clone(&self.queue),
            executor: Arc::clone(&self.executor),
            event_tx: self.event_tx.clone(),
            settings: Arc::clone(&self.settings),
            counters: self.counters.clone(),
            cycle_in_flight: Arc::clone(&self.cycle_in_flight),
            cancel: self.cancel.clone(),
            max_concurrent_checks: self.max_concurrent_checks,
        }
    }
}

/// 페이지 가드 -- 헬스 평가, 이슈 분류, 자동 수정의 전체 흐름을 관리합니다.
///
/// core의 `Pipeline` trait을 구현하여 `pagewarden-daemon`에서
/// 다른 모듈과 동일한 생명주기(start/stop/health_check)로 관리됩니다.
///
/// # 사용 예시
/// ```ignore
/// use pagewarden_page_guard::{PageGuard, PageGuardBuilder};
///
/// let (mut guard, event_rx) = PageGuardBuilder::new()
///     .config(config)
///     .platform_client(platform)
///     .page_source(source)
///     .content_generator(generator)
///     .build()?;
///
/// // Pipeline trait으로 시작
/// guard.start().await?;
/// ```
pub struct PageGuard<P: PlatformClient, S: PageSource> {
    /// 가드 설정 (빌드 시점 고정분)
    config: PageGuardConfig,
    /// 현재 상태
    state: GuardState,
    /// 플랫폼 클라이언트 (공유)
    platform: Arc<P>,
    /// 페이지 소스 (공유)
    source: Arc<S>,
    /// 헬스 평가기
    evaluator: Arc<HealthEvaluator>,
    /// 이슈 분류기
    classifier: Arc<IssueClassifier>,
    /// 스냅샷 저장소 (사이클 태스크와 공유)
    store: Arc<Mutex<SnapshotStore>>,
    /// 수정 대기열 (사이클 태스크와 공유)
    queue: Arc<Mutex<RemediationQueue>>,
    /// 수정 실행기
    executor: Arc<FixExecutor>,
    /// 이벤트 전송 채널
    event_tx: mpsc::Sender<GuardEvent>,
    /// 런타임 변경 가능 설정
    settings: Arc<RwLock<RuntimeSettings>>,
    /// 사이클 진행 중 플래그 (틱 드롭 판정)
    cycle_in_flight: Arc<AtomicBool>,
    /// 카운터
    counters: GuardCounters,
    /// 루프 취소 토큰
    cancel: Option<CancellationToken>,
    /// 루프 태스크 핸들
    task: Option<JoinHandle<()>>,
}

impl<P: PlatformClient, S: PageSource> PageGuard<P, S> {
    /// 현재 상태명을 반환합니다.
    pub fn state_name(&self) -> &str {
        match self.state {
            GuardState::Initialized => "initialized",
            GuardState::Running => "running",
            GuardState::Stopped => "stopped",
        }
    }

    /// 완료된 사이클 수를 반환합니다.
    pub fn cycles_completed(&self) -> u64 {
        self.counters.cycles_completed.load(Ordering::Relaxed)
    }

    /// 드롭된 틱 수를 반환합니다.
    pub fn ticks_dropped(&self) -> u64 {
        self.counters.ticks_dropped.load(Ordering::Relaxed)
    }

    /// 큐에 수용된 이슈 수를 반환합니다.
    pub fn issues_detected(&self) -> u64 {
        self.counters.issues_detected.load(Ordering::Relaxed)
    }

    /// 해결된 이슈 수를 반환합니다.
    pub fn issues_resolved(&self) -> u64 {
        self.counters.issues_resolved.load(Ordering::Relaxed)
    }

    /// 이관된 이슈 수를 반환합니다.
    pub fn issues_escalated(&self) -> u64 {
        self.counters.issues_escalated.load(Ordering::Relaxed)
    }

    /// 실행된 수정 시도 수를 반환합니다.
    pub fn fix_attempts(&self) -> u64 {
        self.counters.fix_attempts.load(Ordering::Relaxed)
    }

    /// 현재 열린 이슈 수를 반환합니다.
    pub async fn open_issue_count(&self) -> usize {
        self.queue.lock().await.open_count()
    }

    /// 운영용 상태 요약을 반환합니다.
    pub async fn status(&self) -> GuardStatus {
        GuardStatus {
            running: self.state == GuardState::Running,
            pages_monitored: self.counters.pages_monitored.load(Ordering::Relaxed),
            active_issues: self.queue.lock().await.open_count(),
        }
    }

    /// 런타임 설정을 변경합니다.
    ///
    /// 유효성 검증은 호출 시점에 동기적으로 수행되며, 잘못된 값은 아무것도
    /// 적용하지 않고 에러를 반환합니다. 주기 변경은 다음 틱부터 반영됩니다.
    pub async fn update_config(&self, update: GuardConfigUpdate) -> Result<(), PageGuardError> {
        if update.is_empty() {
            return Ok(());
        }

        let mut settings = self.settings.write().await;

        // 변경 결과를 기존 검증 경로로 확인
        let mut candidate = self.config.clone();
        candidate.check_interval_secs = update
            .check_interval_secs
            .unwrap_or(settings.check_interval_secs);
        candidate.confidence_threshold = update
            .confidence_threshold
            .unwrap_or(settings.confidence_threshold);
        candidate.max_fix_attempts = update.max_fix_attempts.unwrap_or(settings.max_fix_attempts);
        candidate.auto_fix = update.auto_fix.unwrap_or(settings.auto_fix);
        candidate.validate()?;

        settings.check_interval_secs = candidate.check_interval_secs;
        settings.confidence_threshold = candidate.confidence_threshold;
        settings.max_fix_attempts = candidate.max_fix_attempts;
        settings.auto_fix = candidate.auto_fix;

        info!(
            check_interval_secs = settings.check_interval_secs,
            confidence_threshold = settings.confidence_threshold,
            max_fix_attempts = settings.max_fix_attempts,
            auto_fix = settings.auto_fix,
            "guard runtime settings updated"
        );
        Ok(())
    }

    /// 사이클 한 번을 즉시 실행합니다 (타이머와 무관).
    ///
    /// CLI의 일회성 점검과 테스트에서 사용합니다. 타이머 사이클이
    /// 진행 중이면 [`PageGuardError::CycleInProgress`]를 반환합니다.
    pub async fn run_once(&self) -> Result<CycleSummary, PageGuardError> {
        let ctx = self.cycle_context(
            self.cancel
                .clone()
                .unwrap_or_else(CancellationToken::new),
        );
        match run_cycle_guarded(&ctx).await {
            CycleRun::InProgress => Err(PageGuardError::CycleInProgress),
            CycleRun::ListFailed(e) => Err(PageGuardError::Platform(e)),
            CycleRun::Completed(summary) => Ok(summary),
        }
    }

    fn cycle_context(&self, cancel: CancellationToken) -> CycleContext<P, S> {
        CycleContext {
            platform: Arc::clone(&self.platform),
            source: Arc::clone(&self.source),
            evaluator: Arc::clone(&self.evaluator),
            classifier: Arc::clone(&self.classifier),
            store: Arc::clone(&self.store),
            queue: Arc::clone(&self.queue),
            executor: Arc::clone(&self.executor),
            event_tx: self.event_tx.clone(),
            settings: Arc::clone(&self.settings),
            counters: self.counters.clone(),
            cycle_in_flight: Arc::clone(&self.cycle_in_flight),
            cancel,
            max_concurrent_checks: self.config.max_concurrent_checks,
        }
    }
}

impl<P: PlatformClient, S: PageSource> Pipeline for PageGuard<P, S> {
    async fn start(&mut self) -> Result<(), PagewardenError> {
        if self.state == GuardState::Running {
            // 멱등: 실행 중 start()는 no-op
            debug!("page guard already running, start() is a no-op");
            return Ok(());
        }

        info!("starting page guard");

        // 플랫폼 연결 확인 -- 실패해도 degraded 모드로 기동
        if self.platform.ping().await.is_err() {
            warn!("platform api not reachable, page guard will run in degraded mode");
        }

        let cancel = CancellationToken::new();
        let ctx = self.cycle_context(cancel.clone());

        let loop_task = tokio::spawn(async move {
            // 기동 직후 1회 즉시 평가
            run_scheduled_cycle(&ctx).await;

            let mut current_cycle: Option<JoinHandle<()>> = None;
            loop {
                let interval_secs = ctx.settings.read().await.check_interval_secs;
                tokio::select! {
                    _ = ctx.cancel.cancelled() => break,
                    _ = tokio::time::sleep(Duration::from_secs(interval_secs)) => {
                        // 이전 사이클 태스크 정리 (완료된 핸들)
                        if let Some(handle) = current_cycle.take() {
                            if handle.is_finished() {
                                let _ = handle.await;
                            } else {
                                current_cycle = Some(handle);
                            }
                        }

                        let tick_ctx = ctx.clone();
                        current_cycle = Some(tokio::spawn(async move {
                            run_scheduled_cycle(&tick_ctx).await;
                        }));
                    }
                }
            }

            // 취소 후에도 진행 중인 사이클은 완료를 기다림
            if let Some(handle) = current_cycle.take() {
                let _ = handle.await;
            }
        });

        self.cancel = Some(cancel);
        self.task = Some(loop_task);
        self.state = GuardState::Running;
        info!("page guard started");
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), PagewardenError> {
        if self.state != GuardState::Running {
            debug!("page guard not running, stop() is a no-op");
            return Ok(());
        }

        info!("stopping page guard");

        // 타이머는 즉시 취소, 진행 중인 사이클은 완료까지 대기
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!(error = %e, "guard loop task join failed");
            }
        }

        self.state = GuardState::Stopped;
        info!("page guard stopped");
        Ok(())
    }

    async fn health_check(&self) -> HealthStatus {
        match self.state {
            GuardState::Running => {
                if self.platform.ping().await.is_err() {
                    return HealthStatus::Degraded("platform api not reachable".to_owned());
                }
                let failures = self.counters.last_cycle_failures.load(Ordering::Relaxed);
                if failures > 0 {
                    HealthStatus::Degraded(format!("{failures} pages failed last cycle"))
                } else {
                    HealthStatus::Healthy
                }
            }
            GuardState::Initialized => HealthStatus::Unhealthy("not started".to_owned()),
            GuardState::Stopped => HealthStatus::Unhealthy("stopped".to_owned()),
        }
    }
}

/// 타이머 틱에서 호출되는 사이클 실행 래퍼
async fn run_scheduled_cycle<P: PlatformClient, S: PageSource>(ctx: &CycleContext<P, S>) {
    match run_cycle_guarded(ctx).await {
        CycleRun::InProgress => {
            ctx.counters.ticks_dropped.fetch_add(1, Ordering::Relaxed);
            counter!(m::PAGE_GUARD_TICKS_DROPPED_TOTAL).increment(1);
            warn!("previous cycle still running, dropping tick");
        }
        CycleRun::ListFailed(e) => {
            warn!(error = %e, "failed to list monitored pages, skipping cycle");
        }
        CycleRun::Completed(summary) => {
            debug!(
                pages = summary.pages_checked,
                failed = summary.pages_failed,
                detected = summary.issues_detected,
                resolved = summary.issues_resolved,
                escalated = summary.issues_escalated,
                duration_ms = summary.duration_ms,
                "cycle completed"
            );
        }
    }
}

/// 사이클 본체: in-flight 가드, 목록 조회, 페이지별 워커 풀, 요약 이벤트.
async fn run_cycle_guarded<P: PlatformClient, S: PageSource>(
    ctx: &CycleContext<P, S>,
) -> CycleRun {
    if ctx.cycle_in_flight.swap(true, Ordering::SeqCst) {
        return CycleRun::InProgress;
    }

    let run = run_cycle(ctx).await;
    ctx.cycle_in_flight.store(false, Ordering::SeqCst);
    run
}

async fn run_cycle<P: PlatformClient, S: PageSource>(ctx: &CycleContext<P, S>) -> CycleRun {
    let started = Instant::now();

    let pages = match ctx.source.list_pages().await {
        Ok(pages) => pages,
        Err(e) => return CycleRun::ListFailed(e),
    };

    ctx.counters
        .pages_monitored
        .store(pages.len() as u64, Ordering::Relaxed);
    #[allow(clippy::cast_precision_loss)]
    gauge!(m::PAGE_GUARD_PAGES_MONITORED).set(pages.len() as f64);

    // 목록에서 빠진 페이지의 스냅샷 정리
    {
        let mut store = ctx.store.lock().await;
        store.retain_pages(pages.iter().map(|p| p.id.as_str()));
    }

    let executor_settings = ctx.settings.read().await.executor_settings();

    // 제한된 워커 풀: min(페이지 수, 상한)
    let pool_size = pages.len().clamp(1, ctx.max_concurrent_checks);
    let semaphore = Arc::new(Semaphore::new(pool_size));

    let mut join_set: JoinSet<PageOutcome> = JoinSet::new();
    for page in pages {
        let permit_sem = Arc::clone(&semaphore);
        let page_ctx = ctx.clone();
        join_set.spawn(async move {
            let Ok(_permit) = permit_sem.acquire_owned().await else {
                return PageOutcome {
                    skipped: true,
                    ..Default::default()
                };
            };

            // stop() 이후에는 새 페이지 처리를 시작하지 않음
            // (이미 실행 중인 페이지는 전략 호출까지 마치고 끝남)
            if page_ctx.cancel.is_cancelled() {
                debug!(page_id = %page.id, "cancellation requested, skipping page");
                return PageOutcome {
                    skipped: true,
                    ..Default::default()
                };
            }

            process_page(&page_ctx, page, executor_settings).await
        });
    }

    let mut summary = CycleSummary::default();
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok(outcome) => {
                if outcome.skipped {
                    summary.pages_skipped += 1;
                    continue;
                }
                summary.pages_checked += 1;
                if outcome.failed {
                    summary.pages_failed += 1;
                }
                summary.issues_detected += outcome.detected;
                summary.issues_resolved += outcome.resolved;
                summary.issues_escalated += outcome.escalated;
                summary.fix_attempts += outcome.attempts;
            }
            Err(e) => {
                // 페이지 태스크 패닉도 사이클을 멈추지 않음
                error!(error = %e, "page worker task failed");
                summary.pages_checked += 1;
                summary.pages_failed += 1;
            }
        }
    }

    summary.open_issues = ctx.queue.lock().await.open_count();
    summary.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    // 카운터/메트릭 갱신
    ctx.counters.cycles_completed.fetch_add(1, Ordering::Relaxed);
    ctx.counters
        .issues_detected
        .fetch_add(summary.issues_detected as u64, Ordering::Relaxed);
    ctx.counters
        .issues_resolved
        .fetch_add(summary.issues_resolved as u64, Ordering::Relaxed);
    ctx.counters
        .issues_escalated
        .fetch_add(summary.issues_escalated as u64, Ordering::Relaxed);
    ctx.counters
        .fix_attempts
        .fetch_add(summary.fix_attempts as u64, Ordering::Relaxed);
    ctx.counters
        .last_cycle_failures
        .store(summary.pages_failed as u64, Ordering::Relaxed);

    counter!(m::PAGE_GUARD_CYCLES_TOTAL).increment(1);
    histogram!(m::PAGE_GUARD_CYCLE_DURATION_SECONDS).record(started.elapsed().as_secs_f64());
    #[allow(clippy::cast_precision_loss)]
    gauge!(m::PAGE_GUARD_OPEN_ISSUES).set(summary.open_issues as f64);

    // 집계 브로드캐스트는 사이클당 정확히 1회
    let event = CycleEvent::new(
        summary.pages_checked,
        summary.pages_failed,
        summary.open_issues,
        summary.issues_detected,
        summary.issues_resolved,
        summary.issues_escalated,
        summary.duration_ms,
    );
    if let Err(e) = ctx.event_tx.send(GuardEvent::Cycle(event)).await {
        error!(error = %e, "failed to send cycle summary event");
    }

    CycleRun::Completed(summary)
}

/// 페이지 한 장 처리: 수집 -> 평가 -> 분류 -> 병합 -> 실행.
///
/// 어떤 실패도 사이클을 중단시키지 않습니다 -- 해당 페이지만 degraded로
/// 기록되고 다음 사이클에 다시 평가됩니다.
async fn process_page<P: PlatformClient, S: PageSource>(
    ctx: &CycleContext<P, S>,
    page: PageInfo,
    executor_settings: ExecutorSettings,
) -> PageOutcome {
    let mut outcome = PageOutcome::default();

    let (candidates, fetch_ok) = match ctx.platform.fetch_metrics(&page).await {
        Ok(raw) => {
            let previous = ctx.store.lock().await.get(&page.id).cloned();
            match ctx.evaluator.evaluate(&page.id, &raw, previous.as_ref()) {
                Ok(snapshot) => {
                    let candidates = ctx.classifier.classify(&snapshot, previous.as_ref());
                    ctx.store.lock().await.upsert(snapshot);
                    (candidates, true)
                }
                Err(e) => {
                    // 분류 에러: 이슈 없음으로 처리하고 루프 계속
                    warn!(page_id = %page.id, error = %e, "health evaluation failed, page degraded this cycle");
                    counter!(m::PAGE_GUARD_PAGE_FAILURES_TOTAL).increment(1);
                    outcome.failed = true;
                    (Vec::new(), false)
                }
            }
        }
        Err(e) => {
            warn!(page_id = %page.id, error = %e, "metric fetch failed, page degraded this cycle");
            counter!(m::PAGE_GUARD_PAGE_FAILURES_TOTAL).increment(1);
            outcome.failed = true;
            let candidates = ctx
                .classifier
                .classify_fetch_failure(&page.id, &e)
                .into_iter()
                .collect();
            (candidates, false)
        }
    };

    let current_types: HashSet<IssueType> =
        candidates.iter().map(|issue| issue.issue_type).collect();

    let admitted = ctx.queue.lock().await.merge(candidates);
    outcome.detected = admitted.len();
    for issue in &admitted {
        info!(
            page_id = %issue.page_id,
            issue_id = %issue.id,
            issue_type = %issue.issue_type,
            severity = %issue.severity,
            confidence = issue.confidence,
            "issue admitted to remediation queue"
        );
        counter!(
            m::PAGE_GUARD_ISSUES_DETECTED_TOTAL,
            m::LABEL_ISSUE_TYPE => issue.issue_type.as_str(),
            m::LABEL_SEVERITY => match issue.severity {
                pagewarden_core::types::Severity::Low => "low",
                pagewarden_core::types::Severity::Medium => "medium",
                pagewarden_core::types::Severity::High => "high",
                pagewarden_core::types::Severity::Critical => "critical",
            }
        )
        .increment(1);

        let event = IssueEvent::new(
            IssueEventKind::Detected,
            issue.page_id.clone(),
            issue.id.clone(),
            issue.issue_type,
            issue.severity,
            issue.title.clone(),
        );
        if let Err(e) = ctx.event_tx.send(GuardEvent::Issue(event)).await {
            error!(error = %e, "failed to send issue-detected event");
        }
    }

    let stats = ctx
        .executor
        .process_page(&page, &ctx.queue, &executor_settings, &current_types, fetch_ok)
        .await;
    outcome.resolved = stats.resolved;
    outcome.escalated = stats.escalated;
    outcome.attempts = stats.attempts;

    outcome
}

/// 페이지 가드 빌더
///
/// 가드를 구성하고 필요한 채널을 생성합니다.
pub struct PageGuardBuilder<P: PlatformClient, S: PageSource, G: ContentGenerator> {
    config: PageGuardConfig,
    platform: Option<Arc<P>>,
    source: Option<Arc<S>>,
    generator: Option<Arc<G>>,
    event_tx: Option<mpsc::Sender<GuardEvent>>,
    extra_strategies: Vec<Box<dyn crate::strategy::FixStrategy>>,
}

impl<P: PlatformClient, S: PageSource, G: ContentGenerator> PageGuardBuilder<P, S, G> {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: PageGuardConfig::default(),
            platform: None,
            source: None,
            generator: None,
            event_tx: None,
            extra_strategies: Vec::new(),
        }
    }

    /// 가드 설정을 지정합니다.
    pub fn config(mut self, config: PageGuardConfig) -> Self {
        self.config = config;
        self
    }

    /// 플랫폼 클라이언트를 설정합니다.
    pub fn platform_client(mut self, platform: Arc<P>) -> Self {
        self.platform = Some(platform);
        self
    }

    /// 페이지 소스를 설정합니다.
    pub fn page_source(mut self, source: Arc<S>) -> Self {
        self.source = Some(source);
        self
    }

    /// 콘텐츠 생성기를 설정합니다.
    pub fn content_generator(mut self, generator: Arc<G>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// 외부 이벤트 전송 채널을 설정합니다.
    ///
    /// 설정하지 않으면 빌더가 새 채널을 생성합니다.
    pub fn event_sender(mut self, tx: mpsc::Sender<GuardEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    /// 기본 세트 외의 수정 전략을 등록합니다 (같은 타입은 교체).
    pub fn strategy(mut self, strategy: Box<dyn crate::strategy::FixStrategy>) -> Self {
        self.extra_strategies.push(strategy);
        self
    }

    /// 가드를 빌드합니다.
    ///
    /// # Returns
    /// - `PageGuard`: 가드 인스턴스
    /// - `Option<mpsc::Receiver<GuardEvent>>`: 이벤트 수신 채널
    ///   (외부 event_sender를 설정한 경우 None)
    #[allow(clippy::type_complexity)]
    pub fn build(
        self,
    ) -> Result<(PageGuard<P, S>, Option<mpsc::Receiver<GuardEvent>>), PageGuardError> {
        self.config.validate()?;

        let platform = self.platform.ok_or_else(|| PageGuardError::Config {
            field: "platform_client".to_owned(),
            reason: "platform client must be provided".to_owned(),
        })?;
        let source = self.source.ok_or_else(|| PageGuardError::Config {
            field: "page_source".to_owned(),
            reason: "page source must be provided".to_owned(),
        })?;
        let generator = self.generator.ok_or_else(|| PageGuardError::Config {
            field: "content_generator".to_owned(),
            reason: "content generator must be provided".to_owned(),
        })?;

        let (event_tx, event_rx) = if let Some(tx) = self.event_tx {
            (tx, None)
        } else {
            let (tx, rx) = mpsc::channel(self.config.event_channel_capacity);
            (tx, Some(rx))
        };

        let mut registry = StrategyRegistry::with_defaults(
            Arc::clone(&platform),
            generator,
            self.config.suggestions_per_fix,
        );
        for strategy in self.extra_strategies {
            registry.register(strategy);
        }
        let registry = Arc::new(registry);

        let executor = Arc::new(FixExecutor::new(
            Arc::clone(&registry),
            event_tx.clone(),
            Duration::from_secs(self.config.action_timeout_secs),
        ));

        let settings = RuntimeSettings {
            check_interval_secs: self.config.check_interval_secs,
            confidence_threshold: self.config.confidence_threshold,
            max_fix_attempts: self.config.max_fix_attempts,
            auto_fix: self.config.auto_fix,
        };

        let guard = PageGuard {
            classifier: Arc::new(IssueClassifier::new(self.config.classifier.clone())),
            queue: Arc::new(Mutex::new(RemediationQueue::new(
                self.config.resolved_history_cap,
            ))),
            config: self.config,
            state: GuardState::Initialized,
            platform,
            source,
            evaluator: Arc::new(HealthEvaluator::new()),
            store: Arc::new(Mutex::new(SnapshotStore::new())),
            executor,
            event_tx,
            settings: Arc::new(RwLock::new(settings)),
            cycle_in_flight: Arc::new(AtomicBool::new(false)),
            counters: GuardCounters::default(),
            cancel: None,
            task: None,
        };

        Ok((guard, event_rx))
    }
}

impl<P: PlatformClient, S: PageSource, G: ContentGenerator> Default for PageGuardBuilder<P, S, G> {
    fn default() -> Self {
        Self::new()
    }
}
