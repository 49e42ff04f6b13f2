//! 이벤트 시스템 — 모듈 간 통신의 기본 단위
//!
//! 페이지 가드는 이슈 생명주기 전이와 사이클 요약을 이벤트로 발행하고,
//! 데몬의 이벤트 싱크 태스크가 이를 소비합니다.
//! [`EventMetadata`]는 모든 이벤트에 공통으로 포함되는 메타데이터이며,
//! [`Event`] trait은 모든 이벤트 타입이 구현해야 하는 인터페이스입니다.

use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::types::{IssueType, Severity};

// --- 모듈명 상수 ---

/// 페이지 가드 모듈명
pub const MODULE_PAGE_GUARD: &str = "page-guard";

// --- 이벤트 타입 상수 ---

/// 이슈 탐지 이벤트 타입
pub const EVENT_TYPE_ISSUE_DETECTED: &str = "issue-detected";
/// 이슈 해결 이벤트 타입
pub const EVENT_TYPE_ISSUE_RESOLVED: &str = "issue-resolved";
/// 이슈 에스컬레이션 이벤트 타입
pub const EVENT_TYPE_ISSUE_ESCALATED: &str = "issue-escalated";
/// 사이클 요약 이벤트 타입
pub const EVENT_TYPE_CYCLE_SUMMARY: &str = "cycle-summary";

/// 이벤트 메타데이터 — 모든 이벤트에 공통으로 포함되는 추적 정보
///
/// 각 이벤트의 발생 시각, 생성 모듈, 분산 추적 ID를 담고 있어
/// 이벤트 흐름을 추적하고 디버깅할 수 있습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMetadata {
    /// 이벤트 발생 시각
    pub timestamp: SystemTime,
    /// 이벤트를 생성한 모듈명
    pub source_module: String,
    /// 분산 추적 ID — 같은 흐름의 이벤트를 연결합니다
    pub trace_id: String,
}

impl EventMetadata {
    /// 기존 trace_id를 사용하여 새 메타데이터를 생성합니다.
    pub fn new(source_module: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self {
            timestamp: SystemTime::now(),
            source_module: source_module.into(),
            trace_id: trace_id.into(),
        }
    }

    /// 새로운 UUID v4 trace_id를 생성하여 메타데이터를 만듭니다.
    pub fn with_new_trace(source_module: impl Into<String>) -> Self {
        Self {
            timestamp: SystemTime::now(),
            source_module: source_module.into(),
            trace_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

impl fmt::Display for EventMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] source={} trace={}",
            unix_timestamp_str(self.timestamp),
            self.source_module,
            self.trace_id,
        )
    }
}

/// 모든 이벤트가 구현해야 하는 기본 trait
///
/// `Send + Sync + 'static` 바운드로 `tokio::mpsc` 채널을 통한
/// 안전한 전송을 보장합니다.
pub trait Event: Send + Sync + 'static {
    /// 이벤트 고유 ID (UUID v4)
    fn event_id(&self) -> &str;

    /// 이벤트 메타데이터 (timestamp, source_module, trace_id)
    fn metadata(&self) -> &EventMetadata;

    /// 이벤트 타입명 (로깅 및 라우팅에 사용)
    fn event_type(&self) -> &str;
}

/// 이슈 생명주기 이벤트의 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueEventKind {
    /// 새 이슈가 큐에 등록됨
    Detected,
    /// 이슈가 해결됨 (전략 성공 또는 회복 감지)
    Resolved,
    /// 이슈가 사람에게 이관됨
    Escalated,
}

impl IssueEventKind {
    /// 이벤트 타입 문자열을 반환합니다.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Detected => EVENT_TYPE_ISSUE_DETECTED,
            Self::Resolved => EVENT_TYPE_ISSUE_RESOLVED,
            Self::Escalated => EVENT_TYPE_ISSUE_ESCALATED,
        }
    }
}

/// 이슈 생명주기 전이 이벤트
///
/// 상태 전이당 정확히 한 번 발행됩니다 — 종결 상태에 머무는 이슈에 대해
/// 사이클마다 반복 발행되지 않습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueEvent {
    /// 이벤트 고유 ID
    pub id: String,
    /// 이벤트 메타데이터
    pub metadata: EventMetadata,
    /// 대상 페이지 ID
    pub page_id: String,
    /// 대상 이슈 ID
    pub issue_id: String,
    /// 이슈 타입
    pub issue_type: IssueType,
    /// 심각도
    pub severity: Severity,
    /// 이벤트 종류
    pub kind: IssueEventKind,
    /// 이슈 제목
    pub title: String,
}

impl IssueEvent {
    /// 새로운 trace를 시작하는 이슈 이벤트를 생성합니다.
    pub fn new(
        kind: IssueEventKind,
        page_id: impl Into<String>,
        issue_id: impl Into<String>,
        issue_type: IssueType,
        severity: Severity,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            metadata: EventMetadata::with_new_trace(MODULE_PAGE_GUARD),
            page_id: page_id.into(),
            issue_id: issue_id.into(),
            issue_type,
            severity,
            kind,
            title: title.into(),
        }
    }

    /// 기존 trace에 연결된 이슈 이벤트를 생성합니다.
    pub fn with_trace(
        kind: IssueEventKind,
        page_id: impl Into<String>,
        issue_id: impl Into<String>,
        issue_type: IssueType,
        severity: Severity,
        title: impl Into<String>,
        trace_id: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            metadata: EventMetadata::new(MODULE_PAGE_GUARD, trace_id),
            page_id: page_id.into(),
            issue_id: issue_id.into(),
            issue_type,
            severity,
            kind,
            title: title.into(),
        }
    }
}

impl Event for IssueEvent {
    fn event_id(&self) -> &str {
        &self.id
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    fn event_type(&self) -> &str {
        self.kind.event_type()
    }
}

impl fmt::Display for IssueEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "IssueEvent[{}] {} page={} issue={} severity={}",
            &self.id[..8.min(self.id.len())],
            self.kind.event_type(),
            self.page_id,
            &self.issue_id[..8.min(self.issue_id.len())],
            self.severity,
        )
    }
}

/// 사이클 요약 이벤트
///
/// 한 사이클이 끝날 때 정확히 한 번 발행됩니다.
/// 페이지 목록 조회 자체가 실패한 사이클에는 발행되지 않습니다 (부분 요약 금지).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleEvent {
    /// 이벤트 고유 ID
    pub id: String,
    /// 이벤트 메타데이터
    pub metadata: EventMetadata,
    /// 평가한 페이지 수
    pub pages_checked: usize,
    /// 평가에 실패한 페이지 수
    pub pages_failed: usize,
    /// 사이클 종료 시점의 열린 이슈 수
    pub open_issues: usize,
    /// 이번 사이클에 새로 탐지된 이슈 수
    pub issues_detected: usize,
    /// 이번 사이클에 해결된 이슈 수
    pub issues_resolved: usize,
    /// 이번 사이클에 이관된 이슈 수
    pub issues_escalated: usize,
    /// 사이클 소요 시간 (밀리초)
    pub duration_ms: u64,
}

impl CycleEvent {
    /// 새 사이클 요약 이벤트를 생성합니다.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pages_checked: usize,
        pages_failed: usize,
        open_issues: usize,
        issues_detected: usize,
        issues_resolved: usize,
        issues_escalated: usize,
        duration_ms: u64,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            metadata: EventMetadata::with_new_trace(MODULE_PAGE_GUARD),
            pages_checked,
            pages_failed,
            open_issues,
            issues_detected,
            issues_resolved,
            issues_escalated,
            duration_ms,
        }
    }
}

impl Event for CycleEvent {
    fn event_id(&self) -> &str {
        &self.id
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    fn event_type(&self) -> &str {
        EVENT_TYPE_CYCLE_SUMMARY
    }
}

impl fmt::Display for CycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CycleEvent[{}] pages={} failed={} open={} detected={} resolved={} escalated={} took={}ms",
            &self.id[..8.min(self.id.len())],
            self.pages_checked,
            self.pages_failed,
            self.open_issues,
            self.issues_detected,
            self.issues_resolved,
            self.issues_escalated,
            self.duration_ms,
        )
    }
}

/// 페이지 가드가 발행하는 모든 이벤트
///
/// 가드 → 데몬 이벤트 싱크로 가는 단일 mpsc 채널에 실립니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GuardEvent {
    /// 이슈 생명주기 전이
    Issue(IssueEvent),
    /// 사이클 요약
    Cycle(CycleEvent),
}

impl Event for GuardEvent {
    fn event_id(&self) -> &str {
        match self {
            Self::Issue(e) => e.event_id(),
            Self::Cycle(e) => e.event_id(),
        }
    }

    fn metadata(&self) -> &EventMetadata {
        match self {
            Self::Issue(e) => e.metadata(),
            Self::Cycle(e) => e.metadata(),
        }
    }

    fn event_type(&self) -> &str {
        match self {
            Self::Issue(e) => e.event_type(),
            Self::Cycle(e) => e.event_type(),
        }
    }
}

impl fmt::Display for GuardEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Issue(e) => e.fmt(f),
            Self::Cycle(e) => e.fmt(f),
        }
    }
}

/// SystemTime을 사람이 읽을 수 있는 형태로 변환합니다.
fn unix_timestamp_str(time: SystemTime) -> String {
    match time.duration_since(SystemTime::UNIX_EPOCH) {
        Ok(duration) => {
            let secs = duration.as_secs();
            format!("{secs}")
        }
        Err(_) => "unknown".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_event_kind_maps_to_event_type() {
        assert_eq!(IssueEventKind::Detected.event_type(), "issue-detected");
        assert_eq!(IssueEventKind::Resolved.event_type(), "issue-resolved");
        assert_eq!(IssueEventKind::Escalated.event_type(), "issue-escalated");
    }

    #[test]
    fn issue_event_has_unique_id_and_trace() {
        let e1 = IssueEvent::new(
            IssueEventKind::Detected,
            "page-1",
            "issue-1",
            IssueType::EngagementDrop,
            Severity::High,
            "Engagement drop",
        );
        let e2 = IssueEvent::new(
            IssueEventKind::Detected,
            "page-1",
            "issue-1",
            IssueType::EngagementDrop,
            Severity::High,
            "Engagement drop",
        );
        assert_ne!(e1.id, e2.id);
        assert_ne!(e1.metadata.trace_id, e2.metadata.trace_id);
        assert_eq!(e1.metadata.source_module, MODULE_PAGE_GUARD);
    }

    #[test]
    fn issue_event_with_trace_preserves_trace_id() {
        let e = IssueEvent::with_trace(
            IssueEventKind::Escalated,
            "page-2",
            "issue-2",
            IssueType::PolicyCompliance,
            Severity::Critical,
            "Compliance violation",
            "trace-abc",
        );
        assert_eq!(e.metadata.trace_id, "trace-abc");
        assert_eq!(e.event_type(), "issue-escalated");
    }

    #[test]
    fn cycle_event_type_is_cycle_summary() {
        let e = CycleEvent::new(5, 1, 3, 2, 1, 0, 1234);
        assert_eq!(e.event_type(), EVENT_TYPE_CYCLE_SUMMARY);
        assert_eq!(e.pages_checked, 5);
        assert_eq!(e.duration_ms, 1234);
    }

    #[test]
    fn guard_event_delegates_to_inner() {
        let issue_event = IssueEvent::new(
            IssueEventKind::Resolved,
            "page-1",
            "issue-1",
            IssueType::TechnicalAccess,
            Severity::High,
            "Access restored",
        );
        let id = issue_event.id.clone();
        let wrapped = GuardEvent::Issue(issue_event);
        assert_eq!(wrapped.event_id(), id);
        assert_eq!(wrapped.event_type(), "issue-resolved");

        let cycle = GuardEvent::Cycle(CycleEvent::new(1, 0, 0, 0, 0, 0, 10));
        assert_eq!(cycle.event_type(), "cycle-summary");
    }

    #[test]
    fn guard_event_serialize_roundtrip() {
        let event = GuardEvent::Cycle(CycleEvent::new(2, 0, 1, 1, 0, 0, 55));
        let json = serde_json::to_string(&event).unwrap();
        let back: GuardEvent = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, GuardEvent::Cycle(c) if c.pages_checked == 2));
    }

    #[test]
    fn event_display_contains_key_fields() {
        let e = IssueEvent::new(
            IssueEventKind::Detected,
            "page-7",
            "11112222-3333-4444-5555-666677778888",
            IssueType::ContentQuality,
            Severity::Medium,
            "Quality below floor",
        );
        let shown = e.to_string();
        assert!(shown.contains("page-7"));
        assert!(shown.contains("issue-detected"));
    }
}
