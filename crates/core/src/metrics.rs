//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`,
//! `metrics::histogram!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `pagewarden_`
//! - 모듈명: `page_guard_`, `daemon_`
//! - 접미어: `_total` (counter), `_seconds` (histogram/latency), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(pagewarden_core::metrics::PAGE_GUARD_CYCLES_TOTAL).increment(1);
//! ```

use metrics::{describe_counter, describe_gauge, describe_histogram};

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 심각도 레이블 키 (low, medium, high, critical)
pub const LABEL_SEVERITY: &str = "severity";

/// 이슈 타입 레이블 키 (engagement_drop, content_quality, ...)
pub const LABEL_ISSUE_TYPE: &str = "issue_type";

/// 결과 레이블 키 (success, partial, failed)
pub const LABEL_RESULT: &str = "result";

/// 모듈 레이블 키
pub const LABEL_MODULE: &str = "module";

// ─── Page Guard 메트릭 ─────────────────────────────────────────────

/// Page Guard: 모니터링 중인 페이지 수 (gauge)
pub const PAGE_GUARD_PAGES_MONITORED: &str = "pagewarden_page_guard_pages_monitored";

/// Page Guard: 완료된 사이클 수 (counter)
pub const PAGE_GUARD_CYCLES_TOTAL: &str = "pagewarden_page_guard_cycles_total";

/// Page Guard: 이전 사이클 미완료로 드롭된 틱 수 (counter)
pub const PAGE_GUARD_TICKS_DROPPED_TOTAL: &str = "pagewarden_page_guard_ticks_dropped_total";

/// Page Guard: 사이클 소요 시간 (histogram, 초)
pub const PAGE_GUARD_CYCLE_DURATION_SECONDS: &str =
    "pagewarden_page_guard_cycle_duration_seconds";

/// Page Guard: 탐지된 이슈 수 (counter, label: issue_type, severity)
pub const PAGE_GUARD_ISSUES_DETECTED_TOTAL: &str = "pagewarden_page_guard_issues_detected_total";

/// Page Guard: 해결된 이슈 수 (counter, label: issue_type)
pub const PAGE_GUARD_ISSUES_RESOLVED_TOTAL: &str = "pagewarden_page_guard_issues_resolved_total";

/// Page Guard: 이관된 이슈 수 (counter, label: issue_type)
pub const PAGE_GUARD_ISSUES_ESCALATED_TOTAL: &str =
    "pagewarden_page_guard_issues_escalated_total";

/// Page Guard: 수정 시도 수 (counter, label: issue_type, result)
pub const PAGE_GUARD_FIX_ATTEMPTS_TOTAL: &str = "pagewarden_page_guard_fix_attempts_total";

/// Page Guard: 열린 이슈 수 (gauge)
pub const PAGE_GUARD_OPEN_ISSUES: &str = "pagewarden_page_guard_open_issues";

/// Page Guard: 페이지 평가 실패 수 (counter)
pub const PAGE_GUARD_PAGE_FAILURES_TOTAL: &str = "pagewarden_page_guard_page_failures_total";

// ─── Daemon 메트릭 ─────────────────────────────────────────────────

/// Daemon: 가동 시간 (gauge, 초)
pub const DAEMON_UPTIME_SECONDS: &str = "pagewarden_daemon_uptime_seconds";

/// Daemon: 빌드 정보 (gauge, 항상 1, label: version)
pub const DAEMON_BUILD_INFO: &str = "pagewarden_daemon_build_info";

/// Daemon: 등록된 모듈 수 (gauge)
pub const DAEMON_MODULES_REGISTERED: &str = "pagewarden_daemon_modules_registered";

/// 모든 메트릭의 설명을 등록합니다.
///
/// Prometheus recorder 설치 직후 한 번 호출합니다.
pub fn describe_all() {
    describe_gauge!(
        PAGE_GUARD_PAGES_MONITORED,
        "Number of pages currently monitored"
    );
    describe_counter!(PAGE_GUARD_CYCLES_TOTAL, "Completed reconciliation cycles");
    describe_counter!(
        PAGE_GUARD_TICKS_DROPPED_TOTAL,
        "Timer ticks dropped because the previous cycle was still running"
    );
    describe_histogram!(
        PAGE_GUARD_CYCLE_DURATION_SECONDS,
        "Wall-clock duration of a full reconciliation cycle"
    );
    describe_counter!(PAGE_GUARD_ISSUES_DETECTED_TOTAL, "Issues admitted to the queue");
    describe_counter!(PAGE_GUARD_ISSUES_RESOLVED_TOTAL, "Issues resolved");
    describe_counter!(PAGE_GUARD_ISSUES_ESCALATED_TOTAL, "Issues escalated to a human");
    describe_counter!(PAGE_GUARD_FIX_ATTEMPTS_TOTAL, "Fix strategy executions");
    describe_gauge!(PAGE_GUARD_OPEN_ISSUES, "Issues currently open in the queue");
    describe_counter!(
        PAGE_GUARD_PAGE_FAILURES_TOTAL,
        "Per-page evaluation failures (cycle continued)"
    );
    describe_gauge!(DAEMON_UPTIME_SECONDS, "Daemon uptime in seconds");
    describe_gauge!(DAEMON_BUILD_INFO, "Build information (always 1, version label)");
    describe_gauge!(DAEMON_MODULES_REGISTERED, "Number of registered modules");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_names_have_prefix() {
        for name in [
            PAGE_GUARD_PAGES_MONITORED,
            PAGE_GUARD_CYCLES_TOTAL,
            PAGE_GUARD_TICKS_DROPPED_TOTAL,
            PAGE_GUARD_CYCLE_DURATION_SECONDS,
            PAGE_GUARD_ISSUES_DETECTED_TOTAL,
            PAGE_GUARD_ISSUES_RESOLVED_TOTAL,
            PAGE_GUARD_ISSUES_ESCALATED_TOTAL,
            PAGE_GUARD_FIX_ATTEMPTS_TOTAL,
            PAGE_GUARD_OPEN_ISSUES,
            PAGE_GUARD_PAGE_FAILURES_TOTAL,
            DAEMON_UPTIME_SECONDS,
            DAEMON_MODULES_REGISTERED,
        ] {
            assert!(name.starts_with("pagewarden_"), "{name}");
        }
    }

    #[test]
    fn describe_all_does_not_panic_without_recorder() {
        // recorder가 설치되지 않은 상태에서도 no-op으로 동작해야 함
        describe_all();
    }
}
