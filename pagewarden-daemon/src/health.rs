//! Aggregated health check reporting.
//!
//! Collects each module's `health_check()` result and produces a unified
//! [`DaemonHealth`] report. The overall daemon status is the worst status
//! among all enabled modules.
//!
//! # Aggregation Rule
//!
//! - All Healthy -> Healthy
//! - Any Degraded, none Unhealthy -> Degraded(reason)
//! - Any Unhealthy -> Unhealthy(reason)

use serde::Serialize;

use pagewarden_core::pipeline::HealthStatus;

/// Aggregated health report for the entire daemon.
#[derive(Debug, Clone, Serialize)]
pub struct DaemonHealth {
    /// Overall daemon health status (worst of all modules).
    pub status: HealthStatus,
    /// Daemon uptime in seconds since start.
    pub uptime_secs: u64,
    /// Per-module health reports.
    pub modules: Vec<ModuleHealth>,
}

/// Health status for a single module.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleHealth {
    /// Module name (e.g., "page-guard").
    pub name: String,
    /// Whether the module is enabled in configuration.
    pub enabled: bool,
    /// Current health status of the module.
    pub status: HealthStatus,
}

/// Aggregate multiple module health statuses into a single status.
///
/// Returns the worst status found: Unhealthy > Degraded > Healthy.
/// Only considers enabled modules.
pub fn aggregate_status(modules: &[ModuleHealth]) -> HealthStatus {
    let enabled_modules = modules.iter().filter(|m| m.enabled);

    let mut worst = HealthStatus::Healthy;
    let mut reasons = Vec::new();

    for module in enabled_modules {
        match &module.status {
            HealthStatus::Healthy => {}
            HealthStatus::Degraded(reason) => {
                if !worst.is_unhealthy() {
                    reasons.push(format!("{}: {}", module.name, reason));
                    worst = HealthStatus::Degraded(String::new());
                }
            }
            HealthStatus::Unhealthy(reason) => {
                reasons.push(format!("{}: {}", module.name, reason));
                worst = HealthStatus::Unhealthy(String::new());
            }
        }
    }

    match worst {
        HealthStatus::Healthy => HealthStatus::Healthy,
        HealthStatus::Degraded(_) => HealthStatus::Degraded(reasons.join("; ")),
        HealthStatus::Unhealthy(_) => HealthStatus::Unhealthy(reasons.join("; ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(name: &str, enabled: bool, status: HealthStatus) -> ModuleHealth {
        ModuleHealth {
            name: name.to_owned(),
            enabled,
            status,
        }
    }

    #[test]
    fn all_healthy() {
        let modules = vec![module("page-guard", true, HealthStatus::Healthy)];
        assert_eq!(aggregate_status(&modules), HealthStatus::Healthy);
    }

    #[test]
    fn degraded_wins_over_healthy() {
        let modules = vec![
            module("page-guard", true, HealthStatus::Healthy),
            module(
                "other",
                true,
                HealthStatus::Degraded("api slow".to_owned()),
            ),
        ];
        let status = aggregate_status(&modules);
        assert!(matches!(status, HealthStatus::Degraded(reason) if reason.contains("api slow")));
    }

    #[test]
    fn unhealthy_wins_over_degraded() {
        let modules = vec![
            module(
                "page-guard",
                true,
                HealthStatus::Degraded("slow".to_owned()),
            ),
            module("other", true, HealthStatus::Unhealthy("down".to_owned())),
        ];
        let status = aggregate_status(&modules);
        assert!(matches!(status, HealthStatus::Unhealthy(reason) if reason.contains("down")));
    }

    #[test]
    fn disabled_modules_are_ignored() {
        let modules = vec![
            module("page-guard", true, HealthStatus::Healthy),
            module(
                "disabled",
                false,
                HealthStatus::Unhealthy("not started".to_owned()),
            ),
        ];
        assert_eq!(aggregate_status(&modules), HealthStatus::Healthy);
    }

    #[test]
    fn empty_module_list_is_healthy() {
        assert_eq!(aggregate_status(&[]), HealthStatus::Healthy);
    }

    #[test]
    fn multiple_reasons_joined() {
        let modules = vec![
            module("a", true, HealthStatus::Unhealthy("down".to_owned())),
            module("b", true, HealthStatus::Unhealthy("broken".to_owned())),
        ];
        let status = aggregate_status(&modules);
        assert!(
            matches!(status, HealthStatus::Unhealthy(reason) if reason.contains("down") && reason.contains("broken"))
        );
    }
}
