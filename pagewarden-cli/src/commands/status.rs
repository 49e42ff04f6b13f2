//! `pagewarden status` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

use pagewarden_core::config::PagewardenConfig;

use crate::cli::StatusArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `status` command.
pub async fn execute(
    args: StatusArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let config = PagewardenConfig::load(config_path).await?;

    let report = build_status_report(&config, args.verbose);

    writer.render(&report)?;

    Ok(())
}

fn build_status_report(config: &PagewardenConfig, verbose: bool) -> StatusReport {
    // Check if daemon is running by checking PID file
    let daemon_running = check_daemon_status(&config.general.pid_file);

    let mut modules = Vec::new();

    if config.guard.enabled {
        modules.push(ModuleStatus {
            name: "page-guard".to_owned(),
            enabled: true,
            health: if daemon_running {
                "running".to_owned()
            } else {
                "stopped".to_owned()
            },
            details: if verbose {
                Some(format!(
                    "pages={}, interval={}s, auto_fix={}, confidence_threshold={}, max_fix_attempts={}",
                    config.pages.len(),
                    config.guard.check_interval_secs,
                    config.guard.auto_fix,
                    config.guard.confidence_threshold,
                    config.guard.max_fix_attempts,
                ))
            } else {
                None
            },
        });
    }

    StatusReport {
        daemon_running,
        modules,
    }
}

/// Check if daemon is running by reading PID file and checking process
/// existence.
fn check_daemon_status(pid_file: &str) -> bool {
    let pid_path = std::path::Path::new(pid_file);

    if !pid_path.exists() {
        debug!(pid_file, "pid file does not exist");
        return false;
    }

    let pid_content = match std::fs::read_to_string(pid_path) {
        Ok(content) => content,
        Err(e) => {
            warn!(pid_file, error = %e, "failed to read pid file");
            return false;
        }
    };

    let pid = match pid_content.trim().parse::<u32>() {
        Ok(p) => p,
        Err(e) => {
            warn!(pid_file, error = %e, "failed to parse pid");
            return false;
        }
    };

    is_process_alive(pid)
}

/// Check if a process with the given PID is alive.
#[cfg(unix)]
fn is_process_alive(pid: u32) -> bool {
    use std::io::ErrorKind;

    // Send signal 0 to check if process exists
    // SAFETY: kill(2) with signal 0 is safe and does not affect the target process
    let result = unsafe { libc::kill(pid as libc::pid_t, 0) };

    if result == 0 {
        true
    } else {
        let err = std::io::Error::last_os_error();
        match err.kind() {
            ErrorKind::PermissionDenied => true, // Process exists but we can't signal it
            _ => false,
        }
    }
}

#[cfg(not(unix))]
fn is_process_alive(_pid: u32) -> bool {
    warn!("process liveness check not supported on this platform");
    false
}

#[derive(Serialize)]
pub struct StatusReport {
    pub daemon_running: bool,
    pub modules: Vec<ModuleStatus>,
}

#[derive(Serialize)]
pub struct ModuleStatus {
    pub name: String,
    pub enabled: bool,
    pub health: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl Render for StatusReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(
            w,
            "daemon: {}",
            if self.daemon_running {
                "running"
            } else {
                "stopped"
            }
        )?;

        if self.modules.is_empty() {
            writeln!(w, "no modules enabled")?;
            return Ok(());
        }

        writeln!(w, "{:<16} {:<10} {:<10}", "MODULE", "ENABLED", "HEALTH")?;
        for module in &self.modules {
            writeln!(
                w,
                "{:<16} {:<10} {:<10}",
                module.name, module.enabled, module.health
            )?;
            if let Some(details) = &module.details {
                writeln!(w, "  {details}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_with_guard_disabled_has_no_modules() {
        let config = PagewardenConfig::default();
        let report = build_status_report(&config, false);
        assert!(report.modules.is_empty());
    }

    #[test]
    fn report_with_guard_enabled_lists_module() {
        let mut config = PagewardenConfig::default();
        config.guard.enabled = true;
        let report = build_status_report(&config, true);
        assert_eq!(report.modules.len(), 1);
        assert_eq!(report.modules[0].name, "page-guard");
        assert!(report.modules[0].details.as_ref().unwrap().contains("interval=300s"));
    }

    #[test]
    fn missing_pid_file_means_stopped() {
        assert!(!check_daemon_status("/nonexistent/pagewarden.pid"));
    }

    #[test]
    fn own_pid_is_alive() {
        assert!(is_process_alive(std::process::id()));
    }

    #[test]
    fn render_text_contains_daemon_state() {
        let report = StatusReport {
            daemon_running: false,
            modules: Vec::new(),
        };
        let mut buf = Vec::new();
        report.render_text(&mut buf).unwrap();
        let shown = String::from_utf8(buf).unwrap();
        assert!(shown.contains("daemon: stopped"));
    }
}
