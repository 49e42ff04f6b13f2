//! Module orchestration -- assembly, channel wiring, and lifecycle management.
//!
//! The [`Orchestrator`] is the central coordinator of `pagewarden-daemon`.
//! It loads configuration, builds enabled modules, manages startup/shutdown
//! ordering, runs the guard-event sink task, and waits for shutdown signals.
//!
//! # Event Sink
//!
//! The page guard pushes structured [`GuardEvent`]s (issue-detected,
//! issue-resolved, issue-escalated, cycle-summary) into an mpsc channel.
//! The orchestrator's event sink task consumes and logs them; sink failures
//! never propagate back into the control loop.

use std::path::Path;
use std::time::Instant;

use anyhow::Result;
use tokio::sync::{broadcast, mpsc};

use pagewarden_core::config::PagewardenConfig;
use pagewarden_core::event::{Event, GuardEvent};

use crate::health::{DaemonHealth, ModuleHealth, aggregate_status};
use crate::metrics_server;
use crate::modules::{ModuleRegistry, page_guard};

/// The main daemon orchestrator.
///
/// Manages the complete lifecycle of all pagewarden modules:
/// configuration loading, module wiring, ordered startup,
/// health reporting, and graceful shutdown.
pub struct Orchestrator {
    /// Loaded and validated configuration.
    config: PagewardenConfig,
    /// Registry of all modules (ordered for start/stop).
    modules: ModuleRegistry,
    /// Shutdown broadcast sender (signals all background tasks).
    shutdown_tx: broadcast::Sender<()>,
    /// Daemon start time (for uptime reporting).
    start_time: Instant,
    /// Guard event receiver (consumed by the event sink task).
    guard_event_rx: Option<mpsc::Receiver<GuardEvent>>,
}

impl Orchestrator {
    /// Load configuration and build the orchestrator.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file cannot be read or parsed
    /// - Configuration validation fails
    /// - Any enabled module fails to initialize
    pub async fn build(config_path: &Path) -> Result<Self> {
        let config = PagewardenConfig::load(config_path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?;
        Self::build_from_config(config)
    }

    /// Build from an already-loaded configuration.
    ///
    /// Useful for testing or when config has already been loaded.
    pub fn build_from_config(config: PagewardenConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

        // Install metrics recorder before module initialization
        if config.metrics.enabled {
            metrics_server::install_metrics_recorder(&config.metrics)?;
            tracing::info!(port = config.metrics.port, "metrics endpoint enabled");
        }

        let (shutdown_tx, _) = broadcast::channel(16);

        let mut modules = ModuleRegistry::new();
        let mut guard_event_rx = None;

        if let Some((handle, event_rx)) = page_guard::init(&config)? {
            modules.register(handle);
            guard_event_rx = Some(event_rx);
        }

        tracing::info!(total_modules = modules.count(), "orchestrator initialized");

        if config.metrics.enabled {
            record_daemon_metrics(modules.count());
        }

        Ok(Self {
            config,
            modules,
            shutdown_tx,
            start_time: Instant::now(),
            guard_event_rx,
        })
    }

    /// Start all enabled modules and enter the main event loop.
    ///
    /// This method blocks until a shutdown signal is received.
    ///
    /// # Shutdown Triggers
    ///
    /// - `SIGTERM` (from systemd, Docker, or `kill`)
    /// - `SIGINT` (Ctrl+C)
    pub async fn run(&mut self) -> Result<()> {
        // Write PID file if configured
        if !self.config.general.pid_file.is_empty() {
            let path = Path::new(&self.config.general.pid_file);
            write_pid_file(path)?;
        }

        tracing::info!("starting all modules");
        if let Err(e) = self.modules.start_all().await {
            // Rollback: stop any modules that were successfully started
            tracing::warn!("startup failed, rolling back already-started modules");
            if let Err(stop_err) = self.modules.stop_all().await {
                tracing::error!(
                    startup_error = %e,
                    rollback_error = %stop_err,
                    "rollback also failed during startup failure cleanup"
                );
            }

            if !self.config.general.pid_file.is_empty() {
                let path = Path::new(&self.config.general.pid_file);
                remove_pid_file(path);
            }
            return Err(e);
        }

        // Spawn event sink task (the guard's fire-and-forget event consumer)
        let mut event_sink_task = self.guard_event_rx.take().map(|event_rx| {
            let shutdown_rx = self.shutdown_tx.subscribe();
            spawn_event_sink(event_rx, shutdown_rx)
        });

        // Spawn uptime updater task
        let mut uptime_updater_task = if self.config.metrics.enabled {
            let shutdown_rx = self.shutdown_tx.subscribe();
            Some(spawn_uptime_updater(self.start_time, shutdown_rx))
        } else {
            None
        };

        // Main event loop
        tracing::info!("entering main event loop");
        let signal = wait_for_shutdown_signal().await?;
        tracing::info!(signal = signal, "shutdown signal received");

        // Initiate shutdown
        tracing::info!("broadcasting shutdown signal to all tasks");
        let _ = self.shutdown_tx.send(());

        if let Some(task) = event_sink_task.take() {
            let _ = task.await;
        }
        if let Some(task) = uptime_updater_task.take() {
            let _ = task.await;
        }

        // Stop all modules
        self.shutdown().await?;

        // Remove PID file
        if !self.config.general.pid_file.is_empty() {
            let path = Path::new(&self.config.general.pid_file);
            remove_pid_file(path);
        }

        Ok(())
    }

    /// Perform graceful shutdown of all modules.
    async fn shutdown(&mut self) -> Result<()> {
        tracing::info!("stopping all modules");
        self.modules.stop_all().await
    }

    /// Get the current aggregated health status.
    pub async fn health(&self) -> DaemonHealth {
        let statuses = self.modules.health_statuses().await;
        let modules: Vec<ModuleHealth> = statuses
            .into_iter()
            .map(|(name, enabled, status)| ModuleHealth {
                name,
                enabled,
                status,
            })
            .collect();

        let overall_status = aggregate_status(&modules);
        let uptime_secs = self.start_time.elapsed().as_secs();

        if self.config.metrics.enabled {
            use pagewarden_core::metrics as m;
            #[allow(clippy::cast_precision_loss)]
            metrics::gauge!(m::DAEMON_UPTIME_SECONDS).set(uptime_secs as f64);
        }

        DaemonHealth {
            status: overall_status,
            uptime_secs,
            modules,
        }
    }

    /// Get a reference to the loaded configuration.
    pub fn config(&self) -> &PagewardenConfig {
        &self.config
    }

    /// Number of registered modules.
    pub fn module_count(&self) -> usize {
        self.modules.count()
    }
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
///
/// Returns the name of the signal that triggered the shutdown.
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Write the current process PID to a file.
///
/// Used to prevent duplicate daemon instances.
///
/// # Security
///
/// - Uses `create_new(true)` to atomically create file (prevents TOCTOU races)
/// - Verifies the created file is a regular file (prevents symlink attacks)
/// - Creates parent directory with restrictive permissions (0o700)
fn write_pid_file(path: &Path) -> Result<()> {
    use std::fs::{self, OpenOptions};
    use std::io::{ErrorKind, Write};

    // Create parent directory with restrictive permissions (0o700)
    if let Some(parent) = path.parent() {
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            let mut builder = fs::DirBuilder::new();
            builder.mode(0o700).recursive(true);
            builder.create(parent)?;
        }
        #[cfg(not(unix))]
        {
            fs::create_dir_all(parent)?;
        }
    }

    let pid = std::process::id();

    // Atomically create file only if it doesn't exist (eliminates TOCTOU race)
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            let existing_pid = fs::read_to_string(path).unwrap_or_else(|_| "unknown".to_string());
            return Err(anyhow::anyhow!(
                "PID file {} already exists with PID: {}. Is another instance running?",
                path.display(),
                existing_pid.trim()
            ));
        }
        Err(e) => return Err(e.into()),
    };

    // Verify the created file is a regular file (not a symlink or other special file)
    let metadata = file.metadata()?;
    if !metadata.is_file() {
        let _ = fs::remove_file(path);
        return Err(anyhow::anyhow!(
            "PID file {} is not a regular file (possible symlink attack)",
            path.display()
        ));
    }

    // Set restrictive permissions on the PID file (0o600)
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        file.set_permissions(permissions)?;
    }

    writeln!(file, "{}", pid)?;

    tracing::info!(pid = pid, path = %path.display(), "PID file written");
    Ok(())
}

/// Remove the PID file on daemon shutdown.
///
/// Logs a warning but does not fail if the file cannot be removed.
fn remove_pid_file(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        tracing::warn!(
            path = %path.display(),
            error = %e,
            "failed to remove PID file"
        );
    } else {
        tracing::info!(path = %path.display(), "PID file removed");
    }
}

/// Spawn the guard-event sink task.
///
/// The sink logs every event for audit purposes. Escalations are logged at
/// warn level so they surface in default log configurations.
fn spawn_event_sink(
    mut event_rx: mpsc::Receiver<GuardEvent>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                event_result = event_rx.recv() => {
                    match event_result {
                        Some(event) => log_guard_event(&event),
                        None => {
                            tracing::debug!("guard event channel closed, exiting sink");
                            break;
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    // Drain whatever is already queued before exiting
                    while let Ok(event) = event_rx.try_recv() {
                        log_guard_event(&event);
                    }
                    tracing::debug!("event sink shutting down");
                    break;
                }
            }
        }
    })
}

/// Log a single guard event with structured fields.
fn log_guard_event(event: &GuardEvent) {
    match event {
        GuardEvent::Issue(issue) => {
            let fields = (
                issue.event_type(),
                issue.page_id.as_str(),
                issue.issue_id.as_str(),
            );
            match issue.event_type() {
                "issue-escalated" => tracing::warn!(
                    event = fields.0,
                    page_id = fields.1,
                    issue_id = fields.2,
                    issue_type = %issue.issue_type,
                    severity = %issue.severity,
                    title = %issue.title,
                    "issue escalated to a human operator"
                ),
                _ => tracing::info!(
                    event = fields.0,
                    page_id = fields.1,
                    issue_id = fields.2,
                    issue_type = %issue.issue_type,
                    severity = %issue.severity,
                    "issue lifecycle event"
                ),
            }
        }
        GuardEvent::Cycle(cycle) => {
            tracing::info!(
                event = cycle.event_type(),
                pages_checked = cycle.pages_checked,
                pages_failed = cycle.pages_failed,
                open_issues = cycle.open_issues,
                detected = cycle.issues_detected,
                resolved = cycle.issues_resolved,
                escalated = cycle.issues_escalated,
                duration_ms = cycle.duration_ms,
                "cycle summary"
            );
        }
    }
}

/// Record daemon-level metrics (build info, modules registered).
///
/// This should be called once during orchestrator initialization.
fn record_daemon_metrics(module_count: usize) {
    use pagewarden_core::metrics as m;

    #[allow(clippy::cast_precision_loss)]
    metrics::gauge!(m::DAEMON_BUILD_INFO, "version" => env!("CARGO_PKG_VERSION")).set(1.0);

    #[allow(clippy::cast_precision_loss)]
    metrics::gauge!(m::DAEMON_MODULES_REGISTERED).set(module_count as f64);

    tracing::debug!(
        module_count = module_count,
        version = env!("CARGO_PKG_VERSION"),
        "daemon metrics recorded"
    );
}

/// Spawn a background task that periodically updates the uptime metric.
///
/// Updates every 10 seconds to keep the metric fresh for Prometheus scrapes.
fn spawn_uptime_updater(
    start_time: Instant,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    use pagewarden_core::metrics as m;

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(10));

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    #[allow(clippy::cast_precision_loss)]
                    metrics::gauge!(m::DAEMON_UPTIME_SECONDS)
                        .set(start_time.elapsed().as_secs() as f64);
                }
                _ = shutdown_rx.recv() => {
                    tracing::debug!("uptime updater shutting down");
                    break;
                }
            }
        }
    })
}
