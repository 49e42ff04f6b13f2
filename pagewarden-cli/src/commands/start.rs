//! `pagewarden start` command handler

use std::path::Path;
use std::process::{Command, Stdio};

use tracing::info;

use crate::cli::StartArgs;
use crate::error::CliError;

/// Execute the `start` command.
///
/// In foreground mode, spawns `pagewarden-daemon` and replaces the current
/// process. In daemon mode (`-d`), spawns `pagewarden-daemon` as a detached
/// background process.
pub async fn execute(args: StartArgs, config_path: &Path) -> Result<(), CliError> {
    // Validate config exists
    if !config_path.exists() {
        return Err(CliError::Config(format!(
            "configuration file not found: {}",
            config_path.display()
        )));
    }

    info!(
        daemonize = args.daemonize,
        config = %config_path.display(),
        "starting pagewarden"
    );

    if args.daemonize {
        start_daemon(config_path, args.pid_file.as_deref())?;
    } else {
        start_foreground(config_path)?;
    }

    Ok(())
}

/// Start daemon in foreground mode by exec-ing the pagewarden-daemon binary.
///
/// Replaces the current CLI process with `pagewarden-daemon` using `exec(2)`
/// on Unix. On success, this function never returns (process is replaced).
#[cfg(unix)]
fn start_foreground(config_path: &Path) -> Result<(), CliError> {
    use std::os::unix::process::CommandExt;

    let mut cmd = Command::new("pagewarden-daemon");
    cmd.arg("--config").arg(config_path);

    info!("executing pagewarden-daemon in foreground mode");

    // exec() replaces the current process
    let err = cmd.exec();

    // If we reach here, exec failed
    Err(CliError::Command(format!(
        "failed to execute pagewarden-daemon: {}",
        err
    )))
}

#[cfg(not(unix))]
fn start_foreground(config_path: &Path) -> Result<(), CliError> {
    let status = Command::new("pagewarden-daemon")
        .arg("--config")
        .arg(config_path)
        .status()
        .map_err(|e| CliError::Command(format!("failed to execute pagewarden-daemon: {}", e)))?;

    if !status.success() {
        return Err(CliError::Command(format!(
            "pagewarden-daemon exited with {}",
            status
        )));
    }
    Ok(())
}

/// Start daemon in background mode.
///
/// Spawns `pagewarden-daemon` as a detached background process with stdio
/// redirected to `/dev/null`, then waits briefly and checks the child is
/// still alive to detect immediate crashes.
fn start_daemon(config_path: &Path, pid_file: Option<&Path>) -> Result<(), CliError> {
    let mut cmd = Command::new("pagewarden-daemon");
    cmd.arg("--config")
        .arg(config_path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    if let Some(pid_file) = pid_file {
        cmd.arg("--pid-file").arg(pid_file);
    }

    let mut child = cmd
        .spawn()
        .map_err(|e| CliError::Command(format!("failed to spawn pagewarden-daemon: {}", e)))?;

    // Detect immediate startup crashes (bad config path, port in use, ...)
    std::thread::sleep(std::time::Duration::from_millis(200));
    match child.try_wait() {
        Ok(Some(status)) => Err(CliError::Command(format!(
            "pagewarden-daemon exited immediately with {}",
            status
        ))),
        Ok(None) => {
            println!("pagewarden-daemon started (pid {})", child.id());
            Ok(())
        }
        Err(e) => Err(CliError::Command(format!(
            "failed to check daemon status: {}",
            e
        ))),
    }
}
