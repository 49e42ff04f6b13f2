//! CLI argument definitions for pagewarden-daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Pagewarden page health monitoring daemon.
///
/// Runs the page guard control loop: periodic health evaluation,
/// issue detection, confidence-gated automatic remediation, and
/// escalation to a human when automation is exhausted.
#[derive(Parser, Debug)]
#[command(name = "pagewarden-daemon")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to pagewarden.toml configuration file.
    #[arg(short, long, default_value = "/etc/pagewarden/pagewarden.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Validate configuration file and exit without starting the daemon.
    #[arg(long)]
    pub validate: bool,

    /// Override PID file path (takes precedence over config file).
    #[arg(long)]
    pub pid_file: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = DaemonCli::parse_from(["pagewarden-daemon"]);
        assert_eq!(
            cli.config,
            PathBuf::from("/etc/pagewarden/pagewarden.toml")
        );
        assert!(!cli.validate);
        assert!(cli.log_level.is_none());
    }

    #[test]
    fn overrides() {
        let cli = DaemonCli::parse_from([
            "pagewarden-daemon",
            "--config",
            "custom.toml",
            "--log-level",
            "debug",
            "--validate",
        ]);
        assert_eq!(cli.config, PathBuf::from("custom.toml"));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert!(cli.validate);
    }
}
