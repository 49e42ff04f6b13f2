//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's
//! derive macros. It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Pagewarden -- page health monitoring and auto-remediation platform.
///
/// Use `pagewarden <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "pagewarden", version, about, long_about = None)]
pub struct Cli {
    /// Path to the pagewarden.toml configuration file.
    #[arg(short, long, default_value = "pagewarden.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table / text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the pagewarden daemon.
    Start(StartArgs),

    /// Check daemon and module status.
    Status(StatusArgs),

    /// Run a one-shot health evaluation of the configured pages.
    Check(CheckArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- start ----

/// Start the pagewarden daemon.
#[derive(Args, Debug)]
pub struct StartArgs {
    /// Run as a background daemon (default: foreground).
    #[arg(short = 'd', long)]
    pub daemonize: bool,

    /// Override PID file location (daemon mode only).
    #[arg(long)]
    pub pid_file: Option<PathBuf>,
}

// ---- status ----

/// Display daemon and module status.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Show detailed per-module configuration.
    #[arg(short, long)]
    pub verbose: bool,
}

// ---- check ----

/// Run a one-shot health evaluation without remediation.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Evaluate only this page ID (default: all configured pages).
    #[arg(long)]
    pub page: Option<String>,
}

// ---- config ----

/// Manage configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file.
    Validate,

    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Only show one section (general, guard, platform, content, metrics, pages).
        #[arg(long)]
        section: Option<String>,
    },
}
