//! CLI-specific error types and exit code mapping

use pagewarden_core::error::PagewardenError;
use pagewarden_page_guard::error::PageGuardError;

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to standard Unix exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// Cannot connect to the daemon (e.g., for `status`).
    #[error("daemon not reachable: {0}")]
    #[allow(dead_code)] // Reserved for future use with a daemon health API
    DaemonUnavailable(String),

    /// `check` found open issues (distinct exit code for scripting).
    #[error("{0} issue(s) detected")]
    IssuesFound(usize),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from pagewarden-core.
    #[error("{0}")]
    Core(#[from] PagewardenError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                         |
    /// |------|---------------------------------|
    /// | 0    | Success                         |
    /// | 1    | General / command error         |
    /// | 2    | Configuration error             |
    /// | 3    | Daemon unreachable              |
    /// | 4    | Check found open issues         |
    /// | 10   | IO error                        |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::DaemonUnavailable(_) => 3,
            Self::IssuesFound(_) => 4,
            Self::Io(_) => 10,
            Self::JsonSerialize(_) | Self::Command(_) | Self::Core(_) => 1,
        }
    }
}

impl From<PageGuardError> for CliError {
    fn from(e: PageGuardError) -> Self {
        Self::Command(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_config_error() {
        let err = CliError::Config("test error".to_owned());
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn exit_code_daemon_unavailable() {
        let err = CliError::DaemonUnavailable("test error".to_owned());
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn exit_code_issues_found() {
        let err = CliError::IssuesFound(3);
        assert_eq!(err.exit_code(), 4);
        assert!(err.to_string().contains("3 issue(s)"));
    }

    #[test]
    fn exit_code_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = CliError::Io(io_err);
        assert_eq!(err.exit_code(), 10);
    }

    #[test]
    fn exit_code_command_error() {
        let err = CliError::Command("test error".to_owned());
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn from_core_error() {
        use pagewarden_core::error::ConfigError;
        let core_err = PagewardenError::Config(ConfigError::FileNotFound {
            path: "test.toml".to_owned(),
        });
        let cli_err: CliError = core_err.into();
        assert!(matches!(cli_err, CliError::Core(_)));
    }

    #[test]
    fn from_guard_error_maps_to_command() {
        let guard_err = PageGuardError::ContentGeneration("no api key".to_owned());
        let cli_err: CliError = guard_err.into();
        assert!(matches!(cli_err, CliError::Command(_)));
        assert_eq!(cli_err.exit_code(), 1);
    }

    #[test]
    fn display_config_error() {
        let err = CliError::Config("invalid TOML syntax".to_owned());
        let shown = err.to_string();
        assert!(shown.contains("configuration error"));
        assert!(shown.contains("invalid TOML syntax"));
    }
}
