//! `pagewarden config` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use pagewarden_core::config::PagewardenConfig;

use crate::cli::{ConfigAction, ConfigArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `config` command.
pub async fn execute(
    args: ConfigArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        ConfigAction::Validate => execute_validate(config_path, writer).await,
        ConfigAction::Show { section } => execute_show(config_path, section, writer).await,
    }
}

/// Execute the config validate subcommand.
///
/// Attempts to load and validate the configuration file, reporting any
/// errors without starting anything.
async fn execute_validate(config_path: &Path, writer: &OutputWriter) -> Result<(), CliError> {
    info!(path = %config_path.display(), "validating configuration");

    let result = PagewardenConfig::load(config_path).await;

    let report = match result {
        Ok(_) => ConfigValidationReport {
            source: config_path.display().to_string(),
            valid: true,
            errors: Vec::new(),
        },
        Err(e) => ConfigValidationReport {
            source: config_path.display().to_string(),
            valid: false,
            errors: vec![e.to_string()],
        },
    };

    writer.render(&report)?;

    if !report.valid {
        return Err(CliError::Config("configuration is invalid".to_owned()));
    }

    Ok(())
}

/// Execute the config show subcommand.
///
/// Loads and displays the effective configuration (file + env overrides +
/// defaults). Page access tokens are always redacted.
async fn execute_show(
    config_path: &Path,
    section: Option<String>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    info!(path = %config_path.display(), "loading configuration");

    let mut config = PagewardenConfig::load(config_path).await?;

    redact_credentials(&mut config);

    let config_toml = match section.as_deref() {
        None => toml::to_string_pretty(&config),
        Some("general") => toml::to_string_pretty(&config.general),
        Some("guard") => toml::to_string_pretty(&config.guard),
        Some("platform") => toml::to_string_pretty(&config.platform),
        Some("content") => toml::to_string_pretty(&config.content),
        Some("metrics") => toml::to_string_pretty(&config.metrics),
        Some("pages") => toml::to_string_pretty(&PagesSection {
            pages: config.pages.clone(),
        }),
        Some(other) => {
            return Err(CliError::Command(format!(
                "unknown config section '{other}' (expected: general, guard, platform, content, metrics, pages)"
            )));
        }
    }
    .unwrap_or_else(|e| format!("(serialization error: {e})"));

    let report = ConfigReport {
        source: config_path.display().to_string(),
        section,
        config_toml,
    };

    writer.render(&report)?;
    Ok(())
}

/// Redact access tokens before display.
fn redact_credentials(config: &mut PagewardenConfig) {
    for page in &mut config.pages {
        if !page.access_token.is_empty() {
            page.access_token = "***redacted***".to_owned();
        }
    }
}

/// Wrapper so the pages array serializes as a TOML table array.
#[derive(Serialize)]
struct PagesSection {
    pages: Vec<pagewarden_core::config::PageEntry>,
}

#[derive(Serialize)]
pub struct ConfigValidationReport {
    pub source: String,
    pub valid: bool,
    pub errors: Vec<String>,
}

impl Render for ConfigValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        if self.valid {
            writeln!(w, "configuration OK: {}", self.source)?;
        } else {
            writeln!(w, "configuration INVALID: {}", self.source)?;
            for error in &self.errors {
                writeln!(w, "  - {error}")?;
            }
        }
        Ok(())
    }
}

#[derive(Serialize)]
pub struct ConfigReport {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    pub config_toml: String,
}

impl Render for ConfigReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "# source: {}", self.source)?;
        if let Some(section) = &self.section {
            writeln!(w, "# section: {section}")?;
        }
        writeln!(w, "{}", self.config_toml)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pagewarden_core::config::PageEntry;

    #[test]
    fn redaction_masks_tokens() {
        let mut config = PagewardenConfig::default();
        config.pages.push(PageEntry {
            id: "page-1".to_owned(),
            name: "Acme".to_owned(),
            access_token: "secret-token".to_owned(),
        });
        config.pages.push(PageEntry {
            id: "page-2".to_owned(),
            name: "No token".to_owned(),
            access_token: String::new(),
        });

        redact_credentials(&mut config);
        assert_eq!(config.pages[0].access_token, "***redacted***");
        // Empty tokens stay empty so the output shows they were never set
        assert!(config.pages[1].access_token.is_empty());
    }

    #[test]
    fn validation_report_render() {
        let report = ConfigValidationReport {
            source: "pagewarden.toml".to_owned(),
            valid: false,
            errors: vec!["guard.check_interval_secs must be 30-3600".to_owned()],
        };
        let mut buf = Vec::new();
        report.render_text(&mut buf).unwrap();
        let shown = String::from_utf8(buf).unwrap();
        assert!(shown.contains("INVALID"));
        assert!(shown.contains("check_interval_secs"));
    }
}
