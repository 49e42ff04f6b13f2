//! `pagewarden check` command handler
//!
//! One-shot health evaluation: fetch metrics for each configured page,
//! compute a snapshot, and classify issue candidates. No remediation is
//! attempted and nothing is queued -- this is a read-only diagnostic.

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use colored::Colorize;
use serde::Serialize;
use tracing::info;

use pagewarden_core::config::PagewardenConfig;
use pagewarden_core::types::{PageInfo, Severity};

use pagewarden_page_guard::classifier::IssueClassifier;
use pagewarden_page_guard::config::ClassifierConfig;
use pagewarden_page_guard::health::HealthEvaluator;
use pagewarden_page_guard::platform::{HttpPlatformClient, PlatformClient};

use crate::cli::CheckArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `check` command.
///
/// Exit code is 0 when every page is healthy, 4 when any issue candidates
/// were detected (so scripts can alert on it).
pub async fn execute(
    args: CheckArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let config = PagewardenConfig::load(config_path).await?;

    let pages: Vec<PageInfo> = config
        .pages
        .iter()
        .filter(|entry| args.page.as_ref().is_none_or(|wanted| *wanted == entry.id))
        .map(|entry| PageInfo {
            id: entry.id.clone(),
            name: entry.name.clone(),
            access_token: entry.access_token.clone(),
        })
        .collect();

    if pages.is_empty() {
        return Err(CliError::Command(match args.page {
            Some(page_id) => format!("page '{page_id}' is not in the configuration"),
            None => "no pages configured".to_owned(),
        }));
    }

    let platform = HttpPlatformClient::new(
        &config.platform.api_base,
        Duration::from_secs(config.platform.request_timeout_secs),
    )
    .map_err(|e| CliError::Command(format!("failed to build platform client: {e}")))?;

    let report = run_check(&platform, &pages).await;
    writer.render(&report)?;

    let total_issues: usize = report.pages.iter().map(|p| p.issues.len()).sum();
    if total_issues > 0 {
        return Err(CliError::IssuesFound(total_issues));
    }

    Ok(())
}

/// Evaluate and classify each page (single pass, no trend history).
async fn run_check<P: PlatformClient>(platform: &P, pages: &[PageInfo]) -> CheckReport {
    let evaluator = HealthEvaluator::new();
    let classifier = IssueClassifier::new(ClassifierConfig::default());

    let mut results = Vec::with_capacity(pages.len());
    for page in pages {
        info!(page_id = %page.id, "evaluating page");
        let result = match platform.fetch_metrics(page).await {
            Ok(raw) => match evaluator.evaluate(&page.id, &raw, None) {
                Ok(snapshot) => {
                    let issues = classifier
                        .classify(&snapshot, None)
                        .into_iter()
                        .map(|issue| IssueSummary {
                            issue_type: issue.issue_type.to_string(),
                            severity: issue.severity,
                            confidence: issue.confidence,
                            description: issue.description,
                        })
                        .collect();
                    PageCheck {
                        page_id: page.id.clone(),
                        name: page.name.clone(),
                        overall: Some(snapshot.overall),
                        error: None,
                        issues,
                    }
                }
                Err(e) => PageCheck::failed(page, e.to_string()),
            },
            Err(e) => {
                let mut check = PageCheck::failed(page, e.to_string());
                if let Some(issue) = classifier.classify_fetch_failure(&page.id, &e) {
                    check.issues.push(IssueSummary {
                        issue_type: issue.issue_type.to_string(),
                        severity: issue.severity,
                        confidence: issue.confidence,
                        description: issue.description,
                    });
                }
                check
            }
        };
        results.push(result);
    }

    CheckReport { pages: results }
}

#[derive(Serialize)]
pub struct CheckReport {
    pub pages: Vec<PageCheck>,
}

#[derive(Serialize)]
pub struct PageCheck {
    pub page_id: String,
    pub name: String,
    /// Overall 0-100 health score (absent when evaluation failed).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub issues: Vec<IssueSummary>,
}

impl PageCheck {
    fn failed(page: &PageInfo, error: String) -> Self {
        Self {
            page_id: page.id.clone(),
            name: page.name.clone(),
            overall: None,
            error: Some(error),
            issues: Vec::new(),
        }
    }
}

#[derive(Serialize)]
pub struct IssueSummary {
    pub issue_type: String,
    pub severity: Severity,
    pub confidence: f64,
    pub description: String,
}

fn severity_colored(severity: Severity) -> colored::ColoredString {
    let text = severity.to_string();
    match severity {
        Severity::Low => text.as_str().normal(),
        Severity::Medium => text.as_str().yellow(),
        Severity::High => text.as_str().red(),
        Severity::Critical => text.as_str().red().bold(),
    }
}

impl Render for CheckReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        for page in &self.pages {
            match (&page.overall, &page.error) {
                (Some(overall), _) => {
                    writeln!(w, "{} ({}) -- health {:.1}/100", page.name, page.page_id, overall)?;
                }
                (None, Some(error)) => {
                    writeln!(
                        w,
                        "{} ({}) -- {}: {}",
                        page.name,
                        page.page_id,
                        "evaluation failed".red(),
                        error
                    )?;
                }
                (None, None) => {
                    writeln!(w, "{} ({})", page.name, page.page_id)?;
                }
            }

            if page.issues.is_empty() && page.error.is_none() {
                writeln!(w, "  {}", "no issues".green())?;
            }
            for issue in &page.issues {
                writeln!(
                    w,
                    "  [{}] {} (confidence {:.2}) -- {}",
                    severity_colored(issue.severity),
                    issue.issue_type,
                    issue.confidence,
                    issue.description,
                )?;
            }
        }
        Ok(())
    }
}
