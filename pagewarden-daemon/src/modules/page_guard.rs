//! Page guard module initialization.
//!
//! Converts `PagewardenConfig.guard` into a `PageGuardConfig`, builds the
//! HTTP platform client, config-backed page source, and API content
//! generator, then wraps the assembled `PageGuard` in a `ModuleHandle`.
//!
//! # Channel Wiring
//!
//! ```text
//! PageGuard --GuardEvent--> event_rx --> daemon event sink (logging/audit)
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;

use pagewarden_core::config::PagewardenConfig;
use pagewarden_core::event::GuardEvent;

use pagewarden_page_guard::{
    ApiContentGenerator, ConfigPageSource, HttpPlatformClient, PageGuardBuilder, PageGuardConfig,
};

use super::ModuleHandle;

/// Initialize the page guard module.
///
/// Returns `None` if the page guard is disabled in configuration.
///
/// # Returns
///
/// * `Ok(Some((ModuleHandle, Receiver<GuardEvent>)))` - Guard initialized
/// * `Ok(None)` - Module disabled in configuration
/// * `Err(_)` - Initialization failed (e.g., malformed API base URL)
pub fn init(
    config: &PagewardenConfig,
) -> Result<Option<(ModuleHandle, mpsc::Receiver<GuardEvent>)>> {
    if !config.guard.enabled {
        tracing::info!("page guard disabled in configuration");
        return Ok(None);
    }

    tracing::info!(pages = config.pages.len(), "initializing page guard");

    let mut guard_config = PageGuardConfig::from_core(&config.guard);
    guard_config.suggestions_per_fix = config.content.max_suggestions;

    let platform = Arc::new(HttpPlatformClient::new(
        &config.platform.api_base,
        Duration::from_secs(config.platform.request_timeout_secs),
    )?);

    let source = Arc::new(ConfigPageSource::new(&config.pages));

    let generator = Arc::new(ApiContentGenerator::new(
        &config.content.api_base,
        &config.content.model,
        &config.content.api_key_env,
        Duration::from_secs(config.content.request_timeout_secs),
    )?);

    let (guard, event_rx) = PageGuardBuilder::new()
        .config(guard_config)
        .platform_client(platform)
        .page_source(source)
        .content_generator(generator)
        .build()
        .map_err(|e| anyhow::anyhow!("failed to build page guard: {}", e))?;

    let handle = ModuleHandle::new("page-guard", true, Box::new(guard));

    let event_receiver = event_rx
        .ok_or_else(|| anyhow::anyhow!("page guard builder did not produce an event receiver"))?;

    Ok(Some((handle, event_receiver)))
}
